//! Off-screen render target set for the deferred passes.
//!
//! `target_count` equally sized 32-bit-float colour targets plus one depth
//! target, owned as a single unit tied to the current window size. There is
//! no incremental resize: the owner drops the buffer and allocates a new
//! one.

use anyhow::{Result, bail};

/// Target roles, in attachment order.
pub(crate) const COLOUR_TARGET: usize = 0;
pub(crate) const NORMAL_TARGET: usize = 1;
pub(crate) const DEPTH_TARGET: usize = 2;
pub(crate) const LAPLACIAN_TARGET: usize = 3;
pub(crate) const TARGET_COUNT: usize = 4;

/// Targets written by the geometry pass, in fragment-output order.
pub(crate) const GEOMETRY_TARGETS: &[usize] = &[COLOUR_TARGET, NORMAL_TARGET, DEPTH_TARGET];
/// Targets written by the edge pass.
pub(crate) const EDGE_TARGETS: &[usize] = &[LAPLACIAN_TARGET];

pub(crate) const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba32Float;
pub(crate) const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

const TARGET_BYTES_PER_SAMPLE: u32 = 16;

pub struct GBuffer {
    width: u32,
    height: u32,
    views: Vec<wgpu::TextureView>,
    depth_view: wgpu::TextureView,
    sampler: wgpu::Sampler,
}

impl GBuffer {
    /// Allocates the full target set.
    ///
    /// The attachment budget is validated against the device limits before
    /// anything is created, so a rejected configuration is an explicit
    /// error rather than a half-configured buffer.
    pub fn new(
        device: &wgpu::Device,
        width: u32,
        height: u32,
        target_count: usize,
    ) -> Result<Self> {
        check_attachment_budget(&device.limits(), target_count, GEOMETRY_TARGETS.len())?;

        let width = width.max(1);
        let height = height.max(1);
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };

        let views = (0..target_count)
            .map(|_| {
                let texture = device.create_texture(&wgpu::TextureDescriptor {
                    label: Some("gbuffer target"),
                    size,
                    mip_level_count: 1,
                    sample_count: 1,
                    dimension: wgpu::TextureDimension::D2,
                    format: TARGET_FORMAT,
                    usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                        | wgpu::TextureUsages::TEXTURE_BINDING,
                    view_formats: &[],
                });
                texture.create_view(&wgpu::TextureViewDescriptor::default())
            })
            .collect();

        let depth = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("gbuffer depth"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let depth_view = depth.create_view(&wgpu::TextureViewDescriptor::default());

        // Float targets are not filterable without an extra device feature;
        // every read path samples them through this nearest sampler.
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("gbuffer sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });

        Ok(Self {
            width,
            height,
            views,
            depth_view,
            sampler,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn target_count(&self) -> usize {
        self.views.len()
    }

    /// One-texel step in texture coordinates.
    pub fn texcoord_inc(&self) -> [f32; 2] {
        [1.0 / self.width as f32, 1.0 / self.height as f32]
    }

    /// Exposes target `index` for sampling.
    pub fn target_view(&self, index: usize) -> &wgpu::TextureView {
        &self.views[index]
    }

    pub fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }

    /// Builds the colour attachment list for a pass that writes the given
    /// target subset: fragment output location `i` goes to `writable[i]`.
    pub(crate) fn color_attachments(
        &self,
        writable: &[usize],
        clear: Option<wgpu::Color>,
    ) -> Vec<Option<wgpu::RenderPassColorAttachment<'_>>> {
        writable
            .iter()
            .map(|&i| {
                Some(wgpu::RenderPassColorAttachment {
                    view: &self.views[i],
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: match clear {
                            Some(c) => wgpu::LoadOp::Clear(c),
                            None => wgpu::LoadOp::Load,
                        },
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })
            })
            .collect()
    }

    pub(crate) fn depth_attachment(
        &self,
        clear: bool,
    ) -> wgpu::RenderPassDepthStencilAttachment<'_> {
        wgpu::RenderPassDepthStencilAttachment {
            view: &self.depth_view,
            depth_ops: Some(wgpu::Operations {
                load: if clear {
                    wgpu::LoadOp::Clear(1.0)
                } else {
                    wgpu::LoadOp::Load
                },
                store: wgpu::StoreOp::Store,
            }),
            stencil_ops: None,
        }
    }
}

/// Checks the attachment combination against device limits.
///
/// `simultaneous` is the largest number of float targets any single pass
/// writes at once.
pub(crate) fn check_attachment_budget(
    limits: &wgpu::Limits,
    target_count: usize,
    simultaneous: usize,
) -> Result<()> {
    if target_count as u32 > limits.max_color_attachments {
        bail!(
            "G-Buffer needs {target_count} colour targets but the device allows {}",
            limits.max_color_attachments
        );
    }
    let bytes = simultaneous as u32 * TARGET_BYTES_PER_SAMPLE;
    if bytes > limits.max_color_attachment_bytes_per_sample {
        bail!(
            "G-Buffer writes {bytes} bytes per sample but the device allows {}",
            limits.max_color_attachment_bytes_per_sample
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_limits_reject_three_float_targets() {
        // 3 x 16 bytes exceeds the 32-byte default budget; allocation must
        // fail up front rather than leave a half-configured buffer.
        let limits = wgpu::Limits::default();
        assert!(check_attachment_budget(&limits, TARGET_COUNT, 3).is_err());
    }

    #[test]
    fn raised_budget_accepts_the_geometry_pass() {
        let limits = wgpu::Limits {
            max_color_attachment_bytes_per_sample: 64,
            ..wgpu::Limits::default()
        };
        assert!(check_attachment_budget(&limits, TARGET_COUNT, 3).is_ok());
    }

    #[test]
    fn too_many_targets_are_rejected() {
        let limits = wgpu::Limits {
            max_color_attachments: 2,
            max_color_attachment_bytes_per_sample: 64,
            ..wgpu::Limits::default()
        };
        assert!(check_attachment_budget(&limits, TARGET_COUNT, 1).is_err());
    }
}
