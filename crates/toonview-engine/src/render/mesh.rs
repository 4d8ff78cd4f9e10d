//! GPU resources for a consolidated model.
//!
//! Each non-empty group gets a vertex/index buffer pair; each material gets
//! a bind group carrying its shading coefficients and texture. Materials
//! without a texture bind a small built-in white map with the "textured"
//! flag cleared, so one pipeline layout serves both cases.

use bytemuck::cast_slice;
use wgpu::util::DeviceExt;

use crate::wavefront::{Material, Model, TextureImage};

use super::common::MaterialUniforms;

pub(crate) struct GroupMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
    pub material: usize,
}

pub(crate) struct MaterialBinding {
    pub bind_group: wgpu::BindGroup,
    /// Alpha-textured materials draw with the blending pipeline variant.
    pub blended: bool,
}

pub struct ModelMesh {
    pub(crate) groups: Vec<GroupMesh>,
    pub(crate) materials: Vec<MaterialBinding>,
}

impl ModelMesh {
    /// Uploads a consolidated model. Groups without triangles produce no
    /// GPU resources and are skipped at draw time.
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        model: &Model,
        material_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("material sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });

        let materials = model
            .materials
            .iter()
            .map(|m| upload_material(device, queue, m, material_layout, &sampler))
            .collect();

        let groups = model
            .groups
            .iter()
            .filter(|g| !g.indices.is_empty())
            .map(|g| GroupMesh {
                vertex_buffer: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("group vertex buffer"),
                    contents: cast_slice(&g.vertex_data),
                    usage: wgpu::BufferUsages::VERTEX,
                }),
                index_buffer: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("group index buffer"),
                    contents: cast_slice(&g.indices),
                    usage: wgpu::BufferUsages::INDEX,
                }),
                index_count: g.indices.len() as u32,
                material: g.material,
            })
            .collect();

        Self { groups, materials }
    }
}

fn upload_material(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    material: &Material,
    layout: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
) -> MaterialBinding {
    let uniforms = MaterialUniforms {
        kd: material.diffuse,
        ks: material.specular,
        ia: material.ambient,
        ie: material.emissive,
        shininess: material.shininess,
        textured: material.texture.is_some() as u32,
        _pad: [0; 2],
    };
    let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("material uniforms"),
        contents: bytemuck::bytes_of(&uniforms),
        usage: wgpu::BufferUsages::UNIFORM,
    });

    let view = match &material.texture {
        Some(image) => upload_texture(device, queue, image),
        None => upload_texture(device, queue, &white_texture()),
    };

    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("material bind group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(&view),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    });

    let blended = material.texture.as_ref().is_some_and(|t| t.has_alpha);

    MaterialBinding { bind_group, blended }
}

fn upload_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    image: &TextureImage,
) -> wgpu::TextureView {
    let rgba = to_rgba8(image);

    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("material texture"),
        size: wgpu::Extent3d {
            width: image.width,
            height: image.height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        &rgba,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * image.width),
            rows_per_image: Some(image.height),
        },
        wgpu::Extent3d {
            width: image.width,
            height: image.height,
            depth_or_array_layers: 1,
        },
    );

    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

fn to_rgba8(image: &TextureImage) -> Vec<u8> {
    if image.has_alpha {
        return image.pixels.clone();
    }
    let mut rgba = Vec::with_capacity(image.pixels.len() / 3 * 4);
    for px in image.pixels.chunks_exact(3) {
        rgba.extend_from_slice(px);
        rgba.push(255);
    }
    rgba
}

fn white_texture() -> TextureImage {
    TextureImage {
        width: 2,
        height: 2,
        has_alpha: false,
        pixels: vec![255; 12],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgb_pixels_expand_with_opaque_alpha() {
        let image = TextureImage {
            width: 2,
            height: 1,
            has_alpha: false,
            pixels: vec![10, 20, 30, 40, 50, 60],
        };
        assert_eq!(to_rgba8(&image), vec![10, 20, 30, 255, 40, 50, 60, 255]);
    }

    #[test]
    fn rgba_pixels_pass_through() {
        let image = TextureImage {
            width: 1,
            height: 1,
            has_alpha: true,
            pixels: vec![1, 2, 3, 4],
        };
        assert_eq!(to_rgba8(&image), vec![1, 2, 3, 4]);
    }
}
