//! Debug visualization: draws each of the first four G-Buffer targets into
//! one screen quadrant, bypassing shading.
//!
//! Quadrant layout (matching the classic bottom-left-origin convention):
//! lower-left = target 0, upper-left = 1, upper-right = 2, lower-right = 3.

use super::common::{FullscreenQuad, QuadVertex};
use super::gbuffer::GBuffer;

pub(crate) struct BlitPass {
    layout: wgpu::BindGroupLayout,
    bind_groups: Vec<wgpu::BindGroup>,
    pipeline: wgpu::RenderPipeline,
}

impl BlitPass {
    pub(crate) fn new(device: &wgpu::Device, surface_format: wgpu::TextureFormat) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("blit shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/blit.wgsl").into()),
        });

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("blit bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: false },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::NonFiltering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("blit pipeline layout"),
            bind_group_layouts: &[&layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("blit pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[QuadVertex::layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        Self {
            layout,
            bind_groups: Vec::new(),
            pipeline,
        }
    }

    pub(crate) fn invalidate(&mut self) {
        self.bind_groups.clear();
    }

    pub(crate) fn prepare(&mut self, device: &wgpu::Device, gbuffer: &GBuffer) {
        if !self.bind_groups.is_empty() {
            return;
        }
        let shown = gbuffer.target_count().min(4);
        self.bind_groups = (0..shown)
            .map(|i| {
                device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("blit bind group"),
                    layout: &self.layout,
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 0,
                            resource: wgpu::BindingResource::TextureView(gbuffer.target_view(i)),
                        },
                        wgpu::BindGroupEntry {
                            binding: 1,
                            resource: wgpu::BindingResource::Sampler(gbuffer.sampler()),
                        },
                    ],
                })
            })
            .collect();
    }

    pub(crate) fn record(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        surface_view: &wgpu::TextureView,
        gbuffer: &GBuffer,
        quad: &FullscreenQuad,
    ) {
        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("debug blit"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: surface_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::WHITE),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_pipeline(&self.pipeline);

        let w = gbuffer.width() as f32 * 0.5;
        let h = gbuffer.height() as f32 * 0.5;
        // In surface coordinates (top-left origin): lower-left, upper-left,
        // upper-right, lower-right.
        let quadrants = [(0.0, h), (0.0, 0.0), (w, 0.0), (w, h)];

        for (bind_group, (x, y)) in self.bind_groups.iter().zip(quadrants) {
            rpass.set_viewport(x, y, w, h, 0.0, 1.0);
            rpass.set_bind_group(0, bind_group, &[]);
            quad.draw(&mut rpass);
        }
    }
}
