//! Pass 1: rasterize the model into the colour/normal/depth targets.

use wgpu::util::DeviceExt;

use crate::wavefront::VertexLayout;

use super::common::{FrameUniforms, MaterialUniforms, uniform_size};
use super::gbuffer::{DEPTH_FORMAT, GBuffer, GEOMETRY_TARGETS, TARGET_FORMAT};
use super::mesh::ModelMesh;

/// Constant attribute values fed to layouts that omit normals and/or
/// texture coordinates: normal (0, 0, 1), texcoord (0, 0). Bound with a
/// zero array stride so every vertex reads the same bytes.
const DEFAULT_ATTRIBUTES: [f32; 5] = [0.0, 0.0, 1.0, 0.0, 0.0];

pub(crate) struct GeometryPass {
    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    material_layout: wgpu::BindGroupLayout,
    opaque: wgpu::RenderPipeline,
    blended: wgpu::RenderPipeline,
    defaults: Option<wgpu::Buffer>,
}

impl GeometryPass {
    pub(crate) fn new(device: &wgpu::Device, layout: VertexLayout) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("geometry pass shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/geometry.wgsl").into()),
        });

        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("geometry frame bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: Some(uniform_size::<FrameUniforms>()),
                },
                count: None,
            }],
        });

        let material_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("geometry material bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: Some(uniform_size::<MaterialUniforms>()),
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let frame_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("geometry frame ubo"),
            size: std::mem::size_of::<FrameUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("geometry frame bind group"),
            layout: &frame_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("geometry pipeline layout"),
            bind_group_layouts: &[&frame_layout, &material_layout],
            immediate_size: 0,
        });

        // Vertex fetch: slot 0 is the consolidated stream with whatever
        // attributes the model carries; slot 1 supplies constants for the
        // rest.
        let mut primary = vec![wgpu::VertexAttribute {
            format: wgpu::VertexFormat::Float32x3,
            offset: 0,
            shader_location: 0,
        }];
        let mut defaults_attrs = Vec::new();
        let mut offset = 12u64;
        if layout.has_normals {
            primary.push(wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x3,
                offset,
                shader_location: 1,
            });
            offset += 12;
        } else {
            defaults_attrs.push(wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x3,
                offset: 0,
                shader_location: 1,
            });
        }
        if layout.has_texcoords {
            primary.push(wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x2,
                offset,
                shader_location: 2,
            });
            offset += 8;
        } else {
            defaults_attrs.push(wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x2,
                offset: 12,
                shader_location: 2,
            });
        }
        let stride = offset;
        debug_assert_eq!(stride as usize, layout.floats_per_vertex() * 4);

        let mut buffers = vec![wgpu::VertexBufferLayout {
            array_stride: stride,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &primary,
        }];
        if !defaults_attrs.is_empty() {
            buffers.push(wgpu::VertexBufferLayout {
                array_stride: 0,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &defaults_attrs,
            });
        }

        let defaults = (!defaults_attrs.is_empty()).then(|| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("geometry default attributes"),
                contents: bytemuck::cast_slice(&DEFAULT_ATTRIBUTES),
                usage: wgpu::BufferUsages::VERTEX,
            })
        });

        let make_pipeline = |label: &str, blend: Option<wgpu::BlendState>| {
            // Blend only the colour target; normal/depth data stays raw.
            let targets = [
                Some(wgpu::ColorTargetState {
                    format: TARGET_FORMAT,
                    blend,
                    write_mask: wgpu::ColorWrites::ALL,
                }),
                Some(wgpu::ColorTargetState {
                    format: TARGET_FORMAT,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                }),
                Some(wgpu::ColorTargetState {
                    format: TARGET_FORMAT,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                }),
            ];
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    compilation_options: Default::default(),
                    buffers: &buffers,
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    compilation_options: Default::default(),
                    targets: &targets,
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview_mask: None,
                cache: None,
            })
        };

        let opaque = make_pipeline("geometry pipeline", None);
        let blended = make_pipeline(
            "geometry pipeline (alpha)",
            Some(wgpu::BlendState::ALPHA_BLENDING),
        );

        Self {
            frame_buffer,
            frame_bind_group,
            material_layout,
            opaque,
            blended,
            defaults,
        }
    }

    pub(crate) fn material_layout(&self) -> &wgpu::BindGroupLayout {
        &self.material_layout
    }

    pub(crate) fn prepare(&self, queue: &wgpu::Queue, frame: &FrameUniforms) {
        queue.write_buffer(&self.frame_buffer, 0, bytemuck::bytes_of(frame));
    }

    /// Records the geometry pass: clear, depth test on, one indexed draw
    /// per non-empty group with its material bound.
    pub(crate) fn record(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        gbuffer: &GBuffer,
        mesh: &ModelMesh,
    ) {
        let attachments = gbuffer.color_attachments(GEOMETRY_TARGETS, Some(wgpu::Color::WHITE));
        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("geometry pass"),
            color_attachments: &attachments,
            depth_stencil_attachment: Some(gbuffer.depth_attachment(true)),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_bind_group(0, &self.frame_bind_group, &[]);
        if let Some(defaults) = &self.defaults {
            rpass.set_vertex_buffer(1, defaults.slice(..));
        }

        for group in &mesh.groups {
            let material = &mesh.materials[group.material];
            rpass.set_pipeline(if material.blended {
                &self.blended
            } else {
                &self.opaque
            });
            rpass.set_bind_group(1, &material.bind_group, &[]);
            rpass.set_vertex_buffer(0, group.vertex_buffer.slice(..));
            rpass.set_index_buffer(group.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            rpass.draw_indexed(0..group.index_count, 0, 0..1);
        }
    }
}
