//! Shared GPU types and utilities used by all passes.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

// ── uniform blocks ────────────────────────────────────────────────────────

/// Per-frame transforms for the geometry pass.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(crate) struct FrameUniforms {
    pub m: [[f32; 4]; 4],
    pub mv: [[f32; 4]; 4],
    pub mvp: [[f32; 4]; 4],
}

/// Per-material shading coefficients for the geometry pass.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(crate) struct MaterialUniforms {
    pub kd: [f32; 4],
    pub ks: [f32; 4],
    pub ia: [f32; 4],
    pub ie: [f32; 4],
    pub shininess: f32,
    pub textured: u32,
    pub _pad: [u32; 2],
}

/// Edge-pass parameters.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(crate) struct EdgeUniforms {
    /// Reciprocal of the G-Buffer dimensions: one texel step.
    pub texcoord_inc: [f32; 2],
    pub _pad: [f32; 2],
}

/// Composite-pass parameters.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(crate) struct CompositeUniforms {
    /// Light direction in view space.
    pub light_dir: [f32; 3],
    pub _pad0: f32,
    pub texcoord_inc: [f32; 2],
    pub _pad1: [f32; 2],
}

pub(crate) fn uniform_size<T>() -> std::num::NonZeroU64 {
    std::num::NonZeroU64::new(std::mem::size_of::<T>() as u64)
        .expect("uniform structs are non-empty")
}

// ── fullscreen quad ───────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(crate) struct QuadVertex {
    pub pos: [f32; 2], // NDC
}

impl QuadVertex {
    const ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];

    pub(crate) fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

const QUAD_VERTICES: [QuadVertex; 4] = [
    QuadVertex { pos: [-1.0, -1.0] },
    QuadVertex { pos: [1.0, -1.0] },
    QuadVertex { pos: [1.0, 1.0] },
    QuadVertex { pos: [-1.0, 1.0] },
];

const QUAD_INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];

/// A quad covering the whole viewport, used by the edge, composite and
/// debug-blit passes to run their fragment shader once per pixel.
pub(crate) struct FullscreenQuad {
    vbo: wgpu::Buffer,
    ibo: wgpu::Buffer,
}

impl FullscreenQuad {
    pub(crate) fn new(device: &wgpu::Device) -> Self {
        let vbo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("fullscreen quad vbo"),
            contents: bytemuck::cast_slice(&QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let ibo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("fullscreen quad ibo"),
            contents: bytemuck::cast_slice(&QUAD_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self { vbo, ibo }
    }

    pub(crate) fn draw(&self, rpass: &mut wgpu::RenderPass<'_>) {
        rpass.set_vertex_buffer(0, self.vbo.slice(..));
        rpass.set_index_buffer(self.ibo.slice(..), wgpu::IndexFormat::Uint16);
        rpass.draw_indexed(0..QUAD_INDICES.len() as u32, 0, 0..1);
    }
}
