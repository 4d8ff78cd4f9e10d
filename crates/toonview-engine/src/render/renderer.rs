//! Pass orchestration and the debug-view cycle.

use anyhow::Result;
use glam::{Mat4, Vec3};

use crate::wavefront::VertexLayout;

use super::blit::BlitPass;
use super::common::{FrameUniforms, FullscreenQuad};
use super::composite_pass::CompositePass;
use super::edge_pass::EdgePass;
use super::gbuffer::{GBuffer, TARGET_COUNT};
use super::geometry_pass::GeometryPass;
use super::mesh::ModelMesh;

/// Where a frame's output comes from, cycled by a key press.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum DebugView {
    /// Full three-pass output.
    #[default]
    Final,
    /// Raw G-Buffer contents after the geometry pass.
    GeometryBuffers,
    /// Raw G-Buffer contents after the edge pass.
    EdgeBuffer,
}

impl DebugView {
    pub fn cycled(self) -> Self {
        match self {
            DebugView::Final => DebugView::GeometryBuffers,
            DebugView::GeometryBuffers => DebugView::EdgeBuffer,
            DebugView::EdgeBuffer => DebugView::Final,
        }
    }
}

/// Which passes a frame runs. The geometry pass always runs; a frame that
/// stops early ends in a quadrant blit instead of the composite.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) struct PassPlan {
    pub run_edge: bool,
    pub run_composite: bool,
}

impl PassPlan {
    pub(crate) fn for_view(view: DebugView) -> Self {
        match view {
            DebugView::Final => Self {
                run_edge: true,
                run_composite: true,
            },
            DebugView::GeometryBuffers => Self {
                run_edge: false,
                run_composite: false,
            },
            DebugView::EdgeBuffer => Self {
                run_edge: true,
                run_composite: false,
            },
        }
    }
}

/// Per-frame inputs to [`Renderer::render`].
#[derive(Debug, Copy, Clone)]
pub struct FrameParams {
    /// Model transform (object to world).
    pub m: Mat4,
    /// Model-view transform (object to view).
    pub mv: Mat4,
    /// Model-view-projection transform (object to clip).
    pub mvp: Mat4,
    /// Light direction in view space.
    pub light_dir: Vec3,
}

/// Drives the three deferred passes over the G-Buffer.
///
/// The passes are recorded into the caller's command encoder in program
/// order and submitted as one unit, so pass N+1 always consumes the
/// completed output of pass N.
pub struct Renderer {
    gbuffer: GBuffer,
    geometry: GeometryPass,
    edge: EdgePass,
    composite: CompositePass,
    blit: BlitPass,
    quad: FullscreenQuad,
    debug: DebugView,
}

impl Renderer {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        layout: VertexLayout,
    ) -> Result<Self> {
        Ok(Self {
            gbuffer: GBuffer::new(device, width, height, TARGET_COUNT)?,
            geometry: GeometryPass::new(device, layout),
            edge: EdgePass::new(device),
            composite: CompositePass::new(device, surface_format),
            blit: BlitPass::new(device, surface_format),
            quad: FullscreenQuad::new(device),
            debug: DebugView::default(),
        })
    }

    /// Bind group layout a [`ModelMesh`] needs for its materials.
    pub fn material_layout(&self) -> &wgpu::BindGroupLayout {
        self.geometry.material_layout()
    }

    /// Replaces the G-Buffer wholesale for the new dimensions.
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) -> Result<()> {
        self.gbuffer = GBuffer::new(device, width, height, TARGET_COUNT)?;
        self.edge.invalidate();
        self.composite.invalidate();
        self.blit.invalidate();
        Ok(())
    }

    /// Advances the debug view: final → after pass 1 → after pass 2 → final.
    pub fn cycle_debug(&mut self) {
        self.debug = self.debug.cycled();
    }

    pub fn debug_view(&self) -> DebugView {
        self.debug
    }

    /// Human-readable description of the current output, for the title bar.
    pub fn status_line(&self) -> String {
        match self.debug {
            DebugView::Final => "program output".to_string(),
            DebugView::GeometryBuffers => "after pass 1".to_string(),
            DebugView::EdgeBuffer => "after pass 2".to_string(),
        }
    }

    /// Records one frame into `encoder`.
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        surface_view: &wgpu::TextureView,
        mesh: &ModelMesh,
        params: &FrameParams,
    ) {
        let plan = PassPlan::for_view(self.debug);

        // Pass 1: colour, normal and depth into the G-Buffer.
        self.geometry.prepare(
            queue,
            &FrameUniforms {
                m: params.m.to_cols_array_2d(),
                mv: params.mv.to_cols_array_2d(),
                mvp: params.mvp.to_cols_array_2d(),
            },
        );
        self.geometry.record(encoder, &self.gbuffer, mesh);

        if !plan.run_edge {
            self.blit.prepare(device, &self.gbuffer);
            self.blit
                .record(encoder, surface_view, &self.gbuffer, &self.quad);
            return;
        }

        // Pass 2: depth Laplacian into the edge target.
        self.edge.prepare(device, queue, &self.gbuffer);
        self.edge.record(encoder, &self.gbuffer, &self.quad);

        if !plan.run_composite {
            self.blit.prepare(device, &self.gbuffer);
            self.blit
                .record(encoder, surface_view, &self.gbuffer, &self.quad);
            return;
        }

        // Pass 3: shaded, outlined image onto the surface.
        self.composite
            .prepare(device, queue, &self.gbuffer, params.light_dir);
        self.composite.record(encoder, surface_view, &self.quad);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_cycle_returns_after_three_steps() {
        let start = DebugView::default();
        let cycled = start.cycled().cycled().cycled();
        assert_eq!(cycled, start);
    }

    #[test]
    fn geometry_debug_view_skips_later_passes() {
        let plan = PassPlan::for_view(DebugView::GeometryBuffers);
        assert!(!plan.run_edge);
        assert!(!plan.run_composite);
    }

    #[test]
    fn edge_debug_view_skips_only_the_composite() {
        let plan = PassPlan::for_view(DebugView::EdgeBuffer);
        assert!(plan.run_edge);
        assert!(!plan.run_composite);
    }

    #[test]
    fn final_view_runs_everything() {
        let plan = PassPlan::for_view(DebugView::Final);
        assert!(plan.run_edge);
        assert!(plan.run_composite);
    }
}
