//! The viewer application: orbit camera, key handling and the per-frame
//! drive of the deferred renderer.

use anyhow::Result;
use glam::{Mat4, Vec3};
use winit::dpi::PhysicalSize;
use winit::keyboard::KeyCode;

use toonview_engine::device::{Gpu, SurfaceErrorAction};
use toonview_engine::render::{FrameParams, ModelMesh, Renderer};
use toonview_engine::wavefront::Model;
use toonview_engine::window::{App, AppControl, FrameCtx};

/// Initial eye distance, in bounding radii.
const INIT_EYE_DISTANCE: f32 = 5.0;

/// Orbit speed in radians per second.
const SPIN_RATE: f32 = 0.3;

pub struct ViewerApp {
    model: Model,
    gpu_state: Option<GpuState>,

    theta: f32,
    paused: bool,
    /// Eye position relative to the model centre.
    eye: Vec3,
    fovy: f32,
}

struct GpuState {
    renderer: Renderer,
    mesh: ModelMesh,
}

impl ViewerApp {
    pub fn new(model: Model) -> Self {
        let radius = model.bounds.radius.max(1e-3);
        Self {
            model,
            gpu_state: None,
            theta: 0.0,
            paused: false,
            eye: Vec3::new(0.0, 0.0, INIT_EYE_DISTANCE * radius),
            fovy: 2.0 * 1.0f32.atan2(INIT_EYE_DISTANCE),
        }
    }

    fn frame_params(&self, size: PhysicalSize<u32>) -> FrameParams {
        let radius = self.model.bounds.radius.max(1e-3);

        // Spin about a tilted axis with the model centred at the origin.
        let m = Mat4::from_axis_angle(Vec3::new(0.5, 2.0, 0.0).normalize(), self.theta)
            * Mat4::from_translation(-self.model.bounds.centre);
        let mv = Mat4::from_translation(-self.eye) * m;

        // Near/far hug the bounding sphere.
        let distance = self.eye.length();
        let near = (distance - radius).max(radius * 1e-2);
        let far = distance + radius;
        let aspect = size.width.max(1) as f32 / size.height.max(1) as f32;
        let proj = Mat4::perspective_rh(self.fovy, aspect, near, far);

        // Above, to the right and behind the eye; the view direction is -Z.
        let light_dir = Vec3::new(1.0, 1.0, 0.2).normalize();

        FrameParams {
            m,
            mv,
            mvp: proj * mv,
            light_dir,
        }
    }
}

impl App for ViewerApp {
    fn on_gpu_ready(&mut self, gpu: &Gpu) -> Result<()> {
        let size = gpu.size();
        let renderer = Renderer::new(
            gpu.device(),
            gpu.surface_format(),
            size.width,
            size.height,
            self.model.layout,
        )?;
        let mesh = ModelMesh::new(
            gpu.device(),
            gpu.queue(),
            &self.model,
            renderer.material_layout(),
        );
        self.gpu_state = Some(GpuState { renderer, mesh });
        Ok(())
    }

    fn on_resize(&mut self, gpu: &Gpu, new_size: PhysicalSize<u32>) -> Result<()> {
        if let Some(state) = &mut self.gpu_state {
            if new_size.width > 0 && new_size.height > 0 {
                state
                    .renderer
                    .resize(gpu.device(), new_size.width, new_size.height)?;
            }
        }
        Ok(())
    }

    fn on_key(&mut self, key: KeyCode) -> AppControl {
        match key {
            KeyCode::Escape => return AppControl::Exit,
            KeyCode::KeyD => {
                if let Some(state) = &mut self.gpu_state {
                    state.renderer.cycle_debug();
                }
            }
            KeyCode::KeyP => self.paused = !self.paused,
            KeyCode::ArrowUp => self.eye /= 1.1,
            KeyCode::ArrowDown => self.eye *= 1.1,
            KeyCode::ArrowLeft => self.fovy = (self.fovy * 1.1).min(3.0),
            KeyCode::ArrowRight => self.fovy /= 1.1,
            _ => {}
        }
        AppControl::Continue
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_>) -> AppControl {
        if self.gpu_state.is_none() {
            return AppControl::Continue;
        }

        if !self.paused {
            self.theta += SPIN_RATE * ctx.time.dt;
        }

        let mut frame = match ctx.gpu.begin_frame() {
            Ok(frame) => frame,
            Err(err) => {
                return match ctx.gpu.handle_surface_error(err) {
                    SurfaceErrorAction::Fatal => AppControl::Exit,
                    _ => AppControl::Continue,
                };
            }
        };

        let params = self.frame_params(ctx.gpu.size());
        let Some(state) = &mut self.gpu_state else {
            return AppControl::Continue;
        };
        state.renderer.render(
            ctx.gpu.device(),
            ctx.gpu.queue(),
            &mut frame.encoder,
            &frame.view,
            &state.mesh,
            &params,
        );
        ctx.gpu.submit(frame);

        ctx.gpu
            .window()
            .set_title(&format!("toon shading - {}", state.renderer.status_line()));

        AppControl::Continue
    }
}
