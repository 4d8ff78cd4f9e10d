use std::sync::Arc;

use anyhow::{Context, Result};
use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalSize};
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use crate::device::{Gpu, GpuInit};
use crate::time::{FrameClock, FrameTime};

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "toonview".to_string(),
            initial_size: LogicalSize::new(600.0, 450.0),
        }
    }
}

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Per-frame context passed to [`App::on_frame`].
pub struct FrameCtx<'a> {
    pub gpu: &'a mut Gpu,
    pub time: FrameTime,
}

/// Application contract implemented by the viewer.
///
/// The runtime drives a single window with continuous redraw. GPU-dependent
/// resources are created in `on_gpu_ready`, which runs once after the device
/// exists and before the first frame.
pub trait App {
    /// Called once after the window and GPU context are created.
    fn on_gpu_ready(&mut self, gpu: &Gpu) -> Result<()>;

    /// Called when the drawable size changes (surface already reconfigured).
    fn on_resize(&mut self, gpu: &Gpu, new_size: PhysicalSize<u32>) -> Result<()> {
        let _ = (gpu, new_size);
        Ok(())
    }

    /// Called on a non-repeat key press.
    fn on_key(&mut self, key: KeyCode) -> AppControl {
        let _ = key;
        AppControl::Continue
    }

    /// Called once per rendered frame.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_>) -> AppControl;
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    pub fn run<A>(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Result<()>
    where
        A: App + 'static,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = RuntimeState {
            config,
            gpu_init,
            app,
            gpu: None,
            clock: FrameClock::new(),
            exit_requested: false,
        };

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        Ok(())
    }
}

struct RuntimeState<A> {
    config: RuntimeConfig,
    gpu_init: GpuInit,
    app: A,

    gpu: Option<Gpu>,
    clock: FrameClock,
    exit_requested: bool,
}

impl<A: App> RuntimeState<A> {
    fn request_exit(&mut self, event_loop: &ActiveEventLoop) {
        self.exit_requested = true;
        event_loop.exit();
    }

    fn init_window(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);

        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .context("failed to create window")?,
        );

        let gpu = pollster::block_on(Gpu::new(window, self.gpu_init.clone()))?;
        self.app.on_gpu_ready(&gpu)?;

        gpu.window().request_redraw();
        self.gpu = Some(gpu);
        self.clock.reset();
        Ok(())
    }
}

impl<A: App> ApplicationHandler for RuntimeState<A> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }

        if let Err(e) = self.init_window(event_loop) {
            log::error!("failed to initialize window/GPU: {e:#}");
            self.request_exit(event_loop);
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        // Continuous redraw: the viewer animates every frame.
        event_loop.set_control_flow(ControlFlow::Wait);
        if let Some(gpu) = &self.gpu {
            gpu.window().request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                self.request_exit(event_loop);
            }

            WindowEvent::Resized(new_size) => {
                gpu.resize(new_size);
                if let Err(e) = self.app.on_resize(gpu, new_size) {
                    log::error!("resize failed: {e:#}");
                    self.request_exit(event_loop);
                }
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Pressed && !event.repeat {
                    if let PhysicalKey::Code(code) = event.physical_key {
                        if self.app.on_key(code) == AppControl::Exit {
                            self.request_exit(event_loop);
                        }
                    }
                }
            }

            WindowEvent::RedrawRequested => {
                let time = self.clock.tick();
                let mut ctx = FrameCtx {
                    gpu: &mut *gpu,
                    time,
                };
                if self.app.on_frame(&mut ctx) == AppControl::Exit {
                    self.request_exit(event_loop);
                    return;
                }
                gpu.window().request_redraw();
            }

            _ => {}
        }
    }
}
