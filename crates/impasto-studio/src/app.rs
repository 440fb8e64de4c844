use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use impasto_engine::coords::Vec2;
use impasto_engine::device::{Gpu, SurfaceErrorAction};

use crate::canvas::Canvas;
use crate::config::StudioConfig;

/// Runs the studio until the window closes.
pub fn run(config: StudioConfig) -> Result<()> {
    let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
    let mut state = Studio::new(config);

    event_loop
        .run_app(&mut state)
        .context("winit event loop terminated with error")?;

    state.failure.map_or(Ok(()), Err)
}

#[self_referencing]
struct WindowEntry {
    window: Window,

    #[borrows(window)]
    #[covariant]
    gpu: Gpu<'this>,
}

struct Studio {
    config: StudioConfig,
    entry: Option<WindowEntry>,
    canvas: Option<Canvas>,
    cursor: Option<Vec2>,
    failure: Option<anyhow::Error>,
}

impl Studio {
    fn new(config: StudioConfig) -> Self {
        Self {
            config,
            entry: None,
            canvas: None,
            cursor: None,
            failure: None,
        }
    }

    fn open_window(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let gpu_init = self.config.gpu.clone();
        let entry = WindowEntryTryBuilder {
            window,
            gpu_builder: |w| pollster::block_on(Gpu::new(w, gpu_init)),
        }
        .try_build()?;

        let canvas = entry.with_gpu(|gpu| Canvas::new(gpu, &self.config))?;
        entry.with_window(|w| w.request_redraw());

        self.canvas = Some(canvas);
        self.entry = Some(entry);
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{err:#}");
        self.failure = Some(err);
        self.shutdown(event_loop);
    }

    /// Canvas goes first: its targets belong to the window's device.
    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        self.canvas = None;
        self.entry = None;
        event_loop.exit();
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let (Some(entry), Some(canvas)) = (self.entry.as_mut(), self.canvas.as_mut()) else {
            return;
        };

        let result = entry.with_gpu_mut(|gpu| -> Result<()> {
            let mut frame = match gpu.begin_frame() {
                Ok(frame) => frame,
                Err(e) => {
                    return match gpu.handle_surface_error(e) {
                        SurfaceErrorAction::Fatal => {
                            Err(anyhow::anyhow!("surface lost: out of memory"))
                        }
                        SurfaceErrorAction::Reconfigured | SurfaceErrorAction::SkipFrame => Ok(()),
                    };
                }
            };
            canvas.render(&mut frame, gpu.surface_format())?;
            gpu.submit(frame);
            Ok(())
        });

        if let Err(e) = result {
            self.fail(event_loop, e);
        }
    }

    fn resize(&mut self, width: u32, height: u32) {
        let Some(entry) = self.entry.as_mut() else { return };
        let configured = entry.with_gpu_mut(|gpu| gpu.resize(PhysicalSize::new(width, height)));
        if configured {
            if let Some(canvas) = self.canvas.as_mut() {
                canvas.resize(width, height);
            }
        }
        entry.with_window(|w| w.request_redraw());
    }

    fn on_key(&mut self, event_loop: &ActiveEventLoop, event: &KeyEvent) {
        if event.state != ElementState::Pressed || event.repeat {
            return;
        }
        match event.physical_key {
            PhysicalKey::Code(KeyCode::Escape) => self.shutdown(event_loop),
            PhysicalKey::Code(KeyCode::KeyC) => {
                if let Some(canvas) = self.canvas.as_mut() {
                    canvas.clear();
                }
            }
            _ => {}
        }
    }
}

impl ApplicationHandler for Studio {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.entry.is_some() {
            return;
        }
        if let Err(e) = self.open_window(event_loop) {
            self.fail(event_loop, e.context("failed to open studio window"));
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::Wait);

        // Fading needs a frame every vsync; otherwise redraw on input only.
        if let (Some(entry), Some(canvas)) = (self.entry.as_ref(), self.canvas.as_ref()) {
            if canvas.is_dirty() {
                entry.with_window(|w| w.request_redraw());
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => self.shutdown(event_loop),

            WindowEvent::KeyboardInput { event, .. } => self.on_key(event_loop, &event),

            WindowEvent::CursorMoved { position, .. } => {
                let at = to_vec2(position);
                self.cursor = Some(at);
                if let Some(canvas) = self.canvas.as_mut() {
                    canvas.pointer_moved(at);
                }
            }

            WindowEvent::CursorLeft { .. } => {
                self.cursor = None;
                if let Some(canvas) = self.canvas.as_mut() {
                    canvas.pointer_up();
                }
            }

            WindowEvent::MouseInput { state, button: MouseButton::Left, .. } => {
                let Some(canvas) = self.canvas.as_mut() else { return };
                match (state, self.cursor) {
                    (ElementState::Pressed, Some(at)) => canvas.pointer_down(at),
                    (ElementState::Released, _) => canvas.pointer_up(),
                    _ => {}
                }
            }

            WindowEvent::Resized(new_size) => self.resize(new_size.width, new_size.height),

            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(size) = self.entry.as_ref().map(|e| e.with_window(|w| w.inner_size())) {
                    self.resize(size.width, size.height);
                }
            }

            WindowEvent::RedrawRequested => self.redraw(event_loop),

            _ => {}
        }
    }
}

/// Stamp positions are target pixels, which match the surface's physical pixels.
fn to_vec2(p: PhysicalPosition<f64>) -> Vec2 {
    Vec2::new(p.x as f32, p.y as f32)
}
