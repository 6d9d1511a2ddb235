//! Windowed host: drives an [`Engine`] from the winit event loop.

use std::sync::Arc;
use std::time::{Duration, Instant};

use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::{Window, WindowId},
};

use crate::clock::Clock;
use crate::config::{EngineConfig, PropertyUpdate};
use crate::engine::{Engine, PlaybackState};
use crate::error::RunError;
use crate::gpu::GpuState;
use crate::input::{Command, Input};

const TITLE_REFRESH: Duration = Duration::from_millis(250);

/// Open a window and run the engine until it is closed.
pub fn run(config: EngineConfig) -> Result<(), RunError> {
    let engine = Engine::new(config)?;
    let event_loop = EventLoop::new()?;
    let mut app = App::new(engine);
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

struct App {
    engine: Engine,
    clock: Clock,
    input: Input,
    window: Option<Arc<Window>>,
    gpu_state: Option<GpuState>,
    title_updated: Instant,
    error: Option<RunError>,
}

impl App {
    fn new(engine: Engine) -> Self {
        Self {
            engine,
            clock: Clock::new(),
            input: Input::default(),
            window: None,
            gpu_state: None,
            title_updated: Instant::now(),
            error: None,
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<(), RunError> {
        let window_attrs = Window::default_attributes()
            .with_title("stardust")
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));

        let window = Arc::new(event_loop.create_window(window_attrs)?);
        let size = window.inner_size();
        self.input.set_window_size(size.width, size.height);
        self.gpu_state = Some(pollster::block_on(GpuState::new(window.clone()))?);
        self.window = Some(window);

        self.engine.start();
        self.clock.reanchor();
        self.request_redraw();
        Ok(())
    }

    fn request_redraw(&self) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn run_command(&mut self, command: Command, event_loop: &ActiveEventLoop) {
        match command {
            Command::TogglePause => {
                self.engine.toggle();
                if self.engine.state() == PlaybackState::Playing {
                    self.clock.resume();
                } else {
                    self.clock.pause();
                }
                // No redraw follows a pause
                self.update_title();
            }
            Command::Reset => {
                if let Err(e) = self.engine.reset() {
                    log::error!("Reset failed: {}", e);
                }
            }
            Command::SelectPreset(preset) => self.engine.set_motion_preset(preset),
            Command::NextPreset => self.engine.set_motion_preset(self.engine.preset().next()),
            Command::ToggleColorTransition => {
                let enabled = !self.engine.config().color_transition;
                self.apply(PropertyUpdate::new().color_transition(enabled));
            }
            Command::ToggleMouseInteraction => {
                let enabled = !self.engine.config().mouse_interaction;
                self.apply(PropertyUpdate::new().mouse_interaction(enabled));
            }
            Command::Quit => event_loop.exit(),
        }
        self.request_redraw();
    }

    fn apply(&mut self, update: PropertyUpdate) {
        if let Err(e) = self.engine.update_properties(&update) {
            log::error!("Property update failed: {}", e);
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let dt = self.clock.tick();
        self.engine.tick(dt);

        if let Some(gpu_state) = &mut self.gpu_state {
            gpu_state.camera.orbit(self.input.orbit_delta());
            gpu_state.camera.zoom(self.input.scroll_delta());

            match gpu_state.render(&self.engine) {
                Ok(()) => {}
                Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => gpu_state.reconfigure(),
                Err(wgpu::SurfaceError::OutOfMemory) => {
                    log::error!("GPU out of memory");
                    event_loop.exit();
                }
                Err(e) => log::warn!("Render error: {:?}", e),
            }
        }
        self.engine.clear_dirty();
        self.input.end_frame();

        if self.title_updated.elapsed() >= TITLE_REFRESH {
            self.update_title();
        }

        if self.engine.wants_frame() {
            self.request_redraw();
        }
    }

    fn update_title(&mut self) {
        self.title_updated = Instant::now();
        if let Some(window) = &self.window {
            window.set_title(&title_text(&self.engine, self.clock.fps()));
        }
    }
}

/// Window title: preset, count, elapsed time, FPS and a pause marker.
fn title_text(engine: &Engine, fps: f32) -> String {
    let paused = if engine.state() == PlaybackState::Paused {
        " | paused"
    } else {
        ""
    };
    format!(
        "stardust | {} | {} particles | t={:.1}s | {:.0} fps{}",
        engine.preset(),
        engine.particle_count(),
        engine.elapsed(),
        fps,
        paused,
    )
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.init(event_loop) {
            log::error!("{}", e);
            self.error = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        self.input.handle_event(&event);

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                self.input.set_window_size(physical_size.width, physical_size.height);
                if let Some(gpu_state) = &mut self.gpu_state {
                    gpu_state.resize(physical_size);
                }
                self.request_redraw();
            }
            WindowEvent::CursorMoved { .. } => {
                if let Some(ndc) = self.input.cursor_ndc() {
                    self.engine.set_pointer(ndc.x, ndc.y);
                }
                if self.input.orbit_delta() != glam::Vec2::ZERO {
                    self.request_redraw();
                }
            }
            WindowEvent::CursorLeft { .. } => {
                self.engine.clear_pointer();
            }
            WindowEvent::MouseWheel { .. } => {
                self.request_redraw();
            }
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
            }
            _ => {}
        }

        for command in self.input.drain_commands() {
            self.run_command(command, event_loop);
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.engine.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_marks_pause() {
        let mut engine = Engine::new(EngineConfig::default().with_particle_count(10).with_seed(1)).unwrap();
        engine.start();
        assert!(!title_text(&engine, 60.0).ends_with("paused"));

        engine.toggle();
        let title = title_text(&engine, 60.0);
        assert!(title.ends_with(" | paused"), "{}", title);
        assert!(title.contains("10 particles"));

        engine.toggle();
        assert!(!title_text(&engine, 60.0).contains("paused"));
    }
}
