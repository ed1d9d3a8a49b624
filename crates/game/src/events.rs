//! Window event handling for ShowState.

use renderer::RenderError;
use std::time::Duration;
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// Frame pacing when no swapchain (and so no vsync) throttles redraws.
const NO_VISUALS_FRAME: Duration = Duration::from_millis(16);

impl crate::ShowState {
    /// Handle a window event. Returns true if the app should exit.
    pub(crate) fn handle_window_event(&mut self, event: WindowEvent) -> bool {
        match event {
            WindowEvent::CloseRequested => {
                self.shutdown();
                true
            }
            WindowEvent::Resized(size) => {
                // applied at the start of the next frame
                self.viewport.request(size.width, size.height);
                false
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                self.viewport.set_scale_factor(scale_factor);
                false
            }
            WindowEvent::Occluded(hidden) => {
                if hidden {
                    self.show.suspend_audio();
                }
                false
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if !event.state.is_pressed() || event.repeat {
                    return false;
                }
                if let PhysicalKey::Code(key) = event.physical_key {
                    match key {
                        KeyCode::Space | KeyCode::Enter | KeyCode::NumpadEnter => self.launch(),
                        KeyCode::F5 => self.reload_config(),
                        KeyCode::KeyM => self.toggle_sound(),
                        KeyCode::Escape => {
                            self.shutdown();
                            return true;
                        }
                        _ => {}
                    }
                }
                false
            }
            WindowEvent::MouseInput { state: ElementState::Pressed, button: MouseButton::Left, .. } => {
                self.launch();
                false
            }
            WindowEvent::RedrawRequested => {
                if self.token.is_cancelled() {
                    return true;
                }
                self.update();
                match self.render() {
                    Ok(()) => {}
                    Err(RenderError::SurfaceLost) => log::debug!("Surface reconfigured, frame skipped"),
                    Err(RenderError::OutOfMemory) => {
                        log::error!("GPU out of memory, exiting");
                        self.shutdown();
                        return true;
                    }
                    Err(e) => log::warn!("Frame dropped: {}", e),
                }
                if !self.has_visuals() {
                    std::thread::sleep(NO_VISUALS_FRAME);
                }
                self.window.request_redraw();
                false
            }
            _ => false,
        }
    }
}
