//! Window management
//!
//! Cross-platform window creation via winit. The logical size given here is
//! also the size of the orthographic projection; the core never resizes.

use winit::{
    dpi::LogicalSize,
    error::EventLoopError,
    event_loop::EventLoop,
    window::{Fullscreen, Window, WindowAttributes},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub fullscreen: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Blowback".to_string(),
            width: 1280,
            height: 720,
            fullscreen: false,
        }
    }
}

impl WindowConfig {
    pub fn logical_size(&self) -> (f32, f32) {
        (self.width as f32, self.height as f32)
    }
}

/// Create window attributes from config
pub fn window_attributes(config: &WindowConfig) -> WindowAttributes {
    Window::default_attributes()
        .with_title(config.title.clone())
        .with_inner_size(LogicalSize::new(config.width, config.height))
        .with_fullscreen(fullscreen_mode(config.fullscreen))
}

/// Borderless on the current monitor, or windowed.
pub fn fullscreen_mode(enabled: bool) -> Option<Fullscreen> {
    enabled.then_some(Fullscreen::Borderless(None))
}

/// Mode to switch to when fullscreen is toggled from `current`.
pub fn toggled_fullscreen(current: Option<&Fullscreen>) -> Option<Fullscreen> {
    fullscreen_mode(current.is_none())
}

/// Event loop for a pumped (non-blocking) application.
///
/// Windows are created later, inside the handler's `resumed` callback.
pub fn create_event_loop() -> Result<EventLoop<()>, EventLoopError> {
    EventLoop::new()
}
