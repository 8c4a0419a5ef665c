//! Platform abstraction for Photon.
//!
//! Provides window configuration and creation via winit. The GPU crate only
//! ever sees the window through its raw handles.

use thiserror::Error;
use winit::dpi::PhysicalSize;
use winit::event_loop::ActiveEventLoop;
use winit::window::Window;

#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("Window creation failed: {0}")]
    WindowCreation(String),
    #[error("Event loop error: {0}")]
    EventLoop(String),
}

pub type Result<T> = std::result::Result<T, PlatformError>;

/// Platform configuration.
#[derive(Debug, Clone)]
pub struct PlatformConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub resizable: bool,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            title: "Photon".to_string(),
            width: 800,
            height: 600,
            resizable: false,
        }
    }
}

/// Create a window from a platform configuration.
pub fn create_window(event_loop: &ActiveEventLoop, config: &PlatformConfig) -> Result<Window> {
    let attributes = Window::default_attributes()
        .with_title(&config.title)
        .with_inner_size(PhysicalSize::new(config.width, config.height))
        .with_resizable(config.resizable);

    event_loop
        .create_window(attributes)
        .map_err(|e| PlatformError::WindowCreation(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_requested_window() {
        let config = PlatformConfig::default();
        assert_eq!((config.width, config.height), (800, 600));
        assert!(!config.resizable);
    }
}
