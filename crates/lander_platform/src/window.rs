use std::sync::Arc;
use winit::event_loop::ActiveEventLoop;
use winit::window::{Window, WindowAttributes};

pub struct PlatformConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub resizable: bool,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            title: "George Lands in Minecraft".to_string(),
            width: 640,
            height: 480,
            resizable: false,
        }
    }
}

/// Create the game window. Failure to get a window is unrecoverable.
pub fn create_window(event_loop: &ActiveEventLoop, config: &PlatformConfig) -> Arc<Window> {
    let attrs = WindowAttributes::default()
        .with_title(&config.title)
        .with_inner_size(winit::dpi::LogicalSize::new(config.width, config.height))
        .with_resizable(config.resizable);

    let window = event_loop
        .create_window(attrs)
        .unwrap_or_else(|err| panic!("Failed to create window '{}': {err}", config.title));
    log::debug!(
        "Window '{}' created ({}x{}, resizable: {})",
        config.title,
        config.width,
        config.height,
        config.resizable
    );
    Arc::new(window)
}
