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
            title: "Sorcery".to_string(),
            width: 960,
            height: 600,
            resizable: false,
        }
    }
}

impl PlatformConfig {
    /// Window sized to a base resolution multiplied by an integer scale factor.
    pub fn scaled(
        title: &str,
        base_width: u32,
        base_height: u32,
        scale: u32,
    ) -> Result<Self, String> {
        let width = base_width.checked_mul(scale);
        let height = base_height.checked_mul(scale);
        let (Some(width), Some(height)) = (width, height) else {
            return Err(format!(
                "Window size {base_width}x{base_height} scaled by {scale} overflows"
            ));
        };
        Ok(Self {
            title: title.to_string(),
            width,
            height,
            resizable: false,
        })
    }
}

pub fn create_window(
    event_loop: &ActiveEventLoop,
    config: &PlatformConfig,
) -> Result<Arc<Window>, String> {
    // Physical size: the scaled framebuffer must map 1:1 onto base pixels.
    let attrs = WindowAttributes::default()
        .with_title(&config.title)
        .with_inner_size(winit::dpi::PhysicalSize::new(config.width, config.height))
        .with_resizable(config.resizable);

    let window = event_loop
        .create_window(attrs)
        .map_err(|e| format!("Failed to create window: {e}"))?;
    log::debug!("Window '{}' created", config.title);
    Ok(Arc::new(window))
}
