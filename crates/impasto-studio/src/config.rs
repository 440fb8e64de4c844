use winit::dpi::LogicalSize;

use impasto_engine::device::GpuInit;
use impasto_engine::gfx::ColorFormat;
use impasto_engine::paint::Color;
use impasto_engine::render::CompositorConfig;

/// Studio configuration.
#[derive(Debug, Clone)]
pub struct StudioConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
    pub gpu: GpuInit,
    /// Paint target format. Targets always match the window's physical size.
    pub target_format: ColorFormat,
    pub compositor: CompositorConfig,
    pub brush: BrushConfig,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            title: "impasto".to_string(),
            initial_size: LogicalSize::new(1280.0, 720.0),
            gpu: GpuInit::default(),
            target_format: ColorFormat::Rgba16Float,
            compositor: CompositorConfig::default(),
            brush: BrushConfig::default(),
        }
    }
}

impl StudioConfig {
    /// Applies `IMPASTO_FADE` and `IMPASTO_RADIUS` overrides.
    ///
    /// Unparseable values are logged and ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(fade) = env_f32("IMPASTO_FADE") {
            config.compositor.fade = fade.clamp(0.0, 1.0);
        }
        if let Some(radius) = env_f32("IMPASTO_RADIUS") {
            config.brush.radius = radius.max(0.5);
        }
        config
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BrushConfig {
    pub radius: f32,
    pub hardness: f32,
    /// Stamp spacing as a fraction of the radius.
    pub spacing: f32,
    pub color: Color,
}

impl Default for BrushConfig {
    fn default() -> Self {
        Self {
            radius: 12.0,
            hardness: 0.4,
            spacing: 0.25,
            color: Color::from_srgb_u8(0xe0, 0x8a, 0x3c, 0xff).with_opacity(0.6),
        }
    }
}

fn env_f32(key: &str) -> Option<f32> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse::<f32>() {
        Ok(v) if v.is_finite() => Some(v),
        _ => {
            log::warn!("ignoring {key}={raw:?}: not a number");
            None
        }
    }
}
