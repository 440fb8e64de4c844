/// Extent of the paint target in pixels.
///
/// Renderers treat this as the coordinate basis for converting stamp
/// positions to NDC in shaders.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    #[inline]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn from_extent((width, height): (u32, u32)) -> Self {
        Self::new(width as f32, height as f32)
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self.width > 0.0 && self.height > 0.0 && self.width.is_finite() && self.height.is_finite()
    }

    /// Maps a pixel position to NDC (+Y up).
    #[inline]
    pub fn to_ndc(self, x: f32, y: f32) -> (f32, f32) {
        let w = self.width.max(1.0);
        let h = self.height.max(1.0);
        (x / w * 2.0 - 1.0, 1.0 - y / h * 2.0)
    }
}
