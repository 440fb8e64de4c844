use std::fmt;

use crate::gfx::{Attachments, ColorFormat, DepthFormat, GraphicsContext, TextureDesc, TextureKind};

use super::{Resource, TargetError};

/// Which member of the ping-pong pair a target is.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Slot {
    A,
    B,
}

impl Slot {
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Slot::A => 0,
            Slot::B => 1,
        }
    }

    #[inline]
    pub const fn other(self) -> Slot {
        match self {
            Slot::A => Slot::B,
            Slot::B => Slot::A,
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Slot::A => "A",
            Slot::B => "B",
        })
    }
}

/// Allocation parameters for the off-screen targets.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetConfig {
    /// Extent in physical pixels.
    pub width: u32,
    pub height: u32,

    /// Color storage. Must be renderable and sampleable on the device.
    pub format: ColorFormat,

    /// Optional depth attachment, sized like the color attachment.
    pub depth: Option<DepthFormat>,
}

impl TargetConfig {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            format: ColorFormat::Rgba8Unorm,
            depth: None,
        }
    }
}

/// An off-screen render target: framebuffer plus its backing texture(s).
///
/// A `RenderTarget` only exists once its framebuffer reported complete, so any
/// value of this type may be drawn into or sampled from.
pub struct RenderTarget<C: GraphicsContext> {
    slot: Slot,
    width: u32,
    height: u32,
    framebuffer: C::Framebuffer,
    color: C::Texture,
    depth: Option<C::Texture>,
}

impl<C: GraphicsContext> RenderTarget<C> {
    /// Allocates the attachments, binds them and validates completeness.
    ///
    /// On any failure everything allocated so far is released before the
    /// error is returned.
    pub fn create(ctx: &C, slot: Slot, config: &TargetConfig) -> Result<Self, TargetError> {
        let label = format!("paint target {slot}");

        let Some(color) = ctx.create_texture(&TextureDesc {
            label: &label,
            width: config.width,
            height: config.height,
            kind: TextureKind::Color(config.format),
        }) else {
            log::error!("{label}: color texture allocation returned no handle");
            return Err(TargetError::ResourceCreation(Resource::ColorTexture));
        };

        let depth = match config.depth {
            None => None,
            Some(format) => {
                let desc = TextureDesc {
                    label: &label,
                    width: config.width,
                    height: config.height,
                    kind: TextureKind::Depth(format),
                };
                match ctx.create_texture(&desc) {
                    Some(t) => Some(t),
                    None => {
                        log::error!("{label}: depth texture allocation returned no handle");
                        ctx.release_texture(color);
                        return Err(TargetError::ResourceCreation(Resource::DepthTexture));
                    }
                }
            }
        };

        let framebuffer = ctx.create_framebuffer(
            &label,
            Attachments {
                color: Some(&color),
                depth: depth.as_ref(),
            },
        );
        let Some(framebuffer) = framebuffer else {
            log::error!("{label}: framebuffer allocation returned no handle");
            ctx.release_texture(color);
            if let Some(d) = depth {
                ctx.release_texture(d);
            }
            return Err(TargetError::ResourceCreation(Resource::Framebuffer));
        };

        let status = ctx.check_framebuffer_status(&framebuffer);
        if !status.is_complete() {
            log::error!("{label}: incomplete framebuffer ({status})");
            ctx.release_framebuffer(framebuffer);
            ctx.release_texture(color);
            if let Some(d) = depth {
                ctx.release_texture(d);
            }
            return Err(TargetError::incomplete(&label, status));
        }

        log::debug!("{label}: {}x{} {:?} ready", config.width, config.height, config.format);

        Ok(Self {
            slot,
            width: config.width,
            height: config.height,
            framebuffer,
            color,
            depth,
        })
    }

    #[inline]
    pub fn slot(&self) -> Slot {
        self.slot
    }

    #[inline]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// The framebuffer to bind as draw destination.
    #[inline]
    pub fn framebuffer(&self) -> &C::Framebuffer {
        &self.framebuffer
    }

    /// The color texture backing this target.
    #[inline]
    pub fn texture(&self) -> &C::Texture {
        &self.color
    }

    #[inline]
    pub fn depth_texture(&self) -> Option<&C::Texture> {
        self.depth.as_ref()
    }

    /// Releases the framebuffer first, then its attachments.
    pub fn release(self, ctx: &C) {
        ctx.release_framebuffer(self.framebuffer);
        ctx.release_texture(self.color);
        if let Some(d) = self.depth {
            ctx.release_texture(d);
        }
        log::debug!("paint target {} released", self.slot);
    }
}

impl<C: GraphicsContext> fmt::Debug for RenderTarget<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderTarget")
            .field("slot", &self.slot)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("depth", &self.depth.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::{Allocation, RecordingContext, TargetStatus};

    #[test]
    fn create_binds_color_and_depth() {
        let ctx = RecordingContext::new();
        let config = TargetConfig {
            depth: Some(DepthFormat::Depth24Plus),
            ..TargetConfig::new(64, 32)
        };
        let target = RenderTarget::create(&ctx, Slot::A, &config).unwrap();
        assert_eq!(target.size(), (64, 32));
        assert!(target.depth_texture().is_some());
        assert_eq!(ctx.texture_size(target.texture()), Some((64, 32)));
        assert_eq!(ctx.live(Allocation::Texture), 2);
        assert_eq!(ctx.live(Allocation::Framebuffer), 1);

        target.release(&ctx);
        assert_eq!(ctx.live_total(), 0);
    }

    #[test]
    fn incomplete_target_is_released_and_reported() {
        let ctx = RecordingContext::new();
        let config = TargetConfig {
            format: ColorFormat::Rgb9e5Ufloat,
            ..TargetConfig::new(16, 16)
        };
        match RenderTarget::create(&ctx, Slot::B, &config) {
            Err(TargetError::TargetIncomplete { label, status, description }) => {
                assert_eq!(label, "paint target B");
                assert_eq!(status, TargetStatus::UNSUPPORTED);
                assert_eq!(description, "FRAMEBUFFER_UNSUPPORTED");
            }
            other => panic!("expected TargetIncomplete, got {other:?}"),
        }
        assert_eq!(ctx.live_total(), 0);
    }

    #[test]
    fn zero_extent_reports_dimensions() {
        let ctx = RecordingContext::new();
        let err = RenderTarget::create(&ctx, Slot::A, &TargetConfig::new(0, 16)).unwrap_err();
        assert!(matches!(
            err,
            TargetError::TargetIncomplete { status: TargetStatus::INCOMPLETE_DIMENSIONS, .. }
        ));
    }

    #[test]
    fn each_failed_allocation_rolls_back() {
        let config = TargetConfig {
            depth: Some(DepthFormat::Depth32Float),
            ..TargetConfig::new(8, 8)
        };
        let cases = [
            (Allocation::Texture, 0, Resource::ColorTexture),
            (Allocation::Texture, 1, Resource::DepthTexture),
            (Allocation::Framebuffer, 0, Resource::Framebuffer),
        ];
        for (kind, n, resource) in cases {
            let ctx = RecordingContext::new();
            ctx.fail_nth(kind, n);
            let err = RenderTarget::create(&ctx, Slot::A, &config).unwrap_err();
            assert_eq!(err, TargetError::ResourceCreation(resource));
            assert_eq!(ctx.live_total(), 0, "leak after {resource} failure");
        }
    }

    #[test]
    fn slot_other_flips() {
        assert_eq!(Slot::A.other(), Slot::B);
        assert_eq!(Slot::B.other().index(), 0);
    }
}
