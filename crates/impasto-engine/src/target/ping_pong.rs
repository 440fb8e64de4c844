use std::fmt;

use crate::gfx::GraphicsContext;

use super::{RenderTarget, Resource, Slot, TargetConfig, TargetError};

/// Two render targets alternating between read ("front") and write ("back").
///
/// Roles are an index into a fixed two-element array, so front and back can
/// never name the same target. `swap` is the only way roles change.
pub struct PingPong<C: GraphicsContext> {
    targets: [RenderTarget<C>; 2],
    front: usize,
    swaps: u64,
}

impl<C: GraphicsContext> PingPong<C> {
    /// Allocates and validates both targets. Slot A starts as front.
    ///
    /// If the second target fails, the first is released before returning.
    pub fn new(ctx: &C, config: &TargetConfig) -> Result<Self, TargetError> {
        let a = RenderTarget::create(ctx, Slot::A, config)?;
        let b = match RenderTarget::create(ctx, Slot::B, config) {
            Ok(b) => b,
            Err(e) => {
                a.release(ctx);
                return Err(e);
            }
        };

        if a.framebuffer() == b.framebuffer() || a.texture() == b.texture() {
            log::error!("ping-pong targets alias the same resource");
            a.release(ctx);
            b.release(ctx);
            return Err(TargetError::ResourceCreation(Resource::Framebuffer));
        }

        Ok(Self {
            targets: [a, b],
            front: 0,
            swaps: 0,
        })
    }

    /// Target holding the last accumulated state. Safe to sample.
    #[inline]
    pub fn front(&self) -> &RenderTarget<C> {
        &self.targets[self.front]
    }

    /// Destination of the next accumulation. Never sample it.
    #[inline]
    pub fn back(&self) -> &RenderTarget<C> {
        &self.targets[1 - self.front]
    }

    #[inline]
    pub fn front_slot(&self) -> Slot {
        self.front().slot()
    }

    /// Both targets, in slot order.
    #[inline]
    pub fn targets(&self) -> &[RenderTarget<C>; 2] {
        &self.targets
    }

    /// Number of swaps performed so far.
    #[inline]
    pub fn swaps(&self) -> u64 {
        self.swaps
    }

    #[inline]
    pub fn size(&self) -> (u32, u32) {
        self.targets[0].size()
    }

    /// Exchanges front and back. O(1); no texel data moves.
    #[inline]
    pub fn swap(&mut self) {
        self.front = 1 - self.front;
        self.swaps += 1;
        log::trace!("ping-pong swap #{}: front is now {}", self.swaps, self.front_slot());
    }

    pub fn release(self, ctx: &C) {
        let [a, b] = self.targets;
        a.release(ctx);
        b.release(ctx);
    }
}

impl<C: GraphicsContext> fmt::Debug for PingPong<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PingPong")
            .field("front", &self.front_slot())
            .field("swaps", &self.swaps)
            .field("size", &self.size())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::{Allocation, RecordingContext, TargetStatus};

    fn pair(ctx: &RecordingContext) -> PingPong<RecordingContext> {
        PingPong::new(ctx, &TargetConfig::new(32, 32)).unwrap()
    }

    #[test]
    fn targets_are_distinct_and_a_starts_front() {
        let ctx = RecordingContext::new();
        let pp = pair(&ctx);
        assert_eq!(pp.front_slot(), Slot::A);
        assert_eq!(pp.back().slot(), Slot::B);
        assert_ne!(pp.front().framebuffer(), pp.back().framebuffer());
        assert_ne!(pp.front().texture(), pp.back().texture());
        assert_eq!(ctx.live(Allocation::Framebuffer), 2);
    }

    #[test]
    fn swap_alternates_roles() {
        let ctx = RecordingContext::new();
        let mut pp = pair(&ctx);
        pp.swap();
        assert_eq!(pp.front_slot(), Slot::B);
        pp.swap();
        assert_eq!(pp.front_slot(), Slot::A);
        assert_eq!(pp.swaps(), 2);
    }

    #[test]
    fn front_and_back_never_coincide() {
        let ctx = RecordingContext::new();
        let mut pp = pair(&ctx);
        for _ in 0..17 {
            let back_before = pp.back().slot();
            pp.swap();
            assert_ne!(pp.front().framebuffer(), pp.back().framebuffer());
            assert_eq!(pp.front_slot(), back_before);
        }
    }

    #[test]
    fn swap_keeps_texture_handles() {
        let ctx = RecordingContext::new();
        let mut pp = pair(&ctx);
        let a_tex = *pp.targets()[0].texture();
        pp.swap();
        assert_eq!(*pp.back().texture(), a_tex);
    }

    #[test]
    fn second_target_failure_releases_first() {
        let ctx = RecordingContext::new();
        ctx.fail_nth(Allocation::Framebuffer, 1);
        let err = PingPong::new(&ctx, &TargetConfig::new(8, 8)).unwrap_err();
        assert_eq!(err, TargetError::ResourceCreation(Resource::Framebuffer));
        assert_eq!(ctx.live_total(), 0);
    }

    #[test]
    fn incomplete_pair_is_not_exposed() {
        let ctx = RecordingContext::new();
        ctx.force_status(Some(TargetStatus::INCOMPLETE_ATTACHMENT));
        let err = PingPong::new(&ctx, &TargetConfig::new(8, 8)).unwrap_err();
        assert!(matches!(err, TargetError::TargetIncomplete { .. }));
        assert_eq!(ctx.live_total(), 0);
    }

    #[test]
    fn release_frees_everything() {
        let ctx = RecordingContext::new();
        let pp = pair(&ctx);
        pp.release(&ctx);
        assert_eq!(ctx.live_total(), 0);
        assert_eq!(ctx.released(), 4);
    }
}
