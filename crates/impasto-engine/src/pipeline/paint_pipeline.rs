use std::fmt;

use crate::coords::Viewport;
use crate::geometry::{create_quad_buffer, stamp_count, BrushBuffer, BrushStamp};
use crate::gfx::GraphicsContext;
use crate::target::{PingPong, RenderTarget, Slot, TargetConfig, TargetError};

/// Everything a renderer needs to record one accumulation draw.
///
/// `target` is the back target (write only), `source` the front target (read
/// only). The pipeline swaps them once the closure returns `Ok`.
///
/// `stamps` is the same slice that was uploaded into `brush`. Backends that
/// record several passes before submitting can copy it in command order.
pub struct AccumulationPass<'a, C: GraphicsContext> {
    /// 1-based pass number.
    pub index: u64,
    pub target: &'a RenderTarget<C>,
    pub source: &'a RenderTarget<C>,
    pub quad: &'a C::Buffer,
    pub brush: &'a C::Buffer,
    pub stamps: &'a [BrushStamp],
    pub stamp_count: u32,
    pub viewport: Viewport,
}

/// Read-only view of the accumulated image for presentation.
pub struct PresentSource<'a, C: GraphicsContext> {
    pub slot: Slot,
    pub texture: &'a C::Texture,
    pub quad: &'a C::Buffer,
    pub viewport: Viewport,
}

struct Resources<C: GraphicsContext> {
    quad: C::Buffer,
    brush: BrushBuffer<C>,
    targets: PingPong<C>,
}

/// Owns the quad buffer, the brush buffer and the ping-pong pair.
///
/// All GPU work goes through the context passed to each call. Resources must
/// be handed back with [`release`](Self::release); dropping the pipeline
/// without it leaks them until the context itself goes away.
pub struct PaintPipeline<C: GraphicsContext> {
    config: TargetConfig,
    // `None` only after `release` moved the resources out.
    inner: Option<Resources<C>>,
}

impl<C: GraphicsContext> PaintPipeline<C> {
    /// Allocates quad buffer, brush buffer and both targets, in that order.
    ///
    /// Anything allocated before a failure is released before the error is
    /// returned.
    pub fn new(ctx: &C, config: TargetConfig) -> Result<Self, TargetError> {
        let quad = create_quad_buffer(ctx)?;

        let brush = match BrushBuffer::new(ctx) {
            Ok(b) => b,
            Err(e) => {
                ctx.release_buffer(quad);
                return Err(e);
            }
        };

        let targets = match PingPong::new(ctx, &config) {
            Ok(t) => t,
            Err(e) => {
                brush.release(ctx);
                ctx.release_buffer(quad);
                return Err(e);
            }
        };

        log::info!(
            "paint pipeline ready: {}x{} {:?}",
            config.width,
            config.height,
            config.format
        );

        Ok(Self {
            config,
            inner: Some(Resources { quad, brush, targets }),
        })
    }

    fn res(&self) -> &Resources<C> {
        self.inner
            .as_ref()
            .expect("PaintPipeline resources are present until release()")
    }

    fn res_mut(&mut self) -> &mut Resources<C> {
        self.inner
            .as_mut()
            .expect("PaintPipeline resources are present until release()")
    }

    #[inline]
    pub fn config(&self) -> &TargetConfig {
        &self.config
    }

    #[inline]
    pub fn viewport(&self) -> Viewport {
        Viewport::from_extent((self.config.width, self.config.height))
    }

    /// Completed accumulation passes since the targets were (re)created.
    pub fn passes(&self) -> u64 {
        self.res().targets.swaps()
    }

    pub fn targets(&self) -> &PingPong<C> {
        &self.res().targets
    }

    pub fn front(&self) -> &RenderTarget<C> {
        self.res().targets.front()
    }

    pub fn back(&self) -> &RenderTarget<C> {
        self.res().targets.back()
    }

    /// Texture holding the latest accumulated image.
    pub fn front_texture(&self) -> &C::Texture {
        self.front().texture()
    }

    pub fn quad_buffer(&self) -> &C::Buffer {
        &self.res().quad
    }

    pub fn brush(&self) -> &BrushBuffer<C> {
        &self.res().brush
    }

    /// Runs one accumulation pass.
    ///
    /// Uploads `stamps`, hands `draw` the back target as destination and the
    /// front target as input, then swaps roles. Returns the pass number.
    ///
    /// Roles and the pass count only change when `draw` succeeds. An upload
    /// failure returns before drawing; a draw error is passed through as is.
    pub fn paint<F, E>(&mut self, ctx: &C, stamps: &[BrushStamp], draw: F) -> Result<u64, E>
    where
        F: FnOnce(&AccumulationPass<'_, C>) -> Result<(), E>,
        E: From<TargetError>,
    {
        let viewport = self.viewport();
        let count = stamp_count(stamps.len())?;
        let res = self.res_mut();
        res.brush.upload(ctx, stamps)?;

        let index = res.targets.swaps() + 1;
        draw(&AccumulationPass {
            index,
            target: res.targets.back(),
            source: res.targets.front(),
            quad: &res.quad,
            brush: res.brush.handle(),
            stamps,
            stamp_count: count,
            viewport,
        })?;
        res.targets.swap();
        Ok(index)
    }

    /// Hands the front texture and quad buffer to `draw`. No swap happens.
    pub fn present<F, R>(&self, draw: F) -> R
    where
        F: FnOnce(&PresentSource<'_, C>) -> R,
    {
        let res = self.res();
        let front = res.targets.front();
        draw(&PresentSource {
            slot: front.slot(),
            texture: front.texture(),
            quad: &res.quad,
            viewport: self.viewport(),
        })
    }

    /// Reallocates both targets at a new extent.
    ///
    /// The new pair is built before the old one is released, so a failure
    /// leaves the pipeline exactly as it was. Accumulated content is not
    /// carried over; slot A is front again and `passes()` restarts at zero.
    pub fn resize(&mut self, ctx: &C, width: u32, height: u32) -> Result<(), TargetError> {
        if (width, height) == (self.config.width, self.config.height) {
            return Ok(());
        }

        let config = TargetConfig {
            width,
            height,
            ..self.config.clone()
        };
        let fresh = PingPong::new(ctx, &config)?;
        let old = std::mem::replace(&mut self.res_mut().targets, fresh);
        old.release(ctx);

        log::info!(
            "paint targets resized {}x{} -> {width}x{height}",
            self.config.width,
            self.config.height
        );
        self.config = config;
        Ok(())
    }

    /// Releases every resource exactly once.
    pub fn release(mut self, ctx: &C) {
        if let Some(res) = self.inner.take() {
            res.targets.release(ctx);
            res.brush.release(ctx);
            ctx.release_buffer(res.quad);
            log::debug!("paint pipeline released");
        }
    }
}

impl<C: GraphicsContext> Drop for PaintPipeline<C> {
    fn drop(&mut self) {
        if self.inner.is_some() {
            log::warn!(
                "paint pipeline dropped without release(): 2 buffers and 2 render targets leak"
            );
        }
    }
}

impl<C: GraphicsContext> fmt::Debug for PaintPipeline<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("PaintPipeline");
        d.field("config", &self.config);
        match self.inner.as_ref() {
            Some(res) => d.field("targets", &res.targets).field("brush", &res.brush),
            None => d.field("released", &true),
        };
        d.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Vec2;
    use crate::gfx::{Allocation, RecordingContext, TargetStatus};
    use crate::paint::Color;
    use crate::target::Resource;

    fn pipeline(ctx: &RecordingContext) -> PaintPipeline<RecordingContext> {
        PaintPipeline::new(ctx, TargetConfig::new(64, 64)).unwrap()
    }

    fn stamps(n: usize) -> Vec<BrushStamp> {
        let blue = Color::from_premul(0.0, 0.0, 1.0, 1.0);
        (0..n)
            .map(|i| BrushStamp::new(Vec2::new(i as f32, 1.0), 3.0, blue))
            .collect()
    }

    fn no_draw(_: &AccumulationPass<'_, RecordingContext>) -> Result<(), TargetError> {
        Ok(())
    }

    #[test]
    fn new_allocates_two_buffers_and_two_targets() {
        let ctx = RecordingContext::new();
        let p = pipeline(&ctx);
        assert_eq!(ctx.live(Allocation::Buffer), 2);
        assert_eq!(ctx.live(Allocation::Texture), 2);
        assert_eq!(ctx.live(Allocation::Framebuffer), 2);
        assert_eq!(p.front().slot(), Slot::A);
        p.release(&ctx);
        assert_eq!(ctx.live_total(), 0);
    }

    #[test]
    fn paint_draws_into_back_then_swaps() {
        let ctx = RecordingContext::new();
        let mut p = pipeline(&ctx);
        let back_fb = *p.back().framebuffer();
        let front_tex = *p.front_texture();

        let mut seen = None;
        let index = p
            .paint(&ctx, &stamps(3), |pass| {
                assert_eq!(pass.target.slot(), Slot::B);
                assert_eq!(pass.source.slot(), Slot::A);
                assert_ne!(pass.target.framebuffer(), pass.source.framebuffer());
                seen = Some((
                    *pass.target.framebuffer(),
                    *pass.source.texture(),
                    pass.stamp_count,
                ));
                assert_eq!(pass.stamps.len(), 3);
                Ok::<_, TargetError>(())
            })
            .unwrap();

        assert_eq!(index, 1);
        assert_eq!(seen, Some((back_fb, front_tex, 3)));
        assert_eq!(p.front().slot(), Slot::B);
        assert_eq!(p.brush().len(), 3);
        p.release(&ctx);
    }

    #[test]
    fn roles_alternate_over_many_passes() {
        let ctx = RecordingContext::new();
        let mut p = pipeline(&ctx);
        for i in 1..=9u64 {
            let back_before = p.back().slot();
            let n = p
                .paint(&ctx, &stamps(1), |pass| {
                    assert_ne!(pass.target.slot(), pass.source.slot());
                    Ok::<_, TargetError>(())
                })
                .unwrap();
            assert_eq!(n, i);
            assert_eq!(p.front().slot(), back_before);
            assert_eq!(p.passes(), i);
        }
        p.release(&ctx);
    }

    #[test]
    fn present_reads_front_without_swapping() {
        let ctx = RecordingContext::new();
        let mut p = pipeline(&ctx);
        p.paint(&ctx, &[], no_draw).unwrap();
        let slot = p.present(|src| {
            assert_eq!(src.texture, p.front_texture());
            assert_eq!(src.viewport, Viewport::new(64.0, 64.0));
            src.slot
        });
        assert_eq!(slot, Slot::B);
        assert_eq!(p.passes(), 1);
        assert_eq!(p.front().slot(), Slot::B);
        p.release(&ctx);
    }

    #[test]
    fn every_init_failure_leaves_nothing_allocated() {
        let cases = [
            (Allocation::Buffer, 0, Resource::QuadBuffer),
            (Allocation::Buffer, 1, Resource::BrushBuffer),
            (Allocation::Texture, 0, Resource::ColorTexture),
            (Allocation::Framebuffer, 0, Resource::Framebuffer),
            (Allocation::Texture, 1, Resource::ColorTexture),
            (Allocation::Framebuffer, 1, Resource::Framebuffer),
        ];
        for (kind, n, resource) in cases {
            let ctx = RecordingContext::new();
            ctx.fail_nth(kind, n);
            let err = PaintPipeline::new(&ctx, TargetConfig::new(16, 16)).unwrap_err();
            assert_eq!(err, TargetError::ResourceCreation(resource), "{kind:?} #{n}");
            assert_eq!(ctx.live_total(), 0, "{kind:?} #{n} leaked");
        }
    }

    #[test]
    fn incomplete_target_aborts_init() {
        let ctx = RecordingContext::new();
        ctx.force_status(Some(TargetStatus(0x9999)));
        match PaintPipeline::new(&ctx, TargetConfig::new(16, 16)) {
            Err(TargetError::TargetIncomplete { description, .. }) => {
                assert_eq!(description, "Unknown status: 39321");
            }
            other => panic!("expected TargetIncomplete, got {other:?}"),
        }
        assert_eq!(ctx.live_total(), 0);
    }

    #[test]
    fn failed_upload_does_not_swap() {
        let ctx = RecordingContext::new();
        let mut p = pipeline(&ctx);
        ctx.fail_nth(Allocation::Buffer, 2);
        let mut drew = false;
        let err = p
            .paint(&ctx, &stamps(200), |_| {
                drew = true;
                Ok::<_, TargetError>(())
            })
            .unwrap_err();
        assert_eq!(err, TargetError::ResourceCreation(Resource::BrushBuffer));
        assert!(!drew);
        assert_eq!(p.front().slot(), Slot::A);
        assert_eq!(p.passes(), 0);
        p.release(&ctx);
    }

    #[derive(Debug, PartialEq)]
    enum DrawFailure {
        Backend,
        Target(TargetError),
    }

    impl From<TargetError> for DrawFailure {
        fn from(e: TargetError) -> Self {
            DrawFailure::Target(e)
        }
    }

    #[test]
    fn failed_draw_keeps_roles_and_pass_count() {
        let ctx = RecordingContext::new();
        let mut p = pipeline(&ctx);
        p.paint(&ctx, &stamps(2), no_draw).unwrap();
        let front = *p.front_texture();

        let err = p
            .paint(&ctx, &stamps(2), |_| Err(DrawFailure::Backend))
            .unwrap_err();
        assert_eq!(err, DrawFailure::Backend);
        assert_eq!(*p.front_texture(), front);
        assert_eq!(p.front().slot(), Slot::B);
        assert_eq!(p.passes(), 1);

        // The next successful pass gets the number the failed one would have had.
        assert_eq!(p.paint(&ctx, &stamps(2), no_draw).unwrap(), 2);
        assert_eq!(p.front().slot(), Slot::A);
        p.release(&ctx);
    }

    #[test]
    fn upload_errors_convert_into_the_draw_error_type() {
        let ctx = RecordingContext::new();
        let mut p = pipeline(&ctx);
        ctx.fail_nth(Allocation::Buffer, 2);
        let err = p
            .paint(&ctx, &stamps(100), |_| Ok::<_, DrawFailure>(()))
            .unwrap_err();
        assert_eq!(err, DrawFailure::Target(TargetError::ResourceCreation(Resource::BrushBuffer)));
        assert_eq!(p.passes(), 0);
        p.release(&ctx);
    }

    #[test]
    fn resize_replaces_targets() {
        let ctx = RecordingContext::new();
        let mut p = pipeline(&ctx);
        p.paint(&ctx, &[], no_draw).unwrap();
        p.resize(&ctx, 32, 16).unwrap();
        assert_eq!(p.config().width, 32);
        assert_eq!(ctx.texture_size(p.front_texture()), Some((32, 16)));
        assert_eq!(p.front().slot(), Slot::A);
        assert_eq!(ctx.live(Allocation::Texture), 2);
        assert_eq!(ctx.live(Allocation::Framebuffer), 2);
        p.release(&ctx);
        assert_eq!(ctx.live_total(), 0);
    }

    #[test]
    fn failed_resize_keeps_old_targets() {
        let ctx = RecordingContext::new();
        let mut p = pipeline(&ctx);
        let old = *p.front_texture();
        let err = p.resize(&ctx, 0, 16).unwrap_err();
        assert!(matches!(
            err,
            TargetError::TargetIncomplete { status: TargetStatus::INCOMPLETE_DIMENSIONS, .. }
        ));
        assert_eq!(*p.front_texture(), old);
        assert_eq!(p.config().width, 64);
        assert_eq!(ctx.live(Allocation::Texture), 2);
        p.release(&ctx);
    }

    #[test]
    fn resize_to_same_extent_is_a_no_op() {
        let ctx = RecordingContext::new();
        let mut p = pipeline(&ctx);
        let before = *p.front_texture();
        p.resize(&ctx, 64, 64).unwrap();
        assert_eq!(*p.front_texture(), before);
        p.release(&ctx);
    }
}
