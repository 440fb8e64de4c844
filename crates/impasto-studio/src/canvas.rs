use anyhow::{Context, Result};

use impasto_engine::coords::Vec2;
use impasto_engine::device::{Gpu, GpuFrame};
use impasto_engine::geometry::{BrushStamp, Stroke};
use impasto_engine::gfx::WgpuContext;
use impasto_engine::pipeline::PaintPipeline;
use impasto_engine::render::{BrushCompositor, SurfaceTarget};
use impasto_engine::target::TargetConfig;

use crate::config::{BrushConfig, StudioConfig};

/// Paint state for one window: targets, compositor and the stroke in progress.
pub struct Canvas {
    ctx: WgpuContext,
    pipeline: Option<PaintPipeline<WgpuContext>>,
    compositor: BrushCompositor,

    brush: BrushConfig,
    stroke: Option<Stroke>,
    pending: Vec<BrushStamp>,
    needs_clear: bool,
}

impl Canvas {
    pub fn new(gpu: &Gpu<'_>, config: &StudioConfig) -> Result<Self> {
        let ctx = gpu.context();
        let size = gpu.size();

        let targets = TargetConfig {
            format: config.target_format,
            ..TargetConfig::new(size.width, size.height)
        };
        let pipeline =
            PaintPipeline::new(&ctx, targets).context("failed to allocate paint targets")?;
        let compositor =
            BrushCompositor::new(&ctx, config.target_format.to_wgpu(), config.compositor);

        Ok(Self {
            ctx,
            pipeline: Some(pipeline),
            compositor,
            brush: config.brush,
            stroke: None,
            pending: Vec::new(),
            needs_clear: true,
        })
    }

    pub fn pointer_down(&mut self, at: Vec2) {
        let mut stroke = Stroke::new(self.brush.radius, self.brush.color)
            .with_hardness(self.brush.hardness)
            .with_spacing(self.brush.spacing);
        stroke.begin(at, &mut self.pending);
        self.stroke = Some(stroke);
    }

    pub fn pointer_moved(&mut self, at: Vec2) {
        if let Some(stroke) = self.stroke.as_mut() {
            stroke.extend_to(at, &mut self.pending);
        }
    }

    pub fn pointer_up(&mut self) {
        if let Some(mut stroke) = self.stroke.take() {
            stroke.end();
        }
    }

    pub fn clear(&mut self) {
        self.pending.clear();
        self.needs_clear = true;
    }

    /// Reallocates targets at the new size. On failure the old targets stay.
    pub fn resize(&mut self, width: u32, height: u32) {
        let Some(pipeline) = self.pipeline.as_mut() else { return };
        if width == 0 || height == 0 {
            return;
        }
        match pipeline.resize(&self.ctx, width, height) {
            Ok(()) => self.needs_clear = true,
            Err(e) => log::error!("keeping {:?} targets: {e}", pipeline.config()),
        }
    }

    /// Whether the next frame changes the image.
    pub fn is_dirty(&self) -> bool {
        self.needs_clear || !self.pending.is_empty() || self.compositor.config().fade < 1.0
    }

    /// Records clear, accumulation and presentation into `frame`.
    pub fn render(
        &mut self,
        frame: &mut GpuFrame,
        surface_format: wgpu::TextureFormat,
    ) -> Result<()> {
        let Some(pipeline) = self.pipeline.as_mut() else { return Ok(()) };
        let ctx = &self.ctx;

        if self.needs_clear {
            self.compositor.clear_targets(&mut frame.encoder, pipeline.targets());
            self.needs_clear = false;
        }

        if !self.pending.is_empty() || self.compositor.config().fade < 1.0 {
            let stamps = std::mem::take(&mut self.pending);
            let compositor = &self.compositor;
            let encoder = &mut frame.encoder;
            let pass = pipeline
                .paint(ctx, &stamps, |pass| compositor.accumulate(ctx, encoder, pass))
                .context("paint pass failed")?;
            log::trace!("pass {pass}: {} stamps", stamps.len());
        }

        let mut target = SurfaceTarget::new(&mut frame.encoder, &frame.view, surface_format);
        let compositor = &mut self.compositor;
        pipeline.present(|src| compositor.present(ctx, &mut target, src));
        Ok(())
    }
}

impl Drop for Canvas {
    fn drop(&mut self) {
        if let Some(pipeline) = self.pipeline.take() {
            pipeline.release(&self.ctx);
        }
    }
}
