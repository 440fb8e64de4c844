//! wgpu drawing for the paint pipeline.
//!
//! [`BrushCompositor`] records the draws a [`PaintPipeline`](crate::pipeline::PaintPipeline)
//! hands out: accumulation passes into the back target and the presentation blit.
//!
//! Convention:
//! - stamp positions are target pixels (top-left origin, +Y down)
//! - the vertex shader converts to NDC using a viewport uniform
//! - colors are linear premultiplied

mod common;
mod compositor;
mod ctx;
mod error;

pub use compositor::{BrushCompositor, CompositorConfig};
pub use ctx::SurfaceTarget;
pub use error::DrawError;
