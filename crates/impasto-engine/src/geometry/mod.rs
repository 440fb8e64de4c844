//! Vertex data fed into the paint targets.
//!
//! - [`FULLSCREEN_QUAD`] / [`create_quad_buffer`]: static blit geometry
//! - [`BrushBuffer`]: per-operation stamp instances
//! - [`Stroke`]: pointer samples to evenly spaced [`BrushStamp`]s

mod brush;
mod quad;
mod stroke;

pub use brush::{stamp_count, BrushBuffer, BrushStamp, MIN_BRUSH_CAPACITY};
pub use quad::{create_quad_buffer, QuadVertex, FULLSCREEN_QUAD, QUAD_VERTEX_COUNT};
pub use stroke::{Stroke, MAX_STAMPS_PER_SEGMENT};
