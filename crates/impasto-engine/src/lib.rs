//! Impasto engine crate.
//!
//! GPU render-target management for incremental painting:
//! - [`gfx`]: graphics context seam (wgpu and in-memory recording backends)
//! - [`target`]: validated render targets and the ping-pong pair
//! - [`geometry`]: full-screen quad, brush stamp buffer, stroke spacing
//! - [`pipeline`]: the paint pipeline tying the pieces together
//! - [`render`]: wgpu compositor for accumulation and presentation
//! - [`device`]: wgpu device/surface bootstrap

pub mod coords;
pub mod device;
pub mod geometry;
pub mod gfx;
pub mod logging;
pub mod paint;
pub mod pipeline;
pub mod render;
pub mod target;

pub use gfx::{GraphicsContext, TargetStatus};
pub use pipeline::PaintPipeline;
pub use target::{TargetConfig, TargetError};
