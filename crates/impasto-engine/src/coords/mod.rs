//! Coordinate types shared by strokes and renderers.
//!
//! Canonical CPU space for brush geometry:
//! - target pixels
//! - origin top-left
//! - +X right, +Y down
//!
//! Shaders convert to NDC using a viewport uniform.

mod vec2;
mod viewport;

pub use vec2::Vec2;
pub use viewport::Viewport;
