//! Off-screen render targets.
//!
//! - [`RenderTarget`]: framebuffer + backing texture, validated on creation
//! - [`PingPong`]: the front/back pair used for feedback accumulation
//! - [`TargetError`]: allocation and completeness failures

mod error;
mod ping_pong;
mod render_target;

pub use error::{Resource, TargetError};
pub use ping_pong::PingPong;
pub use render_target::{RenderTarget, Slot, TargetConfig};
