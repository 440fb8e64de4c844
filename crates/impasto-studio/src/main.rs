//! Impasto studio: paint with the mouse into a ping-pong canvas.
//!
//! Left drag paints, `C` clears, `Escape` quits.
//! `IMPASTO_FADE` (0..1) makes strokes fade; `IMPASTO_RADIUS` sets the brush size.

mod app;
mod canvas;
mod config;

use impasto_engine::logging::{init_logging, LoggingConfig};

use crate::config::StudioConfig;

fn main() -> anyhow::Result<()> {
    init_logging(LoggingConfig::default());

    let config = StudioConfig::from_env();
    log::info!(
        "impasto studio: brush radius {}, fade {}",
        config.brush.radius,
        config.compositor.fade
    );

    app::run(config)
}
