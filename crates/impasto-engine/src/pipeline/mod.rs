//! Paint pipeline: allocation, per-pass orchestration and teardown.
//!
//! Per paint operation:
//! 1. upload stamps into the brush buffer
//! 2. draw into the back target, sampling the front target
//! 3. swap front/back
//!
//! Presentation reads the front texture through the full-screen quad.

mod paint_pipeline;

pub use paint_pipeline::{AccumulationPass, PaintPipeline, PresentSource};
