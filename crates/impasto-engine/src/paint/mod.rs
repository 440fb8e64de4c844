//! Brush color model (linear, premultiplied alpha).

pub mod color;

pub use color::Color;
