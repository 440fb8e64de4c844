//! Graphics context seam.
//!
//! Everything above this module talks to the GPU through [`GraphicsContext`]:
//! - [`WgpuContext`] drives a real wgpu device
//! - [`RecordingContext`] keeps resources in memory (tests, headless hosts)
//!
//! Completeness codes and their decoding live in [`status`].

mod context;
mod recording;
pub mod status;
mod wgpu_ctx;

pub use context::{
    Attachments, BufferDesc, BufferUsage, ColorFormat, DepthFormat, GraphicsContext, TextureDesc,
    TextureKind,
};
pub use recording::{
    Allocation, RecordedBuffer, RecordedFramebuffer, RecordedTexture, RecordingContext,
    MAX_TEXTURE_DIMENSION,
};
pub use status::{describe_status, TargetStatus};
pub use wgpu_ctx::{WgpuBuffer, WgpuContext, WgpuFramebuffer, WgpuTexture};
