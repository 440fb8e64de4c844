//! GPU device + surface management.
//!
//! - [`Gpu`]: device, queue and a window surface (swapchain)
//! - [`HeadlessGpu`]: device and queue only
//!
//! Both hand out a [`WgpuContext`](crate::gfx::WgpuContext) for target allocation.

mod gpu;
mod headless;
mod init;
mod surface;

pub use gpu::{Gpu, GpuFrame};
pub use headless::HeadlessGpu;
pub use init::GpuInit;
pub use surface::SurfaceErrorAction;
