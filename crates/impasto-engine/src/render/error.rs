use crate::target::TargetError;

/// Failures while recording a compositor pass.
///
/// Returned from the draw closure of
/// [`PaintPipeline::paint`](crate::pipeline::PaintPipeline::paint), which then
/// leaves the front/back roles as they were.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DrawError {
    #[error("render target '{label}' has no color attachment")]
    MissingColorAttachment { label: String },

    #[error("render target '{label}' is {found:?}, compositor pipelines expect {expected:?}")]
    FormatMismatch {
        label: String,
        found: Option<wgpu::TextureFormat>,
        expected: wgpu::TextureFormat,
    },

    #[error(transparent)]
    Target(#[from] TargetError),
}
