use std::fmt;

use crate::gfx::TargetStatus;

/// The kind of GPU resource an allocation was for.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Resource {
    QuadBuffer,
    BrushBuffer,
    ColorTexture,
    DepthTexture,
    Framebuffer,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Resource::QuadBuffer => "quad vertex buffer",
            Resource::BrushBuffer => "brush vertex buffer",
            Resource::ColorTexture => "color texture",
            Resource::DepthTexture => "depth texture",
            Resource::Framebuffer => "framebuffer",
        };
        f.write_str(name)
    }
}

/// Failures raised while building or rebuilding render resources.
///
/// Neither variant is retried: allocation failure is not expected to clear up
/// within one context lifetime, and an incomplete target is a configuration
/// problem.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TargetError {
    /// The context returned no handle.
    #[error("failed to create {0}")]
    ResourceCreation(Resource),

    /// A framebuffer failed its completeness check after attachment.
    #[error("render target '{label}' is incomplete: {description}")]
    TargetIncomplete {
        label: String,
        status: TargetStatus,
        description: String,
    },

    /// A single pass carried more stamps than one instanced draw can address.
    #[error("{0} stamps exceed the per-pass instance limit")]
    TooManyStamps(usize),
}

impl TargetError {
    pub(crate) fn incomplete(label: &str, status: TargetStatus) -> Self {
        TargetError::TargetIncomplete {
            label: label.to_string(),
            status,
            description: status.describe(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incomplete_message_carries_decoded_status() {
        let err = TargetError::incomplete("paint target A", TargetStatus(0x9999));
        assert_eq!(
            err.to_string(),
            "render target 'paint target A' is incomplete: Unknown status: 39321"
        );
    }

    #[test]
    fn creation_message_names_resource() {
        let err = TargetError::ResourceCreation(Resource::BrushBuffer);
        assert_eq!(err.to_string(), "failed to create brush vertex buffer");
    }

    #[test]
    fn stamp_overflow_message_names_count() {
        let err = TargetError::TooManyStamps(4_294_967_296);
        assert_eq!(err.to_string(), "4294967296 stamps exceed the per-pass instance limit");
    }
}
