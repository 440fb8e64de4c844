use std::fmt;

/// Completeness code reported for a framebuffer.
///
/// Values follow the GL/WebGL `checkFramebufferStatus` numbering so that codes
/// read the same in logs regardless of backend.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct TargetStatus(pub u32);

impl TargetStatus {
    pub const COMPLETE: Self = Self(0x8CD5);
    pub const INCOMPLETE_ATTACHMENT: Self = Self(0x8CD6);
    pub const INCOMPLETE_MISSING_ATTACHMENT: Self = Self(0x8CD7);
    pub const INCOMPLETE_DIMENSIONS: Self = Self(0x8CD9);
    pub const UNSUPPORTED: Self = Self(0x8CDD);
    pub const INCOMPLETE_MULTISAMPLE: Self = Self(0x8D56);

    #[inline]
    pub const fn code(self) -> u32 {
        self.0
    }

    #[inline]
    pub fn is_complete(self) -> bool {
        self == Self::COMPLETE
    }

    /// Canonical name, or `None` for codes this crate does not know.
    pub fn name(self) -> Option<&'static str> {
        let name = match self {
            Self::COMPLETE => "FRAMEBUFFER_COMPLETE",
            Self::INCOMPLETE_ATTACHMENT => "FRAMEBUFFER_INCOMPLETE_ATTACHMENT",
            Self::INCOMPLETE_MISSING_ATTACHMENT => "FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT",
            Self::INCOMPLETE_DIMENSIONS => "FRAMEBUFFER_INCOMPLETE_DIMENSIONS",
            Self::UNSUPPORTED => "FRAMEBUFFER_UNSUPPORTED",
            Self::INCOMPLETE_MULTISAMPLE => "FRAMEBUFFER_INCOMPLETE_MULTISAMPLE",
            _ => return None,
        };
        Some(name)
    }

    /// Human-readable description. Never fails; unknown codes keep their
    /// numeric value.
    pub fn describe(self) -> String {
        describe_status(self.0)
    }
}

impl From<u32> for TargetStatus {
    fn from(code: u32) -> Self {
        Self(code)
    }
}

impl fmt::Display for TargetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

/// Decodes a raw completeness code.
///
/// Recognized codes yield their canonical name; any other value yields
/// `"Unknown status: <code>"` with the code in decimal.
pub fn describe_status(code: u32) -> String {
    match TargetStatus(code).name() {
        Some(name) => name.to_string(),
        None => format!("Unknown status: {code}"),
    }
}
