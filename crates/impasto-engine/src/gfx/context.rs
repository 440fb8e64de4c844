use super::TargetStatus;

/// Color formats a render target may be backed by.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ColorFormat {
    Rgba8Unorm,
    Rgba8UnormSrgb,
    Bgra8Unorm,
    Bgra8UnormSrgb,
    Rgba16Float,
    /// Sampleable but not renderable on most devices; useful to exercise
    /// the `FRAMEBUFFER_UNSUPPORTED` path.
    Rgb9e5Ufloat,
}

impl ColorFormat {
    /// Size of one texel in bytes.
    pub const fn bytes_per_texel(self) -> u32 {
        match self {
            ColorFormat::Rgba16Float => 8,
            _ => 4,
        }
    }
}

/// Depth formats for the optional depth attachment.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum DepthFormat {
    Depth24Plus,
    Depth32Float,
}

/// What a texture is allocated for.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum TextureKind {
    /// Renderable and sampleable color storage.
    Color(ColorFormat),
    /// Depth storage, attachable but never sampled here.
    Depth(DepthFormat),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureDesc<'a> {
    pub label: &'a str,
    pub width: u32,
    pub height: u32,
    pub kind: TextureKind,
}

/// How a buffer is going to be fed.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BufferUsage {
    /// Written once at creation.
    StaticVertex,
    /// Rewritten by the caller between draws.
    DynamicVertex,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferDesc<'a> {
    pub label: &'a str,
    pub usage: BufferUsage,
    /// Size in bytes. Ignored when `contents` is provided.
    pub size: u64,
    pub contents: Option<&'a [u8]>,
}

impl<'a> BufferDesc<'a> {
    pub fn with_contents(label: &'a str, usage: BufferUsage, contents: &'a [u8]) -> Self {
        Self {
            label,
            usage,
            size: contents.len() as u64,
            contents: Some(contents),
        }
    }

    pub fn empty(label: &'a str, usage: BufferUsage, size: u64) -> Self {
        Self {
            label,
            usage,
            size,
            contents: None,
        }
    }

    /// Byte length of the allocation this descriptor asks for.
    pub fn byte_len(&self) -> u64 {
        self.contents.map_or(self.size, |c| c.len() as u64)
    }
}

/// Textures bound to a framebuffer.
pub struct Attachments<'a, T> {
    pub color: Option<&'a T>,
    pub depth: Option<&'a T>,
}

/// A live graphics context.
///
/// Every resource operation in this crate takes the context explicitly; there
/// is no process-wide device. Allocation returns `None` when the backend could
/// not produce a handle. Handles are plain values owned by the caller and must
/// be handed back through the matching `release_*` call.
pub trait GraphicsContext {
    type Buffer: PartialEq;
    type Texture: PartialEq;
    type Framebuffer: PartialEq;

    fn create_buffer(&self, desc: &BufferDesc<'_>) -> Option<Self::Buffer>;

    /// Overwrites `data.len()` bytes at `offset`.
    fn write_buffer(&self, buffer: &Self::Buffer, offset: u64, data: &[u8]);

    fn create_texture(&self, desc: &TextureDesc<'_>) -> Option<Self::Texture>;

    fn create_framebuffer(
        &self,
        label: &str,
        attachments: Attachments<'_, Self::Texture>,
    ) -> Option<Self::Framebuffer>;

    /// Reports whether `framebuffer` can be drawn into and sampled from.
    fn check_framebuffer_status(&self, framebuffer: &Self::Framebuffer) -> TargetStatus;

    fn release_buffer(&self, buffer: Self::Buffer);
    fn release_texture(&self, texture: Self::Texture);
    fn release_framebuffer(&self, framebuffer: Self::Framebuffer);
}
