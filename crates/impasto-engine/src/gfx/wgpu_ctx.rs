use std::sync::atomic::{AtomicU64, Ordering};

use wgpu::util::DeviceExt;

use super::{
    Attachments, BufferDesc, BufferUsage, ColorFormat, DepthFormat, GraphicsContext, TargetStatus,
    TextureDesc, TextureKind,
};

static NEXT_RESOURCE_ID: AtomicU64 = AtomicU64::new(1);

fn next_id() -> u64 {
    NEXT_RESOURCE_ID.fetch_add(1, Ordering::Relaxed)
}

impl ColorFormat {
    pub fn to_wgpu(self) -> wgpu::TextureFormat {
        match self {
            ColorFormat::Rgba8Unorm => wgpu::TextureFormat::Rgba8Unorm,
            ColorFormat::Rgba8UnormSrgb => wgpu::TextureFormat::Rgba8UnormSrgb,
            ColorFormat::Bgra8Unorm => wgpu::TextureFormat::Bgra8Unorm,
            ColorFormat::Bgra8UnormSrgb => wgpu::TextureFormat::Bgra8UnormSrgb,
            ColorFormat::Rgba16Float => wgpu::TextureFormat::Rgba16Float,
            ColorFormat::Rgb9e5Ufloat => wgpu::TextureFormat::Rgb9e5Ufloat,
        }
    }
}

impl DepthFormat {
    pub fn to_wgpu(self) -> wgpu::TextureFormat {
        match self {
            DepthFormat::Depth24Plus => wgpu::TextureFormat::Depth24Plus,
            DepthFormat::Depth32Float => wgpu::TextureFormat::Depth32Float,
        }
    }
}

impl TextureKind {
    pub fn to_wgpu(self) -> wgpu::TextureFormat {
        match self {
            TextureKind::Color(f) => f.to_wgpu(),
            TextureKind::Depth(f) => f.to_wgpu(),
        }
    }
}

/// Vertex buffer allocated through [`WgpuContext`].
#[derive(Debug)]
pub struct WgpuBuffer {
    id: u64,
    buffer: wgpu::Buffer,
    size: u64,
}

impl WgpuBuffer {
    #[inline]
    pub fn raw(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    #[inline]
    pub fn size(&self) -> u64 {
        self.size
    }
}

impl PartialEq for WgpuBuffer {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

/// Texture plus its default view.
#[derive(Debug)]
pub struct WgpuTexture {
    id: u64,
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    width: u32,
    height: u32,
    kind: TextureKind,
    usage: wgpu::TextureUsages,
}

impl WgpuTexture {
    #[inline]
    pub fn raw(&self) -> &wgpu::Texture {
        &self.texture
    }

    /// View over the whole texture, suitable for sampling.
    #[inline]
    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    #[inline]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[inline]
    pub fn format(&self) -> wgpu::TextureFormat {
        self.kind.to_wgpu()
    }
}

impl PartialEq for WgpuTexture {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

#[derive(Debug)]
struct AttachmentInfo {
    texture_id: u64,
    view: wgpu::TextureView,
    width: u32,
    height: u32,
    kind: TextureKind,
    usage: wgpu::TextureUsages,
}

impl AttachmentInfo {
    fn of(texture: &WgpuTexture, label: &str) -> Self {
        Self {
            texture_id: texture.id,
            view: texture.texture.create_view(&wgpu::TextureViewDescriptor {
                label: Some(label),
                ..Default::default()
            }),
            width: texture.width,
            height: texture.height,
            kind: texture.kind,
            usage: texture.usage,
        }
    }
}

/// wgpu has no framebuffer objects; this records the attachment views a
/// render pass will bind.
#[derive(Debug)]
pub struct WgpuFramebuffer {
    id: u64,
    label: String,
    color: Option<AttachmentInfo>,
    depth: Option<AttachmentInfo>,
}

impl WgpuFramebuffer {
    #[inline]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[inline]
    pub fn color_view(&self) -> Option<&wgpu::TextureView> {
        self.color.as_ref().map(|a| &a.view)
    }

    #[inline]
    pub fn depth_view(&self) -> Option<&wgpu::TextureView> {
        self.depth.as_ref().map(|a| &a.view)
    }

    pub fn color_format(&self) -> Option<wgpu::TextureFormat> {
        self.color.as_ref().map(|a| a.kind.to_wgpu())
    }

    /// Identifier of the texture bound as color attachment.
    pub fn color_texture_id(&self) -> Option<u64> {
        self.color.as_ref().map(|a| a.texture_id)
    }
}

impl PartialEq for WgpuFramebuffer {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

/// [`GraphicsContext`] over a wgpu device and queue.
///
/// Holds cloned handles, so it can live alongside the objects it allocates.
///
/// Descriptors wgpu would reject are refused up front (returning `None`) so a
/// bad request surfaces as a null handle instead of an uncaptured validation
/// error.
#[derive(Clone)]
pub struct WgpuContext {
    device: wgpu::Device,
    queue: wgpu::Queue,
}

impl WgpuContext {
    #[inline]
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        Self {
            device: device.clone(),
            queue: queue.clone(),
        }
    }

    #[inline]
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    #[inline]
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    fn renderable(&self, format: wgpu::TextureFormat) -> bool {
        format
            .guaranteed_format_features(self.device.features())
            .allowed_usages
            .contains(wgpu::TextureUsages::RENDER_ATTACHMENT)
    }

    fn extent_ok(&self, width: u32, height: u32) -> bool {
        let max = self.device.limits().max_texture_dimension_2d;
        width > 0 && height > 0 && width <= max && height <= max
    }
}

impl GraphicsContext for WgpuContext {
    type Buffer = WgpuBuffer;
    type Texture = WgpuTexture;
    type Framebuffer = WgpuFramebuffer;

    fn create_buffer(&self, desc: &BufferDesc<'_>) -> Option<WgpuBuffer> {
        let len = desc.byte_len();
        let max = self.device.limits().max_buffer_size;
        if len > max {
            log::error!("buffer '{}' of {len} bytes exceeds device limit {max}", desc.label);
            return None;
        }

        let usage = match desc.usage {
            BufferUsage::StaticVertex => wgpu::BufferUsages::VERTEX,
            BufferUsage::DynamicVertex => wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        };

        let buffer = match desc.contents {
            Some(contents) => self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(desc.label),
                contents,
                usage,
            }),
            None => self.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(desc.label),
                size: len
                    .max(wgpu::COPY_BUFFER_ALIGNMENT)
                    .next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT),
                usage,
                mapped_at_creation: false,
            }),
        };

        Some(WgpuBuffer {
            id: next_id(),
            size: buffer.size(),
            buffer,
        })
    }

    fn write_buffer(&self, buffer: &WgpuBuffer, offset: u64, data: &[u8]) {
        let len = data.len() as u64;
        if offset % wgpu::COPY_BUFFER_ALIGNMENT != 0 || len % wgpu::COPY_BUFFER_ALIGNMENT != 0 {
            log::error!("unaligned buffer write ({len} bytes at {offset}); dropped");
            return;
        }
        if offset + len > buffer.size {
            log::error!(
                "buffer write of {len} bytes at {offset} overflows {} bytes; dropped",
                buffer.size
            );
            return;
        }
        self.queue.write_buffer(&buffer.buffer, offset, data);
    }

    fn create_texture(&self, desc: &TextureDesc<'_>) -> Option<WgpuTexture> {
        if !self.extent_ok(desc.width, desc.height) {
            log::error!(
                "texture '{}' has unusable extent {}x{}",
                desc.label,
                desc.width,
                desc.height
            );
            return None;
        }

        let format = desc.kind.to_wgpu();
        let wanted = match desc.kind {
            TextureKind::Color(_) => {
                wgpu::TextureUsages::RENDER_ATTACHMENT
                    | wgpu::TextureUsages::TEXTURE_BINDING
                    | wgpu::TextureUsages::COPY_SRC
            }
            TextureKind::Depth(_) => wgpu::TextureUsages::RENDER_ATTACHMENT,
        };
        // Requesting a usage the format lacks is a wgpu validation error; keep
        // what the format allows and let the completeness check report it.
        let allowed = format
            .guaranteed_format_features(self.device.features())
            .allowed_usages;
        let usage = wanted & allowed;
        if usage.is_empty() {
            log::error!("texture '{}': format {format:?} allows none of {wanted:?}", desc.label);
            return None;
        }

        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(desc.label),
            size: wgpu::Extent3d {
                width: desc.width,
                height: desc.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Some(WgpuTexture {
            id: next_id(),
            texture,
            view,
            width: desc.width,
            height: desc.height,
            kind: desc.kind,
            usage,
        })
    }

    fn create_framebuffer(
        &self,
        label: &str,
        attachments: Attachments<'_, WgpuTexture>,
    ) -> Option<WgpuFramebuffer> {
        Some(WgpuFramebuffer {
            id: next_id(),
            label: label.to_string(),
            color: attachments.color.map(|t| AttachmentInfo::of(t, label)),
            depth: attachments.depth.map(|t| AttachmentInfo::of(t, label)),
        })
    }

    fn check_framebuffer_status(&self, framebuffer: &WgpuFramebuffer) -> TargetStatus {
        let Some(color) = framebuffer.color.as_ref() else {
            return TargetStatus::INCOMPLETE_MISSING_ATTACHMENT;
        };
        let TextureKind::Color(format) = color.kind else {
            return TargetStatus::INCOMPLETE_ATTACHMENT;
        };
        if !color.usage.contains(wgpu::TextureUsages::RENDER_ATTACHMENT) {
            return if self.renderable(format.to_wgpu()) {
                TargetStatus::INCOMPLETE_ATTACHMENT
            } else {
                TargetStatus::UNSUPPORTED
            };
        }
        if !color.usage.contains(wgpu::TextureUsages::TEXTURE_BINDING) {
            return TargetStatus::INCOMPLETE_ATTACHMENT;
        }
        if !self.extent_ok(color.width, color.height) {
            return TargetStatus::INCOMPLETE_DIMENSIONS;
        }
        if let Some(depth) = framebuffer.depth.as_ref() {
            if !matches!(depth.kind, TextureKind::Depth(_)) {
                return TargetStatus::INCOMPLETE_ATTACHMENT;
            }
            if (depth.width, depth.height) != (color.width, color.height) {
                return TargetStatus::INCOMPLETE_DIMENSIONS;
            }
        }
        TargetStatus::COMPLETE
    }

    // Dropping the last handle frees the allocation once no recorded or
    // submitted command still uses it. `destroy()` would invalidate commands
    // already recorded into an encoder that has not been submitted yet.
    fn release_buffer(&self, buffer: WgpuBuffer) {
        log::trace!("buffer #{} ({} bytes) released", buffer.id, buffer.size);
        drop(buffer);
    }

    fn release_texture(&self, texture: WgpuTexture) {
        log::trace!("texture #{} ({}x{}) released", texture.id, texture.width, texture.height);
        drop(texture);
    }

    fn release_framebuffer(&self, framebuffer: WgpuFramebuffer) {
        log::trace!("framebuffer '{}' released", framebuffer.label);
    }
}
