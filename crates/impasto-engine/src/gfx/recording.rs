//! In-memory graphics context.
//!
//! `RecordingContext` keeps buffer bytes and resource metadata on the CPU. It
//! never draws anything; it exists so resource orchestration can run (and be
//! checked) without a device, and so allocation failures can be injected.

use std::cell::RefCell;
use std::collections::HashMap;

use super::{
    Attachments, BufferDesc, BufferUsage, GraphicsContext, TargetStatus, TextureDesc, TextureKind,
};

/// Upper bound on texture extents, mirroring the wgpu default limit.
pub const MAX_TEXTURE_DIMENSION: u32 = 8192;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct RecordedBuffer(u32);

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct RecordedTexture(u32);

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct RecordedFramebuffer(u32);

/// Allocation category, used for failure injection and accounting.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Allocation {
    Buffer,
    Texture,
    Framebuffer,
}

#[derive(Debug, Clone)]
struct BufferRecord {
    usage: BufferUsage,
    bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
struct TextureRecord {
    width: u32,
    height: u32,
    kind: TextureKind,
}

#[derive(Debug, Clone)]
struct FramebufferRecord {
    color: Option<u32>,
    depth: Option<u32>,
}

#[derive(Debug, Default)]
struct State {
    next_id: u32,
    buffers: HashMap<u32, BufferRecord>,
    textures: HashMap<u32, TextureRecord>,
    framebuffers: HashMap<u32, FramebufferRecord>,
    attempts: HashMap<Allocation, usize>,
    failures: Vec<(Allocation, usize)>,
    forced_status: Option<TargetStatus>,
    released: usize,
}

impl State {
    fn next(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    /// Counts an allocation attempt; returns `false` if it should fail.
    fn admit(&mut self, kind: Allocation) -> bool {
        let n = self.attempts.entry(kind).or_insert(0);
        let index = *n;
        *n += 1;
        !self.failures.contains(&(kind, index))
    }
}

/// CPU-only [`GraphicsContext`].
#[derive(Debug, Default)]
pub struct RecordingContext {
    state: RefCell<State>,
}

impl RecordingContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the `n`th (0-based) allocation of `kind` return no handle.
    pub fn fail_nth(&self, kind: Allocation, n: usize) -> &Self {
        self.state.borrow_mut().failures.push((kind, n));
        self
    }

    /// Overrides every subsequent status query. `None` restores computed
    /// statuses.
    pub fn force_status(&self, status: Option<TargetStatus>) -> &Self {
        self.state.borrow_mut().forced_status = status;
        self
    }

    /// Contents of a live buffer.
    pub fn buffer_contents(&self, buffer: &RecordedBuffer) -> Option<Vec<u8>> {
        self.state
            .borrow()
            .buffers
            .get(&buffer.0)
            .map(|b| b.bytes.clone())
    }

    pub fn buffer_usage(&self, buffer: &RecordedBuffer) -> Option<BufferUsage> {
        self.state.borrow().buffers.get(&buffer.0).map(|b| b.usage)
    }

    /// Extent of a live texture.
    pub fn texture_size(&self, texture: &RecordedTexture) -> Option<(u32, u32)> {
        self.state
            .borrow()
            .textures
            .get(&texture.0)
            .map(|t| (t.width, t.height))
    }

    /// Number of live resources of `kind`.
    pub fn live(&self, kind: Allocation) -> usize {
        let s = self.state.borrow();
        match kind {
            Allocation::Buffer => s.buffers.len(),
            Allocation::Texture => s.textures.len(),
            Allocation::Framebuffer => s.framebuffers.len(),
        }
    }

    /// Number of live resources of every kind.
    pub fn live_total(&self) -> usize {
        let s = self.state.borrow();
        s.buffers.len() + s.textures.len() + s.framebuffers.len()
    }

    /// Number of successful `release_*` calls so far.
    pub fn released(&self) -> usize {
        self.state.borrow().released
    }

    fn computed_status(s: &State, fb: &FramebufferRecord) -> TargetStatus {
        let Some(color) = fb.color.and_then(|id| s.textures.get(&id)) else {
            return TargetStatus::INCOMPLETE_MISSING_ATTACHMENT;
        };
        let TextureKind::Color(format) = color.kind else {
            return TargetStatus::INCOMPLETE_ATTACHMENT;
        };
        if color.width == 0
            || color.height == 0
            || color.width > MAX_TEXTURE_DIMENSION
            || color.height > MAX_TEXTURE_DIMENSION
        {
            return TargetStatus::INCOMPLETE_DIMENSIONS;
        }
        if let Some(depth_id) = fb.depth {
            let Some(depth) = s.textures.get(&depth_id) else {
                return TargetStatus::INCOMPLETE_ATTACHMENT;
            };
            if !matches!(depth.kind, TextureKind::Depth(_)) {
                return TargetStatus::INCOMPLETE_ATTACHMENT;
            }
            if (depth.width, depth.height) != (color.width, color.height) {
                return TargetStatus::INCOMPLETE_DIMENSIONS;
            }
        }
        if format == super::ColorFormat::Rgb9e5Ufloat {
            return TargetStatus::UNSUPPORTED;
        }
        TargetStatus::COMPLETE
    }
}

impl GraphicsContext for RecordingContext {
    type Buffer = RecordedBuffer;
    type Texture = RecordedTexture;
    type Framebuffer = RecordedFramebuffer;

    fn create_buffer(&self, desc: &BufferDesc<'_>) -> Option<RecordedBuffer> {
        let mut s = self.state.borrow_mut();
        if !s.admit(Allocation::Buffer) {
            log::error!("recording ctx: refusing buffer '{}'", desc.label);
            return None;
        }
        let bytes = match desc.contents {
            Some(c) => c.to_vec(),
            None => vec![0; desc.size as usize],
        };
        let id = s.next();
        s.buffers.insert(id, BufferRecord { usage: desc.usage, bytes });
        Some(RecordedBuffer(id))
    }

    fn write_buffer(&self, buffer: &RecordedBuffer, offset: u64, data: &[u8]) {
        let mut s = self.state.borrow_mut();
        let Some(record) = s.buffers.get_mut(&buffer.0) else {
            log::warn!("recording ctx: write to released buffer {}", buffer.0);
            return;
        };
        let start = offset as usize;
        let end = start + data.len();
        if end > record.bytes.len() {
            log::warn!(
                "recording ctx: write of {} bytes at {offset} overflows buffer of {}",
                data.len(),
                record.bytes.len()
            );
            return;
        }
        record.bytes[start..end].copy_from_slice(data);
    }

    fn create_texture(&self, desc: &TextureDesc<'_>) -> Option<RecordedTexture> {
        let mut s = self.state.borrow_mut();
        if !s.admit(Allocation::Texture) {
            log::error!("recording ctx: refusing texture '{}'", desc.label);
            return None;
        }
        let id = s.next();
        s.textures.insert(
            id,
            TextureRecord {
                width: desc.width,
                height: desc.height,
                kind: desc.kind,
            },
        );
        Some(RecordedTexture(id))
    }

    fn create_framebuffer(
        &self,
        label: &str,
        attachments: Attachments<'_, RecordedTexture>,
    ) -> Option<RecordedFramebuffer> {
        let mut s = self.state.borrow_mut();
        if !s.admit(Allocation::Framebuffer) {
            log::error!("recording ctx: refusing framebuffer '{label}'");
            return None;
        }
        let id = s.next();
        s.framebuffers.insert(
            id,
            FramebufferRecord {
                color: attachments.color.map(|t| t.0),
                depth: attachments.depth.map(|t| t.0),
            },
        );
        Some(RecordedFramebuffer(id))
    }

    fn check_framebuffer_status(&self, framebuffer: &RecordedFramebuffer) -> TargetStatus {
        let s = self.state.borrow();
        if let Some(status) = s.forced_status {
            return status;
        }
        match s.framebuffers.get(&framebuffer.0) {
            Some(fb) => Self::computed_status(&s, fb),
            None => TargetStatus::INCOMPLETE_MISSING_ATTACHMENT,
        }
    }

    fn release_buffer(&self, buffer: RecordedBuffer) {
        let mut s = self.state.borrow_mut();
        if s.buffers.remove(&buffer.0).is_some() {
            s.released += 1;
        } else {
            log::warn!("recording ctx: double release of buffer {}", buffer.0);
        }
    }

    fn release_texture(&self, texture: RecordedTexture) {
        let mut s = self.state.borrow_mut();
        if s.textures.remove(&texture.0).is_some() {
            s.released += 1;
        } else {
            log::warn!("recording ctx: double release of texture {}", texture.0);
        }
    }

    fn release_framebuffer(&self, framebuffer: RecordedFramebuffer) {
        let mut s = self.state.borrow_mut();
        if s.framebuffers.remove(&framebuffer.0).is_some() {
            s.released += 1;
        } else {
            log::warn!("recording ctx: double release of framebuffer {}", framebuffer.0);
        }
    }
}
