use std::fmt;

use bytemuck::{Pod, Zeroable};

use crate::coords::Vec2;
use crate::gfx::{BufferDesc, BufferUsage, GraphicsContext};
use crate::paint::Color;
use crate::target::{Resource, TargetError};

/// One soft disc stamped into the accumulation target.
///
/// Layout (32 bytes):
///
///  offset  0  center    [f32; 2]  target pixels, top-left origin
///  offset  8  radius    f32       target pixels
///  offset 12  hardness  f32       0 = fully feathered, 1 = hard edge
///  offset 16  color     [f32; 4]  linear premultiplied
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct BrushStamp {
    pub center: [f32; 2],
    pub radius: f32,
    pub hardness: f32,
    pub color: [f32; 4],
}

impl BrushStamp {
    const ATTRS: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
        2 => Float32x2, // center
        3 => Float32,   // radius
        4 => Float32,   // hardness
        5 => Float32x4  // color
    ];

    pub fn new(center: Vec2, radius: f32, color: Color) -> Self {
        Self {
            center: [center.x, center.y],
            radius: radius.max(0.0),
            hardness: 0.5,
            color: [color.r, color.g, color.b, color.a],
        }
    }

    pub fn with_hardness(mut self, hardness: f32) -> Self {
        self.hardness = hardness.clamp(0.0, 1.0);
        self
    }

    /// Per-instance layout for the stamp pipeline.
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<BrushStamp>() as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRS,
        }
    }
}

const STAMP_SIZE: u64 = std::mem::size_of::<BrushStamp>() as u64;

/// Stamp capacity of a freshly allocated brush buffer.
pub const MIN_BRUSH_CAPACITY: usize = 64;

/// Instance count for a draw of `len` stamps.
pub fn stamp_count(len: usize) -> Result<u32, TargetError> {
    u32::try_from(len).map_err(|_| {
        log::error!("{len} stamps do not fit one instanced draw");
        TargetError::TooManyStamps(len)
    })
}

/// Mutable vertex buffer holding the stamps of the current paint operation.
///
/// The buffer only guarantees that a handle exists; contents are whatever the
/// last [`upload`](Self::upload) wrote.
pub struct BrushBuffer<C: GraphicsContext> {
    buffer: C::Buffer,
    capacity: usize,
    len: usize,
}

impl<C: GraphicsContext> BrushBuffer<C> {
    pub fn new(ctx: &C) -> Result<Self, TargetError> {
        let buffer = Self::allocate(ctx, MIN_BRUSH_CAPACITY)?;
        Ok(Self {
            buffer,
            capacity: MIN_BRUSH_CAPACITY,
            len: 0,
        })
    }

    fn allocate(ctx: &C, capacity: usize) -> Result<C::Buffer, TargetError> {
        let desc = BufferDesc::empty(
            "impasto brush stamps",
            BufferUsage::DynamicVertex,
            capacity as u64 * STAMP_SIZE,
        );
        ctx.create_buffer(&desc).ok_or_else(|| {
            log::error!("brush buffer allocation ({capacity} stamps) returned no handle");
            TargetError::ResourceCreation(Resource::BrushBuffer)
        })
    }

    /// Replaces the buffer contents with `stamps`, growing it if needed.
    ///
    /// On growth the new buffer is allocated before the old one is released;
    /// if that allocation fails the previous buffer and contents stay intact.
    pub fn upload(&mut self, ctx: &C, stamps: &[BrushStamp]) -> Result<(), TargetError> {
        stamp_count(stamps.len())?;
        if stamps.len() > self.capacity {
            let capacity = stamps.len().next_power_of_two().max(MIN_BRUSH_CAPACITY);
            let grown = Self::allocate(ctx, capacity)?;
            let old = std::mem::replace(&mut self.buffer, grown);
            ctx.release_buffer(old);
            log::debug!("brush buffer grown {} -> {capacity} stamps", self.capacity);
            self.capacity = capacity;
        }

        if !stamps.is_empty() {
            ctx.write_buffer(&self.buffer, 0, bytemuck::cast_slice(stamps));
        }
        self.len = stamps.len();
        Ok(())
    }

    #[inline]
    pub fn handle(&self) -> &C::Buffer {
        &self.buffer
    }

    /// Stamps written by the last upload.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn release(self, ctx: &C) {
        ctx.release_buffer(self.buffer);
    }
}

impl<C: GraphicsContext> fmt::Debug for BrushBuffer<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrushBuffer")
            .field("len", &self.len)
            .field("capacity", &self.capacity)
            .finish()
    }
}
