use bytemuck::{Pod, Zeroable};

use crate::gfx::{BufferDesc, BufferUsage, GraphicsContext};
use crate::target::{Resource, TargetError};

/// Interleaved full-screen vertex: NDC position + texture coordinate.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct QuadVertex {
    pub pos: [f32; 2], // -1..1
    pub uv: [f32; 2],  // 0..1, v up
}

impl QuadVertex {
    const ATTRS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
        0 => Float32x2, // pos
        1 => Float32x2  // uv
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// Full-viewport quad in triangle-strip order:
/// bottom-left, bottom-right, top-left, top-right.
pub const FULLSCREEN_QUAD: [QuadVertex; 4] = [
    QuadVertex { pos: [-1.0, -1.0], uv: [0.0, 0.0] },
    QuadVertex { pos: [1.0, -1.0], uv: [1.0, 0.0] },
    QuadVertex { pos: [-1.0, 1.0], uv: [0.0, 1.0] },
    QuadVertex { pos: [1.0, 1.0], uv: [1.0, 1.0] },
];

pub const QUAD_VERTEX_COUNT: u32 = FULLSCREEN_QUAD.len() as u32;

/// Allocates the static full-screen quad used by every blit.
pub fn create_quad_buffer<C: GraphicsContext>(ctx: &C) -> Result<C::Buffer, TargetError> {
    let desc = BufferDesc::with_contents(
        "impasto fullscreen quad",
        BufferUsage::StaticVertex,
        bytemuck::cast_slice(&FULLSCREEN_QUAD),
    );
    ctx.create_buffer(&desc).ok_or_else(|| {
        log::error!("quad buffer allocation returned no handle");
        TargetError::ResourceCreation(Resource::QuadBuffer)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::{Allocation, RecordingContext};

    #[test]
    fn quad_buffer_holds_the_literal_layout() {
        let ctx = RecordingContext::new();
        let buf = create_quad_buffer(&ctx).unwrap();
        let bytes = ctx.buffer_contents(&buf).unwrap();
        assert_eq!(bytes.len(), 64);

        let floats: Vec<f32> = bytes
            .chunks_exact(4)
            .map(|c| f32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        assert_eq!(
            floats,
            [
                -1.0, -1.0, 0.0, 0.0, //
                1.0, -1.0, 1.0, 0.0, //
                -1.0, 1.0, 0.0, 1.0, //
                1.0, 1.0, 1.0, 1.0,
            ]
        );
        assert_eq!(ctx.buffer_usage(&buf), Some(BufferUsage::StaticVertex));
    }

    #[test]
    fn uv_tracks_position() {
        for v in FULLSCREEN_QUAD {
            assert_eq!(v.uv[0], (v.pos[0] + 1.0) * 0.5);
            assert_eq!(v.uv[1], (v.pos[1] + 1.0) * 0.5);
        }
    }

    #[test]
    fn null_allocation_is_a_creation_failure() {
        let ctx = RecordingContext::new();
        ctx.fail_nth(Allocation::Buffer, 0);
        assert_eq!(
            create_quad_buffer(&ctx).unwrap_err(),
            TargetError::ResourceCreation(Resource::QuadBuffer)
        );
    }
}
