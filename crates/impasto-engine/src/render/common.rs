//! Shared GPU types and helpers for the compositor pipelines.

use bytemuck::{Pod, Zeroable};

use crate::coords::Viewport;

// ── blend ─────────────────────────────────────────────────────────────────

pub(super) fn premul_alpha_blend() -> wgpu::BlendState {
    let over = wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
        operation: wgpu::BlendOperation::Add,
    };
    wgpu::BlendState { color: over, alpha: over }
}

// ── composite uniform ─────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(super) struct CompositeUniform {
    pub viewport: [f32; 2],
    pub fade: f32,
    pub _pad: f32, // 16-byte alignment
}

impl CompositeUniform {
    pub(super) fn new(viewport: Viewport, fade: f32) -> Self {
        Self {
            viewport: [viewport.width.max(1.0), viewport.height.max(1.0)],
            fade: fade.clamp(0.0, 1.0),
            _pad: 0.0,
        }
    }
}

/// Minimum binding size for the composite uniform buffer.
///
/// `CompositeUniform` is 16 bytes, so the size is non-zero by construction.
pub(super) fn composite_ubo_min_binding_size() -> std::num::NonZeroU64 {
    std::num::NonZeroU64::new(std::mem::size_of::<CompositeUniform>() as u64)
        .expect("CompositeUniform has non-zero size by construction")
}

pub(super) fn strip_primitive() -> wgpu::PrimitiveState {
    wgpu::PrimitiveState {
        topology: wgpu::PrimitiveTopology::TriangleStrip,
        strip_index_format: None,
        front_face: wgpu::FrontFace::Ccw,
        cull_mode: None,
        polygon_mode: wgpu::PolygonMode::Fill,
        unclipped_depth: false,
        conservative: false,
    }
}

pub(super) fn sampler(
    device: &wgpu::Device,
    label: &str,
    filter: wgpu::FilterMode,
) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some(label),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: filter,
        min_filter: filter,
        mipmap_filter: wgpu::MipmapFilterMode::Nearest,
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_is_16_bytes() {
        assert_eq!(std::mem::size_of::<CompositeUniform>(), 16);
        assert_eq!(composite_ubo_min_binding_size().get(), 16);
    }

    #[test]
    fn uniform_clamps_inputs() {
        let u = CompositeUniform::new(Viewport::new(0.0, 300.0), 1.5);
        assert_eq!(u.viewport, [1.0, 300.0]);
        assert_eq!(u.fade, 1.0);
    }
}
