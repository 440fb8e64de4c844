use wgpu::util::DeviceExt;

use crate::geometry::{BrushStamp, QuadVertex, QUAD_VERTEX_COUNT};
use crate::gfx::{WgpuContext, WgpuTexture};
use crate::paint::Color;
use crate::pipeline::{AccumulationPass, PresentSource};
use crate::target::PingPong;

use super::common::{
    composite_ubo_min_binding_size, premul_alpha_blend, sampler, strip_primitive,
    CompositeUniform,
};
use super::ctx::SurfaceTarget;
use super::error::DrawError;

/// Compositor tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompositorConfig {
    /// Multiplier applied to the previous image on every accumulation pass.
    /// `1.0` keeps strokes forever; lower values fade them out.
    pub fade: f32,
    /// Color used by `clear_targets`.
    pub clear_color: Color,
    /// Color behind the painting when presenting.
    pub background: Color,
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self {
            fade: 1.0,
            clear_color: Color::transparent(),
            background: Color::from_straight(0.08, 0.08, 0.09, 1.0),
        }
    }
}

/// Draws accumulation passes and the presentation blit with wgpu.
///
/// Accumulation is two draws into the back target:
/// 1. the front image through the full-screen quad, scaled by `fade`
/// 2. every uploaded brush stamp as an instanced soft disc (premultiplied over)
///
/// Presentation blits the front texture onto the surface over `background`.
/// The present pipeline is built lazily and rebuilt when the surface format changes.
///
/// Every pass records its own stamp copy and uniform buffer into the encoder,
/// so several passes may share one submit.
pub struct BrushCompositor {
    config: CompositorConfig,
    target_format: wgpu::TextureFormat,

    bind_group_layout: wgpu::BindGroupLayout,
    feedback_sampler: wgpu::Sampler,
    present_sampler: wgpu::Sampler,

    feedback_pipeline: wgpu::RenderPipeline,
    stamp_pipeline: wgpu::RenderPipeline,

    present_format: Option<wgpu::TextureFormat>,
    present_pipeline: Option<wgpu::RenderPipeline>,
}

impl BrushCompositor {
    /// Builds the accumulation pipelines for targets of `target_format`.
    pub fn new(
        ctx: &WgpuContext,
        target_format: wgpu::TextureFormat,
        config: CompositorConfig,
    ) -> Self {
        let device = ctx.device();
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("impasto composite shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/composite.wgsl").into()),
        });

        let bgl = wgpu::BindGroupLayoutDescriptor {
            label: Some("impasto composite bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: Some(composite_ubo_min_binding_size()),
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        };
        let bind_group_layout = device.create_bind_group_layout(&bgl);

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("impasto composite pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let feedback_pipeline = build_pipeline(
            device,
            &layout,
            &shader,
            PipelineDesc {
                label: "impasto feedback pipeline",
                vs: "vs_blit",
                fs: "fs_feedback",
                format: target_format,
                blend: None,
                instanced: false,
            },
        );
        let stamp_pipeline = build_pipeline(
            device,
            &layout,
            &shader,
            PipelineDesc {
                label: "impasto stamp pipeline",
                vs: "vs_stamp",
                fs: "fs_stamp",
                format: target_format,
                blend: Some(premul_alpha_blend()),
                instanced: true,
            },
        );

        log::debug!("BrushCompositor: pipelines built for {target_format:?}");

        let feedback_sampler =
            sampler(device, "impasto feedback sampler", wgpu::FilterMode::Nearest);
        let present_sampler = sampler(device, "impasto present sampler", wgpu::FilterMode::Linear);

        Self {
            config,
            target_format,
            feedback_sampler,
            present_sampler,
            bind_group_layout,
            feedback_pipeline,
            stamp_pipeline,
            present_format: None,
            present_pipeline: None,
        }
    }

    pub fn config(&self) -> &CompositorConfig {
        &self.config
    }

    pub fn set_fade(&mut self, fade: f32) {
        self.config.fade = fade.clamp(0.0, 1.0);
    }

    pub fn target_format(&self) -> wgpu::TextureFormat {
        self.target_format
    }

    /// Records one accumulation pass: stamp copy, feedback copy, brush stamps.
    ///
    /// The stamps are copied into the brush buffer through `encoder`, so each
    /// pass draws its own stamps even when several passes share one submit.
    /// Nothing is recorded when the back target cannot be drawn into.
    /// Depth attachments, if any, are not used.
    pub fn accumulate(
        &self,
        ctx: &WgpuContext,
        encoder: &mut wgpu::CommandEncoder,
        pass: &AccumulationPass<'_, WgpuContext>,
    ) -> Result<(), DrawError> {
        let fb = pass.target.framebuffer();
        let Some(color_view) = fb.color_view() else {
            log::error!("BrushCompositor: {} has no color attachment", fb.label());
            return Err(DrawError::MissingColorAttachment { label: fb.label().to_string() });
        };
        if fb.color_format() != Some(self.target_format) {
            log::error!(
                "BrushCompositor: {} is {:?}, pipelines expect {:?}",
                fb.label(),
                fb.color_format(),
                self.target_format
            );
            return Err(DrawError::FormatMismatch {
                label: fb.label().to_string(),
                found: fb.color_format(),
                expected: self.target_format,
            });
        }

        let stamp_bytes = std::mem::size_of_val(pass.stamps) as u64;
        if stamp_bytes > 0 {
            let staging = ctx.device().create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("impasto stamp staging"),
                contents: bytemuck::cast_slice(pass.stamps),
                usage: wgpu::BufferUsages::COPY_SRC,
            });
            encoder.copy_buffer_to_buffer(&staging, 0, pass.brush.raw(), 0, stamp_bytes);
        }

        let uniform = CompositeUniform::new(pass.viewport, self.config.fade);
        let ubo = uniform_buffer(ctx, "impasto accumulate ubo", &uniform);
        let bind_group = self.bind_source(
            ctx,
            "impasto accumulate bind group",
            &ubo,
            pass.source.texture(),
            &self.feedback_sampler,
        );

        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("impasto accumulate pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_bind_group(0, &bind_group, &[]);
        rpass.set_vertex_buffer(0, pass.quad.raw().slice(..));

        rpass.set_pipeline(&self.feedback_pipeline);
        rpass.draw(0..QUAD_VERTEX_COUNT, 0..1);

        if pass.stamp_count > 0 {
            rpass.set_pipeline(&self.stamp_pipeline);
            rpass.set_vertex_buffer(1, pass.brush.raw().slice(..stamp_bytes));
            rpass.draw(0..QUAD_VERTEX_COUNT, 0..pass.stamp_count);
        }
        Ok(())
    }

    /// Blits the front image onto the surface.
    pub fn present(
        &mut self,
        ctx: &WgpuContext,
        target: &mut SurfaceTarget<'_>,
        source: &PresentSource<'_, WgpuContext>,
    ) {
        self.ensure_present_pipeline(ctx, target.format);
        let Some(pipeline) = self.present_pipeline.as_ref() else { return };

        let uniform = CompositeUniform::new(source.viewport, 1.0);
        let ubo = uniform_buffer(ctx, "impasto present ubo", &uniform);
        let bind_group = self.bind_source(
            ctx,
            "impasto present bind group",
            &ubo,
            source.texture,
            &self.present_sampler,
        );

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("impasto present pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(self.config.background.to_wgpu()),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_pipeline(pipeline);
        rpass.set_bind_group(0, &bind_group, &[]);
        rpass.set_vertex_buffer(0, source.quad.raw().slice(..));
        rpass.draw(0..QUAD_VERTEX_COUNT, 0..1);
    }

    /// Clears both targets of the pair to `clear_color`.
    pub fn clear_targets(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        targets: &PingPong<WgpuContext>,
    ) {
        let clear = self.config.clear_color.to_wgpu();
        for target in targets.targets() {
            let fb = target.framebuffer();
            let Some(view) = fb.color_view() else { continue };
            // Load op does the work; the pass records no draws.
            let _ = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("impasto clear pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
        }
        log::debug!("BrushCompositor: cleared both targets");
    }

    fn ensure_present_pipeline(&mut self, ctx: &WgpuContext, format: wgpu::TextureFormat) {
        if self.present_format == Some(format) && self.present_pipeline.is_some() {
            return;
        }
        let device = ctx.device();
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("impasto present shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/composite.wgsl").into()),
        });
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("impasto present pipeline layout"),
            bind_group_layouts: &[&self.bind_group_layout],
            immediate_size: 0,
        });
        let pipeline = build_pipeline(
            device,
            &layout,
            &shader,
            PipelineDesc {
                label: "impasto present pipeline",
                vs: "vs_blit",
                fs: "fs_present",
                format,
                blend: Some(premul_alpha_blend()),
                instanced: false,
            },
        );

        log::debug!("BrushCompositor: present pipeline built for {format:?}");
        self.present_format = Some(format);
        self.present_pipeline = Some(pipeline);
    }

    fn bind_source(
        &self,
        ctx: &WgpuContext,
        label: &str,
        ubo: &wgpu::Buffer,
        texture: &WgpuTexture,
        sampler: &wgpu::Sampler,
    ) -> wgpu::BindGroup {
        ctx.device().create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: ubo.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(texture.view()),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        })
    }
}

struct PipelineDesc<'a> {
    label: &'a str,
    vs: &'a str,
    fs: &'a str,
    format: wgpu::TextureFormat,
    blend: Option<wgpu::BlendState>,
    instanced: bool,
}

fn build_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    desc: PipelineDesc<'_>,
) -> wgpu::RenderPipeline {
    let quad_only = [QuadVertex::layout()];
    let quad_and_stamps = [QuadVertex::layout(), BrushStamp::layout()];
    let buffers: &[wgpu::VertexBufferLayout<'_>] =
        if desc.instanced { &quad_and_stamps } else { &quad_only };

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(desc.label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some(desc.vs),
            compilation_options: Default::default(),
            buffers,
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some(desc.fs),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: desc.format,
                blend: desc.blend,
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: strip_primitive(),
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    })
}

fn uniform_buffer(ctx: &WgpuContext, label: &str, uniform: &CompositeUniform) -> wgpu::Buffer {
    ctx.device().create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::bytes_of(uniform),
        usage: wgpu::BufferUsages::UNIFORM,
    })
}
