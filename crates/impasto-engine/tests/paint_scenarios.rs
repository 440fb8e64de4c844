use impasto_engine::coords::Vec2;
use impasto_engine::geometry::{
    create_quad_buffer, BrushStamp, Stroke, FULLSCREEN_QUAD, MAX_STAMPS_PER_SEGMENT,
};
use impasto_engine::gfx::{
    describe_status, Allocation, GraphicsContext, RecordingContext, TargetStatus,
};
use impasto_engine::paint::Color;
use impasto_engine::pipeline::AccumulationPass;
use impasto_engine::target::{Resource, Slot};
use impasto_engine::{PaintPipeline, TargetConfig, TargetError};

fn no_draw(_: &AccumulationPass<'_, RecordingContext>) -> Result<(), TargetError> {
    Ok(())
}

fn floats(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|c| f32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

#[test]
fn quad_buffer_holds_strip_literal() {
    let ctx = RecordingContext::new();
    let quad = create_quad_buffer(&ctx).unwrap();

    let bytes = ctx.buffer_contents(&quad).unwrap();
    assert_eq!(bytes.len(), 64);
    assert_eq!(
        floats(&bytes),
        vec![-1.0, -1.0, 0.0, 0.0, 1.0, -1.0, 1.0, 0.0, -1.0, 1.0, 0.0, 1.0, 1.0, 1.0, 1.0, 1.0]
    );
    assert_eq!(FULLSCREEN_QUAD.len(), 4);
    ctx.release_buffer(quad);
}

#[test]
fn unknown_status_decodes_to_decimal() {
    assert_eq!(describe_status(0x9999), "Unknown status: 39321");
    assert_eq!(TargetStatus(0x9999).to_string(), "Unknown status: 39321");
    assert!(!describe_status(TargetStatus::INCOMPLETE_DIMENSIONS.code()).starts_with("Unknown"));
}

#[test]
fn two_passes_alternate_roles() {
    let ctx = RecordingContext::new();
    let mut pipeline = PaintPipeline::new(&ctx, TargetConfig::new(320, 240)).unwrap();
    assert_eq!(pipeline.front().slot(), Slot::A);

    pipeline.paint(&ctx, &[], no_draw).unwrap();
    assert_eq!(pipeline.front().slot(), Slot::B);

    pipeline.paint(&ctx, &[], no_draw).unwrap();
    assert_eq!(pipeline.front().slot(), Slot::A);

    pipeline.release(&ctx);
    assert_eq!(ctx.live_total(), 0);
}

#[test]
fn stroke_stamps_flow_into_brush_buffer() {
    let ctx = RecordingContext::new();
    let mut pipeline = PaintPipeline::new(&ctx, TargetConfig::new(200, 200)).unwrap();

    let mut stroke = Stroke::new(8.0, Color::from_straight(1.0, 0.0, 0.0, 1.0)).with_spacing(0.5);
    let mut stamps = Vec::new();
    stroke.begin(Vec2::new(10.0, 10.0), &mut stamps);
    stroke.extend_to(Vec2::new(50.0, 10.0), &mut stamps);
    stroke.end();
    // One stamp at the start, then every 4px along 40px.
    assert_eq!(stamps.len(), 11);

    let mut drawn = 0;
    pipeline
        .paint(&ctx, &stamps, |pass| {
            drawn = pass.stamp_count;
            Ok::<_, TargetError>(())
        })
        .unwrap();
    assert_eq!(drawn, 11);

    let bytes = ctx.buffer_contents(pipeline.brush().handle()).unwrap();
    let expected: &[u8] = bytemuck::cast_slice(&stamps);
    assert_eq!(&bytes[..expected.len()], expected);

    pipeline.release(&ctx);
}

#[test]
fn incomplete_targets_are_reported_and_nothing_leaks() {
    let ctx = RecordingContext::new();
    ctx.force_status(Some(TargetStatus::UNSUPPORTED));

    let err = PaintPipeline::new(&ctx, TargetConfig::new(64, 64)).unwrap_err();
    match err {
        TargetError::TargetIncomplete { status, ref description, .. } => {
            assert_eq!(status, TargetStatus::UNSUPPORTED);
            assert_eq!(description, &describe_status(TargetStatus::UNSUPPORTED.code()));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(ctx.live_total(), 0);
}

#[test]
fn every_allocation_failure_rolls_back() {
    let cases = [
        (Allocation::Buffer, 0, Resource::QuadBuffer),
        (Allocation::Buffer, 1, Resource::BrushBuffer),
        (Allocation::Texture, 0, Resource::ColorTexture),
        (Allocation::Texture, 1, Resource::ColorTexture),
        (Allocation::Framebuffer, 0, Resource::Framebuffer),
        (Allocation::Framebuffer, 1, Resource::Framebuffer),
    ];

    for (kind, n, resource) in cases {
        let ctx = RecordingContext::new();
        ctx.fail_nth(kind, n);
        let err = PaintPipeline::new(&ctx, TargetConfig::new(32, 32)).unwrap_err();
        assert_eq!(err, TargetError::ResourceCreation(resource), "{kind:?} #{n}");
        assert_eq!(ctx.live_total(), 0, "{kind:?} #{n} leaked");
    }
}

#[test]
fn failed_resize_keeps_painting() {
    let ctx = RecordingContext::new();
    let mut pipeline = PaintPipeline::new(&ctx, TargetConfig::new(64, 64)).unwrap();
    pipeline.paint(&ctx, &[], no_draw).unwrap();

    ctx.fail_nth(Allocation::Texture, 3);
    assert!(pipeline.resize(&ctx, 128, 128).is_err());
    assert_eq!(pipeline.config().width, 64);

    let stamp = BrushStamp::new(Vec2::new(4.0, 4.0), 2.0, Color::from_premul(0.0, 0.5, 0.0, 0.5));
    assert_eq!(pipeline.paint(&ctx, &[stamp], no_draw).unwrap(), 2);

    pipeline.release(&ctx);
    assert_eq!(ctx.live_total(), 0);
}

#[test]
fn pointer_jump_across_the_canvas_stays_bounded() {
    let ctx = RecordingContext::new();
    let mut pipeline = PaintPipeline::new(&ctx, TargetConfig::new(64, 64)).unwrap();

    let mut stroke = Stroke::new(2.0, Color::from_straight(0.0, 0.0, 0.0, 1.0));
    let mut stamps = Vec::new();
    stroke.begin(Vec2::zero(), &mut stamps);
    stroke.extend_to(Vec2::new(3.0e7, 0.0), &mut stamps);
    assert_eq!(stamps.len(), 1 + MAX_STAMPS_PER_SEGMENT);

    assert_eq!(pipeline.paint(&ctx, &stamps, no_draw).unwrap(), 1);
    assert_eq!(pipeline.brush().len(), stamps.len());
    assert_eq!(pipeline.brush().capacity(), 8192);

    pipeline.release(&ctx);
}

#[test]
fn failing_draw_leaves_the_pair_untouched() {
    let ctx = RecordingContext::new();
    let mut pipeline = PaintPipeline::new(&ctx, TargetConfig::new(32, 32)).unwrap();
    let front = *pipeline.front_texture();

    let err = pipeline
        .paint(&ctx, &[], |pass| Err(TargetError::TooManyStamps(pass.stamps.len())))
        .unwrap_err();
    assert_eq!(err, TargetError::TooManyStamps(0));
    assert_eq!(pipeline.front().slot(), Slot::A);
    assert_eq!(*pipeline.front_texture(), front);
    assert_eq!(pipeline.passes(), 0);

    pipeline.release(&ctx);
}
