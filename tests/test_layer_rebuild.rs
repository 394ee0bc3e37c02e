// tests/test_layer_rebuild.rs
// Rebuild/reuse gating of the vector layer renderer: revision tracking,
// extent padding, interaction guard and dirty retries.

use glam::DVec2;
use mapforge::{
    FrameState, Geometry, ImageState, ImageStyle, MemorySource, Style, TraceContext,
    VectorLayerRenderer, ViewHints,
};
use std::cell::Cell;
use std::rc::Rc;

fn point_style_fn() -> mapforge::StyleFunction {
    Box::new(|_feature, _resolution| vec![Style::default()])
}

fn centered_frame(center: DVec2) -> FrameState {
    // resolution 1.0, 100x100 px: the frame extent is 100x100 map units.
    FrameState::for_view(center, 1.0, 0.0, 1.0, [100, 100])
}

#[test]
fn clean_frames_reuse_the_cached_group() {
    let mut source = MemorySource::new();
    source.insert(Geometry::point(DVec2::ZERO));

    let mut renderer = VectorLayerRenderer::with_style(point_style_fn());
    let mut ctx = TraceContext::new();
    let frame = centered_frame(DVec2::ZERO);

    renderer.prepare_frame(&frame, &source, &mut ctx).unwrap();
    renderer.prepare_frame(&frame, &source, &mut ctx).unwrap();
    renderer.prepare_frame(&frame, &source, &mut ctx).unwrap();

    assert_eq!(ctx.uploads.len(), 1);
}

#[test]
fn source_mutation_triggers_a_rebuild() {
    let mut source = MemorySource::new();
    source.insert(Geometry::point(DVec2::ZERO));

    let mut renderer = VectorLayerRenderer::with_style(point_style_fn());
    let mut ctx = TraceContext::new();
    let frame = centered_frame(DVec2::ZERO);

    renderer.prepare_frame(&frame, &source, &mut ctx).unwrap();
    source.insert(Geometry::point(DVec2::new(1.0, 1.0)));
    renderer.prepare_frame(&frame, &source, &mut ctx).unwrap();

    assert_eq!(ctx.uploads.len(), 2);
    let built = renderer.build_result().unwrap();
    assert_eq!(built.revision(), source_revision(&source));
}

fn source_revision(source: &MemorySource) -> u64 {
    use mapforge::FeatureSource as _;
    source.revision()
}

#[test]
fn small_pans_stay_inside_the_padded_extent() {
    let mut source = MemorySource::new();
    source.insert(Geometry::point(DVec2::ZERO));

    let mut renderer = VectorLayerRenderer::with_style(point_style_fn());
    let mut ctx = TraceContext::new();

    // Built extent is the frame extent padded by 25% per side:
    // [-75, 75] on both axes.
    renderer
        .prepare_frame(&centered_frame(DVec2::ZERO), &source, &mut ctx)
        .unwrap();
    assert_eq!(ctx.uploads.len(), 1);

    // Pan to (20, 0): frame extent [-30, 70] is still contained.
    renderer
        .prepare_frame(&centered_frame(DVec2::new(20.0, 0.0)), &source, &mut ctx)
        .unwrap();
    assert_eq!(ctx.uploads.len(), 1);

    // Pan to (40, 0): frame extent [-10, 90] escapes; rebuild.
    renderer
        .prepare_frame(&centered_frame(DVec2::new(40.0, 0.0)), &source, &mut ctx)
        .unwrap();
    assert_eq!(ctx.uploads.len(), 2);
}

#[test]
fn interaction_defers_stale_rebuilds() {
    let mut source = MemorySource::new();
    source.insert(Geometry::point(DVec2::ZERO));

    let mut renderer = VectorLayerRenderer::with_style(point_style_fn());
    let mut ctx = TraceContext::new();
    let frame = centered_frame(DVec2::ZERO);

    renderer.prepare_frame(&frame, &source, &mut ctx).unwrap();
    assert_eq!(ctx.uploads.len(), 1);

    // Stale while interacting: the cached group is kept.
    source.insert(Geometry::point(DVec2::new(5.0, 5.0)));
    let interacting = frame.clone().with_hints(ViewHints {
        animating: false,
        interacting: true,
    });
    renderer
        .prepare_frame(&interacting, &source, &mut ctx)
        .unwrap();
    assert_eq!(ctx.uploads.len(), 1);

    // Interaction ends: the deferred rebuild happens.
    renderer.prepare_frame(&frame, &source, &mut ctx).unwrap();
    assert_eq!(ctx.uploads.len(), 2);
}

#[test]
fn loading_images_mark_the_build_dirty_until_loaded() {
    let mut source = MemorySource::new();
    source.insert(Geometry::point(DVec2::ZERO));

    // Style whose icon load completes externally between frames.
    let state = Rc::new(Cell::new(ImageState::Loading));
    let style_state = Rc::clone(&state);
    let style_fn: mapforge::StyleFunction = Box::new(move |_feature, _resolution| {
        vec![Style {
            image: Some(ImageStyle::new("marker.png").with_state(style_state.get())),
            ..Style::default()
        }]
    });

    let mut renderer = VectorLayerRenderer::with_style(style_fn);
    let mut ctx = TraceContext::new();
    let frame = centered_frame(DVec2::ZERO);

    renderer.prepare_frame(&frame, &source, &mut ctx).unwrap();
    assert!(renderer.is_dirty());
    assert_eq!(ctx.uploads.len(), 1);

    // Still loading: the dirty group rebuilds every frame.
    renderer.prepare_frame(&frame, &source, &mut ctx).unwrap();
    assert!(renderer.is_dirty());
    assert_eq!(ctx.uploads.len(), 2);

    // Load completed: one more rebuild clears the flag, then rest.
    state.set(ImageState::Loaded);
    renderer.prepare_frame(&frame, &source, &mut ctx).unwrap();
    assert!(!renderer.is_dirty());
    assert_eq!(ctx.uploads.len(), 3);

    renderer.prepare_frame(&frame, &source, &mut ctx).unwrap();
    assert_eq!(ctx.uploads.len(), 3);
}

#[test]
fn unsupported_geometry_surfaces_an_error() {
    let mut source = MemorySource::new();
    source.insert(Geometry::line_string(&[DVec2::ZERO, DVec2::new(1.0, 1.0)]));

    let mut renderer = VectorLayerRenderer::with_style(point_style_fn());
    let mut ctx = TraceContext::new();
    let frame = centered_frame(DVec2::ZERO);

    let result = renderer.prepare_frame(&frame, &source, &mut ctx);
    assert!(matches!(
        result,
        Err(mapforge::RenderError::Unsupported(_))
    ));
}
