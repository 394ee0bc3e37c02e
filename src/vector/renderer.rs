//! Frame orchestration for vector layers: rebuild gating, style
//! evaluation and per-frame replay.
//!
//! The renderer owns a cache of the last successful build (group plus
//! the revision and extent it was built for) and replaces it wholesale;
//! nothing in a build result is mutated in place.

use crate::context::DrawContext;
use crate::error::{RenderError, RenderResult};
use crate::extent::Extent;
use crate::geometry::{Geometry, GeometryKind};
use crate::style::{default_styles, Style, StyleFunction};
use crate::transform::{view_transform, viewport_extent};
use crate::vector::feature::{Feature, FeatureId};
use crate::vector::group::{ReplayGroup, ReplayKind};
use crate::vector::source::FeatureSource;
use glam::DVec2;
use std::collections::BTreeSet;

/// View activity flags for the current frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewHints {
    pub animating: bool,
    pub interacting: bool,
}

/// Per-frame view state, produced fresh every frame and never persisted.
#[derive(Debug, Clone)]
pub struct FrameState {
    pub center: DVec2,
    /// Map units per CSS pixel.
    pub resolution: f64,
    /// View rotation in radians.
    pub rotation: f64,
    pub pixel_ratio: f32,
    /// Viewport size in CSS pixels.
    pub size: [u32; 2],
    pub extent: Extent,
    pub hints: ViewHints,
}

impl FrameState {
    /// Frame for a view, with the extent derived from the view state.
    pub fn for_view(
        center: DVec2,
        resolution: f64,
        rotation: f64,
        pixel_ratio: f32,
        size: [u32; 2],
    ) -> Self {
        Self {
            center,
            resolution,
            rotation,
            pixel_ratio,
            size,
            extent: viewport_extent(center, resolution, rotation, size),
            hints: ViewHints::default(),
        }
    }

    pub fn with_hints(mut self, hints: ViewHints) -> Self {
        self.hints = hints;
        self
    }
}

/// One successful build: the replay group plus the source revision and
/// padded extent it was built for. Replaced atomically on rebuild.
pub struct BuildResult {
    group: ReplayGroup,
    revision: u64,
    extent: Extent,
}

impl BuildResult {
    pub fn group(&self) -> &ReplayGroup {
        &self.group
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn extent(&self) -> &Extent {
        &self.extent
    }
}

/// Simplification tolerance for a build pass: half a device pixel.
pub fn build_tolerance(resolution: f64, pixel_ratio: f32) -> f64 {
    resolution / (2.0 * pixel_ratio as f64)
}

/// Squared half-device-pixel tolerance: finer at high pixel density,
/// coarser when zoomed out.
pub fn squared_tolerance(resolution: f64, pixel_ratio: f32) -> f64 {
    let tolerance = build_tolerance(resolution, pixel_ratio);
    tolerance * tolerance
}

/// Rebuild gate. The cached group is reused only when the source
/// revision is unchanged, the previously built extent contains the frame
/// extent, and no pending image load left the build dirty. While the
/// view is animating or being interacted with, a non-dirty group is kept
/// even if stale, trading transient staleness for frame rate.
pub fn should_rebuild(
    built: Option<&BuildResult>,
    dirty: bool,
    source_revision: u64,
    frame: &FrameState,
) -> bool {
    if !dirty && (frame.hints.animating || frame.hints.interacting) {
        return false;
    }
    let Some(built) = built else {
        return true;
    };
    dirty || built.revision != source_revision || !built.extent.contains(&frame.extent)
}

/// Orchestrates one vector layer: decides when to rebuild the replay
/// group and issues the per-frame draw.
pub struct VectorLayerRenderer {
    style_fn: Option<StyleFunction>,
    geometry_filters: Vec<Box<dyn Fn(&Geometry) -> bool>>,
    skipped: BTreeSet<FeatureId>,
    dirty: bool,
    built: Option<BuildResult>,
}

impl VectorLayerRenderer {
    pub fn new() -> Self {
        Self {
            style_fn: None,
            geometry_filters: Vec::new(),
            skipped: BTreeSet::new(),
            dirty: false,
            built: None,
        }
    }

    pub fn with_style(style_fn: StyleFunction) -> Self {
        let mut renderer = Self::new();
        renderer.style_fn = Some(style_fn);
        renderer
    }

    /// Replace the layer style. Invalidates the cached build.
    pub fn set_style(&mut self, style_fn: Option<StyleFunction>) {
        self.style_fn = style_fn;
        self.built = None;
    }

    /// Add a render-geometry predicate. All predicates must accept a
    /// geometry for its feature to be drawn.
    pub fn add_geometry_filter(&mut self, filter: Box<dyn Fn(&Geometry) -> bool>) {
        self.geometry_filters.push(filter);
    }

    /// Exclude a feature from drawing without rebuilding buffers.
    pub fn skip_feature(&mut self, id: FeatureId) {
        self.skipped.insert(id);
    }

    pub fn unskip_feature(&mut self, id: FeatureId) {
        self.skipped.remove(&id);
    }

    /// True while the last build saw a style image that was still
    /// loading; the next frame will rebuild.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn build_result(&self) -> Option<&BuildResult> {
        self.built.as_ref()
    }

    /// Rebuild the replay group if the frame requires it, feeding every
    /// source feature in the padded view extent through the style
    /// function into the group, then uploading the batches.
    pub fn prepare_frame(
        &mut self,
        frame: &FrameState,
        source: &dyn FeatureSource,
        context: &mut dyn DrawContext,
    ) -> RenderResult<()> {
        let revision = source.revision();
        if !should_rebuild(self.built.as_ref(), self.dirty, revision, frame) {
            return Ok(());
        }

        // Pre-fetch features just outside the viewport so small pans do
        // not pop.
        let padded = frame
            .extent
            .buffered(frame.extent.width() / 4.0, frame.extent.height() / 4.0);

        let mut group = ReplayGroup::new(build_tolerance(frame.resolution, frame.pixel_ratio));
        let tolerance = squared_tolerance(frame.resolution, frame.pixel_ratio);
        let style_fn = self.style_fn.as_deref();

        let mut loading = false;
        let mut failure: Option<RenderError> = None;
        let mut feature_count = 0usize;
        source.for_each_feature_in_extent(&padded, &mut |feature| {
            if failure.is_some() {
                return;
            }
            feature_count += 1;
            let styles = match style_fn {
                Some(style_fn) => style_fn(feature, frame.resolution),
                None => default_styles(),
            };
            for style in &styles {
                match render_feature(&mut group, feature, style, tolerance) {
                    Ok(style_loading) => loading |= style_loading,
                    Err(err) => {
                        failure = Some(err);
                        return;
                    }
                }
            }
        });
        if let Some(err) = failure {
            return Err(err);
        }

        group.finish(context)?;
        log::debug!(
            "rebuilt replay group: {} features at revision {}, loading={}",
            feature_count,
            revision,
            loading
        );

        self.dirty = loading;
        self.built = Some(BuildResult {
            group,
            revision,
            extent: padded,
        });
        Ok(())
    }

    /// Draw the cached group for this frame, excluding explicitly
    /// skipped features and features rejected by the geometry filters.
    pub fn compose_frame(
        &self,
        frame: &FrameState,
        source: &dyn FeatureSource,
        context: &mut dyn DrawContext,
    ) -> RenderResult<Option<FeatureId>> {
        let Some(built) = self.built.as_ref() else {
            return Ok(None);
        };
        if built.group.is_empty() {
            return Ok(None);
        }

        let transform = view_transform(frame.center, frame.resolution, frame.rotation, frame.size);
        let skipped = self.frame_skip_list(&built.extent, source);
        built
            .group
            .replay(context, &frame.extent, frame.pixel_ratio, transform, &skipped)
    }

    /// AND-composition of the geometry filters; no filters means every
    /// geometry is rendered.
    pub fn render_geometry_allowed(&self, geometry: &Geometry) -> bool {
        self.geometry_filters.iter().all(|filter| filter(geometry))
    }

    /// The filter must cover the same feature set the group was built
    /// from, so it runs over the padded built extent, not the frame
    /// extent: features in the padding ring are batched too.
    fn frame_skip_list(&self, built_extent: &Extent, source: &dyn FeatureSource) -> Vec<FeatureId> {
        let mut skipped = self.skipped.clone();
        if !self.geometry_filters.is_empty() {
            source.for_each_feature_in_extent(built_extent, &mut |feature| {
                if !self.render_geometry_allowed(feature.geometry()) {
                    skipped.insert(feature.id());
                }
            });
        }
        skipped.into_iter().collect()
    }
}

impl Default for VectorLayerRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Batch one feature under one style. Returns true when the style
/// references a still-loading image.
fn render_feature(
    group: &mut ReplayGroup,
    feature: &Feature,
    style: &Style,
    squared_tolerance: f64,
) -> RenderResult<bool> {
    let geometry = feature.geometry().simplified(squared_tolerance);
    draw_geometry(group, &geometry, style, feature.id())?;
    Ok(style.image_loading())
}

fn draw_geometry(
    group: &mut ReplayGroup,
    geometry: &Geometry,
    style: &Style,
    feature: FeatureId,
) -> RenderResult<()> {
    match geometry.kind() {
        GeometryKind::Point => {
            let replay = group.replay_for(style.z_index, ReplayKind::Point)?;
            if let Some(image) = &style.image {
                replay.set_image_style(image)?;
            }
            replay.draw_point_geometry(geometry, feature)
        }
        GeometryKind::MultiPoint => {
            let replay = group.replay_for(style.z_index, ReplayKind::Point)?;
            if let Some(image) = &style.image {
                replay.set_image_style(image)?;
            }
            replay.draw_multi_point_geometry(geometry, feature)
        }
        GeometryKind::LineString => {
            let replay = group.replay_for(style.z_index, ReplayKind::LineString)?;
            if let Some(fill_stroke) = &style.fill_stroke {
                replay.set_fill_stroke_style(fill_stroke)?;
            }
            replay.draw_line_string_geometry(geometry, feature)
        }
        GeometryKind::MultiLineString => {
            let replay = group.replay_for(style.z_index, ReplayKind::LineString)?;
            if let Some(fill_stroke) = &style.fill_stroke {
                replay.set_fill_stroke_style(fill_stroke)?;
            }
            replay.draw_multi_line_string_geometry(geometry, feature)
        }
        GeometryKind::Polygon => {
            let replay = group.replay_for(style.z_index, ReplayKind::Polygon)?;
            if let Some(fill_stroke) = &style.fill_stroke {
                replay.set_fill_stroke_style(fill_stroke)?;
            }
            replay.draw_polygon_geometry(geometry, feature)
        }
        GeometryKind::MultiPolygon => {
            let replay = group.replay_for(style.z_index, ReplayKind::Polygon)?;
            if let Some(fill_stroke) = &style.fill_stroke {
                replay.set_fill_stroke_style(fill_stroke)?;
            }
            replay.draw_multi_polygon_geometry(geometry, feature)
        }
        GeometryKind::Circle => {
            let replay = group.replay_for(style.z_index, ReplayKind::Polygon)?;
            if let Some(fill_stroke) = &style.fill_stroke {
                replay.set_fill_stroke_style(fill_stroke)?;
            }
            replay.draw_circle_geometry(geometry, feature)
        }
    }
}
