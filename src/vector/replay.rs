//! Batch builders: accumulate flat coordinates per geometry category and
//! replay them as ranged draw calls against a persistent context.

use crate::context::{BufferId, DrawContext};
use crate::error::{RenderError, RenderResult};
use crate::extent::Extent;
use crate::geometry::Geometry;
use crate::style::{FillStroke, ImageStyle};
use crate::vector::feature::{Feature, FeatureId};
use glam::Mat4;
use std::ops::Range;

/// The shared batching contract. One concrete builder exists per batch
/// category; entry points a category does not implement return
/// [`RenderError::Unsupported`] so capability gaps surface instead of
/// silently dropping geometry.
pub trait VectorReplay {
    fn draw_point_geometry(&mut self, _geometry: &Geometry, _feature: FeatureId) -> RenderResult<()> {
        Err(RenderError::unsupported("point geometry not supported by this batch"))
    }

    fn draw_multi_point_geometry(
        &mut self,
        _geometry: &Geometry,
        _feature: FeatureId,
    ) -> RenderResult<()> {
        Err(RenderError::unsupported("multi-point geometry not supported by this batch"))
    }

    fn draw_line_string_geometry(
        &mut self,
        _geometry: &Geometry,
        _feature: FeatureId,
    ) -> RenderResult<()> {
        Err(RenderError::unsupported("line string geometry not supported by this batch"))
    }

    fn draw_multi_line_string_geometry(
        &mut self,
        _geometry: &Geometry,
        _feature: FeatureId,
    ) -> RenderResult<()> {
        Err(RenderError::unsupported("multi-line string geometry not supported by this batch"))
    }

    fn draw_polygon_geometry(&mut self, _geometry: &Geometry, _feature: FeatureId) -> RenderResult<()> {
        Err(RenderError::unsupported("polygon geometry not supported by this batch"))
    }

    fn draw_multi_polygon_geometry(
        &mut self,
        _geometry: &Geometry,
        _feature: FeatureId,
    ) -> RenderResult<()> {
        Err(RenderError::unsupported("multi-polygon geometry not supported by this batch"))
    }

    fn draw_circle_geometry(&mut self, _geometry: &Geometry, _feature: FeatureId) -> RenderResult<()> {
        Err(RenderError::unsupported("circle geometry not supported by this batch"))
    }

    fn draw_text(&mut self, _geometry: &Geometry, _feature: FeatureId) -> RenderResult<()> {
        Err(RenderError::unsupported("text not supported by this batch"))
    }

    fn draw_feature(&mut self, _feature: &Feature) -> RenderResult<()> {
        Err(RenderError::unsupported("generic feature drawing not supported by this batch"))
    }

    fn set_fill_stroke_style(&mut self, _fill_stroke: &FillStroke) -> RenderResult<()> {
        Err(RenderError::unsupported("fill/stroke style not supported by this batch"))
    }

    fn set_image_style(&mut self, _image: &ImageStyle) -> RenderResult<()> {
        Err(RenderError::unsupported("image style not supported by this batch"))
    }

    fn set_text_style(&mut self) -> RenderResult<()> {
        Err(RenderError::unsupported("text style not supported by this batch"))
    }

    /// Upload the accumulated coordinates to the backend, once.
    fn finish(&mut self, context: &mut dyn DrawContext) -> RenderResult<()>;

    /// Issue draw calls for every contiguous run of not-skipped
    /// coordinates. May return a result to short-circuit group replay
    /// (hit-testing); the point batch always returns `None`.
    fn replay(
        &self,
        context: &mut dyn DrawContext,
        pixel_ratio: f32,
        transform: Mat4,
        skipped: &[FeatureId],
    ) -> RenderResult<Option<FeatureId>>;

    /// Accumulated bounding box of everything drawn into this batch.
    fn extent(&self) -> &Extent;
}

/// Point batch: one flat coordinate buffer for every point feature of a
/// build pass, uploaded once and replayed with run-splitting.
///
/// Skipping works on recorded per-feature index ranges: instead of one
/// draw call per feature, the replay walks the buffer and draws the gaps
/// between skipped ranges, so exclusion costs O(visible runs) and never
/// rebuilds the buffer.
pub struct PointReplay {
    coordinates: Vec<f64>,
    /// Half-open ranges into `coordinates`, in insertion order. A
    /// feature batched under several styles records one range per style;
    /// skipping the feature excludes every one of them.
    ranges: Vec<(FeatureId, Range<usize>)>,
    extent: Extent,
    buffer: Option<BufferId>,
}

impl PointReplay {
    /// `tolerance` is the group's simplification tolerance; points have
    /// nothing to simplify.
    pub fn new(_tolerance: f64) -> Self {
        Self {
            coordinates: Vec::new(),
            ranges: Vec::new(),
            extent: Extent::empty(),
            buffer: None,
        }
    }

    /// Copy every stride-th coordinate pair of `flat_coordinates[offset..end]`
    /// into the buffer; `close` repeats the first pair (ring closure).
    /// Returns the half-open buffer-index range written.
    pub fn append_flat_coordinates(
        &mut self,
        flat_coordinates: &[f64],
        offset: usize,
        end: usize,
        stride: usize,
        close: bool,
    ) -> Range<usize> {
        let start = self.coordinates.len();
        let mut i = offset;
        while i < end {
            self.coordinates.push(flat_coordinates[i]);
            self.coordinates.push(flat_coordinates[i + 1]);
            i += stride;
        }
        if close && end > offset {
            self.coordinates.push(flat_coordinates[offset]);
            self.coordinates.push(flat_coordinates[offset + 1]);
        }
        start..self.coordinates.len()
    }

    fn draw_coordinates(&mut self, geometry: &Geometry, feature: FeatureId) {
        self.extent.extend(&geometry.extent());
        let flat_coordinates = geometry.flat_coordinates();
        let range = self.append_flat_coordinates(
            flat_coordinates,
            0,
            flat_coordinates.len(),
            geometry.stride(),
            false,
        );
        self.ranges.push((feature, range));
    }

    /// Resolve the skip list into sorted, validated buffer ranges,
    /// collecting every range recorded for each skipped id. Unknown ids
    /// are ignored; ranges are sorted defensively rather than trusting
    /// caller order. Adjacent ranges are legitimate (one feature batched
    /// under several styles); true overlap asserts in debug builds and
    /// degrades to an unfiltered draw in release.
    fn skip_ranges(&self, skipped: &[FeatureId]) -> Vec<Range<usize>> {
        let mut ranges: Vec<Range<usize>> = self
            .ranges
            .iter()
            .filter(|(id, _)| skipped.contains(id))
            .map(|(_, range)| range.clone())
            .collect();
        ranges.sort_by_key(|range| range.start);

        let overlapping = ranges
            .windows(2)
            .any(|pair| pair[1].start < pair[0].end);
        if overlapping {
            debug_assert!(false, "overlapping skip ranges");
            log::warn!("overlapping skip ranges, drawing the unfiltered buffer");
            ranges.clear();
        }
        ranges
    }

    pub fn vertex_count(&self) -> usize {
        self.coordinates.len() / 2
    }
}

impl VectorReplay for PointReplay {
    fn draw_point_geometry(&mut self, geometry: &Geometry, feature: FeatureId) -> RenderResult<()> {
        self.draw_coordinates(geometry, feature);
        Ok(())
    }

    fn draw_multi_point_geometry(
        &mut self,
        geometry: &Geometry,
        feature: FeatureId,
    ) -> RenderResult<()> {
        self.draw_coordinates(geometry, feature);
        Ok(())
    }

    /// Points render as uniformly styled GPU primitives, not per-feature
    /// sprites; the image style is accepted and ignored.
    fn set_image_style(&mut self, _image: &ImageStyle) -> RenderResult<()> {
        Ok(())
    }

    fn finish(&mut self, context: &mut dyn DrawContext) -> RenderResult<()> {
        if self.buffer.is_some() {
            return Err(RenderError::precondition(
                "finish called twice on a point batch",
            ));
        }
        let data: Vec<f32> = self.coordinates.iter().map(|&c| c as f32).collect();
        self.buffer = Some(context.upload_vertices("mf.Vector.Point.Vertices", &data));
        Ok(())
    }

    fn replay(
        &self,
        context: &mut dyn DrawContext,
        pixel_ratio: f32,
        transform: Mat4,
        skipped: &[FeatureId],
    ) -> RenderResult<Option<FeatureId>> {
        debug_assert!(self.buffer.is_some(), "replay called before finish");
        let Some(buffer) = self.buffer else {
            log::warn!("replay called before finish, skipping batch");
            return Ok(None);
        };

        context.bind_vertex_buffer(buffer);
        context.set_transform(transform, pixel_ratio);

        let mut current = 0;
        for range in self.skip_ranges(skipped) {
            if range.start > current {
                context.draw_points(
                    (current / 2) as u32,
                    ((range.start - current) / 2) as u32,
                );
            }
            current = range.end;
        }
        if current < self.coordinates.len() {
            context.draw_points(
                (current / 2) as u32,
                ((self.coordinates.len() - current) / 2) as u32,
            );
        }
        Ok(None)
    }

    fn extent(&self) -> &Extent {
        &self.extent
    }
}
