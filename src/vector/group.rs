//! Replay groups: one batch builder per geometry category, lazily
//! created, replayed in a fixed global draw order.

use crate::context::DrawContext;
use crate::error::{RenderError, RenderResult};
use crate::extent::Extent;
use crate::vector::feature::FeatureId;
use crate::vector::replay::{PointReplay, VectorReplay};
use glam::Mat4;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// Batch categories. Later categories draw over earlier ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReplayKind {
    Polygon,
    LineString,
    Point,
    Text,
}

/// Global draw order: polygons under lines under points under text.
pub const REPLAY_ORDER: [ReplayKind; 4] = [
    ReplayKind::Polygon,
    ReplayKind::LineString,
    ReplayKind::Point,
    ReplayKind::Text,
];

type ReplayConstructor = fn(f64) -> Box<dyn VectorReplay>;

/// Fixed registry of concrete batch builders. Only the point builder is
/// registered; the other categories are extension points.
fn batch_constructor(kind: ReplayKind) -> Option<ReplayConstructor> {
    match kind {
        ReplayKind::Point => Some(|tolerance| Box::new(PointReplay::new(tolerance))),
        _ => None,
    }
}

/// Owns the batch builders of one build pass. `finish` must be called
/// exactly once, after building and before any `replay`.
pub struct ReplayGroup {
    tolerance: f64,
    replays: HashMap<ReplayKind, Box<dyn VectorReplay>>,
}

impl ReplayGroup {
    pub fn new(tolerance: f64) -> Self {
        Self {
            tolerance,
            replays: HashMap::new(),
        }
    }

    /// The batch builder for `kind`, created on first use with the
    /// group's tolerance. `z_index` is reserved for z-ordered batch
    /// categories and unused by the point-only registry.
    pub fn replay_for(
        &mut self,
        _z_index: f64,
        kind: ReplayKind,
    ) -> RenderResult<&mut dyn VectorReplay> {
        let replay = match self.replays.entry(kind) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let constructor = batch_constructor(kind).ok_or_else(|| {
                    RenderError::unsupported(format!(
                        "no batch builder registered for {kind:?}"
                    ))
                })?;
                entry.insert(constructor(self.tolerance))
            }
        };
        Ok(replay.as_mut())
    }

    /// Upload every contained batch, in unspecified order.
    pub fn finish(&mut self, context: &mut dyn DrawContext) -> RenderResult<()> {
        for replay in self.replays.values_mut() {
            replay.finish(context)?;
        }
        Ok(())
    }

    /// True iff no batch category has ever been requested.
    pub fn is_empty(&self) -> bool {
        self.replays.is_empty()
    }

    /// Replay every batch intersecting `extent`, in [`REPLAY_ORDER`].
    /// Short-circuits on the first batch that returns a result.
    pub fn replay(
        &self,
        context: &mut dyn DrawContext,
        extent: &Extent,
        pixel_ratio: f32,
        transform: Mat4,
        skipped: &[FeatureId],
    ) -> RenderResult<Option<FeatureId>> {
        for kind in REPLAY_ORDER {
            let Some(replay) = self.replays.get(&kind) else {
                continue;
            };
            if !extent.intersects(replay.extent()) {
                continue;
            }
            if let Some(result) = replay.replay(context, pixel_ratio, transform, skipped)? {
                return Ok(Some(result));
            }
        }
        Ok(None)
    }

    #[cfg(test)]
    pub(crate) fn insert_replay(&mut self, kind: ReplayKind, replay: Box<dyn VectorReplay>) {
        self.replays.insert(kind, replay);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::TraceContext;
    use crate::geometry::Geometry;
    use glam::DVec2;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn batches_are_created_lazily() {
        let mut group = ReplayGroup::new(0.5);
        assert!(group.is_empty());

        group.replay_for(0.0, ReplayKind::Point).unwrap();
        assert!(!group.is_empty());
    }

    #[test]
    fn unregistered_kinds_are_unsupported() {
        let mut group = ReplayGroup::new(0.5);
        for kind in [ReplayKind::Polygon, ReplayKind::LineString, ReplayKind::Text] {
            assert!(matches!(
                group.replay_for(0.0, kind),
                Err(RenderError::Unsupported(_))
            ));
        }
        // Failed lookups do not register a batch.
        assert!(group.is_empty());
    }

    #[test]
    fn finish_uploads_every_batch_once() {
        let mut group = ReplayGroup::new(0.5);
        let replay = group.replay_for(0.0, ReplayKind::Point).unwrap();
        replay
            .draw_point_geometry(&Geometry::point(DVec2::new(1.0, 1.0)), FeatureId(1))
            .unwrap();

        let mut ctx = TraceContext::new();
        group.finish(&mut ctx).unwrap();
        assert_eq!(ctx.uploads.len(), 1);
        assert!(matches!(
            group.finish(&mut ctx),
            Err(RenderError::Precondition(_))
        ));
    }

    /// Probe batch that counts replay invocations.
    struct ProbeReplay {
        extent: Extent,
        calls: Rc<Cell<usize>>,
        result: Option<FeatureId>,
    }

    impl VectorReplay for ProbeReplay {
        fn finish(&mut self, _context: &mut dyn DrawContext) -> RenderResult<()> {
            Ok(())
        }

        fn replay(
            &self,
            _context: &mut dyn DrawContext,
            _pixel_ratio: f32,
            _transform: Mat4,
            _skipped: &[FeatureId],
        ) -> RenderResult<Option<FeatureId>> {
            self.calls.set(self.calls.get() + 1);
            Ok(self.result)
        }

        fn extent(&self) -> &Extent {
            &self.extent
        }
    }

    fn probe(extent: Extent, calls: &Rc<Cell<usize>>, result: Option<FeatureId>) -> Box<ProbeReplay> {
        Box::new(ProbeReplay {
            extent,
            calls: Rc::clone(calls),
            result,
        })
    }

    #[test]
    fn replay_culls_batches_outside_the_extent() {
        let mut group = ReplayGroup::new(0.5);
        let near_calls = Rc::new(Cell::new(0));
        let far_calls = Rc::new(Cell::new(0));

        group.insert_replay(
            ReplayKind::Polygon,
            probe(Extent::new(0.0, 0.0, 10.0, 10.0), &near_calls, None),
        );
        group.insert_replay(
            ReplayKind::Point,
            probe(Extent::new(100.0, 100.0, 110.0, 110.0), &far_calls, None),
        );

        let mut ctx = TraceContext::new();
        group
            .replay(
                &mut ctx,
                &Extent::new(0.0, 0.0, 20.0, 20.0),
                1.0,
                Mat4::IDENTITY,
                &[],
            )
            .unwrap();

        assert_eq!(near_calls.get(), 1);
        assert_eq!(far_calls.get(), 0);
    }

    #[test]
    fn replay_short_circuits_on_first_result() {
        let mut group = ReplayGroup::new(0.5);
        let polygon_calls = Rc::new(Cell::new(0));
        let point_calls = Rc::new(Cell::new(0));
        let everywhere = Extent::new(-100.0, -100.0, 100.0, 100.0);

        // Polygon replays before Point; its result stops the pass.
        group.insert_replay(
            ReplayKind::Polygon,
            probe(everywhere, &polygon_calls, Some(FeatureId(7))),
        );
        group.insert_replay(ReplayKind::Point, probe(everywhere, &point_calls, None));

        let mut ctx = TraceContext::new();
        let result = group
            .replay(&mut ctx, &everywhere, 1.0, Mat4::IDENTITY, &[])
            .unwrap();

        assert_eq!(result, Some(FeatureId(7)));
        assert_eq!(polygon_calls.get(), 1);
        assert_eq!(point_calls.get(), 0);
    }
}
