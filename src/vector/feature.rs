//! Features: identified geometry records handed out by a source.

use crate::geometry::Geometry;

/// Stable feature identity, issued monotonically by the owning source.
/// Batch builders key their per-feature index ranges on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FeatureId(pub u64);

#[derive(Debug, Clone)]
pub struct Feature {
    id: FeatureId,
    geometry: Geometry,
}

impl Feature {
    pub fn new(id: FeatureId, geometry: Geometry) -> Self {
        Self { id, geometry }
    }

    pub fn id(&self) -> FeatureId {
        self.id
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }
}
