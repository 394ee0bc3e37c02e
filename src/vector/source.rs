//! Feature sources: spatially queryable feature storage.

use crate::extent::Extent;
use crate::geometry::Geometry;
use crate::vector::feature::{Feature, FeatureId};
use rstar::{RTree, RTreeObject, AABB};

/// Read side of a feature store, as consumed by layer renderers during a
/// rebuild. Visitation order is unspecified; reentrant reads are allowed.
pub trait FeatureSource {
    /// Visit every feature whose bounds intersect `extent`.
    fn for_each_feature_in_extent(&self, extent: &Extent, visit: &mut dyn FnMut(&Feature));

    /// Monotonic counter bumped on every mutation. Renderers compare it
    /// against the revision they last built for.
    fn revision(&self) -> u64;
}

#[derive(Debug, Clone)]
struct IndexedFeature {
    feature: Feature,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedFeature {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// In-memory source backed by an R-tree, issuing feature ids from a
/// monotonic counter.
pub struct MemorySource {
    tree: RTree<IndexedFeature>,
    next_id: u64,
    revision: u64,
}

impl MemorySource {
    pub fn new() -> Self {
        Self {
            tree: RTree::new(),
            next_id: 1,
            revision: 0,
        }
    }

    pub fn insert(&mut self, geometry: Geometry) -> FeatureId {
        let id = FeatureId(self.next_id);
        self.next_id += 1;

        let extent = geometry.extent();
        // Degenerate geometries index at the origin.
        let envelope = if extent.is_empty() {
            AABB::from_point([0.0, 0.0])
        } else {
            AABB::from_corners([extent.min.x, extent.min.y], [extent.max.x, extent.max.y])
        };

        self.tree.insert(IndexedFeature {
            feature: Feature::new(id, geometry),
            envelope,
        });
        self.revision += 1;
        id
    }

    pub fn remove(&mut self, id: FeatureId) -> bool {
        let before = self.tree.size();
        let remaining: Vec<IndexedFeature> = self
            .tree
            .iter()
            .filter(|indexed| indexed.feature.id() != id)
            .cloned()
            .collect();
        if remaining.len() == before {
            return false;
        }
        self.tree = RTree::bulk_load(remaining);
        self.revision += 1;
        true
    }

    pub fn clear(&mut self) {
        self.tree = RTree::new();
        self.revision += 1;
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    pub fn feature(&self, id: FeatureId) -> Option<&Feature> {
        self.tree
            .iter()
            .map(|indexed| &indexed.feature)
            .find(|feature| feature.id() == id)
    }
}

impl Default for MemorySource {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureSource for MemorySource {
    fn for_each_feature_in_extent(&self, extent: &Extent, visit: &mut dyn FnMut(&Feature)) {
        if extent.is_empty() {
            return;
        }
        let query = AABB::from_corners([extent.min.x, extent.min.y], [extent.max.x, extent.max.y]);
        for indexed in self.tree.locate_in_envelope_intersecting(&query) {
            visit(&indexed.feature);
        }
    }

    fn revision(&self) -> u64 {
        self.revision
    }
}
