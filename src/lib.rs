//! mapforge: a vector map rendering engine.
//!
//! Converts geometry + style into GPU-friendly vertex buffers, groups
//! draw calls by z-order and geometry category, and replays them against
//! a persistent graphics context frame after frame. Features can be
//! skipped at replay time (filtering, hit-testing, hover) without
//! rebuilding buffers.
//!
//! Tile fetching, projection math, feature-format parsing and DOM
//! concerns are the embedding application's job; this crate consumes
//! them through narrow seams: a [`vector::FeatureSource`], a
//! [`style::StyleFunction`] and a [`context::DrawContext`].

pub mod context;
pub mod error;
pub mod extent;
pub mod geometry;
pub mod gpu;
pub mod style;
pub mod transform;
pub mod vector;

pub use context::{BufferId, DrawContext, PointPipeline, TraceContext};
pub use error::{RenderError, RenderResult};
pub use extent::Extent;
pub use geometry::{Geometry, GeometryKind};
pub use style::{FillStroke, ImageState, ImageStyle, Style, StyleFunction};
pub use transform::{view_transform, viewport_extent};
pub use vector::{
    Feature, FeatureId, FeatureSource, FrameState, MemorySource, PointReplay, ReplayGroup,
    ReplayKind, VectorLayerRenderer, VectorReplay, ViewHints,
};
