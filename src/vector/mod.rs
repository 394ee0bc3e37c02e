//! Vector replay engine: feature sources, batch builders and the layer
//! renderer that ties them to a frame loop.

pub mod feature;
pub mod group;
pub mod renderer;
pub mod replay;
pub mod source;

// Re-export main types for convenience
pub use feature::{Feature, FeatureId};
pub use group::{ReplayGroup, ReplayKind, REPLAY_ORDER};
pub use renderer::{
    build_tolerance, should_rebuild, squared_tolerance, BuildResult, FrameState,
    VectorLayerRenderer, ViewHints,
};
pub use replay::{PointReplay, VectorReplay};
pub use source::{FeatureSource, MemorySource};
