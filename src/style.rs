//! Layer styling inputs consumed during batch building.
//!
//! Styles are plain data; evaluating them against features is the layer
//! renderer's job. Image resources load outside the engine; a style
//! only reports its load state, and a `Loading` state marks the build
//! dirty so a later frame retries.

use crate::vector::Feature;
use serde::{Deserialize, Serialize};

/// Load state of an external image resource referenced by a style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageState {
    Idle,
    Loading,
    Loaded,
    Error,
}

/// Icon/sprite style. Loading is handled by the embedding application;
/// the engine only inspects `state`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageStyle {
    /// Resource identifier (URL or atlas key).
    pub src: String,
    pub state: ImageState,
    /// Scale factor applied to the source image.
    pub scale: f32,
}

impl ImageStyle {
    pub fn new(src: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            state: ImageState::Idle,
            scale: 1.0,
        }
    }

    pub fn with_state(mut self, state: ImageState) -> Self {
        self.state = state;
        self
    }
}

/// Fill and stroke colors for area and line styles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillStroke {
    /// RGBA fill color
    pub fill_color: [f32; 4],
    /// RGBA stroke color
    pub stroke_color: [f32; 4],
    /// Stroke width in pixels
    pub stroke_width: f32,
}

impl Default for FillStroke {
    fn default() -> Self {
        Self {
            fill_color: [0.2, 0.4, 0.8, 1.0],
            stroke_color: [0.0, 0.0, 0.0, 1.0],
            stroke_width: 1.0,
        }
    }
}

/// One style entry produced by a style function. A feature may carry
/// several; each is dispatched into the replay group separately.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Style {
    /// Draw priority within a batch category.
    pub z_index: f64,
    pub fill_stroke: Option<FillStroke>,
    pub image: Option<ImageStyle>,
    /// Point diameter in CSS pixels.
    pub point_size: f32,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            z_index: 0.0,
            fill_stroke: Some(FillStroke::default()),
            image: None,
            point_size: 4.0,
        }
    }
}

impl Style {
    /// True while this style references an image that is still loading.
    pub fn image_loading(&self) -> bool {
        matches!(
            self.image.as_ref().map(|image| image.state),
            Some(ImageState::Loading)
        )
    }
}

/// Per-feature style evaluation at a given resolution. An empty result
/// excludes the feature from rendering; that is not an error.
pub type StyleFunction = Box<dyn Fn(&Feature, f64) -> Vec<Style>>;

/// Fallback styling for layers that define no style function.
pub fn default_styles() -> Vec<Style> {
    vec![Style::default()]
}
