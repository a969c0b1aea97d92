//! Render options: the resolved style values handed to shape renderers, and
//! the sparse per-layer overrides merged over the engine defaults.
//!
//! Layers are homogeneous, so a flat override bag is effectively per-type:
//! only the fields relevant to the layer's kind have any effect.

#[cfg(test)]
#[path = "options_test.rs"]
mod options_test;

use serde::{Deserialize, Serialize};

use crate::consts::KEYPOINT_MIN_CONFIDENCE;
use crate::model::Scale;

/// Resolved style values for one layer's draw call.
///
/// Produced by merging [`LayerOptions`] over the engine's base options via
/// [`RenderOptions::merged`]. Shape renderers read only the fields relevant
/// to their kind.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    /// Item color (CSS color string), unless overridden per item.
    pub color: String,
    /// Logical pixels per normalized unit.
    pub scale: Scale,
    /// Device pixel ratio, applied at draw time only.
    pub dpr: f64,
    /// Outline width in logical pixels (boxes, masks, pose edges).
    pub stroke_width: f64,
    /// Fill alpha for boxes and masks, in `[0, 1]`.
    pub fill_opacity: f64,
    /// Point marker radius in logical pixels.
    pub point_radius: f64,
    /// Pose keypoint dot radius in logical pixels.
    pub keypoint_radius: f64,
    /// Minimum keypoint confidence for drawing pose joints and edges.
    pub min_confidence: f64,
    /// Whether to draw item labels.
    pub show_labels: bool,
    /// Label font size in logical pixels.
    pub font_px: f64,
}

impl RenderOptions {
    /// Base options shared by every layer in a frame, before per-layer
    /// overrides.
    #[must_use]
    pub fn base(color: &str, scale: Scale, dpr: f64) -> Self {
        Self {
            color: color.to_owned(),
            scale,
            dpr,
            stroke_width: 2.0,
            fill_opacity: 0.15,
            point_radius: 6.0,
            keypoint_radius: 4.0,
            min_confidence: KEYPOINT_MIN_CONFIDENCE,
            show_labels: true,
            font_px: 12.0,
        }
    }

    /// Merge a layer's color and sparse option overrides over these options.
    ///
    /// Unset override fields inherit the base value; set fields win.
    #[must_use]
    pub fn merged(&self, color: Option<&str>, overrides: Option<&LayerOptions>) -> Self {
        let mut out = self.clone();
        if let Some(color) = color {
            out.color = color.to_owned();
        }
        let Some(o) = overrides else {
            return out;
        };
        if let Some(v) = o.stroke_width {
            out.stroke_width = v;
        }
        if let Some(v) = o.fill_opacity {
            out.fill_opacity = v;
        }
        if let Some(v) = o.point_radius {
            out.point_radius = v;
        }
        if let Some(v) = o.keypoint_radius {
            out.keypoint_radius = v;
        }
        if let Some(v) = o.min_confidence {
            out.min_confidence = v;
        }
        if let Some(v) = o.show_labels {
            out.show_labels = v;
        }
        if let Some(v) = o.font_px {
            out.font_px = v;
        }
        out
    }
}

/// Sparse per-layer render-option overrides. Only present fields replace
/// the engine defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LayerOptions {
    /// Outline width in logical pixels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
    /// Fill alpha for boxes and masks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_opacity: Option<f64>,
    /// Point marker radius in logical pixels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub point_radius: Option<f64>,
    /// Pose keypoint dot radius in logical pixels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keypoint_radius: Option<f64>,
    /// Minimum keypoint confidence for pose joints and edges.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_confidence: Option<f64>,
    /// Whether to draw item labels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_labels: Option<bool>,
    /// Label font size in logical pixels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_px: Option<f64>,
}
