//! Overlay vocabulary: shape kinds, item payloads, and the layer envelope.
//!
//! This module defines the data types shared by the renderer and the hit
//! tester. All stored geometry is normalized to `[0, 1]` of the media's
//! natural dimensions; pixel coordinates exist only at draw/hit time.
//!
//! Data flows into this layer from the host UI (JSON deserialization of
//! upstream detection/annotation output, or direct construction). The engine
//! never mutates layers or items — every update is a wholesale snapshot
//! replacement, and callers must not mutate submitted data in place because
//! the renderer and hit tester share the same snapshot by reference.

#[cfg(test)]
#[path = "model_test.rs"]
mod model_test;

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use web_sys::CanvasRenderingContext2d;

use crate::consts::{MASK_MIN_VERTICES, POSE_KEYPOINT_COUNT};
use crate::options::{LayerOptions, RenderOptions};

/// Logical pixels per normalized unit on each axis — the rendering
/// surface's logical (CSS pixel) size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Scale {
    pub x: f64,
    pub y: f64,
}

impl Scale {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A normalized 2D coordinate: fractions of the media's natural size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Normalized axis-aligned bounding rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BBox {
    #[must_use]
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }
}

impl From<[f64; 4]> for BBox {
    fn from(v: [f64; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

/// One pose joint with its detection confidence in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub x: f64,
    pub y: f64,
    pub confidence: f64,
}

impl Keypoint {
    #[must_use]
    pub fn new(x: f64, y: f64, confidence: f64) -> Self {
        Self { x, y, confidence }
    }
}

/// A detection bounding box with an optional class label and confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxItem {
    pub bbox: BBox,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Detection confidence in `[0, 1]`, shown as a rounded percentage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

/// A pose skeleton over the COCO 17-keypoint layout (nose, eyes, ears,
/// shoulders, elbows, wrists, hips, knees, ankles). Undetected joints are
/// `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseItem {
    pub keypoints: Vec<Option<Keypoint>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl PoseItem {
    /// Whether the keypoint list is complete enough to draw or hit-test.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.keypoints.len() >= POSE_KEYPOINT_COUNT
    }
}

/// A segmentation region described by a single closed simple polygon.
///
/// Self-intersecting polygons are not handled specially: containment is
/// still evaluated by the even-odd rule, but their visual meaning is
/// undefined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaskItem {
    pub polygon: Vec<Point>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl MaskItem {
    /// Whether the polygon has enough vertices to draw or hit-test.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.polygon.len() >= MASK_MIN_VERTICES
    }
}

/// A point-of-interest marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointItem {
    pub point: Point,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Draw radius override in logical pixels; hit-testing keeps its own
    /// radius regardless.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
}

/// Opaque payload for caller-drawn layers. The engine never interprets it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomItem {
    #[serde(default)]
    pub data: serde_json::Value,
}

/// The shape kind tag shared by layers and items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Box,
    Pose,
    Mask,
    Point,
    Custom,
}

/// An overlay item's geometry payload, one variant per shape kind.
///
/// Both the draw dispatcher and the hit-test dispatcher match exhaustively
/// on this enum, so adding a kind fails to compile until both handle it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum OverlayShape {
    Box(BoxItem),
    Pose(PoseItem),
    Mask(MaskItem),
    Point(PointItem),
    Custom(CustomItem),
}

impl OverlayShape {
    /// The kind tag for this payload.
    #[must_use]
    pub fn kind(&self) -> ShapeKind {
        match self {
            Self::Box(_) => ShapeKind::Box,
            Self::Pose(_) => ShapeKind::Pose,
            Self::Mask(_) => ShapeKind::Mask,
            Self::Point(_) => ShapeKind::Point,
            Self::Custom(_) => ShapeKind::Custom,
        }
    }
}

/// One overlay annotation: a shared envelope plus a kind-specific payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayItem {
    /// Stable identifier used for hover correlation and hit results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Per-item color override (CSS color string).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Optional start of the item's display window. The engine stores the
    /// bound but never filters by it; interpretation is the caller's.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<f64>,
    /// Optional end of the item's display window, same contract as `start`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<f64>,
    /// Kind-specific geometry.
    #[serde(flatten)]
    pub shape: OverlayShape,
}

impl OverlayItem {
    /// Wrap a payload with no id, color, or time bounds.
    #[must_use]
    pub fn new(shape: OverlayShape) -> Self {
        Self { id: None, color: None, start: None, end: None, shape }
    }

    /// Whether `t` falls inside the item's `[start, end]` window (bounds
    /// inclusive; missing bounds are open).
    #[must_use]
    pub fn active_at(&self, t: f64) -> bool {
        self.start.is_none_or(|s| t >= s) && self.end.is_none_or(|e| t <= e)
    }
}

/// Caller-supplied draw function for custom-kind layers.
///
/// Receives the 2D context, the layer's (budget-truncated) items, and the
/// layer's resolved render options. Cloning is shallow — the function is
/// shared.
#[derive(Clone)]
pub struct CustomDraw(Rc<dyn Fn(&CanvasRenderingContext2d, &[OverlayItem], &RenderOptions)>);

impl CustomDraw {
    /// Wrap a draw function.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&CanvasRenderingContext2d, &[OverlayItem], &RenderOptions) + 'static,
    {
        Self(Rc::new(f))
    }

    /// Invoke the wrapped function.
    pub fn call(&self, ctx: &CanvasRenderingContext2d, items: &[OverlayItem], options: &RenderOptions) {
        (self.0)(ctx, items, options);
    }
}

impl fmt::Debug for CustomDraw {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CustomDraw")
    }
}

/// An ordered, homogeneously-typed collection of overlay items plus display
/// metadata. Later layers draw on top of earlier ones and win hit-test
/// precedence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layer {
    /// Layer identifier, reported in hit results.
    pub id: String,
    /// Shape kind of every item in this layer. Items of another kind are
    /// skipped at draw time.
    pub kind: ShapeKind,
    /// Invisible layers are neither drawn nor hit-testable.
    #[serde(default = "default_visible")]
    pub visible: bool,
    /// Default item color for this layer (CSS color string).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Items in draw order; the last item is topmost within the layer.
    #[serde(default)]
    pub items: Vec<OverlayItem>,
    /// Sparse render-option overrides merged over the engine defaults.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<LayerOptions>,
    /// Draw function for custom-kind layers. A custom layer without one
    /// draws nothing.
    #[serde(skip)]
    pub draw: Option<CustomDraw>,
}

fn default_visible() -> bool {
    true
}

impl Layer {
    /// Create a visible layer with no color or option overrides.
    #[must_use]
    pub fn new(id: &str, kind: ShapeKind, items: Vec<OverlayItem>) -> Self {
        Self {
            id: id.to_owned(),
            kind,
            visible: true,
            color: None,
            items,
            options: None,
            draw: None,
        }
    }
}
