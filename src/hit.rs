//! Hit-testing: point-to-item geometry for every shape kind, and the
//! [`HitTester`] that answers "what is at (x, y)" against the current layer
//! snapshot.
//!
//! All predicates work in logical pixels — the device-pixel-ratio
//! multiplier is a paint-time concern and never enters hit-testing. The
//! polygon helpers here are also used by the renderer for label placement.

#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use std::rc::Rc;

use crate::consts::{HIT_RADIUS_PX, KEYPOINT_MIN_CONFIDENCE};
use crate::model::{
    BoxItem, Layer, MaskItem, OverlayItem, OverlayShape, Point, PointItem, PoseItem, Scale,
    ShapeKind,
};

/// A successful point-to-item query.
#[derive(Debug, Clone)]
pub struct HitResult {
    /// The matched item, cloned out of the snapshot.
    pub item: OverlayItem,
    /// Identifier of the layer that owns the item.
    pub layer_id: String,
    /// Shape kind of the owning layer.
    pub layer_kind: ShapeKind,
}

// =============================================================
// Per-shape predicates
// =============================================================

/// Axis-aligned rectangle containment for a bounding-box item.
#[must_use]
pub fn hit_box(item: &BoxItem, x: f64, y: f64, scale: Scale) -> bool {
    let left = item.bbox.x * scale.x;
    let top = item.bbox.y * scale.y;
    let right = left + item.bbox.width * scale.x;
    let bottom = top + item.bbox.height * scale.y;
    x >= left && x <= right && y >= top && y <= bottom
}

/// Even-odd ray-cast containment for a mask item. Malformed polygons
/// (fewer than 3 vertices) never match.
#[must_use]
pub fn hit_mask(item: &MaskItem, x: f64, y: f64, scale: Scale) -> bool {
    if !item.is_well_formed() {
        return false;
    }
    point_in_polygon(x, y, &item.polygon, scale)
}

/// Distance test for a point marker. `hit_radius` is in logical pixels;
/// the item's draw-radius override does not affect it.
#[must_use]
pub fn hit_point(item: &PointItem, x: f64, y: f64, scale: Scale, hit_radius: f64) -> bool {
    let dx = x - item.point.x * scale.x;
    let dy = y - item.point.y * scale.y;
    dx.hypot(dy) <= hit_radius
}

/// Distance test against any sufficiently confident keypoint of a pose.
/// Malformed poses (short keypoint lists) never match.
#[must_use]
pub fn hit_pose(
    item: &PoseItem,
    x: f64,
    y: f64,
    scale: Scale,
    hit_radius: f64,
    min_confidence: f64,
) -> bool {
    if !item.is_well_formed() {
        return false;
    }
    item.keypoints.iter().flatten().any(|kp| {
        if kp.confidence < min_confidence {
            return false;
        }
        let dx = x - kp.x * scale.x;
        let dy = y - kp.y * scale.y;
        dx.hypot(dy) <= hit_radius
    })
}

/// Whether a logical-pixel point lies on `item`, using the default hit
/// radius and confidence floor. Custom items carry no default geometry and
/// never match.
#[must_use]
pub fn hit_item(item: &OverlayItem, x: f64, y: f64, scale: Scale) -> bool {
    match &item.shape {
        OverlayShape::Box(b) => hit_box(b, x, y, scale),
        OverlayShape::Pose(p) => hit_pose(p, x, y, scale, HIT_RADIUS_PX, KEYPOINT_MIN_CONFIDENCE),
        OverlayShape::Mask(m) => hit_mask(m, x, y, scale),
        OverlayShape::Point(p) => hit_point(p, x, y, scale, HIT_RADIUS_PX),
        OverlayShape::Custom(_) => false,
    }
}

// =============================================================
// Polygon helpers
// =============================================================

/// Even-odd ray cast: counts crossings of a horizontal ray from `(x, y)`
/// against the scaled polygon edges.
#[must_use]
pub fn point_in_polygon(x: f64, y: f64, polygon: &[Point], scale: Scale) -> bool {
    if polygon.is_empty() {
        return false;
    }
    let mut inside = false;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let xi = polygon[i].x * scale.x;
        let yi = polygon[i].y * scale.y;
        let xj = polygon[j].x * scale.x;
        let yj = polygon[j].y * scale.y;
        if ((yi > y) != (yj > y)) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Arithmetic mean of the polygon's vertices, in normalized units.
/// Empty polygons yield the origin.
#[must_use]
pub fn polygon_centroid(polygon: &[Point]) -> Point {
    if polygon.is_empty() {
        return Point::new(0.0, 0.0);
    }
    let n = polygon.len() as f64;
    let sx: f64 = polygon.iter().map(|p| p.x).sum();
    let sy: f64 = polygon.iter().map(|p| p.y).sum();
    Point::new(sx / n, sy / n)
}

// =============================================================
// HitTester
// =============================================================

/// Answers synchronous point queries against the current layer snapshot.
///
/// Holds the same `Rc` snapshot the renderer draws from; [`HitTester::update`]
/// is called whenever layers change or the surface resizes. Queries may run
/// from pointer-event handlers at any time between frames.
#[derive(Debug, Clone, Default)]
pub struct HitTester {
    layers: Rc<Vec<Layer>>,
    scale: Scale,
}

impl HitTester {
    /// Create a tester with an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the layer snapshot and logical scale.
    pub fn update(&mut self, layers: Rc<Vec<Layer>>, scale: Scale) {
        self.layers = layers;
        self.scale = scale;
    }

    /// The topmost match for a logical-pixel point, or `None`.
    ///
    /// Layers are checked last-to-first and items within a layer
    /// last-to-first, so the most recently drawn geometry wins. Invisible
    /// layers are skipped; custom layers are never hit-testable.
    #[must_use]
    pub fn hit_test(&self, x: f64, y: f64) -> Option<HitResult> {
        for layer in self.layers.iter().rev() {
            if !layer.visible || layer.kind == ShapeKind::Custom {
                continue;
            }
            for item in layer.items.iter().rev() {
                if hit_item(item, x, y, self.scale) {
                    return Some(HitResult {
                        item: item.clone(),
                        layer_id: layer.id.clone(),
                        layer_kind: layer.kind,
                    });
                }
            }
        }
        None
    }

    /// Every match for a logical-pixel point.
    ///
    /// Unlike [`HitTester::hit_test`], results come back layer-ascending
    /// and item-ascending: the first element is the bottom-most match, not
    /// the one `hit_test` would return. Completeness queries (e.g. "list
    /// everything under the cursor") want stable document order; priority
    /// queries use `hit_test`.
    #[must_use]
    pub fn hit_test_all(&self, x: f64, y: f64) -> Vec<HitResult> {
        let mut out = Vec::new();
        for layer in self.layers.iter() {
            if !layer.visible || layer.kind == ShapeKind::Custom {
                continue;
            }
            for item in &layer.items {
                if hit_item(item, x, y, self.scale) {
                    out.push(HitResult {
                        item: item.clone(),
                        layer_id: layer.id.clone(),
                        layer_kind: layer.kind,
                    });
                }
            }
        }
        out
    }
}
