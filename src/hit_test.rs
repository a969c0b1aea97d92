#![allow(clippy::float_cmp)]

use std::rc::Rc;

use super::*;
use crate::consts::KEYPOINT_MIN_CONFIDENCE;
use crate::model::{BBox, CustomItem, Keypoint};

// =============================================================
// Helpers
// =============================================================

fn scale_400() -> Scale {
    Scale::new(400.0, 400.0)
}

fn box_item(bbox: [f64; 4]) -> BoxItem {
    BoxItem { bbox: BBox::from(bbox), label: None, confidence: None }
}

fn overlay_box(id: &str, bbox: [f64; 4]) -> OverlayItem {
    let mut item = OverlayItem::new(OverlayShape::Box(box_item(bbox)));
    item.id = Some(id.to_owned());
    item
}

fn overlay_point(id: &str, x: f64, y: f64) -> OverlayItem {
    let mut item = OverlayItem::new(OverlayShape::Point(PointItem {
        point: Point::new(x, y),
        label: None,
        radius: None,
    }));
    item.id = Some(id.to_owned());
    item
}

fn full_pose(x: f64, y: f64, confidence: f64) -> PoseItem {
    PoseItem { keypoints: vec![Some(Keypoint::new(x, y, confidence)); 17], label: None }
}

fn square_mask() -> MaskItem {
    MaskItem {
        polygon: vec![
            Point::new(0.25, 0.25),
            Point::new(0.75, 0.25),
            Point::new(0.75, 0.75),
            Point::new(0.25, 0.75),
        ],
        label: None,
    }
}

fn tester(layers: Vec<Layer>, scale: Scale) -> HitTester {
    let mut t = HitTester::new();
    t.update(Rc::new(layers), scale);
    t
}

// =============================================================
// hit_box
// =============================================================

#[test]
fn box_point_strictly_inside() {
    let b = box_item([0.1, 0.1, 0.2, 0.2]);
    // Scaled rect is x: 40, y: 40, w: 80, h: 80.
    assert!(hit_box(&b, 60.0, 60.0, scale_400()));
}

#[test]
fn box_point_just_outside_top_left() {
    let b = box_item([0.1, 0.1, 0.2, 0.2]);
    assert!(!hit_box(&b, 39.0, 39.0, scale_400()));
}

#[test]
fn box_point_on_edges_inclusive() {
    let b = box_item([0.1, 0.1, 0.2, 0.2]);
    assert!(hit_box(&b, 40.0, 40.0, scale_400()));
    assert!(hit_box(&b, 120.0, 120.0, scale_400()));
}

#[test]
fn box_point_beyond_bottom_right() {
    let b = box_item([0.1, 0.1, 0.2, 0.2]);
    assert!(!hit_box(&b, 121.0, 60.0, scale_400()));
    assert!(!hit_box(&b, 60.0, 121.0, scale_400()));
}

#[test]
fn box_non_uniform_scale() {
    let b = box_item([0.5, 0.5, 0.25, 0.25]);
    let scale = Scale::new(800.0, 200.0);
    // Scaled rect is x: 400, y: 100, w: 200, h: 50.
    assert!(hit_box(&b, 500.0, 120.0, scale));
    assert!(!hit_box(&b, 500.0, 160.0, scale));
}

// =============================================================
// hit_mask / point_in_polygon
// =============================================================

#[test]
fn mask_centroid_of_convex_polygon_hits() {
    let m = square_mask();
    let c = polygon_centroid(&m.polygon);
    let scale = scale_400();
    assert!(hit_mask(&m, c.x * scale.x, c.y * scale.y, scale));
}

#[test]
fn mask_far_outside_misses() {
    let m = square_mask();
    assert!(!hit_mask(&m, 399.0, 399.0, scale_400()));
    assert!(!hit_mask(&m, 1.0, 1.0, scale_400()));
}

#[test]
fn mask_with_two_vertices_never_hits() {
    let m = MaskItem { polygon: vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0)], label: None };
    assert!(!hit_mask(&m, 200.0, 200.0, scale_400()));
}

#[test]
fn polygon_triangle_containment() {
    let triangle =
        vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0), Point::new(0.0, 1.0)];
    let scale = Scale::new(100.0, 100.0);
    assert!(point_in_polygon(20.0, 20.0, &triangle, scale));
    assert!(!point_in_polygon(80.0, 80.0, &triangle, scale));
}

#[test]
fn polygon_concave_notch() {
    // A "U" shape: the notch between the arms is outside.
    let u = vec![
        Point::new(0.0, 0.0),
        Point::new(0.2, 0.0),
        Point::new(0.2, 0.6),
        Point::new(0.8, 0.6),
        Point::new(0.8, 0.0),
        Point::new(1.0, 0.0),
        Point::new(1.0, 1.0),
        Point::new(0.0, 1.0),
    ];
    let scale = Scale::new(100.0, 100.0);
    assert!(point_in_polygon(10.0, 30.0, &u, scale)); // left arm
    assert!(point_in_polygon(90.0, 30.0, &u, scale)); // right arm
    assert!(point_in_polygon(50.0, 80.0, &u, scale)); // base
    assert!(!point_in_polygon(50.0, 30.0, &u, scale)); // notch
}

#[test]
fn polygon_empty_is_never_inside() {
    assert!(!point_in_polygon(0.0, 0.0, &[], scale_400()));
}

#[test]
fn centroid_of_square() {
    let c = polygon_centroid(&square_mask().polygon);
    assert!((c.x - 0.5).abs() < 1e-12);
    assert!((c.y - 0.5).abs() < 1e-12);
}

#[test]
fn centroid_of_empty_polygon_is_origin() {
    let c = polygon_centroid(&[]);
    assert_eq!(c.x, 0.0);
    assert_eq!(c.y, 0.0);
}

// =============================================================
// hit_point
// =============================================================

#[test]
fn point_within_default_radius() {
    let p = PointItem { point: Point::new(0.5, 0.5), label: None, radius: None };
    let scale = scale_400();
    // Scaled position is (200, 200); default hit radius is 10.
    assert!(hit_point(&p, 200.0 + 9.9, 200.0, scale, 10.0));
}

#[test]
fn point_beyond_radius() {
    let p = PointItem { point: Point::new(0.5, 0.5), label: None, radius: None };
    assert!(!hit_point(&p, 230.0, 200.0, scale_400(), 10.0));
}

#[test]
fn point_exactly_on_radius() {
    let p = PointItem { point: Point::new(0.5, 0.5), label: None, radius: None };
    assert!(hit_point(&p, 210.0, 200.0, scale_400(), 10.0));
}

#[test]
fn point_draw_radius_override_does_not_widen_hits() {
    let p = PointItem { point: Point::new(0.5, 0.5), label: None, radius: Some(40.0) };
    let mut item = OverlayItem::new(OverlayShape::Point(p));
    item.id = Some("p".to_owned());
    // 25 px away: inside the 40 px draw radius, outside the 10 px hit radius.
    assert!(!hit_item(&item, 225.0, 200.0, scale_400()));
}

// =============================================================
// hit_pose
// =============================================================

#[test]
fn pose_near_confident_keypoint() {
    let p = full_pose(0.5, 0.5, 0.9);
    assert!(hit_pose(&p, 205.0, 205.0, scale_400(), 10.0, KEYPOINT_MIN_CONFIDENCE));
}

#[test]
fn pose_all_below_confidence_floor_never_hits() {
    let p = full_pose(0.5, 0.5, 0.29);
    // Even querying exactly at the keypoint position.
    assert!(!hit_pose(&p, 200.0, 200.0, scale_400(), 10.0, KEYPOINT_MIN_CONFIDENCE));
}

#[test]
fn pose_far_from_all_keypoints() {
    let p = full_pose(0.5, 0.5, 0.9);
    assert!(!hit_pose(&p, 300.0, 300.0, scale_400(), 10.0, KEYPOINT_MIN_CONFIDENCE));
}

#[test]
fn pose_short_keypoint_list_never_hits() {
    let mut p = full_pose(0.5, 0.5, 0.9);
    p.keypoints.truncate(16);
    assert!(!hit_pose(&p, 200.0, 200.0, scale_400(), 10.0, KEYPOINT_MIN_CONFIDENCE));
}

#[test]
fn pose_null_keypoints_are_ignored() {
    let mut p = full_pose(0.5, 0.5, 0.9);
    for kp in &mut p.keypoints {
        *kp = None;
    }
    p.keypoints[0] = Some(Keypoint::new(0.1, 0.1, 0.9));
    assert!(hit_pose(&p, 40.0, 40.0, scale_400(), 10.0, KEYPOINT_MIN_CONFIDENCE));
    assert!(!hit_pose(&p, 200.0, 200.0, scale_400(), 10.0, KEYPOINT_MIN_CONFIDENCE));
}

// =============================================================
// hit_item dispatch
// =============================================================

#[test]
fn custom_items_never_hit() {
    let item = OverlayItem::new(OverlayShape::Custom(CustomItem { data: serde_json::json!({}) }));
    assert!(!hit_item(&item, 0.0, 0.0, scale_400()));
    assert!(!hit_item(&item, 200.0, 200.0, scale_400()));
}

// =============================================================
// HitTester — single layer scenario
// =============================================================

#[test]
fn single_box_layer_scenario() {
    // One box layer, surface 400x400 at 1x DPR; scaled rect is 40,40,80,80.
    let layers = vec![Layer::new("boxes", ShapeKind::Box, vec![overlay_box("a", [0.1, 0.1, 0.2, 0.2])])];
    let t = tester(layers, scale_400());

    let hit = t.hit_test(60.0, 60.0).expect("inside the box");
    assert_eq!(hit.item.id.as_deref(), Some("a"));
    assert_eq!(hit.layer_id, "boxes");
    assert_eq!(hit.layer_kind, ShapeKind::Box);

    assert!(t.hit_test(10.0, 10.0).is_none());
}

#[test]
fn empty_tester_misses_everything() {
    let t = HitTester::new();
    assert!(t.hit_test(0.0, 0.0).is_none());
    assert!(t.hit_test_all(100.0, 100.0).is_empty());
}

// =============================================================
// HitTester — precedence
// =============================================================

#[test]
fn topmost_layer_wins() {
    let layers = vec![
        Layer::new("bottom", ShapeKind::Box, vec![overlay_box("low", [0.1, 0.1, 0.5, 0.5])]),
        Layer::new("top", ShapeKind::Box, vec![overlay_box("high", [0.1, 0.1, 0.5, 0.5])]),
    ];
    let t = tester(layers, scale_400());
    let hit = t.hit_test(100.0, 100.0).expect("overlap");
    assert_eq!(hit.item.id.as_deref(), Some("high"));
    assert_eq!(hit.layer_id, "top");
}

#[test]
fn last_item_in_layer_wins() {
    let layers = vec![Layer::new(
        "boxes",
        ShapeKind::Box,
        vec![overlay_box("first", [0.1, 0.1, 0.5, 0.5]), overlay_box("second", [0.1, 0.1, 0.5, 0.5])],
    )];
    let t = tester(layers, scale_400());
    let hit = t.hit_test(100.0, 100.0).expect("overlap");
    assert_eq!(hit.item.id.as_deref(), Some("second"));
}

#[test]
fn invisible_layers_are_skipped() {
    let mut top = Layer::new("top", ShapeKind::Box, vec![overlay_box("high", [0.1, 0.1, 0.5, 0.5])]);
    top.visible = false;
    let layers = vec![
        Layer::new("bottom", ShapeKind::Box, vec![overlay_box("low", [0.1, 0.1, 0.5, 0.5])]),
        top,
    ];
    let t = tester(layers, scale_400());
    let hit = t.hit_test(100.0, 100.0).expect("visible layer still hit");
    assert_eq!(hit.item.id.as_deref(), Some("low"));
}

#[test]
fn custom_layers_are_never_hit_testable() {
    let mut custom_item = OverlayItem::new(OverlayShape::Custom(CustomItem { data: serde_json::json!({}) }));
    custom_item.id = Some("c".to_owned());
    let layers = vec![
        Layer::new("boxes", ShapeKind::Box, vec![overlay_box("b", [0.0, 0.0, 1.0, 1.0])]),
        Layer::new("effects", ShapeKind::Custom, vec![custom_item]),
    ];
    let t = tester(layers, scale_400());
    let hit = t.hit_test(200.0, 200.0).expect("box beneath the custom layer");
    assert_eq!(hit.layer_id, "boxes");
}

#[test]
fn mixed_kinds_topmost_point_beats_box() {
    let layers = vec![
        Layer::new("boxes", ShapeKind::Box, vec![overlay_box("b", [0.0, 0.0, 1.0, 1.0])]),
        Layer::new("points", ShapeKind::Point, vec![overlay_point("p", 0.5, 0.5)]),
    ];
    let t = tester(layers, scale_400());
    let hit = t.hit_test(200.0, 200.0).expect("point on top");
    assert_eq!(hit.item.id.as_deref(), Some("p"));
    assert_eq!(hit.layer_kind, ShapeKind::Point);
    // Away from the point, the box still answers.
    let hit = t.hit_test(300.0, 300.0).expect("box below");
    assert_eq!(hit.item.id.as_deref(), Some("b"));
}

// =============================================================
// HitTester — hit_test_all
// =============================================================

#[test]
fn hit_test_all_collects_every_match_ascending() {
    let layers = vec![
        Layer::new(
            "lower",
            ShapeKind::Box,
            vec![overlay_box("a", [0.1, 0.1, 0.5, 0.5]), overlay_box("b", [0.1, 0.1, 0.5, 0.5])],
        ),
        Layer::new("upper", ShapeKind::Box, vec![overlay_box("c", [0.1, 0.1, 0.5, 0.5])]),
    ];
    let t = tester(layers, scale_400());
    let all = t.hit_test_all(100.0, 100.0);
    let ids: Vec<_> = all.iter().filter_map(|h| h.item.id.as_deref()).collect();
    assert_eq!(ids, ["a", "b", "c"]);
}

#[test]
fn hit_test_all_first_element_differs_from_hit_test() {
    // The deliberate traversal asymmetry: hit_test answers topmost-first,
    // hit_test_all answers in document order.
    let layers = vec![
        Layer::new("lower", ShapeKind::Box, vec![overlay_box("a", [0.1, 0.1, 0.5, 0.5])]),
        Layer::new("upper", ShapeKind::Box, vec![overlay_box("b", [0.1, 0.1, 0.5, 0.5])]),
    ];
    let t = tester(layers, scale_400());
    let top = t.hit_test(100.0, 100.0).expect("hit");
    let all = t.hit_test_all(100.0, 100.0);
    assert_eq!(top.item.id.as_deref(), Some("b"));
    assert_eq!(all[0].item.id.as_deref(), Some("a"));
}

#[test]
fn hit_test_all_skips_invisible_and_custom_layers() {
    let mut hidden = Layer::new("hidden", ShapeKind::Box, vec![overlay_box("h", [0.0, 0.0, 1.0, 1.0])]);
    hidden.visible = false;
    let layers = vec![
        hidden,
        Layer::new("effects", ShapeKind::Custom, Vec::new()),
        Layer::new("boxes", ShapeKind::Box, vec![overlay_box("b", [0.0, 0.0, 1.0, 1.0])]),
    ];
    let t = tester(layers, scale_400());
    let all = t.hit_test_all(200.0, 200.0);
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].item.id.as_deref(), Some("b"));
}

#[test]
fn hit_test_all_empty_when_nothing_matches() {
    let layers = vec![Layer::new("boxes", ShapeKind::Box, vec![overlay_box("a", [0.1, 0.1, 0.2, 0.2])])];
    let t = tester(layers, scale_400());
    assert!(t.hit_test_all(399.0, 399.0).is_empty());
}

// =============================================================
// HitTester — update semantics
// =============================================================

#[test]
fn update_replaces_snapshot() {
    let mut t = HitTester::new();
    t.update(
        Rc::new(vec![Layer::new("old", ShapeKind::Box, vec![overlay_box("old", [0.0, 0.0, 1.0, 1.0])])]),
        scale_400(),
    );
    assert!(t.hit_test(200.0, 200.0).is_some());

    t.update(
        Rc::new(vec![Layer::new("new", ShapeKind::Box, vec![overlay_box("new", [0.0, 0.0, 0.1, 0.1])])]),
        scale_400(),
    );
    let hit = t.hit_test(20.0, 20.0).expect("new snapshot");
    assert_eq!(hit.layer_id, "new");
    // The old full-canvas box is gone.
    assert!(t.hit_test(200.0, 200.0).is_none());
}

#[test]
fn update_rescales_queries() {
    let layers = vec![Layer::new("boxes", ShapeKind::Box, vec![overlay_box("a", [0.1, 0.1, 0.2, 0.2])])];
    let mut t = tester(layers.clone(), scale_400());
    assert!(t.hit_test(60.0, 60.0).is_some());

    // Same normalized data on a 100x100 surface: rect becomes 10,10,20,20.
    t.update(Rc::new(layers), Scale::new(100.0, 100.0));
    assert!(t.hit_test(60.0, 60.0).is_none());
    assert!(t.hit_test(15.0, 15.0).is_some());
}
