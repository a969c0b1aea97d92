//! Rendering: draws the overlay layers to a 2D context.
//!
//! This module is the only place that touches
//! [`web_sys::CanvasRenderingContext2d`]. It receives a read-only view of
//! the renderer core and produces pixels — it does not mutate any engine
//! state.
//!
//! All coordinates here are device pixels: normalized values are multiplied
//! by the axis scale and the device pixel ratio at the moment of drawing.
//! Malformed items are skipped without error so one bad record never blanks
//! a frame. Fallible `Canvas2D` calls propagate via `Result<(), JsValue>`;
//! the frame-loop caller contains the result.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use crate::consts::{FPS_GREEN_MIN, FPS_YELLOW_MIN};
use crate::engine::RendererCore;
use crate::hit::polygon_centroid;
use crate::model::{BoxItem, Layer, OverlayItem, OverlayShape, ShapeKind};
use crate::options::RenderOptions;

/// Stroke-width multiplier for hovered boxes and masks.
const HOVER_STROKE_FACTOR: f64 = 1.75;

/// Fill-alpha multiplier for hovered boxes and masks.
const HOVER_FILL_FACTOR: f64 = 2.0;

/// Radius growth factor for hovered point markers.
const HOVER_POINT_FACTOR: f64 = 1.3;

/// Horizontal padding inside a label pill, in logical pixels.
const LABEL_PAD_X: f64 = 4.0;

/// Vertical padding inside a label pill, in logical pixels.
const LABEL_PAD_Y: f64 = 3.0;

/// Body region of a skeleton edge or keypoint, for coloring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyRegion {
    Face,
    Torso,
    Left,
    Right,
}

impl BodyRegion {
    fn color(self) -> &'static str {
        match self {
            Self::Face => "#FFD166",
            Self::Torso => "#06D6A0",
            Self::Left => "#118AB2",
            Self::Right => "#EF476F",
        }
    }
}

/// Skeleton edges over the 17 COCO keypoints: 4 face edges, 2 torso edges,
/// 5 left-side edges, 5 right-side edges.
const SKELETON_EDGES: [(usize, usize, BodyRegion); 16] = [
    // Face
    (0, 1, BodyRegion::Face),
    (0, 2, BodyRegion::Face),
    (1, 3, BodyRegion::Face),
    (2, 4, BodyRegion::Face),
    // Torso
    (5, 6, BodyRegion::Torso),
    (11, 12, BodyRegion::Torso),
    // Left arm and leg
    (5, 7, BodyRegion::Left),
    (7, 9, BodyRegion::Left),
    (5, 11, BodyRegion::Left),
    (11, 13, BodyRegion::Left),
    (13, 15, BodyRegion::Left),
    // Right arm and leg
    (6, 8, BodyRegion::Right),
    (8, 10, BodyRegion::Right),
    (6, 12, BodyRegion::Right),
    (12, 14, BodyRegion::Right),
    (14, 16, BodyRegion::Right),
];

/// Body region of each COCO keypoint, in keypoint order.
const KEYPOINT_REGIONS: [BodyRegion; 17] = [
    BodyRegion::Face,  // nose
    BodyRegion::Face,  // left eye
    BodyRegion::Face,  // right eye
    BodyRegion::Face,  // left ear
    BodyRegion::Face,  // right ear
    BodyRegion::Left,  // left shoulder
    BodyRegion::Right, // right shoulder
    BodyRegion::Left,  // left elbow
    BodyRegion::Right, // right elbow
    BodyRegion::Left,  // left wrist
    BodyRegion::Right, // right wrist
    BodyRegion::Left,  // left hip
    BodyRegion::Right, // right hip
    BodyRegion::Left,  // left knee
    BodyRegion::Right, // right knee
    BodyRegion::Left,  // left ankle
    BodyRegion::Right, // right ankle
];

/// Draw one full frame: clear or background fill, the budgeted layer walk,
/// and the optional FPS readout.
///
/// # Errors
///
/// Returns `Err` if any `Canvas2D` call fails (e.g. invalid context state).
pub fn draw(ctx: &CanvasRenderingContext2d, core: &RendererCore) -> Result<(), JsValue> {
    let (width, height) = core.size();
    let dpr = core.dpr();
    let backing_w = width * dpr;
    let backing_h = height * dpr;

    ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)?;
    match core.config().background.as_deref() {
        Some(background) => {
            ctx.set_fill_style_str(background);
            ctx.fill_rect(0.0, 0.0, backing_w, backing_h);
        }
        None => ctx.clear_rect(0.0, 0.0, backing_w, backing_h),
    }

    for planned in core.frame_plan() {
        let Some(layer) = core.layers().get(planned.index) else {
            continue;
        };
        let items = &layer.items[..planned.take];
        let options = core.layer_options(layer);
        draw_layer(ctx, layer, items, &options, core.hovered())?;
    }

    if core.config().show_fps {
        draw_fps(ctx, core.fps(), dpr)?;
    }
    Ok(())
}

// =============================================================
// Layer dispatch
// =============================================================

fn draw_layer(
    ctx: &CanvasRenderingContext2d,
    layer: &Layer,
    items: &[OverlayItem],
    options: &RenderOptions,
    hovered: Option<&str>,
) -> Result<(), JsValue> {
    match layer.kind {
        ShapeKind::Box => draw_boxes(ctx, items, options, hovered),
        ShapeKind::Pose => draw_poses(ctx, items, options, hovered),
        ShapeKind::Mask => draw_masks(ctx, items, options, hovered),
        ShapeKind::Point => draw_points(ctx, items, options, hovered),
        ShapeKind::Custom => {
            if let Some(custom) = &layer.draw {
                custom.call(ctx, items, options);
            }
            Ok(())
        }
    }
}

/// Split items so the hovered one (if any) draws last, keeping its
/// highlight visually on top regardless of list order.
fn hover_last<'a>(
    items: &'a [OverlayItem],
    hovered: Option<&str>,
) -> (Vec<&'a OverlayItem>, Option<&'a OverlayItem>) {
    let mut rest = Vec::with_capacity(items.len());
    let mut hovered_item = None;
    for item in items {
        if hovered.is_some() && item.id.as_deref() == hovered {
            hovered_item = Some(item);
        } else {
            rest.push(item);
        }
    }
    (rest, hovered_item)
}

// =============================================================
// Boxes
// =============================================================

/// Draw every bounding-box item, hovered item last.
pub fn draw_boxes(
    ctx: &CanvasRenderingContext2d,
    items: &[OverlayItem],
    options: &RenderOptions,
    hovered: Option<&str>,
) -> Result<(), JsValue> {
    let (rest, hovered_item) = hover_last(items, hovered);
    for item in rest {
        draw_box_item(ctx, item, options, false)?;
    }
    if let Some(item) = hovered_item {
        draw_box_item(ctx, item, options, true)?;
    }
    Ok(())
}

fn draw_box_item(
    ctx: &CanvasRenderingContext2d,
    item: &OverlayItem,
    options: &RenderOptions,
    hovered: bool,
) -> Result<(), JsValue> {
    let OverlayShape::Box(b) = &item.shape else {
        return Ok(());
    };
    let sx = options.scale.x * options.dpr;
    let sy = options.scale.y * options.dpr;
    let x = b.bbox.x * sx;
    let y = b.bbox.y * sy;
    let w = b.bbox.width * sx;
    let h = b.bbox.height * sy;

    let color = item.color.as_deref().unwrap_or(&options.color);
    let stroke_width = if hovered {
        options.stroke_width * HOVER_STROKE_FACTOR
    } else {
        options.stroke_width
    } * options.dpr;
    let fill_alpha = if hovered {
        (options.fill_opacity * HOVER_FILL_FACTOR).min(1.0)
    } else {
        options.fill_opacity
    };

    ctx.save();
    if fill_alpha > 0.0 {
        ctx.set_global_alpha(fill_alpha);
        ctx.set_fill_style_str(color);
        ctx.fill_rect(x, y, w, h);
        ctx.set_global_alpha(1.0);
    }
    ctx.set_stroke_style_str(color);
    ctx.set_line_width(stroke_width);
    ctx.stroke_rect(x, y, w, h);

    if options.show_labels {
        if let Some(text) = box_label_text(b) {
            draw_label_pill(ctx, &text, x, y, color, options)?;
        }
    }
    ctx.restore();
    Ok(())
}

/// Label pill text: the label, the rounded confidence percentage, or both.
fn box_label_text(b: &BoxItem) -> Option<String> {
    let pct = b.confidence.map(|c| format!("{:.0}%", c * 100.0));
    match (&b.label, pct) {
        (Some(label), Some(pct)) => Some(format!("{label} {pct}")),
        (Some(label), None) => Some(label.clone()),
        (None, Some(pct)) => Some(pct),
        (None, None) => None,
    }
}

/// Filled pill with white text above the given top-left corner, clamped to
/// the canvas top.
fn draw_label_pill(
    ctx: &CanvasRenderingContext2d,
    text: &str,
    x: f64,
    y: f64,
    color: &str,
    options: &RenderOptions,
) -> Result<(), JsValue> {
    let font_px = options.font_px * options.dpr;
    ctx.set_font(&format!("{font_px:.0}px sans-serif"));
    let Ok(metrics) = ctx.measure_text(text) else {
        return Ok(());
    };
    let pad_x = LABEL_PAD_X * options.dpr;
    let pad_y = LABEL_PAD_Y * options.dpr;
    let pill_h = font_px + pad_y * 2.0;
    let pill_y = (y - pill_h).max(0.0);

    ctx.set_fill_style_str(color);
    ctx.fill_rect(x, pill_y, metrics.width() + pad_x * 2.0, pill_h);
    ctx.set_fill_style_str("#fff");
    ctx.set_text_align("left");
    ctx.set_text_baseline("top");
    ctx.fill_text(text, x + pad_x, pill_y + pad_y)?;
    Ok(())
}

// =============================================================
// Poses
// =============================================================

/// Draw every pose skeleton, hovered item last.
pub fn draw_poses(
    ctx: &CanvasRenderingContext2d,
    items: &[OverlayItem],
    options: &RenderOptions,
    hovered: Option<&str>,
) -> Result<(), JsValue> {
    let (rest, hovered_item) = hover_last(items, hovered);
    for item in rest {
        draw_pose_item(ctx, item, options)?;
    }
    if let Some(item) = hovered_item {
        draw_pose_item(ctx, item, options)?;
    }
    Ok(())
}

fn draw_pose_item(
    ctx: &CanvasRenderingContext2d,
    item: &OverlayItem,
    options: &RenderOptions,
) -> Result<(), JsValue> {
    let OverlayShape::Pose(p) = &item.shape else {
        return Ok(());
    };
    if !p.is_well_formed() {
        return Ok(());
    }
    let sx = options.scale.x * options.dpr;
    let sy = options.scale.y * options.dpr;
    let override_color = item.color.as_deref();

    ctx.save();

    // Skeleton edges, skipping joints that are missing or not confident.
    ctx.set_line_width(options.stroke_width * options.dpr);
    for (a, b, region) in SKELETON_EDGES {
        let (Some(ka), Some(kb)) = (&p.keypoints[a], &p.keypoints[b]) else {
            continue;
        };
        if ka.confidence < options.min_confidence || kb.confidence < options.min_confidence {
            continue;
        }
        ctx.set_stroke_style_str(override_color.unwrap_or_else(|| region.color()));
        ctx.begin_path();
        ctx.move_to(ka.x * sx, ka.y * sy);
        ctx.line_to(kb.x * sx, kb.y * sy);
        ctx.stroke();
    }

    // Keypoint dots: region-colored with a white border.
    let radius = options.keypoint_radius * options.dpr;
    ctx.set_line_width(1.5 * options.dpr);
    for (index, kp) in p.keypoints.iter().enumerate() {
        let Some(kp) = kp else {
            continue;
        };
        if kp.confidence < options.min_confidence {
            continue;
        }
        let region_color = KEYPOINT_REGIONS
            .get(index)
            .map_or(options.color.as_str(), |region| region.color());
        ctx.begin_path();
        ctx.arc(kp.x * sx, kp.y * sy, radius, 0.0, 2.0 * PI)?;
        ctx.set_fill_style_str(override_color.unwrap_or(region_color));
        ctx.fill();
        ctx.set_stroke_style_str("#fff");
        ctx.stroke();
    }

    ctx.restore();
    Ok(())
}

// =============================================================
// Masks
// =============================================================

/// Draw every mask polygon, hovered item last.
pub fn draw_masks(
    ctx: &CanvasRenderingContext2d,
    items: &[OverlayItem],
    options: &RenderOptions,
    hovered: Option<&str>,
) -> Result<(), JsValue> {
    let (rest, hovered_item) = hover_last(items, hovered);
    for item in rest {
        draw_mask_item(ctx, item, options, false)?;
    }
    if let Some(item) = hovered_item {
        draw_mask_item(ctx, item, options, true)?;
    }
    Ok(())
}

fn draw_mask_item(
    ctx: &CanvasRenderingContext2d,
    item: &OverlayItem,
    options: &RenderOptions,
    hovered: bool,
) -> Result<(), JsValue> {
    let OverlayShape::Mask(m) = &item.shape else {
        return Ok(());
    };
    if !m.is_well_formed() {
        return Ok(());
    }
    let sx = options.scale.x * options.dpr;
    let sy = options.scale.y * options.dpr;

    let color = item.color.as_deref().unwrap_or(&options.color);
    let stroke_width = if hovered {
        options.stroke_width * HOVER_STROKE_FACTOR
    } else {
        options.stroke_width
    } * options.dpr;
    let fill_alpha = if hovered {
        (options.fill_opacity * HOVER_FILL_FACTOR).min(1.0)
    } else {
        options.fill_opacity
    };

    ctx.save();
    ctx.begin_path();
    ctx.move_to(m.polygon[0].x * sx, m.polygon[0].y * sy);
    for p in &m.polygon[1..] {
        ctx.line_to(p.x * sx, p.y * sy);
    }
    ctx.close_path();

    ctx.set_global_alpha(fill_alpha);
    ctx.set_fill_style_str(color);
    ctx.fill();
    ctx.set_global_alpha(1.0);

    ctx.set_stroke_style_str(color);
    ctx.set_line_width(stroke_width);
    ctx.stroke();

    if options.show_labels {
        if let Some(label) = &m.label {
            let centroid = polygon_centroid(&m.polygon);
            let font_px = options.font_px * options.dpr;
            ctx.set_font(&format!("{font_px:.0}px sans-serif"));
            ctx.set_text_align("center");
            ctx.set_text_baseline("middle");
            ctx.set_fill_style_str("#fff");
            ctx.fill_text(label, centroid.x * sx, centroid.y * sy)?;
        }
    }
    ctx.restore();
    Ok(())
}

// =============================================================
// Points
// =============================================================

/// Draw every point marker, hovered item last.
pub fn draw_points(
    ctx: &CanvasRenderingContext2d,
    items: &[OverlayItem],
    options: &RenderOptions,
    hovered: Option<&str>,
) -> Result<(), JsValue> {
    let (rest, hovered_item) = hover_last(items, hovered);
    for item in rest {
        draw_point_item(ctx, item, options, false)?;
    }
    if let Some(item) = hovered_item {
        draw_point_item(ctx, item, options, true)?;
    }
    Ok(())
}

fn draw_point_item(
    ctx: &CanvasRenderingContext2d,
    item: &OverlayItem,
    options: &RenderOptions,
    hovered: bool,
) -> Result<(), JsValue> {
    let OverlayShape::Point(p) = &item.shape else {
        return Ok(());
    };
    let sx = options.scale.x * options.dpr;
    let sy = options.scale.y * options.dpr;
    let cx = p.point.x * sx;
    let cy = p.point.y * sy;

    let base_radius = p.radius.unwrap_or(options.point_radius);
    let radius = if hovered { base_radius * HOVER_POINT_FACTOR } else { base_radius } * options.dpr;
    let color = item.color.as_deref().unwrap_or(&options.color);

    ctx.save();

    // Colored disk with a white ring.
    ctx.begin_path();
    ctx.arc(cx, cy, radius, 0.0, 2.0 * PI)?;
    ctx.set_fill_style_str(color);
    ctx.fill();
    ctx.set_stroke_style_str("#fff");
    ctx.set_line_width(2.0 * options.dpr);
    ctx.stroke();

    // Small white center dot.
    ctx.begin_path();
    ctx.arc(cx, cy, radius * 0.3, 0.0, 2.0 * PI)?;
    ctx.set_fill_style_str("#fff");
    ctx.fill();

    if options.show_labels {
        if let Some(label) = &p.label {
            let font_px = options.font_px * options.dpr;
            ctx.set_font(&format!("{font_px:.0}px sans-serif"));
            ctx.set_text_align("left");
            ctx.set_text_baseline("middle");
            ctx.set_fill_style_str("#fff");
            ctx.fill_text(label, cx + radius + LABEL_PAD_X * options.dpr, cy)?;
        }
    }
    ctx.restore();
    Ok(())
}

// =============================================================
// FPS readout
// =============================================================

fn draw_fps(ctx: &CanvasRenderingContext2d, fps: f64, dpr: f64) -> Result<(), JsValue> {
    let font_px = 12.0 * dpr;
    ctx.save();
    ctx.set_font(&format!("{font_px:.0}px monospace"));
    ctx.set_text_align("left");
    ctx.set_text_baseline("top");
    ctx.set_fill_style_str(fps_color(fps));
    ctx.fill_text(&format!("{fps:.0} fps"), 6.0 * dpr, 6.0 * dpr)?;
    ctx.restore();
    Ok(())
}

/// Readout color by frame-rate band: green at or above 30, yellow at or
/// above 15, red below.
fn fps_color(fps: f64) -> &'static str {
    if fps >= FPS_GREEN_MIN {
        "#2ECC40"
    } else if fps >= FPS_YELLOW_MIN {
        "#FFDC00"
    } else {
        "#FF4136"
    }
}
