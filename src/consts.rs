//! Shared numeric constants for the overlay crate.

// ── Hit-testing ─────────────────────────────────────────────────

/// Logical-pixel hit radius for point markers and pose keypoints.
pub const HIT_RADIUS_PX: f64 = 10.0;

/// Minimum keypoint confidence for a pose joint to be drawn or hit-testable.
pub const KEYPOINT_MIN_CONFIDENCE: f64 = 0.3;

// ── Shape completeness ──────────────────────────────────────────

/// Number of keypoints in a well-formed pose (COCO layout).
pub const POSE_KEYPOINT_COUNT: usize = 17;

/// Minimum vertex count for a well-formed mask polygon.
pub const MASK_MIN_VERTICES: usize = 3;

// ── Frame budget ────────────────────────────────────────────────

/// Default cap on overlay items drawn in one frame, counted across layers.
pub const DEFAULT_ITEM_BUDGET: usize = 100;

// ── FPS readout ─────────────────────────────────────────────────

/// Length of one FPS sampling window in milliseconds.
pub const FPS_WINDOW_MS: f64 = 1000.0;

/// Frame rates at or above this render the readout green.
pub const FPS_GREEN_MIN: f64 = 30.0;

/// Frame rates at or above this (but below the green band) render yellow.
pub const FPS_YELLOW_MIN: f64 = 15.0;
