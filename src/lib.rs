//! Overlay rendering engine for media annotation surfaces.
//!
//! Draws typed geometric annotations — bounding boxes, pose skeletons,
//! segmentation masks, point markers, and caller-drawn custom items — onto
//! a canvas layered over video or image content, and correlates pointer
//! coordinates back to the rendered items for hover and click interaction.
//!
//! This crate is compiled to WebAssembly and runs in the browser. The host
//! UI owns the canvas element and feeds in resize events, pointer
//! coordinates, and layer data from upstream detection/annotation
//! pipelines; the engine owns the frame loop, the coordinate transforms,
//! the per-shape drawing, and the geometric hit-testing.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Top-level renderer and the testable [`engine::RendererCore`] |
//! | [`model`] | Layer and item vocabulary (shape kinds, geometry payloads) |
//! | [`options`] | Resolved render options and sparse per-layer overrides |
//! | [`hit`] | Point-to-item hit-testing over the layer snapshot |
//! | [`fps`] | Rolling-window frames-per-second sampling |
//! | [`render`] | Canvas drawing (the only `web_sys` consumer) |
//! | [`consts`] | Shared numeric constants |
//!
//! ## Coordinate model
//!
//! Stored geometry is normalized to `[0, 1]` of the media's natural size.
//! Pixels exist only at the edges: drawing multiplies by the logical scale
//! and the device pixel ratio; hit-testing multiplies by the logical scale
//! alone.

pub mod consts;
pub mod engine;
pub mod fps;
pub mod hit;
pub mod model;
pub mod options;
pub mod render;
