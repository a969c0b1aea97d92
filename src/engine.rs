//! Top-level renderer: the pure [`RendererCore`] and the canvas-owning
//! [`OverlayRenderer`] with its frame loop.
//!
//! Core engine state — the layer snapshot, hover state, frame-budget
//! planning, FPS sampling, and hit-test delegation — lives in
//! `RendererCore`, separated from the canvas wrapper so it can be tested
//! without WASM/browser dependencies. `OverlayRenderer` adds the
//! `CanvasRenderingContext2d`, backing-store sizing, and the
//! self-rescheduling `requestAnimationFrame` chain.

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::consts::DEFAULT_ITEM_BUDGET;
use crate::fps::FpsCounter;
use crate::hit::{HitResult, HitTester};
use crate::model::{Layer, Scale};
use crate::options::RenderOptions;
use crate::render;

/// Construction failure: the canvas could not provide a 2D context.
///
/// This is the only error this subsystem propagates; the steady-state
/// draw/hit-test path contains all per-item problems.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The `getContext("2d")` call itself failed.
    #[error("2d context acquisition failed")]
    ContextAcquisition,
    /// The canvas returned no usable 2D context (e.g. it is already bound
    /// to another context mode).
    #[error("canvas did not provide a 2d context")]
    ContextUnavailable,
}

/// Engine-level configuration supplied at construction.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Item color used when neither layer nor item overrides it.
    pub default_color: String,
    /// Frame background (CSS color); `None` clears to transparent.
    pub background: Option<String>,
    /// Cap on overlay items drawn in a single frame, across all layers.
    pub max_items: usize,
    /// Whether to draw the FPS readout in the top-left corner.
    pub show_fps: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            default_color: "#00E5FF".to_owned(),
            background: None,
            max_items: DEFAULT_ITEM_BUDGET,
            show_fps: false,
        }
    }
}

/// One layer's share of the frame budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedLayer {
    /// Index into the layer snapshot.
    pub index: usize,
    /// Number of items to draw, taken from the front of the layer's list.
    pub take: usize,
}

/// Core renderer state — everything that doesn't require a canvas.
#[derive(Debug)]
pub struct RendererCore {
    layers: Rc<Vec<Layer>>,
    hit: HitTester,
    hovered: Option<String>,
    width: f64,
    height: f64,
    dpr: f64,
    config: RendererConfig,
    fps: FpsCounter,
    running: bool,
}

impl RendererCore {
    #[must_use]
    pub fn new(config: RendererConfig) -> Self {
        Self {
            layers: Rc::new(Vec::new()),
            hit: HitTester::new(),
            hovered: None,
            width: 0.0,
            height: 0.0,
            dpr: 1.0,
            config,
            fps: FpsCounter::new(),
            running: false,
        }
    }

    // --- Snapshot ---

    /// Replace the layer snapshot used by both drawing and hit-testing.
    ///
    /// Full replacement, not a merge: the previous snapshot is dropped
    /// wholesale. The caller must not mutate the submitted layers in place
    /// afterwards — the renderer and hit tester share them by reference.
    pub fn set_layers(&mut self, layers: Vec<Layer>) {
        self.layers = Rc::new(layers);
        self.hit.update(Rc::clone(&self.layers), self.scale());
        log::debug!("overlay: snapshot replaced ({} layers)", self.layers.len());
    }

    /// Update logical size and device pixel ratio, and re-derive the
    /// hit-tester scale. DPR is clamped to at least 1.
    pub fn set_size(&mut self, width: f64, height: f64, dpr: f64) {
        self.width = width;
        self.height = height;
        self.dpr = dpr.max(1.0);
        self.hit.update(Rc::clone(&self.layers), self.scale());
    }

    /// Set the engine-wide hovered-item id used by highlight drawing.
    pub fn set_hovered(&mut self, id: Option<String>) {
        self.hovered = id;
    }

    // --- Queries ---

    #[must_use]
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    #[must_use]
    pub fn hovered(&self) -> Option<&str> {
        self.hovered.as_deref()
    }

    /// Logical pixels per normalized unit: the current logical size.
    #[must_use]
    pub fn scale(&self) -> Scale {
        Scale::new(self.width, self.height)
    }

    /// Current logical size as `(width, height)`.
    #[must_use]
    pub fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    #[must_use]
    pub fn dpr(&self) -> f64 {
        self.dpr
    }

    #[must_use]
    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// The most recently sampled frames-per-second reading.
    #[must_use]
    pub fn fps(&self) -> f64 {
        self.fps.fps()
    }

    /// Record one drawn frame for FPS sampling.
    pub fn record_frame(&mut self, now_ms: f64) {
        self.fps.tick(now_ms);
    }

    // --- Frame planning ---

    /// Base render options shared by every layer this frame.
    #[must_use]
    pub fn base_options(&self) -> RenderOptions {
        RenderOptions::base(&self.config.default_color, self.scale(), self.dpr)
    }

    /// Resolved options for one layer: its color and sparse overrides
    /// merged over the base options.
    #[must_use]
    pub fn layer_options(&self, layer: &Layer) -> RenderOptions {
        self.base_options().merged(layer.color.as_deref(), layer.options.as_ref())
    }

    /// Which layers draw this frame and how many items each contributes.
    ///
    /// Walks visible layers in order against the global item budget. The
    /// first layer to cross the limit is truncated to the remaining count
    /// (the front of its item list is kept); once the budget is exhausted,
    /// every later layer is skipped outright. This is a hard
    /// ordering-dependent cutoff, not a fair-share split.
    #[must_use]
    pub fn frame_plan(&self) -> Vec<PlannedLayer> {
        let mut plan = Vec::new();
        let mut remaining = self.config.max_items;
        for (index, layer) in self.layers.iter().enumerate() {
            if !layer.visible {
                continue;
            }
            if remaining == 0 {
                break;
            }
            let take = layer.items.len().min(remaining);
            remaining -= take;
            plan.push(PlannedLayer { index, take });
        }
        plan
    }

    // --- Hit testing ---

    /// The topmost item at a logical-pixel point.
    #[must_use]
    pub fn hit_test(&self, x: f64, y: f64) -> Option<HitResult> {
        self.hit.hit_test(x, y)
    }

    /// Every item at a logical-pixel point, bottom-most first.
    #[must_use]
    pub fn hit_test_all(&self, x: f64, y: f64) -> Vec<HitResult> {
        self.hit.hit_test_all(x, y)
    }

    // --- Loop state ---

    /// Whether the frame loop is currently running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Transition stopped → running. Returns false when already running,
    /// in which case the caller must not schedule a second chain.
    pub fn begin_running(&mut self) -> bool {
        if self.running {
            return false;
        }
        self.running = true;
        true
    }

    /// Transition running → stopped. Returns false when already stopped.
    pub fn end_running(&mut self) -> bool {
        if !self.running {
            return false;
        }
        self.running = false;
        true
    }
}

/// Book-keeping for the active `requestAnimationFrame` chain.
#[derive(Default)]
struct RafState {
    handle: Option<i32>,
    closure: Option<Closure<dyn FnMut(f64)>>,
}

/// The full overlay renderer: owns the canvas's 2D context and the frame
/// loop. This is the single integration point for host UIs; the canvas
/// element itself remains the caller's.
pub struct OverlayRenderer {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    core: Rc<RefCell<RendererCore>>,
    raf: Rc<RefCell<RafState>>,
}

impl OverlayRenderer {
    /// Bind a renderer to `canvas` and capture the current device pixel
    /// ratio.
    ///
    /// # Errors
    ///
    /// Fails when the canvas cannot provide a 2D drawing context — the one
    /// fatal error in this subsystem; everything after construction is
    /// fail-soft.
    pub fn new(canvas: HtmlCanvasElement, config: RendererConfig) -> Result<Self, EngineError> {
        let ctx = canvas
            .get_context("2d")
            .map_err(|_| EngineError::ContextAcquisition)?
            .ok_or(EngineError::ContextUnavailable)?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| EngineError::ContextUnavailable)?;

        let mut core = RendererCore::new(config);
        core.set_size(0.0, 0.0, device_pixel_ratio());
        log::debug!("overlay: renderer bound to canvas");
        Ok(Self {
            canvas,
            ctx,
            core: Rc::new(RefCell::new(core)),
            raf: Rc::new(RefCell::new(RafState::default())),
        })
    }

    // --- Snapshot ---

    /// Set logical dimensions. The backing store becomes logical × DPR so
    /// rendering stays crisp on high-density displays; the device pixel
    /// ratio is re-read in case the window moved between monitors.
    pub fn set_size(&mut self, width: f64, height: f64) {
        let dpr = device_pixel_ratio();
        self.canvas.set_width((width * dpr).round() as u32);
        self.canvas.set_height((height * dpr).round() as u32);
        self.core.borrow_mut().set_size(width, height, dpr);
    }

    /// Replace the layer snapshot used by drawing and hit-testing.
    pub fn set_layers(&mut self, layers: Vec<Layer>) {
        self.core.borrow_mut().set_layers(layers);
    }

    /// Set the engine-wide hovered-item id.
    pub fn set_hovered(&mut self, id: Option<String>) {
        self.core.borrow_mut().set_hovered(id);
    }

    // --- Frame loop ---

    /// Start the self-rescheduling frame loop. No-op when already running.
    pub fn start(&mut self) {
        if !self.core.borrow_mut().begin_running() {
            return;
        }
        log::debug!("overlay: frame loop started");
        self.schedule_frame();
    }

    /// Stop the frame loop and cancel the pending frame callback. No-op
    /// when already stopped. A frame currently being drawn completes; no
    /// further frames are scheduled.
    pub fn stop(&mut self) {
        if !self.core.borrow_mut().end_running() {
            return;
        }
        let mut state = self.raf.borrow_mut();
        if let Some(handle) = state.handle.take() {
            if let Some(window) = web_sys::window() {
                if let Err(err) = window.cancel_animation_frame(handle) {
                    log::warn!("overlay: cancel_animation_frame failed: {err:?}");
                }
            }
        }
        state.closure = None;
        log::debug!("overlay: frame loop stopped");
    }

    /// Draw exactly one frame, without the loop needing to run.
    pub fn render_frame(&mut self) {
        let mut core = self.core.borrow_mut();
        core.record_frame(js_sys::Date::now());
        if let Err(err) = render::draw(&self.ctx, &core) {
            log::warn!("overlay: frame draw failed: {err:?}");
        }
    }

    /// The most recently sampled frames-per-second reading.
    #[must_use]
    pub fn get_fps(&self) -> f64 {
        self.core.borrow().fps()
    }

    /// Stop the loop and release scheduling resources. The canvas element
    /// is the caller's to keep.
    pub fn destroy(&mut self) {
        self.stop();
        log::debug!("overlay: renderer destroyed");
    }

    // --- Hit testing ---

    /// The topmost item at a logical-pixel point.
    #[must_use]
    pub fn hit_test(&self, x: f64, y: f64) -> Option<HitResult> {
        self.core.borrow().hit_test(x, y)
    }

    /// Every item at a logical-pixel point, bottom-most first.
    #[must_use]
    pub fn hit_test_all(&self, x: f64, y: f64) -> Vec<HitResult> {
        self.core.borrow().hit_test_all(x, y)
    }

    /// The canvas element this renderer draws to.
    #[must_use]
    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    /// Install the frame closure and request the first callback. Each
    /// callback draws, then reschedules itself while the core is running;
    /// `stop` both flips the running flag and cancels the pending handle,
    /// so the chain cannot outlive it.
    fn schedule_frame(&self) {
        let core = Rc::clone(&self.core);
        let ctx = self.ctx.clone();
        let raf = Rc::clone(&self.raf);

        let closure = Closure::wrap(Box::new(move |ts: f64| {
            raf.borrow_mut().handle = None;
            if !core.borrow().is_running() {
                return;
            }
            {
                let mut core = core.borrow_mut();
                core.record_frame(ts);
                if let Err(err) = render::draw(&ctx, &core) {
                    log::warn!("overlay: frame draw failed: {err:?}");
                }
            }
            let Some(window) = web_sys::window() else {
                return;
            };
            let requested = {
                let state = raf.borrow();
                let Some(closure) = state.closure.as_ref() else {
                    return;
                };
                window.request_animation_frame(closure.as_ref().unchecked_ref())
            };
            match requested {
                Ok(handle) => raf.borrow_mut().handle = Some(handle),
                Err(err) => log::warn!("overlay: frame scheduling failed: {err:?}"),
            }
        }) as Box<dyn FnMut(f64)>);

        let mut state = self.raf.borrow_mut();
        state.closure = Some(closure);
        let Some(window) = web_sys::window() else {
            return;
        };
        let Some(closure) = state.closure.as_ref() else {
            return;
        };
        match window.request_animation_frame(closure.as_ref().unchecked_ref()) {
            Ok(handle) => state.handle = Some(handle),
            Err(err) => log::warn!("overlay: frame scheduling failed: {err:?}"),
        }
    }
}

/// The window's device pixel ratio, clamped to at least 1. Headless
/// contexts (no window) report 1.
fn device_pixel_ratio() -> f64 {
    web_sys::window().map_or(1.0, |w| w.device_pixel_ratio()).max(1.0)
}
