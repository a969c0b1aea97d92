//! Frames-per-second sampling over rolling windows.

#[cfg(test)]
#[path = "fps_test.rs"]
mod fps_test;

use crate::consts::FPS_WINDOW_MS;

/// Counts frames over rolling ~1-second windows.
///
/// Timestamps are injected by the caller (the `requestAnimationFrame`
/// timestamp in the browser, `Date.now()` for manual frames), keeping the
/// counter clock-free. The reading updates once per elapsed window and the
/// window then resets; before the first full window it reads `0.0`.
#[derive(Debug, Clone, Default)]
pub struct FpsCounter {
    window_start_ms: Option<f64>,
    frames: u32,
    fps: f64,
}

impl FpsCounter {
    /// Create a counter with no samples.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one frame at `now_ms`.
    pub fn tick(&mut self, now_ms: f64) {
        let Some(start) = self.window_start_ms else {
            self.window_start_ms = Some(now_ms);
            self.frames = 1;
            return;
        };
        let elapsed = now_ms - start;
        if elapsed >= FPS_WINDOW_MS {
            self.fps = f64::from(self.frames) * 1000.0 / elapsed;
            self.window_start_ms = Some(now_ms);
            self.frames = 1;
        } else {
            self.frames += 1;
        }
    }

    /// The most recently completed window's frames-per-second reading.
    #[must_use]
    pub fn fps(&self) -> f64 {
        self.fps
    }
}
