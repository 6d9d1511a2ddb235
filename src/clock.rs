//! Wall-clock frame timing for the windowed host.
//!
//! The engine itself only consumes `Δt`; this is where `Δt` comes from.
//! [`Clock::tick`] measures the gap since the previous frame, clamps stalls to
//! [`MAX_FRAME_DELTA`], and keeps a rolling FPS estimate for the title bar.
//!
//! ```ignore
//! let mut clock = Clock::new();
//!
//! // Once per redraw:
//! let dt = clock.tick();
//! engine.tick(dt)?;
//! ```

use std::time::{Duration, Instant};

/// Largest frame delta handed to the engine, in seconds.
///
/// A window that was minimized or dragged can report a gap of several
/// seconds; the animation should continue from where it was instead.
pub const MAX_FRAME_DELTA: f32 = 0.1;

/// How often the FPS estimate is refreshed.
const FPS_WINDOW: Duration = Duration::from_millis(500);

/// Frame timer.
#[derive(Debug)]
pub struct Clock {
    last_frame: Instant,
    delta: f32,
    frames: u64,
    fps: f32,
    fps_frames: u64,
    fps_since: Instant,
    paused: bool,
    fixed_delta: Option<f32>,
}

impl Clock {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            last_frame: now,
            delta: 0.0,
            frames: 0,
            fps: 0.0,
            fps_frames: 0,
            fps_since: now,
            paused: false,
            fixed_delta: None,
        }
    }

    /// A clock that always reports the same delta, for deterministic runs.
    pub fn fixed(delta: f32) -> Self {
        let mut clock = Self::new();
        clock.set_fixed_delta(Some(delta));
        clock
    }

    /// Advance one frame and return its delta in seconds.
    ///
    /// Returns 0 while paused.
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        self.tick_at(now)
    }

    fn tick_at(&mut self, now: Instant) -> f32 {
        if self.paused {
            self.delta = 0.0;
            return 0.0;
        }

        let measured = now.saturating_duration_since(self.last_frame).as_secs_f32();
        self.delta = self.fixed_delta.unwrap_or(measured).clamp(0.0, MAX_FRAME_DELTA);
        self.last_frame = now;
        self.frames += 1;

        let window = now.saturating_duration_since(self.fps_since);
        if window >= FPS_WINDOW {
            self.fps = (self.frames - self.fps_frames) as f32 / window.as_secs_f32();
            self.fps_frames = self.frames;
            self.fps_since = now;
        }

        self.delta
    }

    /// Delta of the most recent frame.
    #[inline]
    pub fn delta(&self) -> f32 {
        self.delta
    }

    /// Frames ticked while running.
    #[inline]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resume after a pause.
    ///
    /// The next delta is measured from this call, so time spent paused never
    /// shows up as one large jump.
    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            self.reanchor();
        }
    }

    /// Measure the next delta from now.
    pub fn reanchor(&mut self) {
        let now = Instant::now();
        self.last_frame = now;
        self.fps_since = now;
        self.fps_frames = self.frames;
    }

    /// Use a constant delta instead of measured time. `None` restores
    /// measurement.
    pub fn set_fixed_delta(&mut self, delta: Option<f32>) {
        self.fixed_delta = delta.filter(|d| d.is_finite()).map(|d| d.max(0.0));
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}
