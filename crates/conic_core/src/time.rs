//! Frame timing utilities.
//!
//! The scene container asks a [`FrameClock`] for a [`Time`] snapshot once per
//! frame.  [`TimeClock`] reads the wall clock; [`FixedClock`] advances by a
//! constant step so that tests and offline captures are reproducible.

use std::time::Instant;

/// Upper bound on a single frame's delta, in seconds.
///
/// Clamped to prevent spiral-of-death motion after a stall (debugger break,
/// window drag, slow first frame).
pub const MAX_DELTA: f32 = 0.1;

/// A snapshot of timing information for the current frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct Time {
    /// Seconds elapsed since the previous frame.
    pub delta: f32,

    /// Total seconds elapsed since the clock started.
    pub elapsed: f64,

    /// Number of frames ticked so far (starts at 0 for the first frame).
    pub frame_count: u64,
}

/// Source of per-frame timing.
pub trait FrameClock {
    /// Advance by one frame and return the snapshot for it.
    fn tick(&mut self) -> Time;
}

// ─── Wall clock ────────────────────────────────────────────────────────────

/// Stateful timer that accumulates time and produces [`Time`] snapshots.
pub struct TimeClock {
    start: Instant,
    last_tick: Instant,
    frame_count: u64,
}

impl TimeClock {
    /// Create a new clock, starting the epoch now.
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last_tick: now,
            frame_count: 0,
        }
    }
}

impl Default for TimeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock for TimeClock {
    fn tick(&mut self) -> Time {
        let now = Instant::now();
        let delta = (now - self.last_tick).as_secs_f32().min(MAX_DELTA);
        let elapsed = (now - self.start).as_secs_f64();
        let frame_count = self.frame_count;

        self.last_tick = now;
        self.frame_count += 1;

        Time {
            delta,
            elapsed,
            frame_count,
        }
    }
}

// ─── Fixed step ────────────────────────────────────────────────────────────

/// Deterministic clock: every tick advances by `step` seconds.
#[derive(Debug, Clone)]
pub struct FixedClock {
    step: f32,
    elapsed: f64,
    frame_count: u64,
}

impl FixedClock {
    pub fn new(step: f32) -> Self {
        Self {
            step,
            elapsed: 0.0,
            frame_count: 0,
        }
    }

    /// 60 Hz.
    pub fn sixty_hz() -> Self {
        Self::new(1.0 / 60.0)
    }
}

impl FrameClock for FixedClock {
    fn tick(&mut self) -> Time {
        let t = Time {
            delta: self.step,
            elapsed: self.elapsed + self.step as f64,
            frame_count: self.frame_count,
        };
        self.elapsed = t.elapsed;
        self.frame_count += 1;
        t
    }
}
