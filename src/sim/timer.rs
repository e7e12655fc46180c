//! Phase timer
//!
//! Tracks time spent in the current phase. A configured start delay is stored
//! as negative elapsed time, so the timer counts up through zero before the
//! first phase begins. Overshoot past a phase boundary is carried into the
//! next phase instead of being dropped.

use serde::{Deserialize, Serialize};

/// Elapsed-time tracker for a single phase
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhaseTimer {
    /// Seconds into the current phase (negative while the start delay runs)
    elapsed: f32,
    /// Duration of the current phase (seconds)
    duration: f32,
    /// Start delay re-applied on reset (seconds, >= 0)
    start_delay: f32,
}

impl PhaseTimer {
    /// Create a timer for a first phase of `duration`, delayed by `start_delay`
    pub fn new(duration: f32, start_delay: f32) -> Self {
        Self {
            elapsed: -start_delay.max(0.0),
            duration,
            start_delay: start_delay.max(0.0),
        }
    }

    /// Add `dt` seconds. Time spent in the start delay is consumed first;
    /// any remainder counts toward the phase.
    #[inline]
    pub fn advance(&mut self, dt: f32) {
        self.elapsed += dt.max(0.0);
    }

    /// Still counting down the start delay
    #[inline]
    pub fn is_delaying(&self) -> bool {
        self.elapsed < 0.0
    }

    /// Seconds into the current phase, never negative
    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed.max(0.0)
    }

    /// Raw elapsed value including any remaining start delay
    #[inline]
    pub fn raw_elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Duration of the current phase
    #[inline]
    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Normalized progress in [0, 1]. Instantaneous phases report 1.
    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.duration).clamp(0.0, 1.0)
        }
    }

    /// The current phase has run its full duration
    #[inline]
    pub fn is_complete(&self) -> bool {
        !self.is_delaying() && self.elapsed >= self.duration
    }

    /// Move into the next phase keeping the overshoot of the current one
    pub fn roll_over(&mut self, next_duration: f32) {
        self.elapsed = (self.elapsed - self.duration).max(0.0);
        self.duration = next_duration;
    }

    /// Drop whole `cycle`s of overshoot past the end of the current phase,
    /// keeping the last full cycle so every phase still runs once. Returns
    /// the number of cycles dropped.
    pub fn skip_cycles(&mut self, cycle: f32) -> u64 {
        if self.is_delaying() || cycle.is_nan() || cycle <= 0.0 || self.elapsed < self.duration + 2.0 * cycle {
            return 0;
        }
        if !self.elapsed.is_finite() {
            self.elapsed = self.duration + cycle;
            return 0;
        }
        let overshoot = f64::from(self.elapsed) - f64::from(self.duration);
        let cycles = (overshoot / f64::from(cycle)).floor() - 1.0;
        let kept = overshoot - cycles * f64::from(cycle);
        self.elapsed = self.duration + (kept as f32).clamp(0.0, 2.0 * cycle);
        cycles as u64
    }

    /// Start a phase from zero, discarding any carry-over
    pub fn restart(&mut self, duration: f32) {
        self.elapsed = 0.0;
        self.duration = duration;
    }

    /// Back to the configured start delay
    pub fn reset(&mut self, duration: f32) {
        self.elapsed = -self.start_delay;
        self.duration = duration;
    }
}
