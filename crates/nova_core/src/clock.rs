//! Simulation time.
//!
//! The core never reads a global clock. Callers pass a [`SimInstant`] into
//! every tick; only the idle timeout, the miss window, power-up expiry and
//! the play-duration counter look at it. Everything else counts ticks.

use serde::{Deserialize, Serialize};

/// Ticks per second for the simulation.
pub const TICK_RATE: u32 = 60;

/// Duration of one tick in microseconds (~16.67 ms).
pub const TICK_DURATION_MICROS: u64 = 16_667;

/// A point on the caller's monotonic clock, in microseconds.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct SimInstant(u64);

impl SimInstant {
    /// The origin of the clock.
    pub const ZERO: Self = Self(0);

    /// Create an instant from microseconds.
    #[must_use]
    pub const fn from_micros(micros: u64) -> Self {
        Self(micros)
    }

    /// Create an instant from milliseconds.
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis * 1_000)
    }

    /// Raw microsecond value.
    #[must_use]
    pub const fn as_micros(self) -> u64 {
        self.0
    }

    /// Whole milliseconds since the clock origin.
    #[must_use]
    pub const fn as_millis(self) -> u64 {
        self.0 / 1_000
    }

    /// Milliseconds elapsed since `earlier`, zero if `earlier` is later.
    #[must_use]
    pub const fn millis_since(self, earlier: Self) -> u64 {
        self.0.saturating_sub(earlier.0) / 1_000
    }

    /// This instant shifted forward by `millis`.
    #[must_use]
    pub const fn add_millis(self, millis: u64) -> Self {
        Self(self.0.saturating_add(millis * 1_000))
    }

    /// This instant shifted forward by `micros`.
    #[must_use]
    pub const fn add_micros(self, micros: u64) -> Self {
        Self(self.0.saturating_add(micros))
    }
}

/// Convert a millisecond span into whole simulation ticks, rounding up.
#[must_use]
pub const fn millis_to_ticks(millis: u64) -> u64 {
    (millis * 1_000).div_ceil(TICK_DURATION_MICROS)
}

/// Fixed-timestep stepper for callers that drive the simulation from a
/// real clock.
///
/// Real elapsed time is accumulated (scaled by `speed` for throttling or
/// fast-forward) and converted into a whole number of ticks; each tick gets
/// a deterministic instant exactly one tick after the previous one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixedTimestep {
    /// Instant handed to the next tick.
    next_instant: SimInstant,
    /// Accumulated, not yet consumed microseconds.
    accumulator: u64,
    /// Playback speed multiplier (1.0 = real time).
    pub speed: f64,
    /// Upper bound on ticks produced per `advance` call.
    pub max_ticks_per_step: u32,
}

impl FixedTimestep {
    /// Create a stepper whose first tick happens at `start`.
    #[must_use]
    pub fn new(start: SimInstant) -> Self {
        Self {
            next_instant: start,
            accumulator: 0,
            speed: 1.0,
            max_ticks_per_step: 8,
        }
    }

    /// Feed real elapsed microseconds and return how many ticks are due.
    pub fn advance(&mut self, real_elapsed_micros: u64) -> u32 {
        let scaled = if self.speed.is_finite() && self.speed > 0.0 {
            (real_elapsed_micros as f64 * self.speed) as u64
        } else {
            0
        };
        self.accumulator = self.accumulator.saturating_add(scaled);

        let due = self.accumulator / TICK_DURATION_MICROS;
        let ticks = due.min(u64::from(self.max_ticks_per_step));
        if due > ticks {
            // Drop the backlog instead of spiralling.
            self.accumulator = 0;
        } else {
            self.accumulator -= ticks * TICK_DURATION_MICROS;
        }
        ticks as u32
    }

    /// Instant for the next tick; advances the internal cursor.
    pub fn next_tick(&mut self) -> SimInstant {
        let now = self.next_instant;
        self.next_instant = self.next_instant.add_micros(TICK_DURATION_MICROS);
        now
    }

    /// Instant the next call to [`next_tick`](Self::next_tick) will return.
    #[must_use]
    pub const fn peek(&self) -> SimInstant {
        self.next_instant
    }
}

impl Default for FixedTimestep {
    fn default() -> Self {
        Self::new(SimInstant::ZERO)
    }
}
