//! Loss and victory conditions.
//!
//! Hard losses end the match. Soft penalties (the miss window and the idle
//! timer) only cost the combo; they run on the injected wall clock and are
//! independent of each other.

use serde::{Deserialize, Serialize};

use crate::clock::SimInstant;
use crate::components::VictoryKind;

/// Rolling window for counting escapes.
pub const MISS_WINDOW_MS: u64 = 10_000;

/// Escapes inside one window that cost the combo.
pub const MISS_WINDOW_LIMIT: u32 = 3;

/// Time without a fire intent that costs the combo.
pub const IDLE_TIMEOUT_MS: u64 = 15_000;

/// Consecutive escapes that end the match.
pub const ESCAPE_STREAK_LIMIT: u32 = 5;

/// Why a match was lost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LossReason {
    /// No lives left.
    LivesExhausted,
    /// The boss crossed the lower boundary.
    BossEscaped,
    /// Too many aliens escaped in a row.
    EscapeStreak,
    /// The match was abandoned through a status change.
    Abandoned,
}

/// Why the combo was reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComboResetReason {
    /// An alien touched the player.
    PlayerHit,
    /// The boss escaped.
    BossEscaped,
    /// Too many escapes inside the miss window.
    MissWindow,
    /// No fire intent for too long.
    Idle,
}

/// Whether an escape streak ends the match.
#[must_use]
pub const fn escape_streak_exceeded(streak: u32) -> bool {
    streak >= ESCAPE_STREAK_LIMIT
}

/// Victory granted for defeating the boss of `level`, if any.
#[must_use]
pub const fn victory_for_level(level: u32) -> Option<VictoryKind> {
    match level {
        10 => Some(VictoryKind::Minor),
        50 => Some(VictoryKind::Major),
        100 => Some(VictoryKind::Ultimate),
        _ => None,
    }
}

/// Escapes counted inside a rolling window that opens on the first escape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct MissWindow {
    started_at: Option<SimInstant>,
    count: u32,
}

impl MissWindow {
    /// Empty window.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            started_at: None,
            count: 0,
        }
    }

    /// Escapes in the open window.
    #[must_use]
    pub const fn count(&self) -> u32 {
        self.count
    }

    /// Record an escape at `now`. Returns true when the limit was reached,
    /// in which case the window is cleared.
    pub fn record_miss(&mut self, now: SimInstant) -> bool {
        match self.started_at {
            Some(start) if now.millis_since(start) <= MISS_WINDOW_MS => self.count += 1,
            _ => {
                self.started_at = Some(now);
                self.count = 1;
            }
        }

        if self.count >= MISS_WINDOW_LIMIT {
            *self = Self::new();
            true
        } else {
            false
        }
    }

    /// Push the window start forward by a paused gap.
    pub fn shift(&mut self, micros: u64) {
        if let Some(start) = self.started_at.as_mut() {
            *start = start.add_micros(micros);
        }
    }
}

/// Tracks time since the last fire intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct IdleTimer {
    last_fire: SimInstant,
}

impl IdleTimer {
    /// Timer counting from `start`.
    #[must_use]
    pub const fn new(start: SimInstant) -> Self {
        Self { last_fire: start }
    }

    /// Instant of the last fire (or the match start).
    #[must_use]
    pub const fn last_fire(&self) -> SimInstant {
        self.last_fire
    }

    /// Note a fire intent.
    pub fn record_fire(&mut self, now: SimInstant) {
        self.last_fire = now;
    }

    /// True once the idle timeout has passed. The timer then restarts, so a
    /// player who never fires loses the combo every timeout period rather
    /// than every tick.
    pub fn check(&mut self, now: SimInstant) -> bool {
        if now.millis_since(self.last_fire) >= IDLE_TIMEOUT_MS {
            self.last_fire = now;
            true
        } else {
            false
        }
    }

    /// Push the last fire forward by a paused gap.
    pub fn shift(&mut self, micros: u64) {
        self.last_fire = self.last_fire.add_micros(micros);
    }
}
