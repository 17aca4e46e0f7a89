//! Kill streak tracking.
//!
//! The combo grows by one per kill and drives a closed five-step score
//! multiplier table. Resets are requested by the collision and condition
//! systems; the engine itself only owns the level ≥ 50 decay countdown.

use serde::{Deserialize, Serialize};

use crate::clock::millis_to_ticks;

/// Combo value that grants the one-time PERFECT bonus.
pub const PERFECT_COMBO: u32 = 50;

/// Bonus granted when the combo reaches [`PERFECT_COMBO`].
pub const PERFECT_BONUS: u64 = 10_000;

/// Level from which an idle combo decays.
pub const DECAY_MIN_LEVEL: u32 = 50;

/// Decay countdown length in milliseconds.
pub const DECAY_INTERVAL_MS: u64 = 2_000;

/// Named multiplier tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ComboTier {
    /// 6–15, ×2.
    Great,
    /// 16–30, ×3.
    Awesome,
    /// 31–49, ×4.
    Incredible,
    /// 50+, ×5.
    Perfect,
}

impl ComboTier {
    /// Tier for a combo value; `None` below 6.
    #[must_use]
    pub const fn for_combo(combo: u32) -> Option<Self> {
        match combo {
            0..=5 => None,
            6..=15 => Some(Self::Great),
            16..=30 => Some(Self::Awesome),
            31..=49 => Some(Self::Incredible),
            _ => Some(Self::Perfect),
        }
    }

    /// HUD label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Great => "GREAT",
            Self::Awesome => "AWESOME",
            Self::Incredible => "INCREDIBLE",
            Self::Perfect => "PERFECT",
        }
    }

    /// Score multiplier.
    #[must_use]
    pub const fn multiplier(self) -> u32 {
        match self {
            Self::Great => 2,
            Self::Awesome => 3,
            Self::Incredible => 4,
            Self::Perfect => 5,
        }
    }
}

/// Score multiplier for a combo value.
#[must_use]
pub const fn combo_multiplier(combo: u32) -> u32 {
    match ComboTier::for_combo(combo) {
        Some(tier) => tier.multiplier(),
        None => 1,
    }
}

/// Outcome of registering a kill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KillStreak {
    /// Combo after the kill.
    pub combo: u32,
    /// Multiplier for the kill's score.
    pub multiplier: u32,
    /// PERFECT bonus earned by this kill (0 when none).
    pub perfect_bonus: u64,
}

/// Combo state machine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ComboEngine {
    combo: u32,
    max_combo: u32,
    /// Whether reaching [`PERFECT_COMBO`] pays the bonus.
    perfect_armed: bool,
    /// Ticks left on the decay countdown, if running.
    decay_ticks_remaining: Option<u64>,
}

impl ComboEngine {
    /// Fresh engine with a zero combo.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            combo: 0,
            max_combo: 0,
            perfect_armed: true,
            decay_ticks_remaining: None,
        }
    }

    /// Engine restored from a saved combo.
    ///
    /// The PERFECT award counts as spent when the combo is already at or
    /// past the threshold.
    #[must_use]
    pub const fn resume(combo: u32, max_combo: u32) -> Self {
        Self {
            combo,
            max_combo: if max_combo > combo { max_combo } else { combo },
            perfect_armed: combo < PERFECT_COMBO,
            decay_ticks_remaining: None,
        }
    }

    /// Current combo.
    #[must_use]
    pub const fn combo(&self) -> u32 {
        self.combo
    }

    /// Highest combo this match.
    #[must_use]
    pub const fn max_combo(&self) -> u32 {
        self.max_combo
    }

    /// Current multiplier.
    #[must_use]
    pub const fn multiplier(&self) -> u32 {
        combo_multiplier(self.combo)
    }

    /// Count a kill at `level`.
    pub fn register_kill(&mut self, level: u32) -> KillStreak {
        self.combo = self.combo.saturating_add(1);
        self.max_combo = self.max_combo.max(self.combo);

        let perfect_bonus = if self.combo == PERFECT_COMBO && self.perfect_armed {
            self.perfect_armed = false;
            tracing::debug!(combo = self.combo, "PERFECT combo bonus");
            PERFECT_BONUS
        } else {
            0
        };

        if level >= DECAY_MIN_LEVEL {
            self.decay_ticks_remaining = Some(millis_to_ticks(DECAY_INTERVAL_MS));
        }

        KillStreak {
            combo: self.combo,
            multiplier: self.multiplier(),
            perfect_bonus,
        }
    }

    /// Drop the combo to zero. Returns whether there was a streak to lose.
    pub fn reset(&mut self) -> bool {
        let had_streak = self.combo > 0;
        self.combo = 0;
        self.perfect_armed = true;
        self.decay_ticks_remaining = None;
        had_streak
    }

    /// Run one tick of the level ≥ 50 decay. Returns whether the combo dropped.
    pub fn tick_decay(&mut self, level: u32) -> bool {
        if level < DECAY_MIN_LEVEL || self.combo == 0 {
            self.decay_ticks_remaining = None;
            return false;
        }

        let interval = millis_to_ticks(DECAY_INTERVAL_MS);
        let remaining = self.decay_ticks_remaining.unwrap_or(interval);
        if remaining > 1 {
            self.decay_ticks_remaining = Some(remaining - 1);
            return false;
        }

        self.combo -= 1;
        if self.combo == 0 {
            self.perfect_armed = true;
            self.decay_ticks_remaining = None;
        } else {
            self.decay_ticks_remaining = Some(interval);
        }
        true
    }
}

impl Default for ComboEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multiplier_table_boundaries() {
        assert_eq!(combo_multiplier(0), 1);
        assert_eq!(combo_multiplier(5), 1);
        assert_eq!(combo_multiplier(6), 2);
        assert_eq!(combo_multiplier(15), 2);
        assert_eq!(combo_multiplier(16), 3);
        assert_eq!(combo_multiplier(30), 3);
        assert_eq!(combo_multiplier(31), 4);
        assert_eq!(combo_multiplier(49), 4);
        assert_eq!(combo_multiplier(50), 5);
        assert_eq!(combo_multiplier(500), 5);
    }

    #[test]
    fn test_tier_labels() {
        assert_eq!(ComboTier::for_combo(5), None);
        assert_eq!(ComboTier::for_combo(6).map(ComboTier::label), Some("GREAT"));
        assert_eq!(ComboTier::for_combo(16).map(ComboTier::label), Some("AWESOME"));
        assert_eq!(ComboTier::for_combo(31).map(ComboTier::label), Some("INCREDIBLE"));
        assert_eq!(ComboTier::for_combo(50).map(ComboTier::label), Some("PERFECT"));
    }

    #[test]
    fn test_kills_increment_and_track_max() {
        let mut engine = ComboEngine::new();
        for expected in 1..=7 {
            let streak = engine.register_kill(1);
            assert_eq!(streak.combo, expected);
        }
        assert_eq!(engine.multiplier(), 2);
        assert!(engine.reset());
        assert_eq!(engine.combo(), 0);
        assert_eq!(engine.max_combo(), 7);
        assert!(!engine.reset());
    }

    #[test]
    fn test_perfect_bonus_awarded_once() {
        let mut engine = ComboEngine::new();
        let mut bonus = 0;
        for _ in 0..60 {
            bonus += engine.register_kill(1).perfect_bonus;
        }
        assert_eq!(bonus, PERFECT_BONUS);
    }

    #[test]
    fn test_perfect_bonus_rearms_after_reset() {
        let mut engine = ComboEngine::new();
        for _ in 0..50 {
            engine.register_kill(1);
        }
        engine.reset();
        let mut bonus = 0;
        for _ in 0..50 {
            bonus += engine.register_kill(1).perfect_bonus;
        }
        assert_eq!(bonus, PERFECT_BONUS);
    }

    #[test]
    fn test_resume_past_perfect_does_not_pay_again() {
        let mut engine = ComboEngine::resume(55, 10);
        assert_eq!(engine.max_combo(), 55);
        assert_eq!(engine.register_kill(1).perfect_bonus, 0);

        let mut engine = ComboEngine::resume(49, 49);
        assert_eq!(engine.register_kill(1).perfect_bonus, PERFECT_BONUS);
    }

    #[test]
    fn test_no_decay_below_level_50() {
        let mut engine = ComboEngine::new();
        engine.register_kill(49);
        for _ in 0..1_000 {
            assert!(!engine.tick_decay(49));
        }
        assert_eq!(engine.combo(), 1);
    }

    #[test]
    fn test_decay_every_two_seconds_at_level_50() {
        let mut engine = ComboEngine::new();
        engine.register_kill(50);
        engine.register_kill(50);

        for _ in 0..119 {
            assert!(!engine.tick_decay(50));
        }
        assert!(engine.tick_decay(50));
        assert_eq!(engine.combo(), 1);

        for _ in 0..119 {
            assert!(!engine.tick_decay(50));
        }
        assert!(engine.tick_decay(50));
        assert_eq!(engine.combo(), 0);
        assert!(!engine.tick_decay(50));
    }

    #[test]
    fn test_kill_restarts_decay_countdown() {
        let mut engine = ComboEngine::new();
        engine.register_kill(60);
        for _ in 0..100 {
            engine.tick_decay(60);
        }
        engine.register_kill(60);
        for _ in 0..119 {
            assert!(!engine.tick_decay(60));
        }
        assert_eq!(engine.combo(), 2);
    }
}
