//! Score-to-level progression.
//!
//! Level is never stored as an independent source of truth: the simulation
//! recomputes it from the score every tick through [`level_from_score`].
//! Thresholds are cumulative and grow super-linearly
//! (`floor(500 · L · L^0.85)`).

use serde::{Deserialize, Serialize};

/// Lowest level.
pub const MIN_LEVEL: u32 = 1;

/// Highest level.
pub const MAX_LEVEL: u32 = 100;

/// Cumulative score needed to reach `level`.
///
/// Level 1 (and anything below it) needs nothing.
#[must_use]
pub fn required_score(level: u32) -> u64 {
    if level <= MIN_LEVEL {
        return 0;
    }
    let l = f64::from(level);
    (500.0 * l * l.powf(0.85)).floor() as u64
}

/// Greatest level (capped at [`MAX_LEVEL`]) whose threshold is within `score`.
#[must_use]
pub fn level_from_score(score: u64) -> u32 {
    let mut level = MIN_LEVEL;
    for candidate in (MIN_LEVEL + 1)..=MAX_LEVEL {
        if required_score(candidate) > score {
            break;
        }
        level = candidate;
    }
    level
}

/// Percentage progress from `level` toward the next threshold, in `[0, 100]`.
#[must_use]
pub fn level_progress(score: u64, level: u32) -> f64 {
    if level >= MAX_LEVEL {
        return 100.0;
    }
    let floor = required_score(level);
    let ceiling = required_score(level + 1);
    let span = ceiling.saturating_sub(floor);
    if span == 0 {
        return 100.0;
    }
    let gained = score.saturating_sub(floor) as f64;
    (gained / span as f64 * 100.0).clamp(0.0, 100.0)
}

/// One of the six named difficulty sectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Bracket {
    /// Levels 1–10.
    Training,
    /// Levels 11–25.
    Cadet,
    /// Levels 26–40.
    Pilot,
    /// Levels 41–60.
    Veteran,
    /// Levels 61–80.
    Ace,
    /// Levels 81–100.
    Elite,
}

impl Bracket {
    /// All brackets in level order.
    pub const ALL: [Self; 6] = [
        Self::Training,
        Self::Cadet,
        Self::Pilot,
        Self::Veteran,
        Self::Ace,
        Self::Elite,
    ];

    /// Sector containing `level`. Levels above 100 fall into `Elite`.
    #[must_use]
    pub const fn for_level(level: u32) -> Self {
        match level {
            0..=10 => Self::Training,
            11..=25 => Self::Cadet,
            26..=40 => Self::Pilot,
            41..=60 => Self::Veteran,
            61..=80 => Self::Ace,
            _ => Self::Elite,
        }
    }

    /// First level of the sector.
    #[must_use]
    pub const fn first_level(self) -> u32 {
        match self {
            Self::Training => 1,
            Self::Cadet => 11,
            Self::Pilot => 26,
            Self::Veteran => 41,
            Self::Ace => 61,
            Self::Elite => 81,
        }
    }

    /// Last level of the sector.
    #[must_use]
    pub const fn last_level(self) -> u32 {
        match self {
            Self::Training => 10,
            Self::Cadet => 25,
            Self::Pilot => 40,
            Self::Veteran => 60,
            Self::Ace => 80,
            Self::Elite => 100,
        }
    }

    /// Zero-based position of the sector.
    #[must_use]
    pub const fn index(self) -> u32 {
        match self {
            Self::Training => 0,
            Self::Cadet => 1,
            Self::Pilot => 2,
            Self::Veteran => 3,
            Self::Ace => 4,
            Self::Elite => 5,
        }
    }

    /// Lower-case sector name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Training => "training",
            Self::Cadet => "cadet",
            Self::Pilot => "pilot",
            Self::Veteran => "veteran",
            Self::Ace => "ace",
            Self::Elite => "elite",
        }
    }
}

impl std::fmt::Display for Bracket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_score_boundaries() {
        assert_eq!(required_score(0), 0);
        assert_eq!(required_score(1), 0);
        assert_eq!(required_score(2), 1_802);
        assert_eq!(required_score(10), 35_397);
        assert_eq!(required_score(11), 42_222);
        assert_eq!(required_score(25), 192_823);
        assert_eq!(required_score(26), 207_334);
        assert_eq!(required_score(50), 695_127);
        assert_eq!(required_score(100), 2_505_936);
    }

    #[test]
    fn test_level_from_score_boundaries() {
        assert_eq!(level_from_score(0), 1);
        assert_eq!(level_from_score(1_801), 1);
        assert_eq!(level_from_score(1_802), 2);
        assert_eq!(level_from_score(42_221), 10);
        assert_eq!(level_from_score(42_222), 11);
        assert_eq!(level_from_score(u64::MAX), 100);
    }

    #[test]
    fn test_level_roundtrip_every_level() {
        for level in MIN_LEVEL..=MAX_LEVEL {
            assert_eq!(level_from_score(required_score(level)), level);
        }
    }

    #[test]
    fn test_thresholds_strictly_increase() {
        for level in MIN_LEVEL..MAX_LEVEL {
            assert!(required_score(level) < required_score(level + 1));
        }
    }

    #[test]
    fn test_level_progress() {
        assert_eq!(level_progress(0, 1), 0.0);
        assert_eq!(level_progress(901, 1), 901.0 / 1_802.0 * 100.0);
        assert_eq!(level_progress(5_000, 1), 100.0);
        assert_eq!(level_progress(0, 100), 100.0);
        assert_eq!(level_progress(35_397, 10), 0.0);
    }

    #[test]
    fn test_brackets() {
        assert_eq!(Bracket::for_level(1), Bracket::Training);
        assert_eq!(Bracket::for_level(10), Bracket::Training);
        assert_eq!(Bracket::for_level(11), Bracket::Cadet);
        assert_eq!(Bracket::for_level(25), Bracket::Cadet);
        assert_eq!(Bracket::for_level(26), Bracket::Pilot);
        assert_eq!(Bracket::for_level(40), Bracket::Pilot);
        assert_eq!(Bracket::for_level(50), Bracket::Veteran);
        assert_eq!(Bracket::for_level(80), Bracket::Ace);
        assert_eq!(Bracket::for_level(100), Bracket::Elite);
    }

    #[test]
    fn test_brackets_are_contiguous() {
        for pair in Bracket::ALL.windows(2) {
            assert_eq!(pair[0].last_level() + 1, pair[1].first_level());
        }
        for bracket in Bracket::ALL {
            assert_eq!(Bracket::for_level(bracket.first_level()), bracket);
            assert_eq!(Bracket::for_level(bracket.last_level()), bracket);
        }
    }

    mod properties {
        use super::super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_level_is_monotonic(a in 0u64..3_000_000, b in 0u64..3_000_000) {
                let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
                prop_assert!(level_from_score(lo) <= level_from_score(hi));
            }

            #[test]
            fn prop_level_threshold_within_score(score in 0u64..3_000_000) {
                let level = level_from_score(score);
                prop_assert!(required_score(level) <= score);
                if level < MAX_LEVEL {
                    prop_assert!(required_score(level + 1) > score);
                }
            }

            #[test]
            fn prop_progress_is_clamped(score in 0u64..3_000_000, level in 1u32..=100) {
                let progress = level_progress(score, level);
                prop_assert!((0.0..=100.0).contains(&progress));
            }
        }
    }
}
