//! Scripted pilots for headless playtesting.
//!
//! An autopilot looks at the match state once per tick and returns the
//! intents to queue. It only reads state, so a match played by an
//! autopilot is as deterministic as the simulation itself.

use nova_core::components::Alien;
use nova_core::simulation::{Intent, SimulationState};
use serde::{Deserialize, Serialize};

/// Tunables for an [`Autopilot`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutopilotConfig {
    /// Profile name.
    pub name: String,
    /// Ticks between fire intents.
    pub fire_interval_ticks: u64,
    /// Largest horizontal move per tick.
    pub max_step: f64,
    /// Vertical distance above the ship under which aliens are dodged
    /// rather than targeted.
    pub dodge_distance: f64,
    /// Horizontal distance considered "in line" with the ship.
    pub alignment_tolerance: f64,
}

impl Default for AutopilotConfig {
    fn default() -> Self {
        Self {
            name: "steady".to_string(),
            fire_interval_ticks: 8,
            max_step: 0.08,
            dodge_distance: 1.2,
            alignment_tolerance: 0.15,
        }
    }
}

impl AutopilotConfig {
    /// Fires constantly and cuts dodging short.
    #[must_use]
    pub fn aggressive() -> Self {
        Self {
            name: "aggressive".to_string(),
            fire_interval_ticks: 3,
            max_step: 0.12,
            dodge_distance: 0.6,
            alignment_tolerance: 0.25,
        }
    }

    /// Slow trigger, wide berth around low aliens.
    #[must_use]
    pub fn cautious() -> Self {
        Self {
            name: "cautious".to_string(),
            fire_interval_ticks: 15,
            max_step: 0.06,
            dodge_distance: 1.8,
            alignment_tolerance: 0.1,
        }
    }

    /// Never moves or fires. Useful as a baseline: the match is lost to
    /// escapes or the idle timer.
    #[must_use]
    pub fn idle() -> Self {
        Self {
            name: "idle".to_string(),
            fire_interval_ticks: 0,
            max_step: 0.0,
            dodge_distance: 0.0,
            alignment_tolerance: 0.0,
        }
    }

    /// Look up a built-in profile by name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "steady" | "default" => Some(Self::default()),
            "aggressive" => Some(Self::aggressive()),
            "cautious" => Some(Self::cautious()),
            "idle" => Some(Self::idle()),
            _ => None,
        }
    }
}

/// A deterministic pilot.
///
/// Each tick it picks the alien most likely to escape (lowest on screen,
/// bosses first) that is still above the dodge band, slides toward its
/// column and fires on a fixed cadence. Aliens already inside the dodge
/// band and near the ship's column push it sideways instead.
#[derive(Debug, Clone)]
pub struct Autopilot {
    config: AutopilotConfig,
}

impl Autopilot {
    /// Create a pilot from a profile.
    #[must_use]
    pub const fn new(config: AutopilotConfig) -> Self {
        Self { config }
    }

    /// Profile in use.
    #[must_use]
    pub const fn config(&self) -> &AutopilotConfig {
        &self.config
    }

    /// Intents for the tick about to run.
    #[must_use]
    pub fn decide(&self, state: &SimulationState) -> Vec<Intent> {
        let mut intents = Vec::new();
        if !state.status.accepts_ticks() {
            return intents;
        }

        let (px, py) = state.player.to_f64();
        let dx = self.steer(state, px, py);
        if dx != 0.0 {
            intents.push(Intent::Move { dx, dy: 0.0 });
        }

        let interval = self.config.fire_interval_ticks;
        if interval > 0 && state.tick % interval == 0 {
            intents.push(Intent::Fire);
        }
        intents
    }

    fn steer(&self, state: &SimulationState, px: f64, py: f64) -> f64 {
        let step = self.config.max_step;
        if step <= 0.0 {
            return 0.0;
        }

        if let Some(threat) = state
            .aliens
            .iter()
            .filter(|a| !a.is_boss)
            .map(position)
            .filter(|&(x, y)| y - py < self.config.dodge_distance && (x - px).abs() < 0.5)
            .min_by(|a, b| a.1.total_cmp(&b.1))
        {
            // Slide away from the threat, toward the roomier side.
            return if threat.0 >= px { -step } else { step };
        }

        let target = state
            .aliens
            .iter()
            .filter(|a| a.is_boss || position(a).1 - py >= self.config.dodge_distance)
            .min_by(|a, b| {
                b.is_boss
                    .cmp(&a.is_boss)
                    .then(position(a).1.total_cmp(&position(b).1))
            });

        match target {
            Some(alien) => {
                let offset = position(alien).0 - px;
                if offset.abs() <= self.config.alignment_tolerance {
                    0.0
                } else {
                    offset.clamp(-step, step)
                }
            }
            None => (-px).clamp(-step, step),
        }
    }
}

impl Default for Autopilot {
    fn default() -> Self {
        Self::new(AutopilotConfig::default())
    }
}

fn position(alien: &Alien) -> (f64, f64) {
    alien.position.to_f64()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nova_core::components::{AlienColor, GameStatus};
    use nova_test_utils::fixtures::still_alien;

    fn playing() -> SimulationState {
        SimulationState {
            status: GameStatus::Playing,
            ..SimulationState::new()
        }
    }

    #[test]
    fn test_profiles_by_name() {
        assert_eq!(AutopilotConfig::from_name("steady"), Some(AutopilotConfig::default()));
        assert_eq!(
            AutopilotConfig::from_name("aggressive").map(|c| c.fire_interval_ticks),
            Some(3)
        );
        assert!(AutopilotConfig::from_name("berserk").is_none());
    }

    #[test]
    fn test_no_intents_when_not_running() {
        let pilot = Autopilot::default();
        assert!(pilot.decide(&SimulationState::new()).is_empty());
    }

    #[test]
    fn test_fires_on_cadence() {
        let pilot = Autopilot::default();
        let mut state = playing();
        assert!(pilot.decide(&state).contains(&Intent::Fire));
        state.tick = 1;
        assert!(!pilot.decide(&state).contains(&Intent::Fire));
        state.tick = 8;
        assert!(pilot.decide(&state).contains(&Intent::Fire));
    }

    #[test]
    fn test_steers_toward_lowest_alien() {
        let pilot = Autopilot::default();
        let mut state = playing();
        state.aliens.push(still_alien(1, -2.0, 3.5, AlienColor::Red, 1));
        state.aliens.push(still_alien(2, 1.5, 1.0, AlienColor::Red, 1));

        let intents = pilot.decide(&state);
        assert!(intents.contains(&Intent::Move { dx: 0.08, dy: 0.0 }));
    }

    #[test]
    fn test_holds_when_aligned() {
        let pilot = Autopilot::default();
        let mut state = playing();
        state.aliens.push(still_alien(1, 0.1, 2.0, AlienColor::Red, 1));
        assert!(!pilot
            .decide(&state)
            .iter()
            .any(|i| matches!(i, Intent::Move { .. })));
    }

    #[test]
    fn test_dodges_low_alien() {
        let pilot = Autopilot::default();
        let mut state = playing();
        state.aliens.push(still_alien(1, 0.2, -2.0, AlienColor::Red, 1));
        let intents = pilot.decide(&state);
        assert!(intents.contains(&Intent::Move { dx: -0.08, dy: 0.0 }));
    }

    #[test]
    fn test_prefers_boss() {
        let pilot = Autopilot::default();
        let mut state = playing();
        state.aliens.push(still_alien(1, -1.0, 0.0, AlienColor::Red, 1));
        state.aliens.push(Alien {
            is_boss: true,
            ..still_alien(2, 1.0, 3.5, AlienColor::Red, 40)
        });
        let intents = pilot.decide(&state);
        assert!(intents.contains(&Intent::Move { dx: 0.08, dy: 0.0 }));
    }

    #[test]
    fn test_idle_profile_does_nothing() {
        let pilot = Autopilot::new(AutopilotConfig::idle());
        let mut state = playing();
        state.aliens.push(still_alien(1, 2.0, 2.0, AlienColor::Red, 1));
        assert!(pilot.decide(&state).is_empty());
    }
}
