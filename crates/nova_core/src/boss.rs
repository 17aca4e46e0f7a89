//! Boss encounters.
//!
//! Every tenth level ends its fifth wave with a boss. The encounter walks
//! through `Dormant → Spawning → Active → Defeated | Failed`; the boss
//! itself is an ordinary [`Alien`] flagged `is_boss`, so movement and
//! collision treat it like any other alien apart from its hit radius.

use serde::{Deserialize, Serialize};

use crate::clock::millis_to_ticks;
use crate::components::{Alien, AlienColor, EntityId};
use crate::math::{milli, Fixed, Vec2Fixed};

/// Delay between the wave clear and the boss appearing.
pub const BOSS_SPAWN_DELAY_MS: u64 = 1_000;

/// Where the boss appears.
pub const BOSS_SPAWN_POSITION: Vec2Fixed = Vec2Fixed::new(Fixed::ZERO, milli(3_500));

/// Horizontal limit at which the boss turns around.
pub const BOSS_BOUNCE_LIMIT: Fixed = milli(2_500);

/// Boss hit points at `level`.
#[must_use]
pub const fn boss_hp(level: u32) -> u32 {
    15 + (level / 10) * 25
}

/// Milliseconds between two power activations at `level`.
#[must_use]
pub const fn power_cooldown_ms(level: u32) -> u64 {
    5_000 + level as u64 * 50
}

/// Current phase for the HUD: `ceil(hp / max_hp · phases)`, 0 once dead.
#[must_use]
pub const fn boss_phase(hp: u32, max_hp: u32, phases: u32) -> u32 {
    if hp == 0 || max_hp == 0 {
        return 0;
    }
    (hp * phases).div_ceil(max_hp)
}

/// How a boss moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MovementPattern {
    /// Steady side-to-side sweep.
    Sweep,
    /// Fast side-to-side.
    Zigzag,
    /// Slow drift, barely descending.
    Hover,
    /// Quick descent.
    Dive,
}

impl MovementPattern {
    /// Horizontal and descent speed in milli-units per second.
    const fn speeds_milli(self) -> (i64, i64) {
        match self {
            Self::Sweep => (1_000, 80),
            Self::Zigzag => (1_800, 100),
            Self::Hover => (600, 50),
            Self::Dive => (800, 150),
        }
    }

    /// Horizontal speed in units per tick.
    #[must_use]
    pub fn horizontal_speed(self) -> Fixed {
        milli(self.speeds_milli().0) / 60
    }

    /// Descent speed in units per tick.
    #[must_use]
    pub fn descent_speed(self) -> Fixed {
        milli(self.speeds_milli().1) / 60
    }
}

/// Signature ability, surfaced to attack directors as an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum BossPower {
    DroneSwarm,
    PhaseShift,
    ShieldPulse,
    PlasmaRain,
    GravityWell,
    Split,
    TimeWarp,
    SolarFlare,
    BlackHole,
    Annihilation,
}

/// Fixed description of one boss.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BossProfile {
    /// Boss level (10, 20, ... 100).
    pub level: u32,
    /// Display name.
    pub name: &'static str,
    /// Movement pattern.
    pub pattern: MovementPattern,
    /// Signature power.
    pub power: BossPower,
    /// Color, which also decides the guaranteed drop.
    pub color: AlienColor,
    /// Number of HUD phases.
    pub phases: u32,
}

/// One profile per boss level.
pub const BOSS_PROFILES: [BossProfile; 10] = [
    BossProfile {
        level: 10,
        name: "Hive Sentinel",
        pattern: MovementPattern::Sweep,
        power: BossPower::DroneSwarm,
        color: AlienColor::Red,
        phases: 2,
    },
    BossProfile {
        level: 20,
        name: "Void Stalker",
        pattern: MovementPattern::Zigzag,
        power: BossPower::PhaseShift,
        color: AlienColor::Green,
        phases: 2,
    },
    BossProfile {
        level: 30,
        name: "Iron Matriarch",
        pattern: MovementPattern::Sweep,
        power: BossPower::ShieldPulse,
        color: AlienColor::Blue,
        phases: 3,
    },
    BossProfile {
        level: 40,
        name: "Plasma Wraith",
        pattern: MovementPattern::Hover,
        power: BossPower::PlasmaRain,
        color: AlienColor::Yellow,
        phases: 3,
    },
    BossProfile {
        level: 50,
        name: "Star Devourer",
        pattern: MovementPattern::Dive,
        power: BossPower::GravityWell,
        color: AlienColor::Purple,
        phases: 3,
    },
    BossProfile {
        level: 60,
        name: "Nebula Hydra",
        pattern: MovementPattern::Zigzag,
        power: BossPower::Split,
        color: AlienColor::Cyan,
        phases: 4,
    },
    BossProfile {
        level: 70,
        name: "Quantum Reaper",
        pattern: MovementPattern::Dive,
        power: BossPower::TimeWarp,
        color: AlienColor::Red,
        phases: 4,
    },
    BossProfile {
        level: 80,
        name: "Solar Tyrant",
        pattern: MovementPattern::Hover,
        power: BossPower::SolarFlare,
        color: AlienColor::Yellow,
        phases: 4,
    },
    BossProfile {
        level: 90,
        name: "Abyss Leviathan",
        pattern: MovementPattern::Sweep,
        power: BossPower::BlackHole,
        color: AlienColor::Purple,
        phases: 5,
    },
    BossProfile {
        level: 100,
        name: "Cosmic Overlord",
        pattern: MovementPattern::Dive,
        power: BossPower::Annihilation,
        color: AlienColor::Cyan,
        phases: 5,
    },
];

impl BossProfile {
    /// Profile for a boss level. Non-multiples of ten fall back to the
    /// boss of the decade below, and anything under 10 to the first boss.
    #[must_use]
    pub fn for_level(level: u32) -> &'static Self {
        let index = (level / 10).clamp(1, 10) - 1;
        &BOSS_PROFILES[index as usize]
    }
}

/// Build the boss alien for `level`.
#[must_use]
pub fn boss_alien(id: EntityId, level: u32) -> Alien {
    let profile = BossProfile::for_level(level);
    let hp = boss_hp(level);
    Alien {
        id,
        position: BOSS_SPAWN_POSITION,
        color: profile.color,
        hp,
        max_hp: hp,
        is_boss: true,
        speed: profile.pattern.descent_speed(),
        horizontal_velocity: Some(profile.pattern.horizontal_speed()),
        behavior: None,
    }
}

/// Encounter lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum EncounterState {
    /// No encounter running.
    #[default]
    Dormant,
    /// Waiting to place the boss.
    Spawning {
        /// Ticks until the boss appears.
        ticks_remaining: u64,
    },
    /// Boss is on the field.
    Active {
        /// Boss entity.
        boss_id: EntityId,
        /// Ticks until the next power may fire.
        power_ticks_remaining: u64,
    },
    /// Boss destroyed.
    Defeated,
    /// Boss reached the lower boundary.
    Failed,
}

/// What the encounter wants the simulation to do this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncounterAction {
    /// Nothing this tick.
    None,
    /// Place the boss alien now.
    SpawnBoss,
    /// The boss's power is off cooldown.
    ActivatePower(BossPower),
}

/// Boss encounter state machine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct BossEncounter {
    state: EncounterState,
    /// Level the encounter was triggered at.
    level: u32,
}

impl BossEncounter {
    /// A dormant encounter.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: EncounterState::Dormant,
            level: 0,
        }
    }

    /// Rebuild an active encounter around an existing boss alien.
    #[must_use]
    pub fn resume(level: u32, boss_id: EntityId) -> Self {
        Self {
            state: EncounterState::Active {
                boss_id,
                power_ticks_remaining: millis_to_ticks(power_cooldown_ms(level)),
            },
            level,
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> EncounterState {
        self.state
    }

    /// Level the encounter belongs to (0 when dormant since creation).
    #[must_use]
    pub const fn level(&self) -> u32 {
        self.level
    }

    /// Profile of the boss being fought.
    #[must_use]
    pub fn profile(&self) -> Option<&'static BossProfile> {
        self.is_engaged().then(|| BossProfile::for_level(self.level))
    }

    /// Whether the encounter is spawning or active.
    #[must_use]
    pub const fn is_engaged(&self) -> bool {
        matches!(
            self.state,
            EncounterState::Spawning { .. } | EncounterState::Active { .. }
        )
    }

    /// Entity id of the boss while active.
    #[must_use]
    pub const fn boss_id(&self) -> Option<EntityId> {
        match self.state {
            EncounterState::Active { boss_id, .. } => Some(boss_id),
            _ => None,
        }
    }

    /// Start the encounter for `level`.
    pub fn trigger(&mut self, level: u32) {
        tracing::info!(level, boss = BossProfile::for_level(level).name, "Boss encounter triggered");
        self.level = level;
        self.state = EncounterState::Spawning {
            ticks_remaining: millis_to_ticks(BOSS_SPAWN_DELAY_MS),
        };
    }

    /// Record that the boss alien was placed.
    pub fn mark_spawned(&mut self, boss_id: EntityId) {
        self.state = EncounterState::Active {
            boss_id,
            power_ticks_remaining: millis_to_ticks(power_cooldown_ms(self.level)),
        };
    }

    /// Advance one tick.
    pub fn tick(&mut self) -> EncounterAction {
        match &mut self.state {
            EncounterState::Spawning { ticks_remaining } => {
                *ticks_remaining = ticks_remaining.saturating_sub(1);
                if *ticks_remaining == 0 {
                    EncounterAction::SpawnBoss
                } else {
                    EncounterAction::None
                }
            }
            EncounterState::Active {
                power_ticks_remaining,
                ..
            } => {
                *power_ticks_remaining = power_ticks_remaining.saturating_sub(1);
                if *power_ticks_remaining == 0 {
                    *power_ticks_remaining = millis_to_ticks(power_cooldown_ms(self.level));
                    EncounterAction::ActivatePower(BossProfile::for_level(self.level).power)
                } else {
                    EncounterAction::None
                }
            }
            EncounterState::Dormant | EncounterState::Defeated | EncounterState::Failed => {
                EncounterAction::None
            }
        }
    }

    /// The boss was destroyed.
    pub fn defeat(&mut self) {
        tracing::info!(level = self.level, "Boss defeated");
        self.state = EncounterState::Defeated;
    }

    /// The boss escaped.
    pub fn fail(&mut self) {
        tracing::info!(level = self.level, "Boss escaped");
        self.state = EncounterState::Failed;
    }

    /// Return to dormant.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boss_hp_formula() {
        assert_eq!(boss_hp(10), 40);
        assert_eq!(boss_hp(50), 140);
        assert_eq!(boss_hp(100), 265);
    }

    #[test]
    fn test_power_cooldown() {
        assert_eq!(power_cooldown_ms(10), 5_500);
        assert_eq!(power_cooldown_ms(100), 10_000);
    }

    #[test]
    fn test_phase_is_ceiling() {
        assert_eq!(boss_phase(40, 40, 2), 2);
        assert_eq!(boss_phase(21, 40, 2), 2);
        assert_eq!(boss_phase(20, 40, 2), 1);
        assert_eq!(boss_phase(1, 40, 2), 1);
        assert_eq!(boss_phase(0, 40, 2), 0);
        assert_eq!(boss_phase(265, 265, 5), 5);
        assert_eq!(boss_phase(53, 265, 5), 1);
        assert_eq!(boss_phase(54, 265, 5), 2);
    }

    #[test]
    fn test_profiles_cover_every_boss_level() {
        for (i, profile) in BOSS_PROFILES.iter().enumerate() {
            let level = (i as u32 + 1) * 10;
            assert_eq!(profile.level, level);
            assert_eq!(BossProfile::for_level(level), profile);
        }
        assert_eq!(BossProfile::for_level(10).name, "Hive Sentinel");
        assert_eq!(BossProfile::for_level(100).name, "Cosmic Overlord");
    }

    #[test]
    fn test_boss_alien_shape() {
        let boss = boss_alien(7, 50);
        assert!(boss.is_boss);
        assert_eq!(boss.hp, 140);
        assert_eq!(boss.max_hp, 140);
        assert_eq!(boss.position, BOSS_SPAWN_POSITION);
        assert_eq!(boss.speed, MovementPattern::Dive.descent_speed());
    }

    #[test]
    fn test_spawn_delay_then_power_cooldown() {
        let mut encounter = BossEncounter::new();
        assert_eq!(encounter.tick(), EncounterAction::None);

        encounter.trigger(10);
        assert!(encounter.is_engaged());
        for _ in 0..59 {
            assert_eq!(encounter.tick(), EncounterAction::None);
        }
        assert_eq!(encounter.tick(), EncounterAction::SpawnBoss);

        encounter.mark_spawned(42);
        assert_eq!(encounter.boss_id(), Some(42));
        let cooldown = millis_to_ticks(power_cooldown_ms(10));
        for _ in 0..cooldown - 1 {
            assert_eq!(encounter.tick(), EncounterAction::None);
        }
        assert_eq!(
            encounter.tick(),
            EncounterAction::ActivatePower(BossPower::DroneSwarm)
        );
        // Power fires at most once per cooldown window.
        assert_eq!(encounter.tick(), EncounterAction::None);
    }

    #[test]
    fn test_defeat_and_fail_end_engagement() {
        let mut encounter = BossEncounter::resume(50, 3);
        assert_eq!(encounter.profile().map(|p| p.name), Some("Star Devourer"));
        encounter.defeat();
        assert_eq!(encounter.state(), EncounterState::Defeated);
        assert!(!encounter.is_engaged());
        assert!(encounter.profile().is_none());

        let mut encounter = BossEncounter::resume(20, 3);
        encounter.fail();
        assert_eq!(encounter.state(), EncounterState::Failed);
        encounter.reset();
        assert_eq!(encounter, BossEncounter::new());
    }
}
