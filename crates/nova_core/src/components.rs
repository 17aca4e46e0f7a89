//! Entity and state component definitions.
//!
//! Components are pure data with no behavior. The rules that act on them
//! live in the system modules (`collision`, `scoring`, `combo`, ...).

use serde::{Deserialize, Serialize};

use crate::clock::SimInstant;
use crate::math::{option_fixed_serde, Fixed, Vec2Fixed};

/// Unique identifier for bullets and aliens.
pub type EntityId = u64;

// ============================================================================
// Match Status
// ============================================================================

/// Lifecycle status of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum GameStatus {
    /// Created but not started.
    #[default]
    Idle,
    /// Regular waves are running.
    Playing,
    /// Frozen by the player.
    Paused,
    /// Short break between waves, no spawns.
    WaveTransition,
    /// A boss encounter is spawning or active.
    Boss,
    /// Terminal loss.
    GameOver,
    /// A victory threshold was reached.
    Victory,
}

impl GameStatus {
    /// Whether `tick` may be called in this status.
    #[must_use]
    pub const fn accepts_ticks(self) -> bool {
        matches!(
            self,
            Self::Playing | Self::Paused | Self::WaveTransition | Self::Boss
        )
    }

    /// Whether the match has stopped advancing.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::GameOver | Self::Victory)
    }
}

/// Difficulty mode chosen at match start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum DifficultyMode {
    /// ×1 score.
    #[default]
    Normal,
    /// ×1.5 score.
    Elite,
    /// ×2 score.
    Mastery,
}

// ============================================================================
// Aliens
// ============================================================================

/// Alien color. Each color maps to a point value and a power-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AlienColor {
    /// 1 point, rapid fire.
    #[default]
    Red,
    /// 1 point, spread shot.
    Green,
    /// 2 points, shield.
    Blue,
    /// 2 points, slow time.
    Yellow,
    /// 3 points, overdrive.
    Purple,
    /// 4 points, piercing.
    Cyan,
}

impl AlienColor {
    /// All colors in unlock order.
    pub const ALL: [Self; 6] = [
        Self::Red,
        Self::Green,
        Self::Blue,
        Self::Yellow,
        Self::Purple,
        Self::Cyan,
    ];
}

/// Movement/durability tag attached to a wave and to the aliens it spawns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Behavior {
    /// Straight descent.
    #[default]
    Basic,
    /// Horizontal bounce while descending.
    Zigzag,
    /// Fast straight descent.
    Scouts,
    /// One extra hit point.
    Shielded,
    /// Formation-heavy waves.
    Formations,
    /// Zigzag plus an extra hit point.
    Elite,
}

/// An enemy ship.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Alien {
    /// Unique identifier.
    pub id: EntityId,
    /// World position.
    pub position: Vec2Fixed,
    /// Color, selects points and drop.
    pub color: AlienColor,
    /// Remaining hit points.
    pub hp: u32,
    /// Hit points at spawn.
    pub max_hp: u32,
    /// Whether this is the encounter boss.
    pub is_boss: bool,
    /// Descent speed in units per tick.
    #[serde(with = "crate::math::fixed_serde")]
    pub speed: Fixed,
    /// Horizontal velocity in units per tick.
    #[serde(with = "option_fixed_serde")]
    pub horizontal_velocity: Option<Fixed>,
    /// Behavior tag from the wave that spawned it.
    pub behavior: Option<Behavior>,
}

impl Alien {
    /// Whether the alien has no hit points left.
    #[must_use]
    pub const fn is_destroyed(&self) -> bool {
        self.hp == 0
    }
}

// ============================================================================
// Bullets
// ============================================================================

/// A player bullet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bullet {
    /// Unique identifier.
    pub id: EntityId,
    /// World position.
    pub position: Vec2Fixed,
    /// Velocity in units per tick.
    pub velocity: Vec2Fixed,
    /// Piercing bullets survive hits.
    pub piercing: bool,
    /// Last alien this bullet damaged (piercing bullets only).
    pub last_hit: Option<EntityId>,
}

// ============================================================================
// Power-Ups
// ============================================================================

/// Power-up kinds dropped by aliens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerUpType {
    /// Fire spawns two parallel bullets.
    RapidFire,
    /// Fire spawns a three-way spread.
    SpreadShot,
    /// Restores one life; never enters the active set.
    Shield,
    /// Aliens move at half speed.
    SlowTime,
    /// Bullets fly twice as fast.
    Overdrive,
    /// Bullets survive hits.
    Piercing,
}

/// A timed power-up currently affecting the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActivePowerUp {
    /// Power-up kind.
    pub kind: PowerUpType,
    /// Instant at which it stops applying.
    pub expires_at: SimInstant,
}

// ============================================================================
// Boss / Victory / Counters
// ============================================================================

/// Boss projection mirrored from the boss alien each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct BossState {
    /// True iff exactly one alien is the boss.
    pub active: bool,
    /// Current boss hit points.
    pub hp: u32,
    /// Boss hit points at spawn.
    pub max_hp: u32,
}

/// Victory tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VictoryKind {
    /// Level 10 boss.
    Minor,
    /// Level 50 boss.
    Major,
    /// Level 100 boss; ends the match.
    Ultimate,
}

impl VictoryKind {
    /// Banner shown for this victory.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Minor => "SECTOR CLEARED",
            Self::Major => "ELITE SECTOR",
            Self::Ultimate => "COSMIC SAVIOR",
        }
    }

    /// Whether play may continue after this victory.
    #[must_use]
    pub const fn allows_continue(self) -> bool {
        !matches!(self, Self::Ultimate)
    }
}

/// A granted victory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VictoryResult {
    /// Tier reached.
    pub kind: VictoryKind,
    /// Banner title.
    pub title: String,
}

impl VictoryResult {
    /// Build the result for a tier.
    #[must_use]
    pub fn new(kind: VictoryKind) -> Self {
        Self {
            kind,
            title: kind.title().to_string(),
        }
    }
}

/// Per-match counters reported in the final result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct SessionCounters {
    /// Aliens destroyed by bullets.
    pub total_kills: u64,
    /// Aliens that crossed the lower boundary.
    pub missed_aliens: u64,
    /// Escapes since the last kill.
    pub escape_streak: u32,
    /// Bullets fired.
    pub shots_fired: u64,
    /// Bullets that damaged an alien.
    pub shots_hit: u64,
    /// Waves cleared.
    pub waves_completed: u32,
    /// Power-ups picked up.
    pub power_ups_collected: u32,
}

impl SessionCounters {
    /// `shots_hit / shots_fired`, zero when nothing was fired.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        if self.shots_fired == 0 {
            return 0.0;
        }
        self.shots_hit as f64 / self.shots_fired as f64
    }
}
