//! Wave scheduling.
//!
//! Every (level, wave) pair maps to a [`WaveParams`] bundle: how fast aliens
//! spawn, how fast they fall, how tough they are and how many kills clear
//! the wave. The [`WaveScheduler`] turns those parameters into spawn orders
//! tick by tick, rolling formations and colors from the injected RNG.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::clock::{TICK_DURATION_MICROS, TICK_RATE};
use crate::components::{AlienColor, Behavior};
use crate::math::{milli, Fixed, Vec2Fixed};
use crate::progression::{Bracket, MAX_LEVEL};

/// Waves per level.
pub const WAVES_PER_LEVEL: u32 = 5;

/// Minimum gap between spawn groups.
pub const MIN_SPAWN_INTERVAL_MS: u64 = 350;

/// Altitude at which new aliens appear.
pub const ALIEN_SPAWN_Y: Fixed = milli(4_000);

/// Horizontal half-width used for spawn placement.
const SPAWN_HALF_WIDTH_MILLI: i32 = 2_800;

/// Ceiling on the per-group formation roll.
const MAX_FORMATION_CHANCE: f64 = 0.6;

/// Horizontal drift for zigzag and elite aliens, in units per second.
const ZIGZAG_SPEED: f64 = 0.9;

/// Horizontal drift for sweep formations, in units per second.
const SWEEP_SPEED: f64 = 1.2;

/// Derived parameters for one wave.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaveParams {
    /// Level the parameters were derived for.
    pub level: u32,
    /// Wave within the level (1–5).
    pub wave: u32,
    /// Spawn groups per second.
    pub enemies_per_second: f64,
    /// Alien descent speed in units per second.
    pub alien_speed: f64,
    /// Base alien hit points.
    pub alien_hp: u32,
    /// Behavior tag for the wave.
    pub special: Behavior,
    /// Nominal wave length in milliseconds.
    pub duration_ms: u64,
    /// Kills needed to clear the wave.
    pub enemies_required: u32,
    /// Gap between spawn groups in milliseconds.
    pub spawn_interval_ms: u64,
}

impl WaveParams {
    /// Derive the parameters for `level` and `wave`.
    ///
    /// Each bracket has its own base curve; within a bracket the spawn rate
    /// and speed grow by 2% per level, and hit points follow the same scale.
    #[must_use]
    pub fn for_level(level: u32, wave: u32) -> Self {
        let bracket = Bracket::for_level(level);
        let w = f64::from(wave);
        let (eps_base, eps_step, speed_base, speed_step) = match bracket {
            Bracket::Training => (0.8, 0.10, 0.60, 0.05),
            Bracket::Cadet => (1.0, 0.12, 0.75, 0.06),
            Bracket::Pilot => (1.2, 0.15, 0.90, 0.07),
            Bracket::Veteran => (1.5, 0.18, 1.05, 0.08),
            Bracket::Ace => (1.8, 0.20, 1.20, 0.09),
            Bracket::Elite => (2.2, 0.25, 1.40, 0.10),
        };
        let (base_hp, special) = match bracket {
            Bracket::Training => (1, Behavior::Basic),
            Bracket::Cadet => (if wave >= 4 { 2 } else { 1 }, Behavior::Zigzag),
            Bracket::Pilot => (2, Behavior::Scouts),
            Bracket::Veteran => (if wave == 5 { 3 } else { 2 }, Behavior::Shielded),
            Bracket::Ace => (3, Behavior::Formations),
            Bracket::Elite => (4, Behavior::Elite),
        };

        let within_bracket = level.saturating_sub(bracket.first_level());
        let scale = 1.0 + f64::from(within_bracket) * 0.02;

        let enemies_per_second = (eps_base + eps_step * w) * scale;
        let alien_speed = (speed_base + speed_step * w) * scale;
        let alien_hp = ((f64::from(base_hp) * scale).floor() as u32).max(1);
        let spawn_interval_ms =
            ((1000.0 / enemies_per_second).floor() as u64).max(MIN_SPAWN_INTERVAL_MS);

        Self {
            level,
            wave,
            enemies_per_second,
            alien_speed,
            alien_hp,
            special,
            duration_ms: 20_000 + 5_000 * u64::from(wave),
            enemies_required: 8 + 2 * wave + 2 * bracket.index(),
            spawn_interval_ms,
        }
    }
}

/// Bonus awarded for clearing `wave` at `level`.
#[must_use]
pub const fn wave_clear_bonus(wave: u32, level: u32) -> u64 {
    5_000 * wave as u64 + level as u64 * 100
}

/// Levels between boss encounters.
pub const BOSS_LEVEL_INTERVAL: u32 = 10;

/// First boss level at or above `level`.
#[must_use]
pub const fn boss_level_at_or_above(level: u32) -> u32 {
    let level = if level == 0 { 1 } else { level };
    level.div_ceil(BOSS_LEVEL_INTERVAL) * BOSS_LEVEL_INTERVAL
}

/// Whether clearing `wave` at `level` starts the encounter for `boss_level`.
///
/// The boss waits for the first wave-5 clear once the level has reached
/// its boss level, so a level-up mid-cycle never skips it.
#[must_use]
pub const fn is_boss_trigger(level: u32, wave: u32, boss_level: u32) -> bool {
    wave == WAVES_PER_LEVEL && boss_level <= MAX_LEVEL && level >= boss_level
}

// ============================================================================
// Formations
// ============================================================================

/// Spawn group layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Formation {
    /// One alien at a random column.
    Single,
    /// Five aliens in a V.
    VShape,
    /// A row of six sharing one horizontal velocity.
    HorizontalSweep,
    /// Two offset rows of three.
    Staggered,
    /// Eight aliens clustered around a point.
    Swarm,
}

impl Formation {
    /// Structured formations in unlock order.
    pub const STRUCTURED: [Self; 4] = [
        Self::VShape,
        Self::HorizontalSweep,
        Self::Staggered,
        Self::Swarm,
    ];

    /// Level at which this formation may appear.
    #[must_use]
    pub const fn unlock_level(self) -> u32 {
        match self {
            Self::Single => 1,
            Self::VShape => 3,
            Self::HorizontalSweep => 8,
            Self::Staggered => 15,
            Self::Swarm => 25,
        }
    }

    /// Structured formations available at `level`.
    #[must_use]
    pub fn unlocked(level: u32) -> Vec<Self> {
        Self::STRUCTURED
            .into_iter()
            .filter(|f| level >= f.unlock_level())
            .collect()
    }
}

/// Probability that a spawn group uses a structured formation.
#[must_use]
pub fn formation_chance(level: u32, wave: u32, special: Behavior) -> f64 {
    if Formation::unlocked(level).is_empty() {
        return 0.0;
    }
    let base = 0.05 + 0.004 * f64::from(level) + 0.03 * f64::from(wave.saturating_sub(1));
    let boosted = if special == Behavior::Formations {
        base * 2.0
    } else {
        base
    };
    boosted.min(MAX_FORMATION_CHANCE)
}

/// Roll the formation for the next spawn group.
pub fn select_formation<R: Rng + ?Sized>(
    level: u32,
    wave: u32,
    special: Behavior,
    rng: &mut R,
) -> Formation {
    let chance = formation_chance(level, wave, special);
    if chance <= 0.0 || !rng.gen_bool(chance) {
        return Formation::Single;
    }
    let unlocked = Formation::unlocked(level);
    unlocked[rng.gen_range(0..unlocked.len())]
}

/// Colors that may spawn at `level`.
#[must_use]
pub fn unlocked_colors(level: u32) -> &'static [AlienColor] {
    let all: &'static [AlienColor; 6] = &AlienColor::ALL;
    let count = (2 + Bracket::for_level(level).index() as usize).min(all.len());
    &all[..count]
}

/// A planned alien, not yet inserted into the simulation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnOrder {
    /// Spawn position.
    pub position: Vec2Fixed,
    /// Color.
    pub color: AlienColor,
    /// Hit points.
    pub hp: u32,
    /// Descent speed in units per tick.
    pub speed: Fixed,
    /// Horizontal velocity in units per tick.
    pub horizontal_velocity: Option<Fixed>,
    /// Behavior tag.
    pub behavior: Behavior,
}

fn per_tick(units_per_second: f64) -> Fixed {
    Fixed::from_num(units_per_second / f64::from(TICK_RATE))
}

fn random_column<R: Rng + ?Sized>(rng: &mut R, half_width_milli: i32) -> Fixed {
    milli(i64::from(rng.gen_range(-half_width_milli..=half_width_milli)))
}

fn random_sign<R: Rng + ?Sized>(rng: &mut R) -> Fixed {
    if rng.gen_bool(0.5) {
        Fixed::ONE
    } else {
        -Fixed::ONE
    }
}

/// Lay out one spawn group for `formation` using `params`.
pub fn plan_group<R: Rng + ?Sized>(
    params: &WaveParams,
    formation: Formation,
    rng: &mut R,
) -> Vec<SpawnOrder> {
    let offsets: Vec<(i64, i64)> = match formation {
        Formation::Single => vec![(0, 0)],
        Formation::VShape => vec![(0, 0), (-500, 400), (500, 400), (-1_000, 800), (1_000, 800)],
        Formation::HorizontalSweep => (0..6).map(|i| (-2_500 + i * 1_000, 0)).collect(),
        Formation::Staggered => vec![
            (-2_400, 0),
            (-400, 0),
            (1_600, 0),
            (-1_400, 600),
            (600, 600),
            (2_600, 600),
        ],
        Formation::Swarm => (0..8)
            .map(|_| {
                (
                    i64::from(rng.gen_range(-600..=600)),
                    i64::from(rng.gen_range(0..=800)),
                )
            })
            .collect(),
    };

    let anchor_x = match formation {
        Formation::Single => random_column(rng, SPAWN_HALF_WIDTH_MILLI),
        Formation::VShape => random_column(rng, 1_800),
        Formation::Swarm => random_column(rng, 2_000),
        Formation::HorizontalSweep | Formation::Staggered => Fixed::ZERO,
    };

    let sweep_velocity = if formation == Formation::HorizontalSweep {
        Some(per_tick(SWEEP_SPEED) * random_sign(rng))
    } else {
        None
    };

    let colors = unlocked_colors(params.level);
    let speed_factor = if params.special == Behavior::Scouts {
        1.5
    } else {
        1.0
    };
    let speed = per_tick(params.alien_speed * speed_factor);
    let hp = match params.special {
        Behavior::Shielded | Behavior::Elite => params.alien_hp + 1,
        _ => params.alien_hp,
    };

    offsets
        .into_iter()
        .map(|(dx, dy)| {
            let color = colors[rng.gen_range(0..colors.len())];
            let horizontal_velocity = match (sweep_velocity, params.special) {
                (Some(v), _) => Some(v),
                (None, Behavior::Zigzag | Behavior::Elite) => {
                    Some(per_tick(ZIGZAG_SPEED) * random_sign(rng))
                }
                _ => None,
            };
            SpawnOrder {
                position: Vec2Fixed::new(anchor_x + milli(dx), ALIEN_SPAWN_Y + milli(dy)),
                color,
                hp,
                speed,
                horizontal_velocity,
                behavior: params.special,
            }
        })
        .collect()
}

// ============================================================================
// Scheduler
// ============================================================================

/// Per-wave spawn bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WaveScheduler {
    /// Simulated microseconds accumulated toward the next spawn group.
    spawn_accumulator: u64,
    /// Kills credited to the current wave.
    kills_in_wave: u32,
    /// Simulated microseconds spent in the current wave.
    wave_elapsed_micros: u64,
    /// Boss level still waiting to be fought.
    boss_level: u32,
}

impl WaveScheduler {
    /// Fresh scheduler for a wave starting at `level`.
    ///
    /// The next boss due is the first boss level at or above `level`.
    #[must_use]
    pub const fn new(level: u32) -> Self {
        Self {
            spawn_accumulator: 0,
            kills_in_wave: 0,
            wave_elapsed_micros: 0,
            boss_level: boss_level_at_or_above(level),
        }
    }

    /// Scheduler restored partway through a wave.
    #[must_use]
    pub const fn resume(level: u32, kills_in_wave: u32) -> Self {
        Self {
            kills_in_wave,
            ..Self::new(level)
        }
    }

    /// Kills credited to the current wave.
    #[must_use]
    pub const fn kills_in_wave(&self) -> u32 {
        self.kills_in_wave
    }

    /// Simulated milliseconds spent in the current wave.
    #[must_use]
    pub const fn wave_elapsed_ms(&self) -> u64 {
        self.wave_elapsed_micros / 1_000
    }

    /// Boss level still waiting to be fought.
    #[must_use]
    pub const fn boss_level(&self) -> u32 {
        self.boss_level
    }

    /// Boss due when `wave` is cleared at `level`, if any.
    #[must_use]
    pub const fn boss_due(&self, level: u32, wave: u32) -> Option<u32> {
        if is_boss_trigger(level, wave, self.boss_level) {
            Some(self.boss_level)
        } else {
            None
        }
    }

    /// The boss for `boss_level` fell; the next one is ten levels on.
    pub fn boss_defeated(&mut self, boss_level: u32) {
        self.boss_level = boss_level + BOSS_LEVEL_INTERVAL;
    }

    /// Credit a kill to the current wave.
    pub fn record_kill(&mut self) {
        self.kills_in_wave = self.kills_in_wave.saturating_add(1);
    }

    /// Whether the current wave's kill target is met.
    #[must_use]
    pub const fn is_cleared(&self, params: &WaveParams) -> bool {
        self.kills_in_wave >= params.enemies_required
    }

    /// Wave that follows a cleared `wave`, wrapping to 1 after wave 5.
    ///
    /// The cycle runs independently of level-ups so wave 5 stays
    /// reachable however fast the score climbs.
    #[must_use]
    pub const fn next_wave(wave: u32) -> u32 {
        if wave >= WAVES_PER_LEVEL {
            1
        } else {
            wave + 1
        }
    }

    /// Start bookkeeping for a new wave. The pending boss carries over.
    pub fn begin_wave(&mut self) {
        self.spawn_accumulator = 0;
        self.kills_in_wave = 0;
        self.wave_elapsed_micros = 0;
    }

    /// Advance one tick of regular spawning.
    ///
    /// Returns the spawn orders that became due this tick.
    pub fn tick<R: Rng + ?Sized>(
        &mut self,
        level: u32,
        wave: u32,
        rng: &mut R,
    ) -> Vec<SpawnOrder> {
        self.wave_elapsed_micros += TICK_DURATION_MICROS;
        self.spawn_accumulator += TICK_DURATION_MICROS;

        let params = WaveParams::for_level(level, wave);
        let interval = params.spawn_interval_ms * 1_000;
        if self.spawn_accumulator < interval {
            return Vec::new();
        }
        self.spawn_accumulator -= interval;

        let formation = select_formation(level, wave, params.special, rng);
        tracing::trace!(level, wave, ?formation, "Spawning alien group");
        plan_group(&params, formation, rng)
    }
}

impl Default for WaveScheduler {
    fn default() -> Self {
        Self::new(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_params_level_1_wave_1() {
        let p = WaveParams::for_level(1, 1);
        assert!((p.enemies_per_second - 0.9).abs() < 1e-9);
        assert!((p.alien_speed - 0.65).abs() < 1e-9);
        assert_eq!(p.alien_hp, 1);
        assert_eq!(p.special, Behavior::Basic);
        assert_eq!(p.spawn_interval_ms, 1_111);
        assert_eq!(p.duration_ms, 25_000);
        assert_eq!(p.enemies_required, 10);
    }

    #[test]
    fn test_params_scale_within_bracket() {
        let p = WaveParams::for_level(10, 5);
        assert!((p.enemies_per_second - 1.534).abs() < 1e-9);
        assert_eq!(p.spawn_interval_ms, 651);
        assert_eq!(p.enemies_required, 18);

        let p = WaveParams::for_level(11, 4);
        assert_eq!(p.special, Behavior::Zigzag);
        assert_eq!(p.alien_hp, 2);
        assert_eq!(p.spawn_interval_ms, 675);
    }

    #[test]
    fn test_params_high_levels() {
        let p = WaveParams::for_level(50, 5);
        assert_eq!(p.special, Behavior::Shielded);
        assert_eq!(p.alien_hp, 3);
        assert_eq!(p.spawn_interval_ms, 353);
        assert_eq!(p.enemies_required, 24);

        let p = WaveParams::for_level(100, 5);
        assert_eq!(p.special, Behavior::Elite);
        assert_eq!(p.alien_hp, 5);
        assert_eq!(p.spawn_interval_ms, MIN_SPAWN_INTERVAL_MS);
        assert_eq!(p.enemies_required, 28);
    }

    #[test]
    fn test_wave_clear_bonus_and_boss_trigger() {
        assert_eq!(wave_clear_bonus(1, 1), 5_100);
        assert_eq!(wave_clear_bonus(5, 10), 26_000);
        assert!(is_boss_trigger(10, 5, 10));
        assert!(is_boss_trigger(100, 5, 100));
        assert!(!is_boss_trigger(10, 4, 10));
        assert!(!is_boss_trigger(9, 5, 10));
        assert!(!is_boss_trigger(100, 5, 110));
    }

    #[test]
    fn test_boss_trigger_after_overshooting_boss_level() {
        assert!(is_boss_trigger(11, 5, 10));
        assert!(is_boss_trigger(23, 5, 20));
    }

    #[test]
    fn test_boss_level_at_or_above() {
        assert_eq!(boss_level_at_or_above(0), 10);
        assert_eq!(boss_level_at_or_above(1), 10);
        assert_eq!(boss_level_at_or_above(10), 10);
        assert_eq!(boss_level_at_or_above(11), 20);
        assert_eq!(boss_level_at_or_above(100), 100);
    }

    #[test]
    fn test_formation_unlocks() {
        assert!(Formation::unlocked(2).is_empty());
        assert_eq!(Formation::unlocked(3), vec![Formation::VShape]);
        assert_eq!(Formation::unlocked(25).len(), 4);
        assert_eq!(formation_chance(1, 5, Behavior::Basic), 0.0);
        assert!((formation_chance(10, 1, Behavior::Basic) - 0.09).abs() < 1e-9);
        assert_eq!(formation_chance(100, 5, Behavior::Formations), 0.6);
    }

    #[test]
    fn test_single_formation_below_unlock() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..100 {
            assert_eq!(select_formation(2, 5, Behavior::Basic, &mut rng), Formation::Single);
        }
    }

    #[test]
    fn test_formations_only_use_unlocked_layouts() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for _ in 0..500 {
            let f = select_formation(10, 5, Behavior::Basic, &mut rng);
            assert!(matches!(
                f,
                Formation::Single | Formation::VShape | Formation::HorizontalSweep
            ));
        }
    }

    #[test]
    fn test_plan_group_sizes_and_bounds() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let params = WaveParams::for_level(30, 3);
        for (formation, size) in [
            (Formation::Single, 1),
            (Formation::VShape, 5),
            (Formation::HorizontalSweep, 6),
            (Formation::Staggered, 6),
            (Formation::Swarm, 8),
        ] {
            let group = plan_group(&params, formation, &mut rng);
            assert_eq!(group.len(), size);
            for order in &group {
                assert!(order.position.y >= ALIEN_SPAWN_Y);
                assert!(order.position.x.abs() <= milli(3_000));
                assert!(unlocked_colors(30).contains(&order.color));
            }
        }
    }

    #[test]
    fn test_special_tags_shape_aliens() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let zigzag = plan_group(&WaveParams::for_level(12, 1), Formation::Single, &mut rng);
        assert!(zigzag[0].horizontal_velocity.is_some());

        let shielded = WaveParams::for_level(45, 1);
        let group = plan_group(&shielded, Formation::Single, &mut rng);
        assert_eq!(group[0].hp, shielded.alien_hp + 1);

        let sweep = plan_group(&WaveParams::for_level(9, 1), Formation::HorizontalSweep, &mut rng);
        let first = sweep[0].horizontal_velocity;
        assert!(first.is_some());
        assert!(sweep.iter().all(|o| o.horizontal_velocity == first));
    }

    #[test]
    fn test_unlocked_colors_grow_with_bracket() {
        assert_eq!(unlocked_colors(1), &[AlienColor::Red, AlienColor::Green]);
        assert_eq!(unlocked_colors(30).len(), 4);
        assert_eq!(unlocked_colors(100).len(), 6);
    }

    #[test]
    fn test_scheduler_spawns_after_interval() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut scheduler = WaveScheduler::new(1);
        // 1111 ms interval: 66 ticks is 1100 ms, 67 ticks is ~1117 ms.
        for _ in 0..66 {
            assert!(scheduler.tick(1, 1, &mut rng).is_empty());
        }
        assert_eq!(scheduler.tick(1, 1, &mut rng).len(), 1);
    }

    #[test]
    fn test_scheduler_wave_progression() {
        let mut scheduler = WaveScheduler::new(4);
        let params = WaveParams::for_level(4, 2);
        for _ in 0..params.enemies_required - 1 {
            scheduler.record_kill();
        }
        assert!(!scheduler.is_cleared(&params));
        scheduler.record_kill();
        assert!(scheduler.is_cleared(&params));

        assert_eq!(WaveScheduler::next_wave(2), 3);
        assert_eq!(WaveScheduler::next_wave(4), 5);
        assert_eq!(WaveScheduler::next_wave(5), 1);

        scheduler.begin_wave();
        assert_eq!(scheduler.kills_in_wave(), 0);
        assert_eq!(scheduler.boss_level(), 10);
    }

    #[test]
    fn test_pending_boss_survives_new_waves() {
        let mut scheduler = WaveScheduler::new(8);
        assert_eq!(scheduler.boss_due(12, 4), None);
        scheduler.begin_wave();
        assert_eq!(scheduler.boss_due(12, 5), Some(10));

        scheduler.boss_defeated(10);
        assert_eq!(scheduler.boss_level(), 20);
        assert_eq!(scheduler.boss_due(12, 5), None);
        assert_eq!(scheduler.boss_due(20, 5), Some(20));
    }
}
