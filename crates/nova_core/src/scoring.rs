//! Score deltas and power-up drops.
//!
//! All formulas work in integers: the half-step Elite multiplier is applied
//! as `x * 3 / 2`, which floors exactly like the real-valued formula.

use rand::Rng;

use crate::clock::SimInstant;
use crate::components::{ActivePowerUp, AlienColor, DifficultyMode, PowerUpType};
use crate::progression::required_score;

/// Score unit every kill is scaled from.
pub const BASE_KILL_SCORE: u64 = 500;

/// Extra multiplier for boss kills.
pub const BOSS_MULTIPLIER: u64 = 5;

/// How long a timed power-up lasts.
pub const POWER_UP_DURATION_MS: u64 = 10_000;

/// Most lives a player can hold.
pub const MAX_LIVES: u32 = 3;

/// Base point value of an alien color.
#[must_use]
pub const fn reward_points(color: AlienColor) -> u64 {
    match color {
        AlienColor::Red | AlienColor::Green => 1,
        AlienColor::Blue | AlienColor::Yellow => 2,
        AlienColor::Purple => 3,
        AlienColor::Cyan => 4,
    }
}

/// Power-up dropped by an alien color.
#[must_use]
pub const fn power_up_for(color: AlienColor) -> PowerUpType {
    match color {
        AlienColor::Red => PowerUpType::RapidFire,
        AlienColor::Green => PowerUpType::SpreadShot,
        AlienColor::Blue => PowerUpType::Shield,
        AlienColor::Yellow => PowerUpType::SlowTime,
        AlienColor::Purple => PowerUpType::Overdrive,
        AlienColor::Cyan => PowerUpType::Piercing,
    }
}

/// Apply the difficulty multiplier to an integer score.
#[must_use]
pub const fn apply_mode(value: u64, mode: DifficultyMode) -> u64 {
    match mode {
        DifficultyMode::Normal => value,
        DifficultyMode::Elite => value * 3 / 2,
        DifficultyMode::Mastery => value * 2,
    }
}

/// Inputs to a kill score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KillContext {
    /// Color of the destroyed alien.
    pub color: AlienColor,
    /// Hit points the alien spawned with. Ignored for the boss, whose
    /// kill uses an HP factor of 1 and the boss multiplier instead.
    pub max_hp: u32,
    /// Whether the alien was the boss.
    pub is_boss: bool,
    /// Current wave.
    pub wave: u32,
    /// Combo multiplier after counting this kill.
    pub combo_multiplier: u32,
    /// Difficulty mode.
    pub mode: DifficultyMode,
}

/// Score for one kill.
///
/// Bosses use a durability term of 1; the boss multiplier stands in for
/// their hit points.
#[must_use]
pub const fn kill_score(ctx: &KillContext) -> u64 {
    let (hp_term, boss_term) = if ctx.is_boss {
        (1, BOSS_MULTIPLIER)
    } else {
        (ctx.max_hp as u64, 1)
    };
    let raw = BASE_KILL_SCORE
        * reward_points(ctx.color)
        * hp_term
        * ctx.wave as u64
        * ctx.combo_multiplier as u64
        * boss_term;
    apply_mode(raw, ctx.mode)
}

/// Probability that a regular kill drops its power-up.
#[must_use]
pub const fn drop_chance(level: u32) -> f64 {
    match level {
        0..=49 => 1.0,
        50..=59 => 0.9,
        60..=69 => 0.8,
        70..=79 => 0.75,
        80..=89 => 0.7,
        _ => 0.6,
    }
}

/// Roll whether a kill drops its power-up. Bosses always drop.
pub fn roll_drop<R: Rng + ?Sized>(level: u32, is_boss: bool, rng: &mut R) -> bool {
    if is_boss {
        return true;
    }
    let chance = drop_chance(level);
    chance >= 1.0 || rng.gen_bool(chance)
}

/// Score lost when an alien escapes at `level`.
#[must_use]
pub const fn escape_penalty(level: u32) -> u64 {
    match level {
        0..=49 => 0,
        50..=59 => 100,
        60..=69 => 200,
        70..=79 => 300,
        80..=89 => 400,
        _ => 500,
    }
}

/// Subtract `penalty` from `score` without dropping below the threshold
/// of `level`.
#[must_use]
pub fn apply_penalty(score: u64, penalty: u64, level: u32) -> u64 {
    score.saturating_sub(penalty).max(required_score(level).min(score))
}

/// What collecting a power-up did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerUpOutcome {
    /// Shield restored a life (false when already at the cap).
    LifeRestored(bool),
    /// A timed power-up was added.
    Activated,
    /// An active power-up had its expiry pushed back.
    Refreshed,
}

/// Collect `kind` at `now`, updating the active set and lives.
pub fn collect_power_up(
    active: &mut Vec<ActivePowerUp>,
    lives: &mut u32,
    kind: PowerUpType,
    now: SimInstant,
) -> PowerUpOutcome {
    if kind == PowerUpType::Shield {
        let restored = *lives < MAX_LIVES;
        *lives = (*lives + 1).min(MAX_LIVES);
        return PowerUpOutcome::LifeRestored(restored);
    }

    let expires_at = now.add_millis(POWER_UP_DURATION_MS);
    if let Some(existing) = active.iter_mut().find(|p| p.kind == kind) {
        existing.expires_at = expires_at;
        PowerUpOutcome::Refreshed
    } else {
        active.push(ActivePowerUp { kind, expires_at });
        PowerUpOutcome::Activated
    }
}

/// Drop power-ups whose expiry is at or before `now`, returning their kinds.
pub fn expire_power_ups(active: &mut Vec<ActivePowerUp>, now: SimInstant) -> Vec<PowerUpType> {
    let mut expired = Vec::new();
    active.retain(|p| {
        if p.expires_at <= now {
            expired.push(p.kind);
            false
        } else {
            true
        }
    });
    expired
}

/// Whether `kind` is currently active.
#[must_use]
pub fn has_power_up(active: &[ActivePowerUp], kind: PowerUpType) -> bool {
    active.iter().any(|p| p.kind == kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn ctx(color: AlienColor) -> KillContext {
        KillContext {
            color,
            max_hp: 1,
            is_boss: false,
            wave: 1,
            combo_multiplier: 1,
            mode: DifficultyMode::Normal,
        }
    }

    #[test]
    fn test_base_kill_score_per_color() {
        for color in AlienColor::ALL {
            assert_eq!(kill_score(&ctx(color)), 500 * reward_points(color));
        }
        assert_eq!(kill_score(&ctx(AlienColor::Red)), 500);
        assert_eq!(kill_score(&ctx(AlienColor::Blue)), 1_000);
        assert_eq!(kill_score(&ctx(AlienColor::Purple)), 1_500);
        assert_eq!(kill_score(&ctx(AlienColor::Cyan)), 2_000);
    }

    #[test]
    fn test_kill_score_multipliers() {
        let mut c = ctx(AlienColor::Green);
        c.max_hp = 3;
        c.wave = 4;
        c.combo_multiplier = 2;
        assert_eq!(kill_score(&c), 500 * 3 * 4 * 2);

        c.mode = DifficultyMode::Elite;
        assert_eq!(kill_score(&c), 500 * 3 * 4 * 2 * 3 / 2);

        c.mode = DifficultyMode::Mastery;
        assert_eq!(kill_score(&c), 500 * 3 * 4 * 2 * 2);
    }

    #[test]
    fn test_boss_kill_ignores_hp() {
        let mut c = ctx(AlienColor::Red);
        c.is_boss = true;
        c.max_hp = 40;
        c.wave = 5;
        assert_eq!(kill_score(&c), 12_500);

        c.max_hp = 265;
        assert_eq!(kill_score(&c), 12_500);
    }

    #[test]
    fn test_drop_chance_steps() {
        assert_eq!(drop_chance(1), 1.0);
        assert_eq!(drop_chance(49), 1.0);
        assert_eq!(drop_chance(50), 0.9);
        assert_eq!(drop_chance(65), 0.8);
        assert_eq!(drop_chance(75), 0.75);
        assert_eq!(drop_chance(89), 0.7);
        assert_eq!(drop_chance(90), 0.6);
        assert_eq!(drop_chance(100), 0.6);
    }

    #[test]
    fn test_drops_guaranteed_low_level_and_boss() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        for _ in 0..200 {
            assert!(roll_drop(10, false, &mut rng));
            assert!(roll_drop(100, true, &mut rng));
        }
        let drops = (0..1_000).filter(|_| roll_drop(95, false, &mut rng)).count();
        assert!((500..700).contains(&drops));
    }

    #[test]
    fn test_escape_penalty_steps() {
        assert_eq!(escape_penalty(49), 0);
        assert_eq!(escape_penalty(50), 100);
        assert_eq!(escape_penalty(60), 200);
        assert_eq!(escape_penalty(79), 300);
        assert_eq!(escape_penalty(80), 400);
        assert_eq!(escape_penalty(90), 500);
    }

    #[test]
    fn test_penalty_floors_at_level_threshold() {
        let floor = required_score(50);
        assert_eq!(apply_penalty(floor + 1_000, 100, 50), floor + 900);
        assert_eq!(apply_penalty(floor + 50, 100, 50), floor);
        assert_eq!(apply_penalty(40, 100, 1), 0);
    }

    #[test]
    fn test_shield_restores_life_without_entering_set() {
        let mut active = Vec::new();
        let mut lives = 2;
        let outcome = collect_power_up(&mut active, &mut lives, PowerUpType::Shield, SimInstant::ZERO);
        assert_eq!(outcome, PowerUpOutcome::LifeRestored(true));
        assert_eq!(lives, 3);
        assert!(active.is_empty());

        let outcome = collect_power_up(&mut active, &mut lives, PowerUpType::Shield, SimInstant::ZERO);
        assert_eq!(outcome, PowerUpOutcome::LifeRestored(false));
        assert_eq!(lives, 3);
    }

    #[test]
    fn test_power_up_refresh_does_not_stack() {
        let mut active = Vec::new();
        let mut lives = 3;
        let t0 = SimInstant::from_millis(1_000);
        let t1 = SimInstant::from_millis(6_000);
        collect_power_up(&mut active, &mut lives, PowerUpType::Overdrive, t0);
        let outcome = collect_power_up(&mut active, &mut lives, PowerUpType::Overdrive, t1);
        assert_eq!(outcome, PowerUpOutcome::Refreshed);
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].expires_at, SimInstant::from_millis(16_000));
    }

    #[test]
    fn test_power_up_expiry() {
        let mut active = Vec::new();
        let mut lives = 3;
        collect_power_up(&mut active, &mut lives, PowerUpType::SlowTime, SimInstant::ZERO);
        collect_power_up(
            &mut active,
            &mut lives,
            PowerUpType::Piercing,
            SimInstant::from_millis(5_000),
        );

        assert!(expire_power_ups(&mut active, SimInstant::from_millis(9_999)).is_empty());
        assert_eq!(
            expire_power_ups(&mut active, SimInstant::from_millis(10_000)),
            vec![PowerUpType::SlowTime]
        );
        assert!(has_power_up(&active, PowerUpType::Piercing));
        assert!(!has_power_up(&active, PowerUpType::SlowTime));
    }
}
