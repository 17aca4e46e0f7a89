//! Test fixtures and helpers.
//!
//! Pre-built matches and alien placements for consistent testing.

use fixed::types::I32F32;
use nova_core::clock::{SimInstant, TICK_DURATION_MICROS};
use nova_core::components::{Alien, AlienColor, Behavior, EntityId, GameStatus};
use nova_core::config::SimulationConfig;
use nova_core::math::Vec2Fixed;
use nova_core::progression::required_score;
use nova_core::simulation::{Simulation, SimulationState, TickEvents};
use nova_core::waves::SpawnOrder;

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Create a fixed-point number from a float (for tests only).
///
/// Note: In real simulation code, never use floats.
/// This is only for convenient test setup.
#[must_use]
pub fn fixed_f(n: f64) -> I32F32 {
    I32F32::from_num(n)
}

/// Instant of `tick` on a clock that starts at zero and advances one
/// nominal tick per call.
#[must_use]
pub const fn at(tick: u64) -> SimInstant {
    SimInstant::from_micros(tick * TICK_DURATION_MICROS)
}

/// A seeded match already switched to `Playing`.
///
/// # Panics
///
/// Panics if the match refuses to start, which would be a core bug.
#[must_use]
pub fn playing_match(seed: u64) -> Simulation {
    let mut sim = Simulation::new(SimulationConfig::with_seed(seed));
    sim.set_status(GameStatus::Playing)
        .expect("idle match must start");
    sim
}

/// Order for a motionless alien at `(x, y)`.
#[must_use]
pub fn still_order(x: f64, y: f64, color: AlienColor, hp: u32) -> SpawnOrder {
    SpawnOrder {
        position: Vec2Fixed::from_f64(x, y),
        color,
        hp,
        speed: I32F32::ZERO,
        horizontal_velocity: None,
        behavior: Behavior::Basic,
    }
}

/// Place a motionless alien in `sim`.
///
/// # Panics
///
/// Panics if the alien cap is already reached.
pub fn place_alien(sim: &mut Simulation, x: f64, y: f64, color: AlienColor, hp: u32) -> EntityId {
    sim.spawn_alien(still_order(x, y, color, hp))
        .expect("alien cap reached in fixture")
}

/// A motionless alien value for building states by hand.
#[must_use]
pub fn still_alien(id: EntityId, x: f64, y: f64, color: AlienColor, hp: u32) -> Alien {
    Alien {
        id,
        position: Vec2Fixed::from_f64(x, y),
        color,
        hp,
        max_hp: hp,
        is_boss: false,
        speed: I32F32::ZERO,
        horizontal_velocity: None,
        behavior: None,
    }
}

/// State at the start of `level`, paused on nothing and ready to tick.
#[must_use]
pub fn state_at_level(level: u32, wave: u32, status: GameStatus) -> SimulationState {
    SimulationState {
        status,
        score: required_score(level),
        wave,
        ..SimulationState::new()
    }
}

/// Boss fight at `level` with a motionless boss at the origin that has
/// `hp` of `max_hp` hit points left.
#[must_use]
pub fn boss_fight(level: u32, hp: u32, max_hp: u32) -> Simulation {
    let mut state = state_at_level(level, 5, GameStatus::Boss);
    state.aliens.push(Alien {
        is_boss: true,
        max_hp,
        ..still_alien(1, 0.0, 0.0, AlienColor::Red, hp)
    });
    Simulation::from_state(SimulationConfig::default(), state)
}

/// Queue one tick of plain play.
///
/// Steers under the lowest alien and fires. While a wave is running and
/// the field is empty, a motionless red alien is placed just above the
/// muzzle so the wave keeps moving.
pub fn hunt(sim: &mut Simulation) {
    let player = sim.state().player;
    let target = sim
        .state()
        .aliens
        .iter()
        .filter(|a| !a.is_destroyed())
        .min_by_key(|a| a.position.y)
        .map(|a| a.position.x);

    match target {
        Some(x) => sim.apply_move((x - player.x).to_num::<f64>(), 0.0),
        None if sim.state().status == GameStatus::Playing => {
            let _ = sim.spawn_alien(still_order(
                player.x.to_num(),
                player.y.to_num::<f64>() + 0.6,
                AlienColor::Red,
                1,
            ));
        }
        None => {}
    }
    sim.apply_fire();
}

/// [`run_until`] with [`hunt`] queued before every tick.
pub fn hunt_until(
    sim: &mut Simulation,
    start: u64,
    limit: u64,
    done: impl Fn(&TickEvents) -> bool,
) -> Option<TickEvents> {
    for t in start..start + limit {
        if !sim.state().status.accepts_ticks() {
            return None;
        }
        hunt(sim);
        let events = sim.tick(at(t));
        if done(&events) {
            return Some(events);
        }
    }
    None
}

/// Tick `sim` from `start` until `done` holds for a tick's events, for at
/// most `limit` ticks or until the match stops accepting ticks.
pub fn run_until(
    sim: &mut Simulation,
    start: u64,
    limit: u64,
    done: impl Fn(&TickEvents) -> bool,
) -> Option<TickEvents> {
    for t in start..start + limit {
        if !sim.state().status.accepts_ticks() {
            return None;
        }
        let events = sim.tick(at(t));
        if done(&events) {
            return Some(events);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_helpers() {
        assert_eq!(fixed(3), I32F32::from_num(3));
        assert_eq!(fixed_f(0.5), I32F32::from_num(0.5));
        assert_eq!(at(60).as_micros(), 60 * TICK_DURATION_MICROS);
    }

    #[test]
    fn test_playing_match_starts() {
        let sim = playing_match(5);
        assert_eq!(sim.state().status, GameStatus::Playing);
        assert_eq!(sim.config().seed, 5);
    }

    #[test]
    fn test_place_alien() {
        let mut sim = playing_match(1);
        let id = place_alien(&mut sim, 1.0, 2.0, AlienColor::Cyan, 3);
        let alien = &sim.state().aliens[0];
        assert_eq!(alien.id, id);
        assert_eq!(alien.position, Vec2Fixed::from_f64(1.0, 2.0));
        assert_eq!(alien.max_hp, 3);
    }

    #[test]
    fn test_hunt_keeps_killing() {
        let mut sim = playing_match(3);
        hunt_until(&mut sim, 0, 120, |_| false);
        assert!(sim.state().counters.total_kills >= 10);
        assert_eq!(sim.state().lives, 3);
    }

    #[test]
    fn test_boss_fight_fixture() {
        let sim = boss_fight(50, 10, 140);
        assert_eq!(sim.state().level, 50);
        assert!(sim.state().boss.active);
        assert_eq!(sim.state().boss.hp, 10);
        assert_eq!(sim.encounter().level(), 50);
    }
}
