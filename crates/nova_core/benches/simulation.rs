//! Simulation benchmarks for nova_core.
//!
//! Run with: `cargo bench -p nova_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use nova_core::clock::{SimInstant, TICK_DURATION_MICROS};
use nova_core::components::GameStatus;
use nova_core::config::SimulationConfig;
use nova_core::progression::level_from_score;
use nova_core::simulation::{Simulation, SimulationState};

fn at(tick: u64) -> SimInstant {
    SimInstant::from_micros(tick * TICK_DURATION_MICROS)
}

/// A match that has been running for `ticks` with steady fire.
fn warmed_up(ticks: u64) -> Simulation {
    let mut sim = Simulation::new(SimulationConfig::with_seed(42));
    let _ = sim.set_status(GameStatus::Playing);
    for t in 0..ticks {
        if t % 6 == 0 {
            sim.apply_fire();
        }
        sim.tick(at(t));
    }
    sim
}

/// Runs simulation benchmarks for the nova_core crate.
pub fn simulation_benchmark(c: &mut Criterion) {
    c.bench_function("tick_600_from_start", |b| {
        b.iter_batched(
            || {
                let mut sim = Simulation::new(SimulationConfig::with_seed(7));
                let _ = sim.set_status(GameStatus::Playing);
                sim
            },
            |mut sim| {
                for t in 0..600 {
                    if t % 6 == 0 {
                        sim.apply_fire();
                    }
                    black_box(sim.tick(at(t)));
                }
                sim
            },
            BatchSize::SmallInput,
        );
    });

    c.bench_function("tick_crowded_late_game", |b| {
        let state = SimulationState {
            status: GameStatus::Playing,
            score: 2_000_000,
            level: level_from_score(2_000_000),
            ..SimulationState::new()
        };
        b.iter_batched(
            || Simulation::from_state(SimulationConfig::with_seed(3), state.clone()),
            |mut sim| {
                for t in 0..300 {
                    if !sim.state().status.accepts_ticks() {
                        break;
                    }
                    sim.apply_fire();
                    black_box(sim.tick(at(t)));
                }
                sim
            },
            BatchSize::SmallInput,
        );
    });

    let sim = warmed_up(300);
    c.bench_function("state_hash", |b| b.iter(|| black_box(sim.state_hash())));
    c.bench_function("snapshot", |b| b.iter(|| black_box(sim.snapshot())));
}

criterion_group!(benches, simulation_benchmark);
criterion_main!(benches);
