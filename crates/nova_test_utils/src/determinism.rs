//! Determinism testing utilities.
//!
//! Provides a harness for verifying that the simulation
//! produces identical results given identical inputs.
//!
//! # Testing Strategy
//!
//! Replays and batch balance runs rely on the simulation being 100%
//! deterministic. Sources of non-determinism include:
//!
//! - **Floating-point math**: Positions and velocities use fixed-point
//!   arithmetic via [`nova_core::math::Fixed`]; floats only appear in
//!   derived, display-only values.
//!
//! - **Wall-clock reads**: The core never reads a clock. Every tick gets an
//!   explicit [`SimInstant`](nova_core::clock::SimInstant).
//!
//! - **System randomness**: All rolls come from the `ChaCha8Rng` seeded
//!   from the match config and stored inside the simulation.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: Individual rules (scoring, combo, waves)
//! 2. **Property tests**: Random intent streams must replay identically
//! 3. **Integration tests**: Full match scenarios are reproducible
//! 4. **Parallel tests**: Running N matches on N threads all match

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use nova_core::components::GameStatus;
use nova_core::config::SimulationConfig;
use nova_core::simulation::{Intent, Simulation};

use crate::fixtures::at;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks simulated.
    pub ticks: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for deterministic simulation).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the simulation was deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the simulation produced different hashes across runs.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Simulation is non-deterministic!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Result of parallel simulation runs.
#[derive(Debug, Clone)]
pub struct ParallelSimResult {
    /// Final state hash from each simulation.
    pub hashes: Vec<u64>,
    /// Number of ticks each simulation ran.
    pub ticks: u64,
    /// Number of simulations run.
    pub num_sims: usize,
}

impl ParallelSimResult {
    /// Check if all simulations produced identical results.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        self.hashes.windows(2).all(|w| w[0] == w[1])
    }

    /// Assert all simulations matched.
    ///
    /// # Panics
    ///
    /// Panics if simulations produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic() {
            let mut unique: Vec<u64> = self.hashes.clone();
            unique.sort_unstable();
            unique.dedup();
            panic!(
                "Parallel simulations diverged!\n\
                 Simulations: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {}\n\
                 All hashes: {:?}",
                self.num_sims,
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a simulation multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run the simulation
/// * `ticks` - Number of ticks to simulate per run
/// * `setup` - Function to create initial simulation state
/// * `step` - Function to advance the simulation; receives the tick index
/// * `hash` - Function to compute state hash
///
/// # Example
///
/// ```
/// use nova_test_utils::determinism::verify_determinism;
/// use nova_test_utils::fixtures::{at, playing_match};
///
/// let result = verify_determinism(
///     3,   // Run 3 times
///     120, // 120 ticks each
///     || playing_match(9),
///     |sim, t| {
///         sim.apply_fire();
///         sim.tick(at(t));
///     },
///     |sim| sim.state_hash(),
/// );
/// result.assert_deterministic();
/// ```
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S, u64),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for t in 0..ticks {
            step(&mut state, t);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

/// Default input pattern: fire every sixth tick and sway left and right.
pub fn steady_fire(sim: &mut Simulation, t: u64) {
    if t % 6 == 0 {
        sim.apply_fire();
    }
    if t % 40 == 0 {
        let dx = if (t / 40) % 2 == 0 { 0.5 } else { -0.5 };
        sim.apply_move(dx, 0.0);
    }
}

/// Advance `sim` one tick with `intents`, stopping quietly once the match
/// no longer accepts ticks. Returns whether a tick ran.
pub fn step_with(sim: &mut Simulation, t: u64, intents: &[Intent]) -> bool {
    for intent in intents {
        // Scripts may contain status changes that are invalid at this point.
        let _ = sim.apply_intent(*intent);
    }
    if !sim.state().status.accepts_ticks() {
        return false;
    }
    sim.tick(at(t));
    true
}

/// Play a script of per-tick intents against a fresh, started match.
#[must_use]
pub fn run_script(config: SimulationConfig, frames: &[Vec<Intent>]) -> Simulation {
    let mut sim = Simulation::new(config);
    let _ = sim.set_status(GameStatus::Playing);
    for (t, intents) in (0u64..).zip(frames) {
        if !step_with(&mut sim, t, intents) {
            break;
        }
    }
    sim
}

/// Simplified determinism verification for `Simulation` type.
///
/// Runs the simulation twice with identical setup and the
/// [`steady_fire`] input pattern and verifies the final state hashes
/// match exactly.
///
/// # Returns
///
/// `true` if both runs produced identical state hashes.
pub fn verify_simulation_determinism<F>(setup_fn: F, num_ticks: u64) -> bool
where
    F: Fn() -> Simulation,
{
    let result = verify_determinism(
        2,
        num_ticks,
        &setup_fn,
        |sim, t| {
            steady_fire(sim, t);
            step_with(sim, t, &[]);
        },
        |sim| sim.state_hash(),
    );
    result.is_deterministic
}

/// Run N simulations on scoped threads and collect final hashes.
///
/// Catches non-determinism that only manifests under thread scheduling
/// variations or memory layout differences.
///
/// # Panics
///
/// Panics if a simulation thread panics.
pub fn run_parallel_simulations_scoped<F>(
    setup_fn: F,
    num_sims: usize,
    num_ticks: u64,
) -> ParallelSimResult
where
    F: Fn() -> Simulation + Sync,
{
    let hashes = thread::scope(|s| {
        let handles: Vec<_> = (0..num_sims)
            .map(|_| {
                s.spawn(|| {
                    let mut sim = setup_fn();
                    for t in 0..num_ticks {
                        steady_fire(&mut sim, t);
                        if !step_with(&mut sim, t, &[]) {
                            break;
                        }
                    }
                    sim.state_hash()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().expect("simulation thread panicked"))
            .collect()
    });

    ParallelSimResult {
        hashes,
        ticks: num_ticks,
        num_sims,
    }
}

/// Compare two simulation runs tick-by-tick, finding first divergence.
///
/// Useful for debugging non-determinism by finding exactly when
/// simulations start to differ.
///
/// # Returns
///
/// `None` if simulations are deterministic, `Some(tick)` if they diverge
/// at that tick.
pub fn find_first_divergence<F>(setup_fn: F, num_ticks: u64) -> Option<u64>
where
    F: Fn() -> Simulation,
{
    let mut sim1 = setup_fn();
    let mut sim2 = setup_fn();

    if sim1.state_hash() != sim2.state_hash() {
        return Some(0);
    }

    for tick in 1..=num_ticks {
        steady_fire(&mut sim1, tick - 1);
        steady_fire(&mut sim2, tick - 1);
        let ran1 = step_with(&mut sim1, tick - 1, &[]);
        let ran2 = step_with(&mut sim2, tick - 1, &[]);

        if ran1 != ran2 || sim1.state_hash() != sim2.state_hash() {
            return Some(tick);
        }
        if !ran1 {
            break;
        }
    }

    None
}

/// Verify that serialization round-trip preserves simulation state exactly.
///
/// This is critical for save/load and replay seeking.
pub fn verify_serialization_determinism<F>(setup_fn: F, num_ticks: u64) -> bool
where
    F: Fn() -> Simulation,
{
    let mut sim = setup_fn();

    for t in 0..num_ticks {
        steady_fire(&mut sim, t);
        step_with(&mut sim, t, &[]);
    }

    let hash_before = sim.state_hash();

    let Ok(bytes) = sim.serialize() else {
        return false;
    };
    let Ok(restored) = Simulation::deserialize(&bytes) else {
        return false;
    };

    hash_before == restored.state_hash()
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for determinism testing.
///
/// These strategies generate random but reproducible inputs for
/// property-based testing of simulation determinism.
pub mod strategies {
    use nova_core::components::DifficultyMode;
    use nova_core::config::SimulationConfig;
    use nova_core::simulation::Intent;
    use proptest::prelude::*;

    /// Generate a move delta, including values outside the clamp range.
    pub fn arb_move_delta() -> impl Strategy<Value = f64> {
        prop_oneof![
            8 => -0.5f64..0.5f64,
            1 => -5.0f64..5.0f64,
            1 => Just(0.0),
        ]
    }

    /// Generate a move intent.
    pub fn arb_move_intent() -> impl Strategy<Value = Intent> {
        (arb_move_delta(), arb_move_delta()).prop_map(|(dx, dy)| Intent::Move { dx, dy })
    }

    /// Generate a gameplay intent (no status changes).
    pub fn arb_intent() -> impl Strategy<Value = Intent> {
        prop_oneof![
            2 => arb_move_intent(),
            3 => Just(Intent::Fire),
        ]
    }

    /// Generate the intents for one tick.
    pub fn arb_frame() -> impl Strategy<Value = Vec<Intent>> {
        proptest::collection::vec(arb_intent(), 0..3)
    }

    /// Generate a per-tick intent script.
    pub fn arb_script(max_ticks: usize) -> impl Strategy<Value = Vec<Vec<Intent>>> {
        proptest::collection::vec(arb_frame(), 1..max_ticks)
    }

    /// Generate a difficulty mode.
    pub fn arb_mode() -> impl Strategy<Value = DifficultyMode> {
        prop_oneof![
            Just(DifficultyMode::Normal),
            Just(DifficultyMode::Elite),
            Just(DifficultyMode::Mastery),
        ]
    }

    /// Generate a match config with default caps.
    pub fn arb_config() -> impl Strategy<Value = SimulationConfig> {
        (any::<u64>(), arb_mode()).prop_map(|(seed, mode)| SimulationConfig {
            mode,
            ..SimulationConfig::with_seed(seed)
        })
    }

    /// Generate a score in the playable range.
    pub fn arb_score() -> impl Strategy<Value = u64> {
        0u64..3_000_000u64
    }
}
