//! Autopilot match execution for headless testing.
//!
//! Plays one seeded match with an [`Autopilot`] and collects
//! [`GameMetrics`]. Every tick is built as a [`ReplayFrame`], so the same
//! frames can be kept as a replay that re-simulates to the same hash.
//!
//! The loop is bounded by `max_ticks`; a match still running at the limit
//! is reported as a timeout.

use std::time::Instant;

use nova_core::clock::FixedTimestep;
use nova_core::components::GameStatus;
use nova_core::config::SimulationConfig;
use nova_core::error::Result;
use nova_core::replay::{Replay, ReplayFrame};
use nova_core::simulation::{Intent, MatchResult, Simulation, TickEvent};
use tracing::{debug, info, trace};

use crate::autopilot::{Autopilot, AutopilotConfig};
use crate::metrics::GameMetrics;

/// Ten minutes at 60 ticks per second.
pub const DEFAULT_MAX_TICKS: u64 = 36_000;

/// Configuration for a single game run.
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Match configuration (seed, mode, caps).
    pub simulation: SimulationConfig,
    /// Maximum ticks before timeout.
    pub max_ticks: u64,
    /// Pilot profile.
    pub autopilot: AutopilotConfig,
    /// Keep playing after Minor and Major victories.
    pub continue_after_victory: bool,
    /// Keep a replay of the match.
    pub record_replay: bool,
    /// Game ID for tracking.
    pub game_id: String,
}

impl GameConfig {
    /// Default run for `seed`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            simulation: SimulationConfig::with_seed(seed),
            max_ticks: DEFAULT_MAX_TICKS,
            autopilot: AutopilotConfig::default(),
            continue_after_victory: true,
            record_replay: false,
            game_id: format!("game_{seed}"),
        }
    }
}

/// Result of running a game.
#[derive(Debug)]
pub struct GameResult {
    /// Collected metrics.
    pub metrics: GameMetrics,
    /// Every match result produced, in order. Continued victories add an
    /// entry each; the last one is the final outcome if the match ended.
    pub results: Vec<MatchResult>,
    /// Recorded replay, when requested.
    pub replay: Option<Replay>,
}

impl GameResult {
    /// Final state hash.
    #[must_use]
    pub const fn final_state_hash(&self) -> u64 {
        self.metrics.final_state_hash
    }

    /// Result that ended the match, if it ended before the tick limit.
    #[must_use]
    pub fn final_result(&self) -> Option<&MatchResult> {
        if self.metrics.outcome == "timeout" {
            None
        } else {
            self.results.last()
        }
    }
}

/// Run a complete autopilot match.
///
/// # Errors
/// Returns an error if an intent is rejected by the simulation, which
/// would mean the loop asked for an illegal status change.
pub fn run_game(config: &GameConfig) -> Result<GameResult> {
    let started = Instant::now();
    info!(
        game_id = %config.game_id,
        seed = config.simulation.seed,
        max_ticks = config.max_ticks,
        autopilot = %config.autopilot.name,
        "Starting game simulation"
    );

    let pilot = Autopilot::new(config.autopilot.clone());
    let mut sim = Simulation::new(config.simulation);
    let mut timestep = FixedTimestep::default();
    let mut replay = config.record_replay.then(|| Replay::new(config.simulation));
    let mut metrics = GameMetrics::new(
        config.game_id.clone(),
        config.autopilot.name.clone(),
        config.simulation.seed,
    );
    let mut results = Vec::new();
    let mut ticks = 0u64;

    while ticks < config.max_ticks {
        let mut intents = Vec::new();
        match sim.state().status {
            GameStatus::Idle => intents.push(Intent::SetStatus(GameStatus::Playing)),
            GameStatus::Victory if config.continue_after_victory && can_continue(&sim) => {
                intents.push(Intent::ContinueAfterVictory);
            }
            GameStatus::Victory | GameStatus::GameOver => break,
            _ => {}
        }
        if intents.is_empty() {
            intents.extend(pilot.decide(sim.state()));
        }

        let frame = ReplayFrame::new(timestep.next_tick(), intents);
        let events = frame.apply(&mut sim)?;
        if let Some(replay) = replay.as_mut() {
            replay.frames.push(frame);
        }
        let Some(events) = events else { continue };
        ticks += 1;

        for event in &events.events {
            match event {
                TickEvent::WaveCleared { wave, bonus } => {
                    debug!(tick = ticks, wave, bonus, "Wave cleared");
                }
                TickEvent::BossDefeated { level } => debug!(tick = ticks, level, "Boss defeated"),
                _ => trace!(tick = ticks, ?event, "Event"),
            }
        }
        if let Some(result) = events.match_result {
            metrics.record_outcome(result.outcome);
            results.push(result);
        }
    }

    metrics.finalize(&sim, ticks);
    if let Some(replay) = replay.as_mut() {
        replay.finalize(&sim);
    }

    info!(
        game_id = %config.game_id,
        ticks,
        outcome = %metrics.outcome,
        score = metrics.final_score,
        level = metrics.level,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Game complete"
    );

    Ok(GameResult {
        metrics,
        results,
        replay,
    })
}

fn can_continue(sim: &Simulation) -> bool {
    sim.state()
        .victory
        .as_ref()
        .is_some_and(|v| v.kind.allows_continue())
}
