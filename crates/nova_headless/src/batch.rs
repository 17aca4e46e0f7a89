//! Batch game runner for balance testing.
//!
//! Runs many seeded autopilot matches in parallel using rayon and
//! aggregates their metrics.

use crate::autopilot::AutopilotConfig;
use crate::game_runner::{run_game, GameConfig, DEFAULT_MAX_TICKS};
use crate::metrics::{BatchSummary, GameMetrics};
use nova_core::components::DifficultyMode;
use nova_core::config::SimulationConfig;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Configuration for a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Number of games to run
    pub game_count: u32,
    /// Maximum parallel games (0 = use rayon default)
    pub parallel_games: u32,
    /// Starting seed for deterministic runs
    pub seed_start: u64,
    /// Maximum ticks per game
    pub max_ticks: u64,
    /// Difficulty mode for every game
    pub mode: DifficultyMode,
    /// Pilot profile
    pub autopilot: AutopilotConfig,
    /// Keep playing after Minor and Major victories
    pub continue_after_victory: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            game_count: 100,
            parallel_games: 0,
            seed_start: 0,
            max_ticks: DEFAULT_MAX_TICKS,
            mode: DifficultyMode::Normal,
            autopilot: AutopilotConfig::default(),
            continue_after_victory: true,
        }
    }
}

impl BatchConfig {
    /// Create config for `game_count` games
    pub fn new(game_count: u32) -> Self {
        Self {
            game_count,
            ..Default::default()
        }
    }

    /// Set seed start
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed_start = seed;
        self
    }

    /// Set the tick limit
    pub fn with_max_ticks(mut self, max_ticks: u64) -> Self {
        self.max_ticks = max_ticks;
        self
    }

    /// Set the pilot profile
    pub fn with_autopilot(mut self, autopilot: AutopilotConfig) -> Self {
        self.autopilot = autopilot;
        self
    }

    fn game_config(&self, seed: u64) -> GameConfig {
        GameConfig {
            simulation: SimulationConfig {
                mode: self.mode,
                ..SimulationConfig::with_seed(seed)
            },
            max_ticks: self.max_ticks,
            autopilot: self.autopilot.clone(),
            continue_after_victory: self.continue_after_victory,
            record_replay: false,
            game_id: format!("game_{seed}"),
        }
    }
}

/// Results from a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// Configuration used
    pub config: BatchConfig,
    /// Individual game metrics, in seed order
    pub games: Vec<GameMetrics>,
    /// Aggregate summary
    pub summary: BatchSummary,
    /// Total runtime
    pub duration_seconds: f64,
    /// Errors encountered
    pub errors: Vec<BatchError>,
}

impl BatchResults {
    /// Save results to JSON file
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Load results from JSON file
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(std::io::Error::other)
    }
}

/// Error during batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchError {
    /// Game index
    pub game_index: u32,
    /// Seed used
    pub seed: u64,
    /// Error message
    pub message: String,
}

/// Progress tracking for batch runs
#[derive(Debug)]
pub struct BatchProgress {
    /// Total games
    pub total: u32,
    completed: AtomicU32,
    start_time: Instant,
}

impl BatchProgress {
    /// Create new progress tracker
    pub fn new(total: u32) -> Self {
        Self {
            total,
            completed: AtomicU32::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record a completed game and return the new count
    pub fn record_completion(&self) -> u32 {
        self.completed.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Get current completion count
    pub fn current(&self) -> u32 {
        self.completed.load(Ordering::Relaxed)
    }

    /// Get completion percentage
    pub fn percentage(&self) -> f64 {
        self.current() as f64 / self.total.max(1) as f64 * 100.0
    }

    /// Get estimated time remaining
    pub fn eta(&self) -> Duration {
        let completed = self.current();
        if completed == 0 {
            return Duration::from_secs(0);
        }

        let elapsed = self.start_time.elapsed();
        let per_game = elapsed.as_secs_f64() / completed as f64;
        let remaining = self.total.saturating_sub(completed);
        Duration::from_secs_f64(per_game * remaining as f64)
    }
}

/// Run one game of the batch.
fn run_single_game(seed: u64, config: &BatchConfig) -> Result<GameMetrics, String> {
    run_game(&config.game_config(seed))
        .map(|result| result.metrics)
        .map_err(|e| e.to_string())
}

/// Run a batch of games
pub fn run_batch(config: BatchConfig) -> BatchResults {
    let start = Instant::now();
    let progress = BatchProgress::new(config.game_count);
    let step = (config.game_count / 10).max(1);

    info!(
        games = config.game_count,
        seed_start = config.seed_start,
        autopilot = %config.autopilot.name,
        "Starting batch run"
    );

    let play = || -> Vec<Result<GameMetrics, BatchError>> {
        (0..config.game_count)
            .into_par_iter()
            .map(|i| {
                let seed = config.seed_start.wrapping_add(u64::from(i));
                let outcome = run_single_game(seed, &config).map_err(|message| {
                    warn!(game = i, seed, %message, "Game failed");
                    BatchError {
                        game_index: i,
                        seed,
                        message,
                    }
                });

                let completed = progress.record_completion();
                if completed % step == 0 {
                    debug!(
                        completed,
                        total = config.game_count,
                        percent = progress.percentage(),
                        eta_secs = progress.eta().as_secs(),
                        "Batch progress"
                    );
                }
                outcome
            })
            .collect()
    };

    // `parallel_games` gets its own pool.
    let results = if config.parallel_games > 0 {
        match rayon::ThreadPoolBuilder::new()
            .num_threads(config.parallel_games as usize)
            .build()
        {
            Ok(pool) => pool.install(play),
            Err(e) => {
                warn!(error = %e, "Thread pool unavailable, using the global pool");
                play()
            }
        }
    } else {
        play()
    };

    let (games, errors): (Vec<_>, Vec<_>) = results.into_iter().partition(Result::is_ok);
    let games: Vec<GameMetrics> = games.into_iter().filter_map(Result::ok).collect();
    let errors: Vec<BatchError> = errors.into_iter().filter_map(Result::err).collect();

    let summary = BatchSummary::from_games(&games);
    let duration_seconds = start.elapsed().as_secs_f64();

    info!(
        games = games.len(),
        errors = errors.len(),
        duration_seconds,
        "Batch complete"
    );

    BatchResults {
        config,
        games,
        summary,
        duration_seconds,
        errors,
    }
}

/// Verify determinism by running the same seed several times
pub fn verify_determinism(seed: u64, runs: u32, max_ticks: u64) -> bool {
    let config = BatchConfig::new(1).with_max_ticks(max_ticks);
    let hashes: Vec<Option<u64>> = (0..runs)
        .map(|_| {
            run_single_game(seed, &config)
                .ok()
                .map(|m| m.final_state_hash)
        })
        .collect();

    match hashes.first() {
        Some(Some(first)) => hashes.iter().all(|h| *h == Some(*first)),
        _ => false,
    }
}
