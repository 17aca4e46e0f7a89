//! Headless Nova Sentinel match runner.
//!
//! This binary runs matches without graphics, controlled via JSON on
//! stdin/stdout or by a scripted autopilot. Designed for bots, CI testing,
//! balance batches and replay verification.
//!
//! # Usage
//!
//! ```bash
//! # Interactive mode - read commands from stdin
//! cargo run -p nova_headless
//!
//! # One autopilot match, keeping the replay and result
//! cargo run -p nova_headless -- run --seed 7 --replay match.replay --output result.json
//!
//! # Batch balance test
//! cargo run -p nova_headless -- batch --count 500 --output results/batch.json
//!
//! # Check a replay still reproduces its final hash
//! cargo run -p nova_headless -- verify --file match.replay
//!
//! # Progression and wave tables
//! cargo run -p nova_headless -- tables
//! ```
//!
//! # Protocol
//!
//! Input (stdin): JSON commands, one per line
//! Output (stdout): JSON responses, one per line
//! Logs (stderr): Debug information
//!
//! See the protocol module for command/response format.

use std::io;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use nova_core::replay::Replay;
use nova_headless::{
    autopilot::AutopilotConfig,
    batch::{run_batch, verify_determinism, BatchConfig},
    config::resolve_config,
    game_runner::{run_game, GameConfig, DEFAULT_MAX_TICKS},
    runner::{HeadlessConfig, HeadlessRunner},
    tables::{boss_table, progression_table, sector_edges, wave_table},
};

#[derive(Parser)]
#[command(name = "nova_headless")]
#[command(about = "Headless Nova Sentinel runner for bots, balance testing and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Drive a match over the JSON-lines protocol
    Interactive {
        /// RON config file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Seed override
        #[arg(long)]
        seed: Option<u64>,

        /// Output state after every tick
        #[arg(long)]
        auto_state: bool,

        /// Save a replay of the session here on exit
        #[arg(long)]
        record: Option<PathBuf>,
    },

    /// Play one match with the autopilot
    Run {
        /// RON config file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Seed override
        #[arg(long)]
        seed: Option<u64>,

        /// Maximum ticks before the match is cut off
        #[arg(long, default_value_t = DEFAULT_MAX_TICKS)]
        max_ticks: u64,

        /// Autopilot profile (steady, aggressive, cautious, idle)
        #[arg(short, long, default_value = "steady")]
        autopilot: String,

        /// Stop at the first victory instead of continuing
        #[arg(long)]
        no_continue: bool,

        /// Save the replay here
        #[arg(long)]
        replay: Option<PathBuf>,

        /// Write the match result JSON here
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run a batch of autopilot matches for balance testing
    Batch {
        /// RON config file (mode and caps; the seed is ignored)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Number of games to run
        #[arg(short, long, default_value = "100")]
        count: u32,

        /// Maximum parallel games (0 = auto)
        #[arg(short, long, default_value = "0")]
        parallel: u32,

        /// Starting random seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Maximum ticks per game
        #[arg(long, default_value_t = DEFAULT_MAX_TICKS)]
        max_ticks: u64,

        /// Autopilot profile (steady, aggressive, cautious, idle)
        #[arg(short, long, default_value = "steady")]
        autopilot: String,

        /// Write the full results JSON here
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Re-simulate a replay and check its final hash
    Verify {
        /// Replay file path
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Verify determinism by running the same seed multiple times
    Determinism {
        /// Seed to verify
        #[arg(long, default_value = "12345")]
        seed: u64,

        /// Number of verification runs
        #[arg(short, long, default_value = "5")]
        runs: u32,

        /// Ticks per run
        #[arg(long, default_value = "3600")]
        max_ticks: u64,
    },

    /// Print progression, wave and boss tables
    Tables {
        /// Last level in the progression table
        #[arg(long, default_value = "100")]
        max_level: u32,

        /// Levels to list in the wave table (default: sector edges)
        #[arg(long, value_delimiter = ',')]
        levels: Vec<u32>,
    },
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging to stderr (stdout is for protocol)
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(filter)
        .init();

    match cli.command {
        Some(Commands::Interactive {
            config,
            seed,
            auto_state,
            record,
        }) => cmd_interactive(config.as_deref(), seed, auto_state, record.as_deref()),
        Some(Commands::Run {
            config,
            seed,
            max_ticks,
            autopilot,
            no_continue,
            replay,
            output,
        }) => cmd_run(
            config.as_deref(),
            seed,
            max_ticks,
            &autopilot,
            !no_continue,
            replay.as_deref(),
            output.as_deref(),
        ),
        Some(Commands::Batch {
            config,
            count,
            parallel,
            seed,
            max_ticks,
            autopilot,
            output,
        }) => cmd_batch(
            config.as_deref(),
            count,
            parallel,
            seed,
            max_ticks,
            &autopilot,
            output.as_deref(),
        ),
        Some(Commands::Verify { file }) => cmd_verify(&file),
        Some(Commands::Determinism {
            seed,
            runs,
            max_ticks,
        }) => cmd_determinism(seed, runs, max_ticks),
        Some(Commands::Tables { max_level, levels }) => cmd_tables(max_level, &levels),
        None => {
            // Default: interactive mode
            cmd_interactive(None, None, false, None);
        }
    }
}

/// Print an error and exit with status 1.
fn fail(message: impl std::fmt::Display) -> ! {
    tracing::error!("{message}");
    eprintln!("Error: {message}");
    std::process::exit(1);
}

fn autopilot_or_exit(name: &str) -> AutopilotConfig {
    AutopilotConfig::from_name(name).unwrap_or_else(|| {
        fail(format!(
            "Unknown autopilot '{name}' (expected steady, aggressive, cautious or idle)"
        ))
    })
}

/// Serve the JSON-lines protocol on stdin/stdout
fn cmd_interactive(config: Option<&Path>, seed: Option<u64>, auto_state: bool, record: Option<&Path>) {
    let simulation = resolve_config(config, seed).unwrap_or_else(|e| fail(e));
    tracing::info!(seed = simulation.seed, "Starting interactive session");

    let mut runner = HeadlessRunner::with_config(HeadlessConfig {
        simulation,
        auto_state_output: auto_state,
        record_replay: record.is_some(),
    });

    let stdin = io::stdin();
    let stdout = io::stdout();
    if let Err(e) = runner.run(stdin.lock(), stdout.lock()) {
        fail(format!("Protocol I/O failed: {e}"));
    }

    if let (Some(path), Some(replay)) = (record, runner.take_replay()) {
        match replay.save(path) {
            Ok(()) => tracing::info!(path = %path.display(), frames = replay.frame_count(), "Replay saved"),
            Err(e) => fail(e),
        }
    }
}

/// Play one autopilot match
fn cmd_run(
    config: Option<&Path>,
    seed: Option<u64>,
    max_ticks: u64,
    autopilot: &str,
    continue_after_victory: bool,
    replay_path: Option<&Path>,
    output: Option<&Path>,
) {
    let simulation = resolve_config(config, seed).unwrap_or_else(|e| fail(e));
    let game = GameConfig {
        simulation,
        max_ticks,
        autopilot: autopilot_or_exit(autopilot),
        continue_after_victory,
        record_replay: replay_path.is_some(),
        ..GameConfig::new(simulation.seed)
    };

    let result = run_game(&game).unwrap_or_else(|e| fail(e));
    let metrics = &result.metrics;

    println!("Seed:      {}", metrics.seed);
    println!("Outcome:   {}", metrics.outcome);
    println!("Ticks:     {}", metrics.duration_ticks);
    println!("Score:     {}", metrics.final_score);
    println!("Level:     {} (wave {})", metrics.level, metrics.wave);
    println!("Kills:     {} ({:.1}% accuracy)", metrics.total_kills, metrics.accuracy * 100.0);
    println!("Max combo: {}", metrics.max_combo);
    println!("Hash:      {:016x}", metrics.final_state_hash);

    if let (Some(path), Some(replay)) = (replay_path, result.replay.as_ref()) {
        if let Err(e) = replay.save(path) {
            fail(e);
        }
        println!("Replay:    {}", path.display());
    }

    if let Some(path) = output {
        let json = match result.final_result() {
            Some(match_result) => serde_json::to_string_pretty(match_result),
            None => serde_json::to_string_pretty(metrics),
        }
        .unwrap_or_else(|e| fail(e));
        if let Err(e) = std::fs::write(path, json) {
            fail(format!("Failed to write {}: {e}", path.display()));
        }
        println!("Result:    {}", path.display());
    }
}

/// Run a batch of autopilot matches
fn cmd_batch(
    config: Option<&Path>,
    count: u32,
    parallel: u32,
    seed: u64,
    max_ticks: u64,
    autopilot: &str,
    output: Option<&Path>,
) {
    let simulation = resolve_config(config, None).unwrap_or_else(|e| fail(e));
    let batch = BatchConfig {
        game_count: count,
        parallel_games: parallel,
        seed_start: seed,
        max_ticks,
        mode: simulation.mode,
        autopilot: autopilot_or_exit(autopilot),
        ..BatchConfig::default()
    };

    let results = run_batch(batch);
    print!("{}", results.summary.report());
    println!("Runtime:      {:.1}s", results.duration_seconds);

    for error in &results.errors {
        eprintln!("Game {} (seed {}) failed: {}", error.game_index, error.seed, error.message);
    }

    if let Some(path) = output {
        if let Err(e) = results.save(path) {
            fail(format!("Failed to write {}: {e}", path.display()));
        }
        println!("Results:      {}", path.display());
    }

    if !results.errors.is_empty() {
        std::process::exit(1);
    }
}

/// Re-simulate a replay file
fn cmd_verify(file: &Path) {
    let replay = Replay::load(file).unwrap_or_else(|e| fail(e));
    println!(
        "Replay: {} frames, final tick {}, hash {:016x}",
        replay.frame_count(),
        replay.final_tick,
        replay.final_hash
    );

    match replay.verify() {
        Ok(()) => println!("✓ Replay verified"),
        Err(e) => {
            println!("✗ Replay FAILED");
            fail(e);
        }
    }
}

/// Run the same seed several times and compare hashes
fn cmd_determinism(seed: u64, runs: u32, max_ticks: u64) {
    println!("Verifying determinism: seed {seed}, {runs} runs of {max_ticks} ticks");
    if verify_determinism(seed, runs, max_ticks) {
        println!("✓ Determinism verified");
    } else {
        println!("✗ Determinism FAILED");
        std::process::exit(1);
    }
}

/// Print balance tables
fn cmd_tables(max_level: u32, levels: &[u32]) {
    let levels = if levels.is_empty() {
        sector_edges()
    } else {
        levels.to_vec()
    };

    println!("== Progression ==");
    print!("{}", progression_table(max_level));
    println!();
    println!("== Waves ==");
    print!("{}", wave_table(&levels));
    println!();
    println!("== Bosses ==");
    print!("{}", boss_table());
}
