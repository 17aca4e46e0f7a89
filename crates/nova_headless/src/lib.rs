//! Headless match runner for bots, balance testing and CI verification.
//!
//! This crate drives `nova_core` matches without a front end. It provides:
//!
//! - **Controller play**: a bot or script plays a match over JSON lines
//! - **Autopilot runs**: a scripted pilot plays seeded matches end to end
//! - **Balance batches**: many seeds in parallel, summarized
//! - **Replay verification**: check that replays produce identical results
//!
//! # Protocol
//!
//! Communication uses JSON lines (one JSON object per line):
//!
//! - **stdin**: Commands from controller (start, tick, move, fire, etc.)
//! - **stdout**: State updates and responses (JSON)
//! - **stderr**: Debug logs (human-readable)
//!
//! See [`protocol`] module for the full command/response specification.
//!
//! # Example
//!
//! ```bash
//! # Run interactively
//! printf '{"cmd":"start"}\n{"cmd":"tick","count":60}\n{"cmd":"query"}\n' | cargo run -p nova_headless
//!
//! # Verify a replay
//! cargo run -p nova_headless -- verify --file match.replay
//! ```

pub mod autopilot;
pub mod batch;
pub mod config;
pub mod game_runner;
pub mod metrics;
pub mod protocol;
pub mod runner;
pub mod tables;

pub use autopilot::{Autopilot, AutopilotConfig};
pub use batch::{run_batch, BatchConfig, BatchResults};
pub use config::{load_config, ConfigError};
pub use game_runner::{run_game, GameConfig, GameResult};
pub use metrics::{BatchSummary, GameMetrics};
pub use protocol::{Command, Response};
pub use runner::HeadlessRunner;
