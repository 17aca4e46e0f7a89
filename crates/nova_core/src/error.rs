//! Error types for the shooter simulation.
//!
//! The tick function itself never fails: out-of-range intents are clamped
//! and contract violations panic. These errors cover the fallible edges
//! around it (status changes, serialization, configuration, replays).

use thiserror::Error;

use crate::components::GameStatus;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for all simulation errors.
#[derive(Debug, Error)]
pub enum GameError {
    /// Requested status change is not allowed from the current status.
    #[error("Invalid status transition: {from:?} -> {to:?}")]
    InvalidTransition {
        /// Status the match is currently in.
        from: GameStatus,
        /// Status that was requested.
        to: GameStatus,
    },

    /// Configuration text could not be parsed.
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(String),

    /// Invalid game state.
    #[error("Invalid game state: {0}")]
    InvalidState(String),

    /// Replay re-simulation diverged from the recorded result.
    #[error("Replay diverged at tick {tick}: expected hash {expected}, got {actual}")]
    ReplayDiverged {
        /// Tick after which the hashes were compared.
        tick: u64,
        /// Hash stored in the replay.
        expected: u64,
        /// Hash produced by re-simulation.
        actual: u64,
    },
}
