//! # Nova Core
//!
//! Deterministic simulation core for the Nova Sentinel arcade shooter.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO beyond replay files
//! - No system randomness (seeded `ChaCha8Rng` only)
//! - No wall-clock reads (callers pass the instant to `tick`)
//!
//! This separation enables:
//! - Headless runs and batch balance testing
//! - Replay systems
//! - Determinism testing
//!
//! ## Crate Structure
//!
//! - [`simulation`] - Core simulation loop, intents and events
//! - [`components`] - Entity and state definitions
//! - [`progression`] / [`waves`] - Level curve and wave scheduling
//! - [`combo`] / [`scoring`] - Kill streaks, scores and power-ups
//! - [`boss`] - Boss encounters
//! - [`collision`] / [`movement`] / [`conditions`] - Per-tick rules
//! - [`replay`] - Recording and verifying matches
//! - [`math`] / [`clock`] - Fixed-point math and simulated time

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod boss;
pub mod clock;
pub mod collision;
pub mod combo;
pub mod components;
pub mod conditions;
pub mod config;
pub mod error;
pub mod math;
pub mod movement;
pub mod progression;
pub mod replay;
pub mod scoring;
pub mod simulation;
pub mod waves;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::boss::{BossEncounter, BossPower, BossProfile, EncounterState};
    pub use crate::clock::{FixedTimestep, SimInstant, TICK_RATE};
    pub use crate::combo::{ComboEngine, ComboTier};
    pub use crate::components::*;
    pub use crate::conditions::{ComboResetReason, LossReason};
    pub use crate::config::SimulationConfig;
    pub use crate::error::{GameError, Result};
    pub use crate::math::{Fixed, Vec2Fixed};
    pub use crate::progression::{level_from_score, required_score, Bracket};
    pub use crate::replay::{Replay, ReplayFrame, ReplayPlayer};
    pub use crate::simulation::{
        Intent, MatchOutcome, MatchResult, Simulation, SimulationState, Snapshot, TickEvent,
        TickEvents,
    };
    pub use crate::waves::{SpawnOrder, WaveParams};
}
