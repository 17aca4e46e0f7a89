//! JSON protocol for headless match control.
//!
//! The headless runner communicates via JSON lines (one JSON object per line):
//!
//! **Input (stdin):** Commands from the controller
//! **Output (stdout):** Match state updates and responses
//!
//! # Protocol Flow
//!
//! 1. Runner starts, outputs `{"type":"ready","version":"1.0","tick":0}`
//! 2. Controller sends `start`, then intents and `tick` commands
//! 3. Runner answers every command; `query` returns the full state
//! 4. When the match ends, outputs `{"type":"match_ended","result":{...}}`
//!
//! # Example Session
//!
//! ```text
//! <- {"type":"ready","version":"1.0","tick":0}
//! -> {"cmd":"start"}
//! <- {"type":"ack","cmd":"start"}
//! -> {"cmd":"move","dx":0.25,"dy":0.0}
//! <- {"type":"ack","cmd":"move"}
//! -> {"cmd":"fire"}
//! <- {"type":"ack","cmd":"fire"}
//! -> {"cmd":"tick","count":60}
//! <- {"type":"ack","cmd":"tick"}
//! -> {"cmd":"query"}
//! <- {"type":"state","tick":60,"status":"Playing","score":0,...}
//! ```

use nova_core::components::{AlienColor, GameStatus, PowerUpType, VictoryKind};
use nova_core::progression::Bracket;
use nova_core::simulation::{MatchResult, Snapshot};
use serde::{Deserialize, Serialize};

/// Protocol version reported in the `ready` response.
pub const PROTOCOL_VERSION: &str = "1.0";

// ============================================================================
// Input Commands (Controller -> Runner)
// ============================================================================

/// Commands that can be sent to the headless runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Command {
    /// Start an idle match.
    Start,

    /// Advance the match by N ticks (default: 1).
    Tick {
        #[serde(default = "default_tick_count")]
        count: u32,
    },

    /// Queue a ship move for the next tick.
    Move { dx: f64, dy: f64 },

    /// Queue a fire intent for the next tick.
    Fire,

    /// Pause a running match.
    Pause,

    /// Resume a paused match.
    Resume,

    /// Discard the match and return to idle.
    Reset,

    /// Continue after a Minor or Major victory.
    Continue,

    /// Query current match state without advancing time.
    Query,

    /// Report the current state hash (for determinism verification).
    Hash,

    /// Quit the runner.
    Quit,
}

fn default_tick_count() -> u32 {
    1
}

// ============================================================================
// Output Responses (Runner -> Controller)
// ============================================================================

/// Responses sent from the headless runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Runner is ready to accept commands.
    Ready { version: String, tick: u64 },

    /// Acknowledgment of a command.
    Ack { cmd: String },

    /// Error processing a command.
    Error {
        message: String,
        cmd: Option<String>,
    },

    /// Current match state.
    State(StateView),

    /// State hash for determinism verification.
    Hash { tick: u64, hash: u64 },

    /// The match reached a terminal or victory status.
    MatchEnded { result: MatchResult },

    /// Goodbye message before shutdown.
    Bye,
}

// ============================================================================
// State Types
// ============================================================================

/// A world position in floating point, for controllers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// State of a single alien.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlienView {
    pub id: u64,
    pub x: f64,
    pub y: f64,
    pub color: AlienColor,
    pub hp: u32,
    pub max_hp: u32,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_boss: bool,
}

/// Boss HUD.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BossView {
    pub name: String,
    pub hp: u32,
    pub max_hp: u32,
    pub phase: u32,
}

/// Flattened match state sent in `state` responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateView {
    pub tick: u64,
    pub status: GameStatus,
    pub score: u64,
    pub level: u32,
    pub level_progress: f64,
    pub bracket: Bracket,
    pub wave: u32,
    pub kills_in_wave: u32,
    pub enemies_required: u32,
    pub lives: u32,
    pub combo: u32,
    pub combo_multiplier: u32,
    pub player: Point,
    pub aliens: Vec<AlienView>,
    pub bullets: Vec<Point>,
    pub power_ups: Vec<PowerUpType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boss: Option<BossView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub victory: Option<VictoryKind>,
    pub hash: u64,
}

impl StateView {
    /// Build the view from a snapshot and its state hash.
    #[must_use]
    pub fn from_snapshot(snapshot: &Snapshot, hash: u64) -> Self {
        let state = &snapshot.state;
        let (px, py) = state.player.to_f64();
        let boss = match (&snapshot.boss_name, snapshot.boss_phase) {
            (Some(name), Some(phase)) if state.boss.active => Some(BossView {
                name: name.clone(),
                hp: state.boss.hp,
                max_hp: state.boss.max_hp,
                phase,
            }),
            _ => None,
        };

        Self {
            tick: state.tick,
            status: state.status,
            score: state.score,
            level: state.level,
            level_progress: snapshot.level_progress,
            bracket: snapshot.bracket,
            wave: state.wave,
            kills_in_wave: state.kills_in_wave,
            enemies_required: snapshot.enemies_required,
            lives: state.lives,
            combo: state.combo,
            combo_multiplier: snapshot.combo_multiplier,
            player: Point { x: px, y: py },
            aliens: state
                .aliens
                .iter()
                .map(|a| {
                    let (x, y) = a.position.to_f64();
                    AlienView {
                        id: a.id,
                        x,
                        y,
                        color: a.color,
                        hp: a.hp,
                        max_hp: a.max_hp,
                        is_boss: a.is_boss,
                    }
                })
                .collect(),
            bullets: state
                .bullets
                .iter()
                .map(|b| {
                    let (x, y) = b.position.to_f64();
                    Point { x, y }
                })
                .collect(),
            power_ups: state.power_ups.iter().map(|p| p.kind).collect(),
            boss,
            victory: state.victory.as_ref().map(|v| v.kind),
            hash,
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

impl Response {
    /// Create a ready response.
    pub fn ready(tick: u64) -> Self {
        Self::Ready {
            version: PROTOCOL_VERSION.to_string(),
            tick,
        }
    }

    /// Create an acknowledgment.
    pub fn ack(cmd: &str) -> Self {
        Self::Ack {
            cmd: cmd.to_string(),
        }
    }

    /// Create an error response.
    pub fn error(message: impl Into<String>, cmd: Option<&str>) -> Self {
        Self::Error {
            message: message.into(),
            cmd: cmd.map(String::from),
        }
    }

    /// Serialize to JSON line (with newline).
    pub fn to_json_line(&self) -> String {
        let mut json = serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"type":"error","message":"Serialization failed: {e}"}}"#)
        });
        json.push('\n');
        json
    }
}

impl Command {
    /// Parse from a JSON line.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Get command name for acknowledgment.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Tick { .. } => "tick",
            Self::Move { .. } => "move",
            Self::Fire => "fire",
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::Reset => "reset",
            Self::Continue => "continue",
            Self::Query => "query",
            Self::Hash => "hash",
            Self::Quit => "quit",
        }
    }
}
