//! Replay system for recording and playing back matches.
//!
//! A replay stores the match config and one frame per `tick` call: the
//! intents applied before the tick and the instant passed to it. Because the
//! simulation is deterministic, re-running the frames from a fresh match
//! reproduces the recorded final hash exactly.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::clock::SimInstant;
use crate::config::SimulationConfig;
use crate::error::{GameError, Result};
use crate::simulation::{Intent, Simulation, TickEvents};

/// Replay file format version for compatibility.
pub const REPLAY_VERSION: u32 = 2;

/// Input for a single step of the match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayFrame {
    /// Instant passed to `tick`.
    pub now: SimInstant,
    /// Intents applied before the tick, in order.
    pub intents: Vec<Intent>,
}

impl ReplayFrame {
    /// Create a frame.
    #[must_use]
    pub const fn new(now: SimInstant, intents: Vec<Intent>) -> Self {
        Self { now, intents }
    }

    /// Apply this frame to `sim`.
    ///
    /// Intents go through [`Simulation::apply_intent`]; the tick runs only
    /// when the match accepts ticks afterwards. Returns the tick's events,
    /// or `None` when no tick ran.
    pub fn apply(&self, sim: &mut Simulation) -> Result<Option<TickEvents>> {
        for intent in &self.intents {
            sim.apply_intent(*intent)?;
        }
        if sim.state().status.accepts_ticks() {
            Ok(Some(sim.tick(self.now)))
        } else {
            Ok(None)
        }
    }
}

/// Complete replay data structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Replay {
    /// Replay format version.
    pub version: u32,
    /// Config the match was created with.
    pub config: SimulationConfig,
    /// Frames in the order they were played.
    pub frames: Vec<ReplayFrame>,
    /// Tick counter when recording stopped.
    pub final_tick: u64,
    /// State hash when recording stopped.
    pub final_hash: u64,
}

impl Replay {
    /// Create an empty replay for a match started from `config`.
    #[must_use]
    pub const fn new(config: SimulationConfig) -> Self {
        Self {
            version: REPLAY_VERSION,
            config,
            frames: Vec::new(),
            final_tick: 0,
            final_hash: 0,
        }
    }

    /// Record one frame.
    pub fn record_frame(&mut self, now: SimInstant, intents: Vec<Intent>) {
        self.frames.push(ReplayFrame::new(now, intents));
    }

    /// Finalize the replay with the end state of `sim`.
    pub fn finalize(&mut self, sim: &Simulation) {
        self.final_tick = sim.get_tick();
        self.final_hash = sim.state_hash();
    }

    /// Save the replay to a file.
    ///
    /// # Errors
    /// Returns an error if serialization or file writing fails.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = bincode::serialize(self)
            .map_err(|e| GameError::InvalidState(format!("Failed to serialize replay: {e}")))?;
        std::fs::write(path.as_ref(), bytes)
            .map_err(|e| GameError::InvalidState(format!("Failed to write replay file: {e}")))?;
        Ok(())
    }

    /// Load a replay from a file.
    ///
    /// # Errors
    /// Returns an error if file reading, deserialization or the version
    /// check fails.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())
            .map_err(|e| GameError::InvalidState(format!("Failed to read replay file: {e}")))?;
        let replay: Self = bincode::deserialize(&bytes)
            .map_err(|e| GameError::InvalidState(format!("Failed to deserialize replay: {e}")))?;

        if replay.version != REPLAY_VERSION {
            return Err(GameError::InvalidState(format!(
                "Replay version mismatch: expected {REPLAY_VERSION}, got {}",
                replay.version
            )));
        }

        Ok(replay)
    }

    /// Fresh match to play the frames against.
    #[must_use]
    pub fn initial_simulation(&self) -> Simulation {
        Simulation::new(self.config)
    }

    /// Number of recorded frames.
    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Re-simulate every frame and compare the final hash.
    ///
    /// # Errors
    /// Returns [`GameError::ReplayDiverged`] on a hash mismatch, or the
    /// error of the first intent that could not be applied.
    pub fn verify(&self) -> Result<()> {
        let mut player = ReplayPlayer::new(self.clone());
        while player.advance()? {}

        let actual = player.simulation().state_hash();
        if actual != self.final_hash {
            return Err(GameError::ReplayDiverged {
                tick: player.simulation().get_tick(),
                expected: self.final_hash,
                actual,
            });
        }
        tracing::debug!(frames = self.frames.len(), hash = actual, "Replay verified");
        Ok(())
    }
}

/// Replay playback controller.
#[derive(Debug)]
pub struct ReplayPlayer {
    replay: Replay,
    simulation: Simulation,
    /// Index of the next frame to play.
    frame_index: usize,
    /// Whether playback is paused.
    pub paused: bool,
}

impl ReplayPlayer {
    /// Create a player positioned before the first frame.
    #[must_use]
    pub fn new(replay: Replay) -> Self {
        let simulation = replay.initial_simulation();
        Self {
            replay,
            simulation,
            frame_index: 0,
            paused: false,
        }
    }

    /// Play the next frame.
    ///
    /// Returns true if there are more frames to play.
    pub fn advance(&mut self) -> Result<bool> {
        if self.paused || self.is_finished() {
            return Ok(!self.is_finished());
        }

        self.replay.frames[self.frame_index].apply(&mut self.simulation)?;
        self.frame_index += 1;

        Ok(!self.is_finished())
    }

    /// Restart from a fresh match and play up to `target_frame`.
    pub fn seek(&mut self, target_frame: usize) -> Result<()> {
        self.simulation = self.replay.initial_simulation();
        self.frame_index = 0;

        let target = target_frame.min(self.replay.frames.len());
        while self.frame_index < target {
            self.replay.frames[self.frame_index].apply(&mut self.simulation)?;
            self.frame_index += 1;
        }
        Ok(())
    }

    /// Frames played so far.
    #[must_use]
    pub const fn current_frame(&self) -> usize {
        self.frame_index
    }

    /// Match being replayed.
    #[must_use]
    pub const fn simulation(&self) -> &Simulation {
        &self.simulation
    }

    /// Replay being played.
    #[must_use]
    pub const fn replay(&self) -> &Replay {
        &self.replay
    }

    /// Whether every frame has been played.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.frame_index >= self.replay.frames.len()
    }

    /// Toggle pause state.
    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    /// Progress as a percentage (0-100).
    #[must_use]
    pub fn progress_percent(&self) -> f64 {
        if self.replay.frames.is_empty() {
            100.0
        } else {
            (self.frame_index as f64 / self.replay.frames.len() as f64) * 100.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::TICK_DURATION_MICROS;
    use crate::components::GameStatus;

    fn at(tick: u64) -> SimInstant {
        SimInstant::from_micros(tick * TICK_DURATION_MICROS)
    }

    /// Record `ticks` frames of a simple firing pattern.
    fn record(seed: u64, ticks: u64) -> (Replay, Simulation) {
        let config = SimulationConfig::with_seed(seed);
        let mut sim = Simulation::new(config);
        let mut replay = Replay::new(config);

        for t in 0..ticks {
            let mut intents = Vec::new();
            if t == 0 {
                intents.push(Intent::SetStatus(GameStatus::Playing));
            }
            if t % 5 == 0 {
                intents.push(Intent::Fire);
            }
            if t % 13 == 0 {
                intents.push(Intent::Move { dx: 0.4, dy: 0.0 });
            } else if t % 17 == 0 {
                intents.push(Intent::Move { dx: -0.4, dy: 0.1 });
            }
            let frame = ReplayFrame::new(at(t), intents);
            frame.apply(&mut sim).unwrap();
            replay.frames.push(frame);
        }
        replay.finalize(&sim);
        (replay, sim)
    }

    #[test]
    fn test_replay_create() {
        let replay = Replay::new(SimulationConfig::with_seed(12345));
        assert_eq!(replay.version, REPLAY_VERSION);
        assert_eq!(replay.config.seed, 12345);
        assert_eq!(replay.frame_count(), 0);
    }

    #[test]
    fn test_replay_record_and_finalize() {
        let (replay, sim) = record(3, 120);
        assert_eq!(replay.frame_count(), 120);
        assert_eq!(replay.final_tick, 120);
        assert_eq!(replay.final_hash, sim.state_hash());
    }

    #[test]
    fn test_replay_verifies() {
        let (replay, _) = record(9, 400);
        assert!(replay.verify().is_ok());
    }

    #[test]
    fn test_tampered_replay_diverges() {
        let (mut replay, _) = record(9, 400);
        replay.frames[200].intents.push(Intent::Move { dx: 0.5, dy: 0.5 });
        assert!(matches!(
            replay.verify(),
            Err(GameError::ReplayDiverged { tick: 400, .. })
        ));
    }

    #[test]
    fn test_replay_save_load() {
        let (replay, _) = record(1, 60);

        let temp_path = std::env::temp_dir().join("nova_test_replay.bin");
        assert!(replay.save(&temp_path).is_ok());

        let loaded = Replay::load(&temp_path).unwrap();
        assert_eq!(loaded, replay);
        assert!(loaded.verify().is_ok());

        let _ = std::fs::remove_file(temp_path);
    }

    #[test]
    fn test_load_rejects_missing_file() {
        let path = std::env::temp_dir().join("nova_replay_does_not_exist.bin");
        assert!(matches!(Replay::load(path), Err(GameError::InvalidState(_))));
    }

    #[test]
    fn test_replay_player_advance_and_pause() {
        let (replay, _) = record(4, 10);
        let mut player = ReplayPlayer::new(replay);

        for _ in 0..5 {
            assert!(player.advance().unwrap());
        }
        assert_eq!(player.current_frame(), 5);
        assert_eq!(player.simulation().get_tick(), 5);

        player.toggle_pause();
        player.advance().unwrap();
        assert_eq!(player.current_frame(), 5);

        player.toggle_pause();
        while player.advance().unwrap() {}
        assert!(player.is_finished());
    }

    #[test]
    fn test_replay_player_seek_and_progress() {
        let (replay, _) = record(4, 100);
        let mut player = ReplayPlayer::new(replay);
        assert!((player.progress_percent() - 0.0).abs() < 0.01);

        player.seek(50).unwrap();
        assert_eq!(player.current_frame(), 50);
        assert!((player.progress_percent() - 50.0).abs() < 0.01);
        let hash_at_50 = player.simulation().state_hash();

        player.seek(10).unwrap();
        player.seek(50).unwrap();
        assert_eq!(player.simulation().state_hash(), hash_at_50);

        player.seek(1_000).unwrap();
        assert!(player.is_finished());
    }
}
