//! Headless match runner implementation.
//!
//! Owns one [`Simulation`] and drives it from protocol [`Command`]s. Each
//! `tick` consumes the next instant of a [`FixedTimestep`], so a session is
//! a pure function of its command stream and can be recorded as a replay.

use std::io::{self, BufRead, Write};

use nova_core::clock::FixedTimestep;
use nova_core::components::GameStatus;
use nova_core::config::SimulationConfig;
use nova_core::replay::Replay;
use nova_core::simulation::{Intent, Simulation};

use crate::protocol::{Command, Response, StateView};

/// Headless runner configuration.
#[derive(Debug, Clone, Default)]
pub struct HeadlessConfig {
    /// Configuration for the match.
    pub simulation: SimulationConfig,
    /// Output state after every `tick` command (vs only on query).
    pub auto_state_output: bool,
    /// Keep a replay of the session.
    pub record_replay: bool,
}

/// Headless runner for controller-driven matches.
pub struct HeadlessRunner {
    sim: Simulation,
    timestep: FixedTimestep,
    auto_state_output: bool,
    /// Intents applied since the last tick, in order.
    pending: Vec<Intent>,
    replay: Option<Replay>,
}

impl HeadlessRunner {
    /// Create a new headless runner with default config.
    pub fn new() -> Self {
        Self::with_config(HeadlessConfig::default())
    }

    /// Create a runner with custom configuration.
    pub fn with_config(config: HeadlessConfig) -> Self {
        Self {
            sim: Simulation::new(config.simulation),
            timestep: FixedTimestep::default(),
            auto_state_output: config.auto_state_output,
            pending: Vec::new(),
            replay: config.record_replay.then(|| Replay::new(config.simulation)),
        }
    }

    /// The match being driven.
    pub const fn simulation(&self) -> &Simulation {
        &self.sim
    }

    /// Run the JSON-lines loop until `quit` or end of input.
    ///
    /// Reads one command per line from `input` and writes responses to
    /// `output`. Malformed lines produce an `error` response and are
    /// otherwise ignored.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> io::Result<()> {
        tracing::info!(seed = self.sim.config().seed, "Headless runner started");
        write_response(&mut output, &Response::ready(self.sim.get_tick()))?;

        for line in input.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let cmd = match Command::from_json(line) {
                Ok(cmd) => cmd,
                Err(e) => {
                    tracing::warn!(error = %e, "Unparseable command");
                    write_response(&mut output, &Response::error(format!("Parse error: {e}"), None))?;
                    continue;
                }
            };

            let quit = cmd == Command::Quit;
            for response in self.handle(cmd) {
                write_response(&mut output, &response)?;
            }
            if quit {
                break;
            }
        }

        tracing::info!(tick = self.sim.get_tick(), "Headless runner stopped");
        Ok(())
    }

    /// Process one command and return its responses.
    pub fn handle(&mut self, cmd: Command) -> Vec<Response> {
        let name = cmd.name();
        tracing::debug!(cmd = name, tick = self.sim.get_tick(), "Command");

        match cmd {
            Command::Start => self.intent(Intent::SetStatus(GameStatus::Playing), name),
            Command::Move { dx, dy } => self.intent(Intent::Move { dx, dy }, name),
            Command::Fire => self.intent(Intent::Fire, name),
            Command::Pause => self.intent(Intent::SetStatus(GameStatus::Paused), name),
            Command::Resume => self.intent(Intent::SetStatus(GameStatus::Playing), name),
            Command::Reset => self.intent(Intent::Reset, name),
            Command::Continue => self.intent(Intent::ContinueAfterVictory, name),
            Command::Tick { count } => self.tick(count, name),
            Command::Query => vec![self.state_response()],
            Command::Hash => vec![Response::Hash {
                tick: self.sim.get_tick(),
                hash: self.sim.state_hash(),
            }],
            Command::Quit => vec![Response::Bye],
        }
    }

    /// Stop recording and return the replay, if one was being kept.
    ///
    /// Intents queued after the last tick are flushed into a final frame
    /// first, ticking the live match when it accepts ticks.
    pub fn take_replay(&mut self) -> Option<Replay> {
        let mut replay = self.replay.take()?;
        if !self.pending.is_empty() {
            let now = self.timestep.next_tick();
            if self.sim.state().status.accepts_ticks() {
                self.sim.tick(now);
            }
            replay.record_frame(now, std::mem::take(&mut self.pending));
        }
        replay.finalize(&self.sim);
        Some(replay)
    }

    fn intent(&mut self, intent: Intent, name: &str) -> Vec<Response> {
        match self.sim.apply_intent(intent) {
            Ok(()) => {
                if self.replay.is_some() {
                    self.pending.push(intent);
                }
                vec![Response::ack(name)]
            }
            Err(e) => vec![Response::error(e.to_string(), Some(name))],
        }
    }

    fn tick(&mut self, count: u32, name: &str) -> Vec<Response> {
        let status = self.sim.state().status;
        if !status.accepts_ticks() {
            return vec![Response::error(
                format!("Cannot tick a {status:?} match"),
                Some(name),
            )];
        }

        let mut responses = Vec::new();
        for _ in 0..count {
            let now = self.timestep.next_tick();
            let events = self.sim.tick(now);
            if let Some(replay) = self.replay.as_mut() {
                replay.record_frame(now, std::mem::take(&mut self.pending));
            }
            if let Some(result) = events.match_result {
                responses.push(Response::MatchEnded { result });
            }
            if !self.sim.state().status.accepts_ticks() {
                break;
            }
        }

        if self.auto_state_output {
            responses.push(self.state_response());
        } else {
            responses.push(Response::ack(name));
        }
        responses
    }

    fn state_response(&self) -> Response {
        Response::State(StateView::from_snapshot(
            &self.sim.snapshot(),
            self.sim.state_hash(),
        ))
    }
}

impl Default for HeadlessRunner {
    fn default() -> Self {
        Self::new()
    }
}

fn write_response<W: Write>(output: &mut W, response: &Response) -> io::Result<()> {
    output.write_all(response.to_json_line().as_bytes())?;
    output.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(runner: &mut HeadlessRunner, input: &str) -> Vec<Response> {
        let mut out = Vec::new();
        runner.run(input.as_bytes(), &mut out).unwrap();
        String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn test_ready_and_bye() {
        let mut runner = HeadlessRunner::new();
        let responses = session(&mut runner, "{\"cmd\":\"quit\"}\n{\"cmd\":\"start\"}\n");
        assert_eq!(responses.len(), 2);
        assert!(matches!(responses[0], Response::Ready { tick: 0, .. }));
        assert_eq!(responses[1], Response::Bye);
        // Lines after quit are not read.
        assert_eq!(runner.simulation().state().status, GameStatus::Idle);
    }

    #[test]
    fn test_tick_before_start_is_error() {
        let mut runner = HeadlessRunner::new();
        let responses = runner.handle(Command::Tick { count: 5 });
        assert!(matches!(
            &responses[0],
            Response::Error { cmd: Some(cmd), .. } if cmd == "tick"
        ));
        assert_eq!(runner.simulation().get_tick(), 0);
    }

    #[test]
    fn test_start_and_tick() {
        let mut runner = HeadlessRunner::new();
        assert_eq!(runner.handle(Command::Start), vec![Response::ack("start")]);
        assert_eq!(
            runner.handle(Command::Tick { count: 30 }),
            vec![Response::ack("tick")]
        );
        assert_eq!(runner.simulation().get_tick(), 30);

        let Response::State(view) = &runner.handle(Command::Query)[0] else {
            panic!("expected state");
        };
        assert_eq!(view.tick, 30);
        assert_eq!(view.status, GameStatus::Playing);
        assert_eq!(view.hash, runner.simulation().state_hash());
    }

    #[test]
    fn test_bad_line_reports_parse_error() {
        let mut runner = HeadlessRunner::new();
        let responses = session(&mut runner, "garbage\n\n{\"cmd\":\"hash\"}\n");
        assert!(matches!(&responses[1], Response::Error { cmd: None, .. }));
        assert!(matches!(responses[2], Response::Hash { tick: 0, .. }));
    }

    #[test]
    fn test_invalid_transition_is_error() {
        let mut runner = HeadlessRunner::new();
        let responses = runner.handle(Command::Continue);
        assert!(matches!(&responses[0], Response::Error { .. }));
    }

    #[test]
    fn test_pause_resume() {
        let mut runner = HeadlessRunner::new();
        runner.handle(Command::Start);
        runner.handle(Command::Pause);
        assert_eq!(runner.simulation().state().status, GameStatus::Paused);
        runner.handle(Command::Tick { count: 10 });
        runner.handle(Command::Resume);
        assert_eq!(runner.simulation().state().status, GameStatus::Playing);
    }

    #[test]
    fn test_auto_state_output() {
        let mut runner = HeadlessRunner::with_config(HeadlessConfig {
            auto_state_output: true,
            ..HeadlessConfig::default()
        });
        runner.handle(Command::Start);
        let responses = runner.handle(Command::Tick { count: 2 });
        assert!(matches!(&responses[0], Response::State(view) if view.tick == 2));
    }

    #[test]
    fn test_abandon_reports_match_ended() {
        let mut runner = HeadlessRunner::new();
        runner.handle(Command::Start);
        runner.handle(Command::Tick { count: 1 });
        // Abandoning only ends the match; the next tick is refused.
        runner.sim.set_status(GameStatus::GameOver).unwrap();
        assert!(runner.sim.match_result().is_some());
        let responses = runner.handle(Command::Tick { count: 1 });
        assert!(matches!(&responses[0], Response::Error { .. }));
    }

    #[test]
    fn test_recorded_session_verifies() {
        let mut runner = HeadlessRunner::with_config(HeadlessConfig {
            simulation: SimulationConfig::with_seed(11),
            record_replay: true,
            ..HeadlessConfig::default()
        });
        runner.handle(Command::Start);
        for i in 0..40 {
            runner.handle(Command::Fire);
            runner.handle(Command::Move {
                dx: if i % 2 == 0 { 0.3 } else { -0.2 },
                dy: 0.0,
            });
            runner.handle(Command::Tick { count: 5 });
        }
        runner.handle(Command::Pause);

        let replay = runner.take_replay().expect("recording enabled");
        assert_eq!(replay.frame_count(), 201);
        assert_eq!(replay.final_hash, runner.simulation().state_hash());
        assert!(replay.verify().is_ok());
    }

    #[test]
    fn test_no_replay_unless_requested() {
        let mut runner = HeadlessRunner::new();
        runner.handle(Command::Start);
        assert!(runner.take_replay().is_none());
    }
}
