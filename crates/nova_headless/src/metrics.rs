//! Match metrics collection for balance analysis.
//!
//! One [`GameMetrics`] per autopilot match, aggregated into a
//! [`BatchSummary`] across a batch.

use std::collections::BTreeMap;

use nova_core::components::GameStatus;
use nova_core::conditions::LossReason;
use nova_core::progression::Bracket;
use nova_core::simulation::{MatchOutcome, Simulation};
use serde::{Deserialize, Serialize};

/// Complete metrics for a single match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameMetrics {
    /// Unique game identifier.
    pub game_id: String,
    /// Autopilot profile name.
    pub autopilot: String,
    /// Random seed used.
    pub seed: u64,
    /// Ticks simulated.
    pub duration_ticks: u64,
    /// How the match ended: `game_over:<reason>`, `victory:<kind>` or
    /// `timeout` when the tick budget ran out first.
    pub outcome: String,
    /// Victories passed on the way (Minor and Major are continued).
    pub victories: u32,
    /// Final score.
    pub final_score: u64,
    /// Final level.
    pub level: u32,
    /// Final wave.
    pub wave: u32,
    /// Sector of the final level.
    pub bracket: Option<Bracket>,
    /// Aliens destroyed.
    pub total_kills: u64,
    /// Aliens that escaped.
    pub missed_aliens: u64,
    /// Best combo reached.
    pub max_combo: u32,
    /// Hits per shot fired.
    pub accuracy: f64,
    /// Waves cleared.
    pub waves_completed: u32,
    /// Power-ups collected.
    pub power_ups_collected: u32,
    /// Lives left at the end.
    pub lives: u32,
    /// Final simulation state hash (for determinism validation).
    pub final_state_hash: u64,
}

impl GameMetrics {
    /// Create a new metrics record.
    #[must_use]
    pub fn new(game_id: impl Into<String>, autopilot: impl Into<String>, seed: u64) -> Self {
        Self {
            game_id: game_id.into(),
            autopilot: autopilot.into(),
            seed,
            outcome: "timeout".to_string(),
            ..Default::default()
        }
    }

    /// Record a match result.
    pub fn record_outcome(&mut self, outcome: MatchOutcome) {
        self.outcome = outcome_label(outcome);
        if matches!(outcome, MatchOutcome::Victory(_)) {
            self.victories += 1;
        }
    }

    /// Copy the end-of-run counters from `sim`.
    pub fn finalize(&mut self, sim: &Simulation, duration_ticks: u64) {
        let state = sim.state();
        self.duration_ticks = duration_ticks;
        self.final_score = state.score;
        self.level = state.level;
        self.wave = state.wave;
        self.bracket = Some(Bracket::for_level(state.level));
        self.total_kills = state.counters.total_kills;
        self.missed_aliens = state.counters.missed_aliens;
        self.max_combo = state.max_combo;
        self.accuracy = state.counters.accuracy();
        self.waves_completed = state.counters.waves_completed;
        self.power_ups_collected = state.counters.power_ups_collected;
        self.lives = state.lives;
        self.final_state_hash = sim.state_hash();

        // Continued victories leave the match running; only a terminal
        // status keeps the recorded outcome.
        if !matches!(state.status, GameStatus::GameOver | GameStatus::Victory) {
            self.outcome = "timeout".to_string();
        }
    }
}

/// Stable label for an outcome, used as a summary key.
#[must_use]
pub fn outcome_label(outcome: MatchOutcome) -> String {
    match outcome {
        MatchOutcome::Defeat(reason) => {
            let reason = match reason {
                LossReason::LivesExhausted => "lives_exhausted",
                LossReason::BossEscaped => "boss_escaped",
                LossReason::EscapeStreak => "escape_streak",
                LossReason::Abandoned => "abandoned",
            };
            format!("game_over:{reason}")
        }
        MatchOutcome::Victory(kind) => format!("victory:{}", format!("{kind:?}").to_lowercase()),
    }
}

/// Aggregate summary across a batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Games included.
    pub total_games: u32,
    /// Count per outcome label.
    pub outcomes: BTreeMap<String, u32>,
    /// Count per final sector name.
    pub brackets: BTreeMap<String, u32>,
    /// Mean final score.
    pub mean_score: f64,
    /// Median final score.
    pub median_score: u64,
    /// Best final score.
    pub max_score: u64,
    /// Mean final level.
    pub mean_level: f64,
    /// Highest final level.
    pub max_level: u32,
    /// Mean accuracy.
    pub mean_accuracy: f64,
    /// Mean best combo.
    pub mean_max_combo: f64,
    /// Mean match length in ticks.
    pub mean_duration_ticks: f64,
    /// Games that passed at least one victory.
    pub games_with_victory: u32,
}

impl BatchSummary {
    /// Aggregate `games`.
    #[must_use]
    pub fn from_games(games: &[GameMetrics]) -> Self {
        if games.is_empty() {
            return Self::default();
        }
        let n = games.len() as f64;

        let mut outcomes = BTreeMap::new();
        let mut brackets = BTreeMap::new();
        for game in games {
            *outcomes.entry(game.outcome.clone()).or_insert(0) += 1;
            if let Some(bracket) = game.bracket {
                *brackets.entry(bracket.name().to_string()).or_insert(0) += 1;
            }
        }

        let mut scores: Vec<u64> = games.iter().map(|g| g.final_score).collect();
        scores.sort_unstable();

        Self {
            total_games: games.len() as u32,
            outcomes,
            brackets,
            mean_score: scores.iter().map(|&s| s as f64).sum::<f64>() / n,
            median_score: scores[scores.len() / 2],
            max_score: scores[scores.len() - 1],
            mean_level: games.iter().map(|g| f64::from(g.level)).sum::<f64>() / n,
            max_level: games.iter().map(|g| g.level).max().unwrap_or(0),
            mean_accuracy: games.iter().map(|g| g.accuracy).sum::<f64>() / n,
            mean_max_combo: games.iter().map(|g| f64::from(g.max_combo)).sum::<f64>() / n,
            mean_duration_ticks: games.iter().map(|g| g.duration_ticks as f64).sum::<f64>() / n,
            games_with_victory: games.iter().filter(|g| g.victories > 0).count() as u32,
        }
    }

    /// Fraction of games with the given outcome label.
    #[must_use]
    pub fn rate(&self, outcome: &str) -> f64 {
        if self.total_games == 0 {
            return 0.0;
        }
        f64::from(self.outcomes.get(outcome).copied().unwrap_or(0)) / f64::from(self.total_games)
    }

    /// Human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("Games:        {}\n", self.total_games));
        out.push_str(&format!(
            "Score:        mean {:.0}, median {}, max {}\n",
            self.mean_score, self.median_score, self.max_score
        ));
        out.push_str(&format!(
            "Level:        mean {:.1}, max {}\n",
            self.mean_level, self.max_level
        ));
        out.push_str(&format!("Accuracy:     {:.1}%\n", self.mean_accuracy * 100.0));
        out.push_str(&format!("Best combo:   {:.1} (mean)\n", self.mean_max_combo));
        out.push_str(&format!("Length:       {:.0} ticks (mean)\n", self.mean_duration_ticks));
        out.push_str(&format!("Victories:    {} games\n", self.games_with_victory));
        out.push_str("Outcomes:\n");
        for (outcome, count) in &self.outcomes {
            out.push_str(&format!(
                "  {outcome:<28} {count:>5} ({:>5.1}%)\n",
                self.rate(outcome) * 100.0
            ));
        }
        out.push_str("Final sector:\n");
        for (bracket, count) in &self.brackets {
            out.push_str(&format!("  {bracket:<28} {count:>5}\n"));
        }
        out
    }
}
