//! Core simulation loop.
//!
//! One [`Simulation`] owns one match. Callers queue move and fire intents
//! and advance the match with [`Simulation::tick`], passing the instant of
//! the frame. Each tick runs the same fixed pipeline:
//!
//! 1. **Intents** - apply queued moves, spawn bullets for fire intents
//! 2. **Movement** - advance bullets and aliens, drop stray bullets
//! 3. **Collisions** - bullet hits, kills and scoring, player contacts
//! 4. **Escapes** - aliens past the lower boundary, miss window
//! 5. **Soft penalties** - idle timeout and high-level combo decay
//! 6. **Boss** - spawn delay and power cooldown
//! 7. **Waves** - transition countdown, wave clears, spawning
//! 8. **End of match** - loss first, then victory
//!
//! # Determinism
//!
//! Positions are fixed-point, entity lists keep insertion order and all
//! randomness comes from the seeded RNG stored in the simulation, so the
//! same config and intent stream always produce the same state hash.
//!
//! # Example
//!
//! ```
//! use nova_core::clock::SimInstant;
//! use nova_core::components::GameStatus;
//! use nova_core::config::SimulationConfig;
//! use nova_core::simulation::Simulation;
//!
//! let mut sim = Simulation::new(SimulationConfig::with_seed(7));
//! sim.set_status(GameStatus::Playing).unwrap();
//!
//! sim.apply_move(0.25, 0.0);
//! sim.apply_fire();
//! let _events = sim.tick(SimInstant::ZERO);
//!
//! assert_eq!(sim.get_tick(), 1);
//! assert_eq!(sim.state().counters.shots_fired, 1);
//! ```

use std::collections::hash_map::DefaultHasher;
use std::collections::VecDeque;
use std::hash::{Hash, Hasher};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::boss::{boss_alien, boss_phase, BossEncounter, BossPower, EncounterAction};
use crate::clock::{millis_to_ticks, SimInstant, TICK_DURATION_MICROS};
use crate::collision::{player_contacts, remove_out_of_bounds, resolve_bullet_hits, take_escaped};
use crate::combo::{combo_multiplier, ComboEngine, ComboTier};
use crate::components::{
    Alien, AlienColor, BossState, Bullet, EntityId, GameStatus, PowerUpType, SessionCounters,
    VictoryKind, VictoryResult,
};
use crate::components::ActivePowerUp;
use crate::conditions::{
    escape_streak_exceeded, victory_for_level, ComboResetReason, IdleTimer, LossReason, MissWindow,
};
use crate::config::SimulationConfig;
use crate::error::{GameError, Result};
use crate::math::{milli, units, Fixed, Vec2Fixed};
use crate::movement::{advance_aliens, advance_bullets, clamp_delta};
use crate::progression::{level_from_score, level_progress, Bracket, MIN_LEVEL};
use crate::scoring::{
    apply_penalty, collect_power_up, escape_penalty, expire_power_ups, has_power_up, kill_score,
    power_up_for, roll_drop, KillContext, MAX_LIVES,
};
use crate::waves::{wave_clear_bonus, SpawnOrder, WaveParams, WaveScheduler};

/// Where the player starts.
pub const PLAYER_START: Vec2Fixed = Vec2Fixed::new(Fixed::ZERO, milli(-2_500));

/// Player position limit on both axes.
pub const PLAYER_LIMIT: Fixed = units(3);

/// Largest move applied per intent on each axis.
pub const MAX_MOVE_DELTA: Fixed = milli(500);

/// Bullet speed in units per tick.
pub const BULLET_SPEED: Fixed = milli(200);

/// Length of the break between waves.
pub const WAVE_TRANSITION_MS: u64 = 2_000;

/// Ticks during which the boss cannot cost another life after touching
/// the player.
pub const BOSS_CONTACT_IMMUNITY_TICKS: u64 = 90;

const MUZZLE_OFFSET: Fixed = milli(300);
const RAPID_FIRE_SPACING: Fixed = milli(150);
const SPREAD_DRIFT: Fixed = milli(50);

// ============================================================================
// Inputs
// ============================================================================

/// Abstract player or controller intent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Intent {
    /// Move the ship by a delta; clamped to ±0.5 per axis.
    Move {
        /// Horizontal delta.
        dx: f64,
        /// Vertical delta.
        dy: f64,
    },
    /// Fire the current weapon pattern.
    Fire,
    /// Change the match status.
    SetStatus(GameStatus),
    /// Discard the match and start over.
    Reset,
    /// Resume after a Minor or Major victory.
    ContinueAfterVictory,
}

/// Intent waiting for the next tick. Moves are clamped on entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
enum QueuedIntent {
    Move(Vec2Fixed),
    Fire,
}

// ============================================================================
// State and outputs
// ============================================================================

/// Everything observable about a match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SimulationState {
    /// Ticks processed.
    pub tick: u64,
    /// Player ship position.
    pub player: Vec2Fixed,
    /// Live bullets in fire order.
    pub bullets: Vec<Bullet>,
    /// Live aliens in spawn order.
    pub aliens: Vec<Alien>,
    /// Total score.
    pub score: u64,
    /// Remaining lives (0–3).
    pub lives: u32,
    /// Level, always `level_from_score(score)`.
    pub level: u32,
    /// Wave within the level (1–5).
    pub wave: u32,
    /// Kills credited to the current wave.
    pub kills_in_wave: u32,
    /// Current kill streak.
    pub combo: u32,
    /// Best kill streak this match.
    pub max_combo: u32,
    /// Timed power-ups in effect.
    pub power_ups: Vec<ActivePowerUp>,
    /// Boss projection.
    pub boss: BossState,
    /// Session counters.
    pub counters: SessionCounters,
    /// Match status.
    pub status: GameStatus,
    /// Victory reached, if any.
    pub victory: Option<VictoryResult>,
}

impl SimulationState {
    /// State of a freshly created match.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tick: 0,
            player: PLAYER_START,
            bullets: Vec::new(),
            aliens: Vec::new(),
            score: 0,
            lives: MAX_LIVES,
            level: MIN_LEVEL,
            wave: 1,
            kills_in_wave: 0,
            combo: 0,
            max_combo: 0,
            power_ups: Vec::new(),
            boss: BossState::default(),
            counters: SessionCounters::default(),
            status: GameStatus::Idle,
            victory: None,
        }
    }
}

impl Default for SimulationState {
    fn default() -> Self {
        Self::new()
    }
}

/// Something that happened during a tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TickEvent {
    /// A regular alien entered the field.
    AlienSpawned {
        /// New alien.
        id: EntityId,
    },
    /// A bullet damaged an alien.
    AlienHit {
        /// Alien hit.
        alien: EntityId,
        /// Bullet that hit it.
        bullet: EntityId,
    },
    /// An alien was destroyed by the player.
    AlienDestroyed {
        /// Destroyed alien.
        id: EntityId,
        /// Its color.
        color: AlienColor,
        /// Score awarded.
        score: u64,
        /// Combo after the kill.
        combo: u32,
    },
    /// The combo reached the PERFECT threshold.
    PerfectCombo {
        /// Bonus awarded.
        bonus: u64,
    },
    /// A power-up was collected.
    PowerUpCollected {
        /// Kind collected.
        kind: PowerUpType,
    },
    /// A timed power-up ran out.
    PowerUpExpired {
        /// Kind that expired.
        kind: PowerUpType,
    },
    /// An alien touched the player.
    PlayerHit {
        /// Lives left afterwards.
        lives: u32,
    },
    /// An alien crossed the lower boundary.
    AlienEscaped {
        /// Escaped alien.
        id: EntityId,
        /// Score deducted.
        penalty: u64,
    },
    /// The combo dropped to zero.
    ComboReset {
        /// Cause.
        reason: ComboResetReason,
    },
    /// The combo lost one step to decay.
    ComboDecayed {
        /// Combo afterwards.
        combo: u32,
    },
    /// The level went up.
    LevelUp {
        /// New level.
        level: u32,
    },
    /// The wave's kill target was met.
    WaveCleared {
        /// Cleared wave.
        wave: u32,
        /// Bonus awarded.
        bonus: u64,
    },
    /// Regular spawning resumed.
    WaveStarted {
        /// New wave.
        wave: u32,
    },
    /// The boss entered the field.
    BossSpawned {
        /// Boss entity.
        id: EntityId,
        /// Boss level of the encounter.
        level: u32,
        /// Boss name.
        name: String,
    },
    /// The boss's power came off cooldown.
    BossPower {
        /// Power to run.
        power: BossPower,
    },
    /// The boss was destroyed.
    BossDefeated {
        /// Encounter level.
        level: u32,
    },
    /// A victory was granted.
    Victory {
        /// Tier reached.
        kind: VictoryKind,
    },
    /// The match was lost.
    GameOver {
        /// Cause.
        reason: LossReason,
    },
}

/// Events produced by one tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickEvents {
    /// Events in the order they happened.
    pub events: Vec<TickEvent>,
    /// Final result, set on the tick the match ended.
    pub match_result: Option<MatchResult>,
}

impl TickEvents {
    fn push(&mut self, event: TickEvent) {
        self.events.push(event);
    }

    /// Whether nothing happened.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty() && self.match_result.is_none()
    }

    /// Whether any event matches `predicate`.
    pub fn any(&self, predicate: impl Fn(&TickEvent) -> bool) -> bool {
        self.events.iter().any(predicate)
    }
}

/// How a match ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchOutcome {
    /// The match was lost.
    Defeat(LossReason),
    /// A victory was reached.
    Victory(VictoryKind),
}

/// Summary handed to persistence layers when a match ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// How the match ended.
    pub outcome: MatchOutcome,
    /// Final score.
    pub final_score: u64,
    /// Final level.
    pub level: u32,
    /// Final wave.
    pub wave: u32,
    /// Aliens destroyed.
    pub total_kills: u64,
    /// Best combo.
    pub max_combo: u32,
    /// Hits per shot fired.
    pub accuracy: f64,
    /// Unpaused play time in milliseconds.
    pub play_duration_ms: u64,
    /// Waves cleared.
    pub waves_completed: u32,
    /// Power-ups collected.
    pub power_ups_collected: u32,
    /// Difficulty sector of the final level.
    pub bracket: Bracket,
}

/// Read-only view of a match with derived HUD fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Copy of the match state.
    pub state: SimulationState,
    /// Percent toward the next level.
    pub level_progress: f64,
    /// Difficulty sector.
    pub bracket: Bracket,
    /// Current combo multiplier.
    pub combo_multiplier: u32,
    /// Current combo tier, if any.
    pub combo_tier: Option<ComboTier>,
    /// Name of the boss being fought.
    pub boss_name: Option<String>,
    /// Current boss phase.
    pub boss_phase: Option<u32>,
    /// Kills needed to clear the wave.
    pub enemies_required: u32,
    /// Time spent in the current wave.
    pub wave_elapsed_ms: u64,
    /// Nominal wave length.
    pub wave_duration_ms: u64,
}

// ============================================================================
// Simulation
// ============================================================================

/// Wall-clock bookkeeping for a match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
struct MatchClock {
    started_at: Option<SimInstant>,
    last_now: Option<SimInstant>,
    paused_total_micros: u64,
    resume_pending: bool,
}

/// The shooter simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Simulation {
    config: SimulationConfig,
    state: SimulationState,
    rng: ChaCha8Rng,
    scheduler: WaveScheduler,
    combo: ComboEngine,
    encounter: BossEncounter,
    miss_window: MissWindow,
    idle: IdleTimer,
    intents: VecDeque<QueuedIntent>,
    next_id: EntityId,
    clock: MatchClock,
    transition_ticks_remaining: u64,
    contact_immunity_ticks: u64,
    paused_from: Option<GameStatus>,
    match_result: Option<MatchResult>,
}

impl Simulation {
    /// Create an idle match seeded from `config`.
    #[must_use]
    pub fn new(config: SimulationConfig) -> Self {
        Self::with_rng(config, ChaCha8Rng::seed_from_u64(config.seed))
    }

    /// Create an idle match with an injected RNG.
    #[must_use]
    pub fn with_rng(config: SimulationConfig, rng: ChaCha8Rng) -> Self {
        Self {
            config,
            state: SimulationState::new(),
            rng,
            scheduler: WaveScheduler::new(MIN_LEVEL),
            combo: ComboEngine::new(),
            encounter: BossEncounter::new(),
            miss_window: MissWindow::new(),
            idle: IdleTimer::default(),
            intents: VecDeque::new(),
            next_id: 1,
            clock: MatchClock::default(),
            transition_ticks_remaining: 0,
            contact_immunity_ticks: 0,
            paused_from: None,
            match_result: None,
        }
    }

    /// Rebuild a match around a saved or hand-made state.
    ///
    /// The level is recomputed from the score. A boss alien in the state
    /// resumes an active encounter for the boss level at or below the
    /// current level; a `Boss` status without one restarts the spawn delay.
    #[must_use]
    pub fn from_state(config: SimulationConfig, mut state: SimulationState) -> Self {
        let mut sim = Self::new(config);
        state.level = level_from_score(state.score);
        let boss_level = (state.level / 10).max(1) * 10;

        sim.next_id = state
            .bullets
            .iter()
            .map(|b| b.id)
            .chain(state.aliens.iter().map(|a| a.id))
            .max()
            .map_or(1, |id| id + 1);
        sim.combo = ComboEngine::resume(state.combo, state.max_combo);
        sim.scheduler = WaveScheduler::resume(state.level, state.kills_in_wave);

        if let Some(boss) = state.aliens.iter().find(|a| a.is_boss) {
            sim.encounter = BossEncounter::resume(boss_level, boss.id);
        } else if state.status == GameStatus::Boss {
            sim.encounter.trigger(boss_level);
        }
        match state.status {
            GameStatus::WaveTransition => {
                sim.transition_ticks_remaining = millis_to_ticks(WAVE_TRANSITION_MS);
            }
            GameStatus::Paused => sim.paused_from = Some(GameStatus::Playing),
            _ => {}
        }

        sim.state = state;
        sim.sync_projection();
        sim
    }

    /// Match configuration.
    #[must_use]
    pub const fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Current match state.
    #[must_use]
    pub const fn state(&self) -> &SimulationState {
        &self.state
    }

    /// Ticks processed so far.
    #[must_use]
    pub const fn get_tick(&self) -> u64 {
        self.state.tick
    }

    /// Boss encounter state machine.
    #[must_use]
    pub const fn encounter(&self) -> &BossEncounter {
        &self.encounter
    }

    /// Wave bookkeeping, including the boss still due.
    #[must_use]
    pub const fn scheduler(&self) -> &WaveScheduler {
        &self.scheduler
    }

    /// Rolling escape window.
    #[must_use]
    pub const fn miss_window(&self) -> &MissWindow {
        &self.miss_window
    }

    /// Intents waiting for the next tick.
    #[must_use]
    pub fn pending_intents(&self) -> usize {
        self.intents.len()
    }

    /// Final result once the match has ended.
    #[must_use]
    pub const fn match_result(&self) -> Option<&MatchResult> {
        self.match_result.as_ref()
    }

    // ------------------------------------------------------------------------
    // Intents
    // ------------------------------------------------------------------------

    /// Queue a move. Each axis is clamped to ±0.5; non-finite values are 0.
    pub fn apply_move(&mut self, dx: f64, dy: f64) {
        self.intents
            .push_back(QueuedIntent::Move(clamp_delta(dx, dy, MAX_MOVE_DELTA)));
    }

    /// Queue a fire intent.
    pub fn apply_fire(&mut self) {
        self.intents.push_back(QueuedIntent::Fire);
    }

    /// Dispatch an [`Intent`].
    pub fn apply_intent(&mut self, intent: Intent) -> Result<()> {
        match intent {
            Intent::Move { dx, dy } => self.apply_move(dx, dy),
            Intent::Fire => self.apply_fire(),
            Intent::SetStatus(status) => return self.set_status(status),
            Intent::Reset => self.reset(),
            Intent::ContinueAfterVictory => return self.continue_after_victory(),
        }
        Ok(())
    }

    /// Change the match status.
    ///
    /// Allowed: `Idle → Playing` (start), any running status `→ Paused`,
    /// `Paused →` the status it was paused from (`Playing` also resumes),
    /// and any running or paused status `→ GameOver` (abandon). Setting the
    /// current status is a no-op.
    pub fn set_status(&mut self, to: GameStatus) -> Result<()> {
        let from = self.state.status;
        if from == to {
            return Ok(());
        }

        match (from, to) {
            (GameStatus::Idle, GameStatus::Playing) => {
                tracing::info!(seed = self.config.seed, mode = ?self.config.mode, "Match started");
                self.state.status = GameStatus::Playing;
                self.scheduler.begin_wave();
            }
            (GameStatus::Playing | GameStatus::WaveTransition | GameStatus::Boss, GameStatus::Paused) => {
                self.paused_from = Some(from);
                self.state.status = GameStatus::Paused;
            }
            (GameStatus::Paused, _) if Some(to) == self.paused_from || to == GameStatus::Playing => {
                self.state.status = self.paused_from.take().unwrap_or(GameStatus::Playing);
                self.clock.resume_pending = true;
            }
            (
                GameStatus::Playing
                | GameStatus::Paused
                | GameStatus::WaveTransition
                | GameStatus::Boss,
                GameStatus::GameOver,
            ) => {
                self.state.status = GameStatus::GameOver;
                self.finish(MatchOutcome::Defeat(LossReason::Abandoned));
            }
            _ => return Err(GameError::InvalidTransition { from, to }),
        }
        Ok(())
    }

    /// Throw the match away and return to the initial idle state.
    ///
    /// The RNG is reseeded from the config, so two resets in a row leave
    /// identical state.
    pub fn reset(&mut self) {
        tracing::debug!(tick = self.state.tick, "Match reset");
        *self = Self::new(self.config);
    }

    /// Resume play at wave 1 after a Minor or Major victory.
    pub fn continue_after_victory(&mut self) -> Result<()> {
        let resumable = self.state.status == GameStatus::Victory
            && self
                .state
                .victory
                .as_ref()
                .is_some_and(|v| v.kind.allows_continue());
        if !resumable {
            return Err(GameError::InvalidTransition {
                from: self.state.status,
                to: GameStatus::Playing,
            });
        }

        tracing::info!(level = self.state.level, "Continuing after victory");
        self.state.victory = None;
        self.state.wave = 1;
        self.state.status = GameStatus::Playing;
        self.scheduler.begin_wave();
        self.encounter.reset();
        self.match_result = None;
        self.clock.resume_pending = true;
        self.sync_projection();
        Ok(())
    }

    /// Insert a regular alien. Returns `None` when the alien cap is reached.
    pub fn spawn_alien(&mut self, order: SpawnOrder) -> Option<EntityId> {
        if self.state.aliens.len() >= self.config.max_aliens {
            tracing::trace!(cap = self.config.max_aliens, "Alien cap reached, spawn skipped");
            return None;
        }
        let id = self.allocate_id();
        self.state.aliens.push(Alien {
            id,
            position: order.position,
            color: order.color,
            hp: order.hp,
            max_hp: order.hp,
            is_boss: false,
            speed: order.speed,
            horizontal_velocity: order.horizontal_velocity,
            behavior: Some(order.behavior),
        });
        Some(id)
    }

    // ------------------------------------------------------------------------
    // Tick
    // ------------------------------------------------------------------------

    /// Advance the match by one tick at instant `now`.
    ///
    /// A paused match discards queued intents and does nothing else.
    ///
    /// # Panics
    ///
    /// Panics when the match is `Idle`, `GameOver` or `Victory`.
    pub fn tick(&mut self, now: SimInstant) -> TickEvents {
        assert!(
            self.state.status.accepts_ticks(),
            "tick() called on a {:?} match",
            self.state.status
        );

        let mut events = TickEvents::default();
        if self.state.status == GameStatus::Paused {
            self.intents.clear();
            return events;
        }

        self.sync_clock(now);
        let level_before = self.state.level;
        let mut loss = None;

        // 1. Intents
        self.drain_intents(now);

        // 2. Movement
        for kind in expire_power_ups(&mut self.state.power_ups, now) {
            events.push(TickEvent::PowerUpExpired { kind });
        }
        self.run_movement();

        // 3. Collisions
        let boss_defeated = self.run_bullet_collisions(now, &mut events);
        self.run_player_collisions(&mut events, &mut loss);

        // 4. Escapes
        self.run_escapes(now, &mut events, &mut loss);

        // 5. Soft penalties
        if self.idle.check(now) {
            self.reset_combo(ComboResetReason::Idle, &mut events);
        }
        if self.combo.tick_decay(self.state.level) {
            events.push(TickEvent::ComboDecayed {
                combo: self.combo.combo(),
            });
        }

        // 6-8. Boss, waves, end of match
        if let Some(reason) = loss {
            self.end_in_defeat(reason, &mut events);
        } else if boss_defeated {
            self.resolve_boss_defeat(&mut events);
        } else {
            self.run_boss_encounter(&mut events);
            self.run_waves(&mut events);
        }

        if self.state.level > level_before {
            events.push(TickEvent::LevelUp {
                level: self.state.level,
            });
        }

        self.sync_projection();
        self.state.tick += 1;

        #[cfg(debug_assertions)]
        {
            let hash = self.state_hash();
            tracing::debug!(tick = self.state.tick, state_hash = hash, "Simulation state hash");
        }

        events
    }

    fn allocate_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn add_score(&mut self, delta: u64) {
        self.state.score = self.state.score.saturating_add(delta);
        self.state.level = level_from_score(self.state.score);
    }

    fn has_power_up(&self, kind: PowerUpType) -> bool {
        has_power_up(&self.state.power_ups, kind)
    }

    fn reset_combo(&mut self, reason: ComboResetReason, events: &mut TickEvents) {
        if self.combo.reset() {
            tracing::trace!(?reason, "Combo reset");
            events.push(TickEvent::ComboReset { reason });
        }
    }

    /// Record the match start and shift wall-clock timers over a pause.
    fn sync_clock(&mut self, now: SimInstant) {
        if self.clock.started_at.is_none() {
            self.clock.started_at = Some(now);
            self.idle = IdleTimer::new(now);
        }

        if self.clock.resume_pending {
            self.clock.resume_pending = false;
            if let Some(last) = self.clock.last_now {
                let gap = now
                    .as_micros()
                    .saturating_sub(last.as_micros())
                    .saturating_sub(TICK_DURATION_MICROS);
                if gap > 0 {
                    tracing::debug!(gap_micros = gap, "Shifting timers over pause");
                    self.idle.shift(gap);
                    self.miss_window.shift(gap);
                    for power_up in &mut self.state.power_ups {
                        power_up.expires_at = power_up.expires_at.add_micros(gap);
                    }
                    self.clock.paused_total_micros += gap;
                }
            }
        }

        self.clock.last_now = Some(now);
    }

    fn drain_intents(&mut self, now: SimInstant) {
        while let Some(intent) = self.intents.pop_front() {
            match intent {
                QueuedIntent::Move(delta) => {
                    self.state.player = (self.state.player + delta).clamp_symmetric(PLAYER_LIMIT);
                }
                QueuedIntent::Fire => self.fire(now),
            }
        }
    }

    fn fire(&mut self, now: SimInstant) {
        self.idle.record_fire(now);

        let origin = self.state.player + Vec2Fixed::new(Fixed::ZERO, MUZZLE_OFFSET);
        // (x offset from the muzzle, horizontal drift) per bullet
        let lanes = if self.has_power_up(PowerUpType::SpreadShot) {
            vec![
                (Fixed::ZERO, -SPREAD_DRIFT),
                (Fixed::ZERO, Fixed::ZERO),
                (Fixed::ZERO, SPREAD_DRIFT),
            ]
        } else if self.has_power_up(PowerUpType::RapidFire) {
            vec![(-RAPID_FIRE_SPACING, Fixed::ZERO), (RAPID_FIRE_SPACING, Fixed::ZERO)]
        } else {
            vec![(Fixed::ZERO, Fixed::ZERO)]
        };
        let piercing = self.has_power_up(PowerUpType::Piercing);

        for (offset_x, drift_x) in lanes {
            let id = self.allocate_id();
            self.state.bullets.push(Bullet {
                id,
                position: origin + Vec2Fixed::new(offset_x, Fixed::ZERO),
                velocity: Vec2Fixed::new(drift_x, BULLET_SPEED),
                piercing,
                last_hit: None,
            });
            self.state.counters.shots_fired += 1;
        }

        let excess = self.state.bullets.len().saturating_sub(self.config.max_bullets);
        if excess > 0 {
            self.state.bullets.drain(..excess);
        }
    }

    fn run_movement(&mut self) {
        let bullet_factor = if self.has_power_up(PowerUpType::Overdrive) {
            units(2)
        } else {
            Fixed::ONE
        };
        advance_bullets(&mut self.state.bullets, bullet_factor);
        remove_out_of_bounds(&mut self.state.bullets);

        let alien_factor = if self.has_power_up(PowerUpType::SlowTime) {
            milli(500)
        } else {
            Fixed::ONE
        };
        advance_aliens(&mut self.state.aliens, alien_factor);
    }

    /// Returns whether the boss was destroyed.
    fn run_bullet_collisions(&mut self, now: SimInstant, events: &mut TickEvents) -> bool {
        let hits = resolve_bullet_hits(&mut self.state.bullets, &mut self.state.aliens);
        if hits.is_empty() {
            return false;
        }
        for hit in &hits {
            self.state.counters.shots_hit += 1;
            events.push(TickEvent::AlienHit {
                alien: hit.alien,
                bullet: hit.bullet,
            });
        }

        let mut destroyed = Vec::new();
        self.state.aliens.retain(|alien| {
            if alien.is_destroyed() {
                destroyed.push(alien.clone());
                false
            } else {
                true
            }
        });

        let mut boss_defeated = false;
        for alien in destroyed {
            boss_defeated |= alien.is_boss;
            self.on_alien_destroyed(&alien, now, events);
        }
        boss_defeated
    }

    fn on_alien_destroyed(&mut self, alien: &Alien, now: SimInstant, events: &mut TickEvents) {
        let streak = self.combo.register_kill(self.state.level);
        let score = kill_score(&KillContext {
            color: alien.color,
            max_hp: alien.max_hp,
            is_boss: alien.is_boss,
            wave: self.state.wave,
            combo_multiplier: streak.multiplier,
            mode: self.config.mode,
        });
        self.add_score(score + streak.perfect_bonus);

        let counters = &mut self.state.counters;
        counters.total_kills += 1;
        counters.escape_streak = 0;

        tracing::trace!(id = alien.id, color = ?alien.color, score, combo = streak.combo, "Alien destroyed");
        events.push(TickEvent::AlienDestroyed {
            id: alien.id,
            color: alien.color,
            score,
            combo: streak.combo,
        });
        if streak.perfect_bonus > 0 {
            events.push(TickEvent::PerfectCombo {
                bonus: streak.perfect_bonus,
            });
        }

        if !alien.is_boss {
            self.scheduler.record_kill();
        }

        if roll_drop(self.state.level, alien.is_boss, &mut self.rng) {
            let kind = power_up_for(alien.color);
            collect_power_up(&mut self.state.power_ups, &mut self.state.lives, kind, now);
            self.state.counters.power_ups_collected += 1;
            events.push(TickEvent::PowerUpCollected { kind });
        }

        if alien.is_boss {
            self.encounter.defeat();
            events.push(TickEvent::BossDefeated {
                level: self.encounter.level(),
            });
        }
    }

    fn run_player_collisions(&mut self, events: &mut TickEvents, loss: &mut Option<LossReason>) {
        self.contact_immunity_ticks = self.contact_immunity_ticks.saturating_sub(1);

        for id in player_contacts(self.state.player, &self.state.aliens) {
            let Some(index) = self.state.aliens.iter().position(|a| a.id == id) else {
                continue;
            };
            if self.state.aliens[index].is_boss {
                if self.contact_immunity_ticks > 0 {
                    continue;
                }
                self.contact_immunity_ticks = BOSS_CONTACT_IMMUNITY_TICKS;
            } else {
                self.state.aliens.remove(index);
            }

            self.state.lives = self.state.lives.saturating_sub(1);
            events.push(TickEvent::PlayerHit {
                lives: self.state.lives,
            });
            self.reset_combo(ComboResetReason::PlayerHit, events);
            if self.state.lives == 0 {
                loss.get_or_insert(LossReason::LivesExhausted);
            }
        }
    }

    fn run_escapes(&mut self, now: SimInstant, events: &mut TickEvents, loss: &mut Option<LossReason>) {
        for alien in take_escaped(&mut self.state.aliens) {
            let counters = &mut self.state.counters;
            counters.missed_aliens += 1;
            counters.escape_streak += 1;
            let streak = counters.escape_streak;

            let before = self.state.score;
            self.state.score = apply_penalty(before, escape_penalty(self.state.level), self.state.level);
            self.state.level = level_from_score(self.state.score);

            tracing::trace!(id = alien.id, streak, "Alien escaped");
            events.push(TickEvent::AlienEscaped {
                id: alien.id,
                penalty: before - self.state.score,
            });

            if self.miss_window.record_miss(now) {
                self.reset_combo(ComboResetReason::MissWindow, events);
            }

            if alien.is_boss {
                self.encounter.fail();
                self.reset_combo(ComboResetReason::BossEscaped, events);
                loss.get_or_insert(LossReason::BossEscaped);
            } else if escape_streak_exceeded(streak) {
                loss.get_or_insert(LossReason::EscapeStreak);
            }
        }
    }

    fn run_boss_encounter(&mut self, events: &mut TickEvents) {
        if self.state.status != GameStatus::Boss {
            return;
        }
        match self.encounter.tick() {
            EncounterAction::SpawnBoss => {
                let id = self.allocate_id();
                let boss = boss_alien(id, self.encounter.level());
                self.state.aliens.push(boss);
                self.encounter.mark_spawned(id);

                let name = self
                    .encounter
                    .profile()
                    .map_or_else(String::new, |p| p.name.to_string());
                let level = self.encounter.level();
                tracing::info!(id, level, %name, "Boss spawned");
                events.push(TickEvent::BossSpawned { id, level, name });
            }
            EncounterAction::ActivatePower(power) => {
                tracing::debug!(?power, "Boss power activated");
                events.push(TickEvent::BossPower { power });
            }
            EncounterAction::None => {}
        }
    }

    fn run_waves(&mut self, events: &mut TickEvents) {
        match self.state.status {
            GameStatus::WaveTransition => {
                self.transition_ticks_remaining = self.transition_ticks_remaining.saturating_sub(1);
                if self.transition_ticks_remaining == 0 {
                    self.state.status = GameStatus::Playing;
                    self.scheduler.begin_wave();
                    events.push(TickEvent::WaveStarted {
                        wave: self.state.wave,
                    });
                }
            }
            GameStatus::Playing => {
                let params = WaveParams::for_level(self.state.level, self.state.wave);
                if self.scheduler.is_cleared(&params) {
                    self.clear_wave(events);
                    return;
                }
                let orders = self
                    .scheduler
                    .tick(self.state.level, self.state.wave, &mut self.rng);
                for order in orders {
                    if let Some(id) = self.spawn_alien(order) {
                        events.push(TickEvent::AlienSpawned { id });
                    }
                }
            }
            _ => {}
        }
    }

    fn clear_wave(&mut self, events: &mut TickEvents) {
        let level = self.state.level;
        let wave = self.state.wave;
        let bonus = wave_clear_bonus(wave, level);
        let boss = self.scheduler.boss_due(level, wave);

        tracing::info!(level, wave, bonus, "Wave cleared");
        self.state.counters.waves_completed += 1;
        self.add_score(bonus);
        events.push(TickEvent::WaveCleared { wave, bonus });

        if let Some(boss_level) = boss {
            self.state.status = GameStatus::Boss;
            self.encounter.trigger(boss_level);
            self.scheduler.begin_wave();
        } else {
            self.begin_transition(WaveScheduler::next_wave(wave));
        }
    }

    fn begin_transition(&mut self, next_wave: u32) {
        self.state.wave = next_wave;
        self.state.status = GameStatus::WaveTransition;
        self.transition_ticks_remaining = millis_to_ticks(WAVE_TRANSITION_MS);
    }

    fn resolve_boss_defeat(&mut self, events: &mut TickEvents) {
        self.scheduler.boss_defeated(self.encounter.level());
        match victory_for_level(self.encounter.level()) {
            Some(kind) => {
                tracing::info!(?kind, level = self.state.level, "Victory");
                self.state.status = GameStatus::Victory;
                self.state.victory = Some(VictoryResult::new(kind));
                events.push(TickEvent::Victory { kind });
                self.finish(MatchOutcome::Victory(kind));
                events.match_result.clone_from(&self.match_result);
            }
            None => self.begin_transition(1),
        }
    }

    fn end_in_defeat(&mut self, reason: LossReason, events: &mut TickEvents) {
        tracing::info!(?reason, score = self.state.score, level = self.state.level, "Game over");
        self.state.status = GameStatus::GameOver;
        events.push(TickEvent::GameOver { reason });
        self.finish(MatchOutcome::Defeat(reason));
        events.match_result.clone_from(&self.match_result);
    }

    fn finish(&mut self, outcome: MatchOutcome) {
        self.sync_projection();
        let play_duration_ms = match (self.clock.started_at, self.clock.last_now) {
            (Some(start), Some(last)) => {
                last.as_micros()
                    .saturating_sub(start.as_micros())
                    .saturating_sub(self.clock.paused_total_micros)
                    / 1_000
            }
            _ => 0,
        };
        let state = &self.state;
        self.match_result = Some(MatchResult {
            outcome,
            final_score: state.score,
            level: state.level,
            wave: state.wave,
            total_kills: state.counters.total_kills,
            max_combo: state.max_combo,
            accuracy: state.counters.accuracy(),
            play_duration_ms,
            waves_completed: state.counters.waves_completed,
            power_ups_collected: state.counters.power_ups_collected,
            bracket: Bracket::for_level(state.level),
        });
    }

    /// Mirror engine-owned values into the public state.
    fn sync_projection(&mut self) {
        self.state.combo = self.combo.combo();
        self.state.max_combo = self.combo.max_combo();
        self.state.kills_in_wave = self.scheduler.kills_in_wave();
        self.state.boss = self
            .state
            .aliens
            .iter()
            .find(|a| a.is_boss)
            .map_or_else(BossState::default, |boss| BossState {
                active: true,
                hp: boss.hp,
                max_hp: boss.max_hp,
            });
    }

    // ------------------------------------------------------------------------
    // Views
    // ------------------------------------------------------------------------

    /// Immutable copy of the state plus derived HUD values.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        let state = self.state.clone();
        let profile = self.encounter.profile();
        let params = WaveParams::for_level(state.level, state.wave);
        Snapshot {
            level_progress: level_progress(state.score, state.level),
            bracket: Bracket::for_level(state.level),
            combo_multiplier: combo_multiplier(state.combo),
            combo_tier: ComboTier::for_combo(state.combo),
            boss_name: profile.map(|p| p.name.to_string()),
            boss_phase: profile.map(|p| boss_phase(state.boss.hp, state.boss.max_hp, p.phases)),
            enemies_required: params.enemies_required,
            wave_elapsed_ms: self.scheduler.wave_elapsed_ms(),
            wave_duration_ms: params.duration_ms,
            state,
        }
    }

    /// Hash of all state that influences future ticks.
    ///
    /// Two simulations with equal hashes will stay in lockstep when fed the
    /// same intents and instants.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.state.hash(&mut hasher);
        self.scheduler.hash(&mut hasher);
        self.combo.hash(&mut hasher);
        self.encounter.hash(&mut hasher);
        self.miss_window.hash(&mut hasher);
        self.idle.hash(&mut hasher);
        self.intents.hash(&mut hasher);
        self.next_id.hash(&mut hasher);
        self.clock.hash(&mut hasher);
        self.transition_ticks_remaining.hash(&mut hasher);
        self.contact_immunity_ticks.hash(&mut hasher);
        self.paused_from.hash(&mut hasher);
        self.rng.get_word_pos().hash(&mut hasher);

        hasher.finish()
    }

    /// Serialize the whole simulation, RNG included.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| GameError::InvalidState(format!("Failed to serialize simulation: {e}")))
    }

    /// Restore a simulation produced by [`serialize`](Self::serialize).
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        bincode::deserialize(data)
            .map_err(|e| GameError::InvalidState(format!("Failed to deserialize simulation: {e}")))
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new(SimulationConfig::default())
    }
}
