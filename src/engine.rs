//! Game engine: lifecycle, scheduling and the consumer-facing surface
//!
//! [`Engine`] owns the simulation state, the seeded RNG, both timers and the
//! persistence backend. The host drives it with [`Engine::advance`] (elapsed
//! milliseconds) and the command methods; renderers either poll
//! [`Engine::snapshot`] or subscribe to change notifications.
//!
//! Every mutation goes through `&mut self`, so a tick and a move can never
//! interleave. Stopping the scheduler inside a command means no tick runs
//! after that command returns.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::Serialize;

use crate::achievements::{AchievementBook, RunSummary};
use crate::consts::SHIELD_DURATION_MS;
use crate::persistence::KeyValueStore;
use crate::progress::{LevelProgress, LifetimeStats, read_high_score, write_high_score};
use crate::sim::{
    Collision, Direction, GameEvent, GamePhase, GameState, Obstacle, PlayerState, RunStats,
    ShieldTimer, TickScheduler, resolve_collision, tick,
};
use crate::tuning::{self, ConfigError, DifficultyConfig, GridConfig};

/// Read-only view handed to renderers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub is_active: bool,
    pub is_paused: bool,
    pub is_game_over: bool,
    pub score: u32,
    pub high_score: u32,
    pub player: PlayerState,
    pub obstacles: Vec<Obstacle>,
    pub tick_interval_ms: u32,
    pub grid: GridConfig,
    pub level: Option<u32>,
    pub target_score: u32,
    pub target_reached: bool,
    pub stats: RunStats,
}

/// Handle returned by [`Engine::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

type Observer = Box<dyn FnMut(&Snapshot)>;

pub struct Engine<S: KeyValueStore> {
    state: GameState,
    /// Difficulty of the current (or last) session, fixed at start
    config: DifficultyConfig,
    level: Option<u32>,
    /// Difficulty the next `start_session` will adopt
    next_config: DifficultyConfig,
    next_level: Option<u32>,
    high_score: u32,
    rng: Pcg32,
    scheduler: TickScheduler,
    shield_timer: ShieldTimer,
    /// Engine time in ms, advanced only by `advance`
    clock_ms: u64,
    store: S,
    events: Vec<GameEvent>,
    observers: Vec<(ObserverId, Observer)>,
    next_observer: u64,
}

impl<S: KeyValueStore> Engine<S> {
    /// Engine with a random seed
    pub fn new(store: S) -> Self {
        Self::with_seed(store, rand::random())
    }

    /// Engine with a fixed seed (reproducible obstacle fields)
    pub fn with_seed(store: S, seed: u64) -> Self {
        log::debug!("Engine seed: {}", seed);
        let config = DifficultyConfig::default();
        let high_score = read_high_score(&store).unwrap_or_else(|e| {
            log::warn!("High score unavailable: {}", e);
            0
        });
        Self {
            state: GameState::new(GridConfig::default(), config.initial_tick_interval_ms),
            config,
            level: None,
            next_config: config,
            next_level: None,
            high_score,
            rng: Pcg32::seed_from_u64(seed),
            scheduler: TickScheduler::new(),
            shield_timer: ShieldTimer::default(),
            clock_ms: 0,
            store,
            events: Vec::new(),
            observers: Vec::new(),
            next_observer: 1,
        }
    }

    // === Configuration (applied at the next session start) ===

    pub fn set_difficulty(&mut self, config: DifficultyConfig) {
        self.next_config = config;
        self.next_level = None;
    }

    /// Use a catalog level's difficulty from the next session on
    pub fn select_level(&mut self, level_id: u32) -> Result<(), ConfigError> {
        let level = tuning::level(level_id)?;
        self.next_config = level.config;
        self.next_level = Some(level.id);
        Ok(())
    }

    pub fn set_grid(&mut self, grid: GridConfig) {
        if self.state.is_active() {
            log::warn!("Grid change ignored while a session is active");
            return;
        }
        self.state.grid = grid;
    }

    /// Difficulty the next session will use
    pub fn difficulty(&self) -> &DifficultyConfig {
        &self.next_config
    }

    // === Lifecycle ===

    /// Adopt the selected difficulty, reset the board and start ticking.
    ///
    /// Calling this during a session restarts it: the abandoned run is
    /// dropped without a game over, progress or achievement update.
    pub fn start_session(&mut self) -> Result<(), ConfigError> {
        self.state.grid.validate()?;
        self.next_config.validate()?;
        self.config = self.next_config;
        self.level = self.next_level;

        self.scheduler.stop();
        self.shield_timer.cancel();
        self.state.reset(self.config.initial_tick_interval_ms);
        self.high_score = read_high_score(&self.store).unwrap_or_else(|e| {
            log::warn!("High score unavailable, treating as 0: {}", e);
            0
        });

        self.state.phase = GamePhase::Running;
        self.scheduler.start(self.state.tick_interval_ms);
        log::info!(
            "Session started (level {:?}, {}ms ticks, high score {})",
            self.level,
            self.state.tick_interval_ms,
            self.high_score
        );
        self.events.push(GameEvent::SessionStarted { level: self.level });
        self.notify();
        Ok(())
    }

    /// End the running session. Returns false if none was active.
    pub fn end_session(&mut self) -> bool {
        let ended = self.finish_session();
        if ended {
            self.notify();
        }
        ended
    }

    /// Flip pause. Returns false (no-op) when no session is active.
    pub fn toggle_pause(&mut self) -> bool {
        match self.state.phase {
            GamePhase::Running => {
                self.state.phase = GamePhase::Paused;
                self.scheduler.stop();
                log::info!("Paused");
                self.events.push(GameEvent::Paused);
            }
            GamePhase::Paused => {
                self.state.phase = GamePhase::Running;
                self.scheduler.start(self.state.tick_interval_ms);
                log::info!("Resumed");
                self.events.push(GameEvent::Resumed);
            }
            GamePhase::Idle | GamePhase::Ended => return false,
        }
        self.notify();
        true
    }

    // === Input ===

    /// Move one cell and resolve the destination. Ignored unless running.
    pub fn move_player(&mut self, direction: Direction) -> bool {
        if !self.state.is_running() {
            log::debug!("Move {:?} ignored in {:?}", direction, self.state.phase);
            return false;
        }
        let grid = self.state.grid;
        self.state.player.position = self.state.player.position.step(direction, &grid);
        let collision = resolve_collision(&mut self.state, &self.config);
        self.apply_collision(collision);
        self.notify();
        true
    }

    // === Time ===

    /// Feed elapsed host time. Fires due ticks and timer expiries in order.
    pub fn advance(&mut self, elapsed_ms: u64) {
        let mut remaining = elapsed_ms;
        let mut changed = false;

        loop {
            let step = [
                self.scheduler.until_next(),
                self.shield_timer.until(self.clock_ms),
            ]
            .into_iter()
            .flatten()
            .fold(remaining, u64::min);

            self.clock_ms += step;
            self.scheduler.elapse(step);
            remaining -= step;

            if self.shield_timer.take_expired(self.clock_ms) && self.state.player.has_shield {
                self.state.player.has_shield = false;
                log::debug!("Shield expired");
                self.events.push(GameEvent::ShieldExpired);
                changed = true;
            }

            if self.scheduler.take_due() {
                let collision = tick(&mut self.state, &mut self.rng, &self.config);
                self.apply_collision(collision);
                self.scheduler.apply_pending();
                changed = true;
            }

            if remaining == 0 {
                break;
            }
        }

        if changed {
            self.notify();
        }
    }

    // === Observation ===

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            is_active: self.state.is_active(),
            is_paused: self.state.phase == GamePhase::Paused,
            is_game_over: self.state.phase == GamePhase::Ended,
            score: self.state.score,
            high_score: self.high_score,
            player: self.state.player,
            obstacles: self.state.obstacles.clone(),
            tick_interval_ms: self.state.tick_interval_ms,
            grid: self.state.grid,
            level: self.level,
            target_score: self.config.target_score,
            target_reached: self.state.target_reached,
            stats: self.state.stats,
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.state.phase
    }

    pub fn clock_ms(&self) -> u64 {
        self.clock_ms
    }

    /// Call `observer` with a fresh snapshot after every state change
    pub fn subscribe<F>(&mut self, observer: F) -> ObserverId
    where
        F: FnMut(&Snapshot) + 'static,
    {
        let id = ObserverId(self.next_observer);
        self.next_observer += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(oid, _)| *oid != id);
        self.observers.len() != before
    }

    /// Take every event raised since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    // === Persistence access ===

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn level_progress(&self) -> LevelProgress {
        LevelProgress::load(&self.store)
    }

    pub fn achievements(&self) -> AchievementBook {
        AchievementBook::load(&self.store)
    }

    #[cfg(test)]
    pub(crate) fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    // === Internals ===

    fn apply_collision(&mut self, collision: Collision) {
        match collision {
            Collision::None => {}
            Collision::Energy { score } => {
                log::debug!("Energy collected, score {}", score);
                self.events.push(GameEvent::EnergyCollected { score });
                let target = self.config.target_score;
                if target > 0 && !self.state.target_reached && score >= target {
                    self.state.target_reached = true;
                    log::info!("Target score {} reached", target);
                    self.events.push(GameEvent::TargetReached { score });
                }
            }
            Collision::SpeedBoost { interval_ms } => {
                log::debug!("Speed boost, next interval {}ms", interval_ms);
                self.scheduler.reschedule(interval_ms);
                self.events.push(GameEvent::SpeedBoosted { interval_ms });
            }
            Collision::Shield => {
                log::debug!("Shield armed");
                self.shield_timer.arm(self.clock_ms, SHIELD_DURATION_MS);
                self.events.push(GameEvent::ShieldArmed);
            }
            Collision::ShieldBlock => {
                log::debug!("Shield absorbed a barrier");
                self.shield_timer.cancel();
                self.events.push(GameEvent::ShieldConsumed);
            }
            Collision::Fatal => {
                self.finish_session();
            }
        }
    }

    fn finish_session(&mut self) -> bool {
        if !self.state.is_active() {
            log::debug!("end_session ignored in {:?}", self.state.phase);
            return false;
        }

        self.state.phase = GamePhase::Ended;
        self.scheduler.stop();

        let score = self.state.score;
        let new_high_score = score > self.high_score;
        if new_high_score {
            self.high_score = score;
            if let Err(e) = write_high_score(&mut self.store, score) {
                log::warn!("Failed to persist high score {}: {}", score, e);
            }
        }
        log::info!(
            "Game over: score {} (high score {}{})",
            score,
            self.high_score,
            if new_high_score { ", new!" } else { "" }
        );
        self.events.push(GameEvent::GameOver {
            score,
            new_high_score,
        });

        self.record_progress();
        true
    }

    /// Fold the finished run into level progress, lifetime stats and achievements
    fn record_progress(&mut self) {
        let run = RunSummary {
            score: self.state.score,
            stats: self.state.stats,
            target_reached: self.state.target_reached,
        };

        let mut lifetime = LifetimeStats::load(&self.store);
        lifetime.absorb(&run.stats);
        lifetime.save(&mut self.store);

        let mut levels = LevelProgress::load(&self.store);
        if let Some(level) = self.level {
            if levels.record_run(level, run.score, run.target_reached) {
                log::info!("Level {} completed", level);
            }
            levels.save(&mut self.store);
        }

        let mut book = AchievementBook::load(&self.store);
        let fresh = book.evaluate(&run, &lifetime, &levels);
        if !fresh.is_empty() {
            book.save(&mut self.store);
            for achievement in fresh {
                log::info!("Achievement unlocked: {}", achievement.title);
                self.events.push(GameEvent::AchievementUnlocked {
                    id: achievement.id.to_string(),
                });
            }
        }
    }

    fn notify(&mut self) {
        if self.observers.is_empty() {
            return;
        }
        let snapshot = self.snapshot();
        for (_, observer) in &mut self.observers {
            observer(&snapshot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;
    use crate::persistence::testing::BrokenStore;
    use crate::sim::{GridPosition, ObstacleKind};
    use proptest::prelude::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// No random spawns, so tests control the field completely
    fn quiet() -> DifficultyConfig {
        DifficultyConfig {
            obstacle_chance: 0.0,
            ..Default::default()
        }
    }

    fn running(config: DifficultyConfig) -> Engine<MemoryStore> {
        let mut engine = Engine::with_seed(MemoryStore::new(), 42);
        engine.set_difficulty(config);
        engine.start_session().unwrap();
        engine.drain_events();
        engine
    }

    fn place(engine: &mut Engine<MemoryStore>, kind: ObstacleKind, x: u8, y: u8) {
        engine.state.obstacles.push(Obstacle::new(kind, x, y));
    }

    #[test]
    fn test_start_session_resets_board() {
        let mut engine = running(quiet());
        place(&mut engine, ObstacleKind::Energy, 2, 5);
        engine.move_player(Direction::Up);
        assert_eq!(engine.snapshot().score, 1);

        engine.start_session().unwrap();
        let snap = engine.snapshot();
        assert!(snap.is_active && !snap.is_paused && !snap.is_game_over);
        assert_eq!(snap.score, 0);
        assert_eq!(snap.player.position, GridPosition::new(2, 6));
        assert!(snap.obstacles.is_empty());
        assert_eq!(snap.tick_interval_ms, 1000);
    }

    #[test]
    fn test_bad_config_rejected_at_start() {
        let mut engine = Engine::with_seed(MemoryStore::new(), 1);
        engine.set_difficulty(DifficultyConfig {
            powerup_chance: 1.5,
            ..Default::default()
        });
        assert!(engine.start_session().is_err());
        assert_eq!(engine.phase(), GamePhase::Idle);

        engine.set_difficulty(DifficultyConfig::default());
        engine.set_grid(GridConfig::new(0, 8));
        assert!(matches!(
            engine.start_session(),
            Err(ConfigError::GridTooSmall { .. })
        ));
    }

    #[test]
    fn test_scenario_a_movement_clamps() {
        let mut engine = running(quiet());
        for _ in 0..3 {
            engine.move_player(Direction::Up);
        }
        assert_eq!(engine.snapshot().player.position, GridPosition::new(2, 3));
        for _ in 0..10 {
            engine.move_player(Direction::Up);
        }
        assert_eq!(engine.snapshot().player.position, GridPosition::new(2, 0));
        for _ in 0..10 {
            engine.move_player(Direction::Right);
        }
        assert_eq!(engine.snapshot().player.position, GridPosition::new(4, 0));
    }

    #[test]
    fn test_scenario_b_energy_pickup() {
        let mut engine = running(quiet());
        place(&mut engine, ObstacleKind::Energy, 2, 6);
        engine.move_player(Direction::Left);
        engine.move_player(Direction::Right);
        let snap = engine.snapshot();
        assert_eq!(snap.score, 1);
        assert!(snap.obstacles.is_empty());
        assert_eq!(
            engine.drain_events(),
            vec![GameEvent::EnergyCollected { score: 1 }]
        );
    }

    #[test]
    fn test_scenario_c_speed_boosts_clamp_at_floor() {
        let mut engine = running(quiet());
        for i in 0..20 {
            let (y, dir) = if i % 2 == 0 {
                (5, Direction::Up)
            } else {
                (6, Direction::Down)
            };
            place(&mut engine, ObstacleKind::SpeedBoost, 2, y);
            let before = engine.snapshot().tick_interval_ms;
            engine.move_player(dir);
            let after = engine.snapshot().tick_interval_ms;
            assert!(after <= before);
            assert!(after >= 300);
        }
        assert_eq!(engine.snapshot().tick_interval_ms, 300);
    }

    #[test]
    fn test_scenario_d_barrier_ends_run_and_saves_high_score() {
        let mut engine = running(quiet());
        place(&mut engine, ObstacleKind::Energy, 2, 5);
        place(&mut engine, ObstacleKind::Energy, 2, 4);
        place(&mut engine, ObstacleKind::Barrier, 2, 3);
        for _ in 0..3 {
            engine.move_player(Direction::Up);
        }

        let snap = engine.snapshot();
        assert!(snap.is_game_over);
        assert!(!snap.is_active);
        assert_eq!(snap.high_score, 2);
        assert_eq!(read_high_score(engine.store()), Ok(2));
        assert!(engine.drain_events().contains(&GameEvent::GameOver {
            score: 2,
            new_high_score: true
        }));
    }

    #[test]
    fn test_scenario_e_shield_absorbs_barrier() {
        let mut engine = running(quiet());
        place(&mut engine, ObstacleKind::Shield, 2, 5);
        place(&mut engine, ObstacleKind::Barrier, 2, 4);
        engine.move_player(Direction::Up);
        assert!(engine.snapshot().player.has_shield);
        engine.move_player(Direction::Up);

        let snap = engine.snapshot();
        assert!(!snap.player.has_shield);
        assert!(snap.obstacles.is_empty());
        assert!(!snap.is_game_over);
        assert!(snap.is_active);
    }

    #[test]
    fn test_lower_score_keeps_stored_high_score() {
        let mut store = MemoryStore::new();
        write_high_score(&mut store, 10).unwrap();
        let mut engine = Engine::with_seed(store, 3);
        engine.set_difficulty(quiet());
        engine.start_session().unwrap();
        assert_eq!(engine.snapshot().high_score, 10);
        assert!(engine.end_session());
        assert_eq!(read_high_score(engine.store()), Ok(10));
    }

    #[test]
    fn test_end_session_runs_once() {
        let mut engine = running(quiet());
        assert!(engine.end_session());
        assert!(!engine.end_session());
        let game_overs = engine
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::GameOver { .. }))
            .count();
        assert_eq!(game_overs, 1);
    }

    #[test]
    fn test_moves_ignored_unless_running() {
        let mut engine = Engine::with_seed(MemoryStore::new(), 1);
        assert!(!engine.move_player(Direction::Up));

        engine.set_difficulty(quiet());
        engine.start_session().unwrap();
        engine.toggle_pause();
        assert!(!engine.move_player(Direction::Up));
        assert_eq!(engine.snapshot().player.position, GridPosition::new(2, 6));

        engine.toggle_pause();
        engine.end_session();
        assert!(!engine.move_player(Direction::Up));
        assert_eq!(engine.snapshot().player.position, GridPosition::new(2, 6));
    }

    #[test]
    fn test_tick_moves_field_on_interval() {
        let mut engine = running(quiet());
        place(&mut engine, ObstacleKind::Energy, 0, 0);
        engine.advance(999);
        assert_eq!(engine.snapshot().obstacles[0].position.y, 0);
        engine.advance(1);
        assert_eq!(engine.snapshot().obstacles[0].position.y, 1);
        engine.advance(3000);
        assert_eq!(engine.snapshot().obstacles[0].position.y, 4);
    }

    #[test]
    fn test_falling_barrier_ends_run_on_tick() {
        let mut engine = running(quiet());
        place(&mut engine, ObstacleKind::Barrier, 2, 5);
        engine.advance(1000);
        assert!(engine.snapshot().is_game_over);
        // Scheduler is down: nothing else moves
        let frozen = engine.snapshot().obstacles;
        engine.advance(10_000);
        assert_eq!(engine.snapshot().obstacles, frozen);
    }

    #[test]
    fn test_pause_freezes_field_and_toggle_is_idempotent() {
        let mut engine = running(quiet());
        place(&mut engine, ObstacleKind::Energy, 0, 0);
        engine.advance(600);

        assert!(engine.toggle_pause());
        assert!(engine.snapshot().is_paused);
        engine.advance(5000);
        assert_eq!(engine.snapshot().obstacles[0].position.y, 0);

        assert!(engine.toggle_pause());
        let snap = engine.snapshot();
        assert!(!snap.is_paused);
        assert_eq!(snap.tick_interval_ms, 1000);
        // Resume starts a full fresh period
        engine.advance(999);
        assert_eq!(engine.snapshot().obstacles[0].position.y, 0);
        engine.advance(1);
        assert_eq!(engine.snapshot().obstacles[0].position.y, 1);
        assert_eq!(
            engine.drain_events(),
            vec![GameEvent::Paused, GameEvent::Resumed]
        );
    }

    #[test]
    fn test_toggle_pause_noop_when_inactive() {
        let mut engine = Engine::with_seed(MemoryStore::new(), 1);
        assert!(!engine.toggle_pause());
        assert!(!engine.snapshot().is_paused);
    }

    #[test]
    fn test_speed_boost_applies_at_next_boundary() {
        let mut engine = running(quiet());
        place(&mut engine, ObstacleKind::Energy, 0, 0);
        engine.advance(500);
        place(&mut engine, ObstacleKind::SpeedBoost, 2, 5);
        engine.move_player(Direction::Up);
        assert_eq!(engine.snapshot().tick_interval_ms, 950);

        // The running period completes at the old cadence
        engine.advance(499);
        assert_eq!(engine.snapshot().obstacles[0].position.y, 0);
        engine.advance(1);
        assert_eq!(engine.snapshot().obstacles[0].position.y, 1);
        // Then the new cadence takes over
        engine.advance(949);
        assert_eq!(engine.snapshot().obstacles[0].position.y, 1);
        engine.advance(1);
        assert_eq!(engine.snapshot().obstacles[0].position.y, 2);
    }

    #[test]
    fn test_shield_expires_after_five_seconds() {
        let mut engine = running(quiet());
        place(&mut engine, ObstacleKind::Shield, 2, 5);
        engine.move_player(Direction::Up);
        engine.advance(4999);
        assert!(engine.snapshot().player.has_shield);
        engine.advance(1);
        assert!(!engine.snapshot().player.has_shield);
        assert!(engine.drain_events().contains(&GameEvent::ShieldExpired));
    }

    #[test]
    fn test_shield_expiry_runs_while_paused() {
        let mut engine = running(quiet());
        place(&mut engine, ObstacleKind::Shield, 2, 5);
        engine.move_player(Direction::Up);
        engine.toggle_pause();
        engine.advance(5000);
        assert!(!engine.snapshot().player.has_shield);
    }

    #[test]
    fn test_second_shield_restarts_timer() {
        let mut engine = running(quiet());
        place(&mut engine, ObstacleKind::Shield, 2, 5);
        engine.move_player(Direction::Up);
        engine.toggle_pause();
        engine.advance(3000);
        engine.toggle_pause();
        place(&mut engine, ObstacleKind::Shield, 2, 4);
        engine.move_player(Direction::Up);
        engine.toggle_pause();

        engine.advance(2000);
        assert!(engine.snapshot().player.has_shield);
        engine.advance(3000);
        assert!(!engine.snapshot().player.has_shield);
    }

    #[test]
    fn test_consumed_shield_timer_does_not_clear_new_shield() {
        let mut engine = running(quiet());
        place(&mut engine, ObstacleKind::Shield, 2, 5);
        place(&mut engine, ObstacleKind::Barrier, 2, 4);
        engine.move_player(Direction::Up);
        engine.move_player(Direction::Up);
        assert!(!engine.snapshot().player.has_shield);

        engine.toggle_pause();
        engine.advance(4000);
        engine.toggle_pause();
        place(&mut engine, ObstacleKind::Shield, 2, 3);
        engine.move_player(Direction::Up);
        engine.toggle_pause();

        // First pickup's 5s window passes; the fresh shield survives
        engine.advance(1500);
        assert!(engine.snapshot().player.has_shield);
        engine.advance(3500);
        assert!(!engine.snapshot().player.has_shield);
    }

    #[test]
    fn test_persistence_failures_do_not_block_play() {
        let mut engine = Engine::with_seed(BrokenStore, 9);
        engine.set_difficulty(quiet());
        engine.start_session().unwrap();
        assert_eq!(engine.snapshot().high_score, 0);
        engine.state.obstacles.push(Obstacle::new(ObstacleKind::Energy, 2, 5));
        engine.move_player(Direction::Up);
        assert!(engine.end_session());
        let snap = engine.snapshot();
        assert!(snap.is_game_over);
        assert_eq!(snap.high_score, 1);
    }

    #[test]
    fn test_observers_see_changes() {
        let mut engine = Engine::with_seed(MemoryStore::new(), 5);
        engine.set_difficulty(quiet());
        let seen: Rc<RefCell<Vec<Snapshot>>> = Rc::default();
        let sink = Rc::clone(&seen);
        let id = engine.subscribe(move |snap| sink.borrow_mut().push(snap.clone()));

        engine.start_session().unwrap();
        engine.move_player(Direction::Left);
        engine.advance(1000);
        assert_eq!(seen.borrow().len(), 3);
        assert_eq!(
            seen.borrow()[1].player.position,
            GridPosition::new(1, 6)
        );

        assert!(engine.unsubscribe(id));
        engine.move_player(Direction::Left);
        assert_eq!(seen.borrow().len(), 3);
    }

    #[test]
    fn test_level_target_records_progress_and_achievements() {
        let mut engine = Engine::with_seed(MemoryStore::new(), 8);
        engine.select_level(1).unwrap();
        engine.next_config.obstacle_chance = 0.0;
        engine.next_config.target_score = 2;
        engine.start_session().unwrap();

        place(&mut engine, ObstacleKind::Energy, 2, 5);
        place(&mut engine, ObstacleKind::Energy, 2, 4);
        engine.move_player(Direction::Up);
        engine.move_player(Direction::Up);
        assert!(engine.snapshot().target_reached);
        engine.end_session();

        let events = engine.drain_events();
        assert!(events.contains(&GameEvent::TargetReached { score: 2 }));
        for id in ["first_game", "level_1_complete", "perfect_run"] {
            assert!(
                events.contains(&GameEvent::AchievementUnlocked { id: id.to_string() }),
                "missing {}",
                id
            );
        }
        assert!(engine.level_progress().is_unlocked(2));
        assert!(engine.achievements().is_unlocked("level_1_complete"));
    }

    #[test]
    fn test_difficulty_change_waits_for_next_session() {
        let mut engine = running(quiet());
        for i in 0..20 {
            let (y, dir) = if i % 2 == 0 {
                (5, Direction::Up)
            } else {
                (6, Direction::Down)
            };
            place(&mut engine, ObstacleKind::SpeedBoost, 2, y);
            engine.move_player(dir);
        }
        assert_eq!(engine.snapshot().tick_interval_ms, 300);

        // Level 1 has a much higher floor; it must not leak into this run
        engine.select_level(1).unwrap();
        place(&mut engine, ObstacleKind::SpeedBoost, 2, 5);
        engine.move_player(Direction::Up);
        let snap = engine.snapshot();
        assert!(snap.is_active);
        assert_eq!(snap.tick_interval_ms, 300);
        assert_eq!(snap.level, None);
        assert_eq!(snap.target_score, DifficultyConfig::default().target_score);

        // Ticks keep the session's field settings too
        engine.advance(3000);
        assert!(engine.snapshot().obstacles.is_empty());

        engine.end_session();
        engine.start_session().unwrap();
        let snap = engine.snapshot();
        let level_one = tuning::level(1).unwrap();
        assert_eq!(snap.level, Some(1));
        assert_eq!(snap.tick_interval_ms, level_one.config.initial_tick_interval_ms);
        assert_eq!(snap.target_score, level_one.config.target_score);
    }

    #[test]
    fn test_restart_drops_running_session_unrecorded() {
        let mut engine = running(quiet());
        place(&mut engine, ObstacleKind::Energy, 2, 5);
        engine.move_player(Direction::Up);
        engine.start_session().unwrap();

        assert!(
            !engine
                .drain_events()
                .iter()
                .any(|e| matches!(e, GameEvent::GameOver { .. }))
        );
        assert_eq!(LifetimeStats::load(engine.store()).games_played, 0);
        assert_eq!(read_high_score(engine.store()), Ok(0));
        assert_eq!(engine.snapshot().stats, RunStats::default());
    }

    #[test]
    fn test_select_unknown_level() {
        let mut engine = Engine::with_seed(MemoryStore::new(), 8);
        assert_eq!(engine.select_level(42), Err(ConfigError::UnknownLevel(42)));
    }

    #[derive(Debug, Clone)]
    enum Command {
        Move(Direction),
        Advance(u64),
        Pause,
    }

    fn command() -> impl Strategy<Value = Command> {
        prop_oneof![
            prop_oneof![
                Just(Direction::Up),
                Just(Direction::Down),
                Just(Direction::Left),
                Just(Direction::Right),
            ]
            .prop_map(Command::Move),
            (0u64..2500).prop_map(Command::Advance),
            Just(Command::Pause),
        ]
    }

    fn dense() -> DifficultyConfig {
        DifficultyConfig {
            obstacle_chance: 0.9,
            powerup_chance: 0.5,
            ..Default::default()
        }
    }

    proptest! {
        #[test]
        fn prop_session_invariants(seed in any::<u64>(), commands in prop::collection::vec(command(), 1..200)) {
            let mut engine = Engine::with_seed(MemoryStore::new(), seed);
            engine.set_difficulty(dense());
            engine.start_session().unwrap();
            let width = engine.snapshot().grid.width as usize;
            let mut last_interval = engine.snapshot().tick_interval_ms;

            for cmd in commands {
                let before = engine.snapshot();
                match &cmd {
                    Command::Move(dir) => { engine.move_player(*dir); }
                    Command::Advance(ms) => engine.advance(*ms),
                    Command::Pause => { engine.toggle_pause(); }
                }
                let snap = engine.snapshot();

                // Interval only shrinks and never passes the floor
                prop_assert!(snap.tick_interval_ms <= last_interval);
                prop_assert!(snap.tick_interval_ms >= 300);
                last_interval = snap.tick_interval_ms;

                // Top row is never fully barred
                let top_barriers = snap.obstacles.iter()
                    .filter(|o| o.position.y == 0 && o.kind == ObstacleKind::Barrier)
                    .count();
                prop_assert!(top_barriers < width);

                // One obstacle per cell
                let mut cells: Vec<_> = snap.obstacles.iter().map(|o| o.position).collect();
                cells.sort();
                cells.dedup();
                prop_assert_eq!(cells.len(), snap.obstacles.len());

                // Inactive or paused sessions never move obstacles
                if !before.is_active || before.is_paused {
                    prop_assert_eq!(&before.obstacles, &snap.obstacles);
                }
            }
        }

        #[test]
        fn prop_double_toggle_restores_pause(seed in any::<u64>(), warmup in 0u64..3000) {
            let mut engine = Engine::with_seed(MemoryStore::new(), seed);
            engine.set_difficulty(dense());
            engine.start_session().unwrap();
            engine.advance(warmup);
            let before = engine.snapshot();
            engine.toggle_pause();
            engine.toggle_pause();
            let after = engine.snapshot();
            prop_assert_eq!(before.is_paused, after.is_paused);
            prop_assert_eq!(before.tick_interval_ms, after.tick_interval_ms);
            prop_assert_eq!(before.obstacles, after.obstacles);
        }
    }
}
