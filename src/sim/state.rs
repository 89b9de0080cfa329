//! Game state and core simulation types
//!
//! Everything a tick or a move mutates lives in [`GameState`]. Timers and the
//! RNG are owned by the engine, not the state, so the state stays a plain
//! serializable value.

use std::collections::HashSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::tuning::GridConfig;

/// A cell on the grid. Row 0 is the top, where obstacles spawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPosition {
    pub x: u8,
    pub y: u8,
}

impl GridPosition {
    pub const fn new(x: u8, y: u8) -> Self {
        Self { x, y }
    }

    /// One cell in `dir`, clamped to the grid bounds
    pub fn step(self, dir: Direction, grid: &GridConfig) -> Self {
        let max_x = grid.width.saturating_sub(1);
        let max_y = grid.height.saturating_sub(1);
        match dir {
            Direction::Up => Self::new(self.x, self.y.saturating_sub(1)),
            Direction::Down => Self::new(self.x, (self.y + 1).min(max_y)),
            Direction::Left => Self::new(self.x.saturating_sub(1), self.y),
            Direction::Right => Self::new((self.x + 1).min(max_x), self.y),
        }
    }
}

/// Directional intent from the input layer (keyboard or swipe)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "up" | "arrowup" | "w" => Ok(Direction::Up),
            "down" | "arrowdown" | "s" => Ok(Direction::Down),
            "left" | "arrowleft" | "a" => Ok(Direction::Left),
            "right" | "arrowright" | "d" => Ok(Direction::Right),
            other => Err(format!("unknown direction '{other}'")),
        }
    }
}

/// Obstacle types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ObstacleKind {
    /// Ends the run unless the player is shielded
    #[default]
    Barrier,
    /// +1 score
    Energy,
    /// Shortens the tick interval
    SpeedBoost,
    /// Absorbs one barrier hit
    Shield,
}

impl ObstacleKind {
    pub fn is_powerup(&self) -> bool {
        *self != ObstacleKind::Barrier
    }
}

/// A falling grid entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Obstacle {
    pub kind: ObstacleKind,
    pub position: GridPosition,
}

impl Obstacle {
    pub fn new(kind: ObstacleKind, x: u8, y: u8) -> Self {
        Self {
            kind,
            position: GridPosition::new(x, y),
        }
    }
}

/// The player's token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    pub position: GridPosition,
    pub has_shield: bool,
}

/// Session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GamePhase {
    /// No session started yet
    #[default]
    Idle,
    /// Ticks firing, input accepted
    Running,
    /// Session alive but frozen
    Paused,
    /// Run ended (barrier hit or explicit end)
    Ended,
}

impl GamePhase {
    pub fn is_active(&self) -> bool {
        matches!(self, GamePhase::Running | GamePhase::Paused)
    }
}

/// Per-run counters that feed level progress and achievements
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    pub energy_collected: u32,
    pub speed_boosts_collected: u32,
    pub shields_collected: u32,
    /// Barrier hits absorbed by a shield
    pub shield_blocks: u32,
    pub ticks: u64,
}

/// Discrete gameplay events for sound/haptics/UI consumers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    SessionStarted { level: Option<u32> },
    EnergyCollected { score: u32 },
    SpeedBoosted { interval_ms: u32 },
    ShieldArmed,
    ShieldConsumed,
    ShieldExpired,
    Paused,
    Resumed,
    TargetReached { score: u32 },
    GameOver { score: u32, new_high_score: bool },
    AchievementUnlocked { id: String },
}

/// Complete simulation state for one session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub grid: GridConfig,
    pub phase: GamePhase,
    pub score: u32,
    /// Current tick cadence; only ever shrinks within a session
    pub tick_interval_ms: u32,
    pub player: PlayerState,
    /// Live obstacles, at most one per cell
    pub obstacles: Vec<Obstacle>,
    pub stats: RunStats,
    /// Level target already hit this session
    pub target_reached: bool,
}

impl GameState {
    /// Idle state on the given grid
    pub fn new(grid: GridConfig, tick_interval_ms: u32) -> Self {
        Self {
            grid,
            phase: GamePhase::Idle,
            score: 0,
            tick_interval_ms,
            player: PlayerState {
                position: grid.spawn(),
                has_shield: false,
            },
            obstacles: Vec::new(),
            stats: RunStats::default(),
            target_reached: false,
        }
    }

    /// Reset everything a fresh session starts from
    pub fn reset(&mut self, tick_interval_ms: u32) {
        *self = Self::new(self.grid, tick_interval_ms);
    }

    pub fn is_active(&self) -> bool {
        self.phase.is_active()
    }

    pub fn is_running(&self) -> bool {
        self.phase == GamePhase::Running
    }

    /// Index of the obstacle on `pos`, if any
    pub fn obstacle_at(&self, pos: GridPosition) -> Option<usize> {
        self.obstacles.iter().position(|o| o.position == pos)
    }

    /// Drop obstacles that share a cell with an earlier one.
    /// Returns how many were removed.
    pub fn normalize_cells(&mut self) -> usize {
        let before = self.obstacles.len();
        let mut seen = HashSet::with_capacity(before);
        self.obstacles.retain(|o| seen.insert(o.position));
        let dropped = before - self.obstacles.len();
        if dropped > 0 {
            log::warn!("Dropped {} obstacle(s) sharing an occupied cell", dropped);
        }
        dropped
    }
}
