//! Data-driven difficulty tuning
//!
//! Every number that shapes a run lives here: grid size, tick cadence, spawn
//! probabilities and the level catalog. Configs are validated once when a
//! session starts, never mid-run.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;
use crate::sim::{GridPosition, ObstacleKind};

/// Rejected difficulty or grid configuration
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("grid must be at least 1x2 cells, got {width}x{height}")]
    GridTooSmall { width: u8, height: u8 },
    #[error("floor tick interval must be greater than zero")]
    ZeroFloorInterval,
    #[error("initial tick interval {initial}ms is below the floor of {floor}ms")]
    IntervalBelowFloor { initial: u32, floor: u32 },
    #[error("{name} must be a probability in [0, 1], got {value}")]
    ProbabilityOutOfRange { name: &'static str, value: f64 },
    #[error("{kind:?} frequency must be finite and non-negative, got {value}")]
    InvalidFrequency { kind: ObstacleKind, value: f64 },
    #[error("powerups can spawn but every powerup frequency is zero")]
    NoPowerupFrequency,
    #[error("no level with id {0}")]
    UnknownLevel(u32),
}

/// Grid dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridConfig {
    pub width: u8,
    pub height: u8,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            width: GRID_WIDTH,
            height: GRID_HEIGHT,
        }
    }
}

impl GridConfig {
    pub fn new(width: u8, height: u8) -> Self {
        Self { width, height }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height < 2 {
            return Err(ConfigError::GridTooSmall {
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }

    /// Player spawn cell: center column, one row above the bottom edge
    pub fn spawn(&self) -> GridPosition {
        GridPosition::new(self.width / 2, self.height.saturating_sub(2))
    }
}

/// Relative weights used to pick a powerup kind
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KindFrequencies {
    pub energy: f64,
    pub speed_boost: f64,
    pub shield: f64,
}

impl Default for KindFrequencies {
    fn default() -> Self {
        Self {
            energy: 0.5,
            speed_boost: 0.3,
            shield: 0.2,
        }
    }
}

impl KindFrequencies {
    pub fn total(&self) -> f64 {
        self.energy + self.speed_boost + self.shield
    }

    /// Map a roll in [0, 1) onto a powerup kind
    pub fn pick(&self, roll: f64) -> ObstacleKind {
        let scaled = roll * self.total();
        if scaled < self.energy {
            ObstacleKind::Energy
        } else if scaled < self.energy + self.speed_boost {
            ObstacleKind::SpeedBoost
        } else {
            ObstacleKind::Shield
        }
    }
}

/// Per-level difficulty, read once at session start
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyConfig {
    pub initial_tick_interval_ms: u32,
    pub floor_tick_interval_ms: u32,
    pub speed_decrease_step_ms: u32,
    pub obstacle_chance: f64,
    pub powerup_chance: f64,
    pub kind_frequencies: KindFrequencies,
    /// Score that completes the level (0 = endless)
    pub target_score: u32,
}

impl Default for DifficultyConfig {
    fn default() -> Self {
        Self {
            initial_tick_interval_ms: INITIAL_TICK_INTERVAL_MS,
            floor_tick_interval_ms: MIN_TICK_INTERVAL_MS,
            speed_decrease_step_ms: SPEED_DECREASE_STEP_MS,
            obstacle_chance: OBSTACLE_CHANCE,
            powerup_chance: POWERUP_CHANCE,
            kind_frequencies: KindFrequencies::default(),
            target_score: 0,
        }
    }
}

impl DifficultyConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.floor_tick_interval_ms == 0 {
            return Err(ConfigError::ZeroFloorInterval);
        }
        if self.initial_tick_interval_ms < self.floor_tick_interval_ms {
            return Err(ConfigError::IntervalBelowFloor {
                initial: self.initial_tick_interval_ms,
                floor: self.floor_tick_interval_ms,
            });
        }
        check_probability("obstacle_chance", self.obstacle_chance)?;
        check_probability("powerup_chance", self.powerup_chance)?;

        let freqs = &self.kind_frequencies;
        for (kind, value) in [
            (ObstacleKind::Energy, freqs.energy),
            (ObstacleKind::SpeedBoost, freqs.speed_boost),
            (ObstacleKind::Shield, freqs.shield),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidFrequency { kind, value });
            }
        }
        if self.obstacle_chance > 0.0 && self.powerup_chance > 0.0 && freqs.total() <= 0.0 {
            return Err(ConfigError::NoPowerupFrequency);
        }
        Ok(())
    }

    /// Next interval after a speed boost, clamped to the floor
    pub fn boosted_interval(&self, current_ms: u32) -> u32 {
        current_ms
            .saturating_sub(self.speed_decrease_step_ms)
            .max(self.floor_tick_interval_ms)
    }
}

fn check_probability(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::ProbabilityOutOfRange { name, value })
    }
}

/// A selectable level
#[derive(Debug, Clone, Copy)]
pub struct Level {
    pub id: u32,
    pub name: &'static str,
    pub description: &'static str,
    pub difficulty: &'static str,
    pub config: DifficultyConfig,
}

#[allow(clippy::too_many_arguments)]
const fn level_config(
    initial: u32,
    floor: u32,
    step: u32,
    obstacle_chance: f64,
    powerup_chance: f64,
    energy: f64,
    speed_boost: f64,
    shield: f64,
    target_score: u32,
) -> DifficultyConfig {
    DifficultyConfig {
        initial_tick_interval_ms: initial,
        floor_tick_interval_ms: floor,
        speed_decrease_step_ms: step,
        obstacle_chance,
        powerup_chance,
        kind_frequencies: KindFrequencies {
            energy,
            speed_boost,
            shield,
        },
        target_score,
    }
}

/// Level catalog, easiest first
pub const LEVELS: &[Level] = &[
    Level {
        id: 1,
        name: "Neural Gateway",
        description: "Enter the digital realm and learn the basics of movement and energy collection.",
        difficulty: "Easy",
        config: level_config(1000, 800, 20, 0.3, 0.4, 0.4, 0.3, 0.3, 10),
    },
    Level {
        id: 2,
        name: "Data Stream",
        description: "Navigate through faster data streams with increasing obstacles.",
        difficulty: "Medium",
        config: level_config(800, 600, 25, 0.4, 0.35, 0.4, 0.4, 0.2, 15),
    },
    Level {
        id: 3,
        name: "Firewall Breach",
        description: "Bypass security systems and avoid detection protocols.",
        difficulty: "Hard",
        config: level_config(700, 500, 30, 0.5, 0.3, 0.3, 0.5, 0.2, 20),
    },
    Level {
        id: 4,
        name: "Quantum Maze",
        description: "Master unpredictable quantum shifts and collect unstable energy patterns.",
        difficulty: "Expert",
        config: level_config(600, 400, 35, 0.55, 0.25, 0.3, 0.4, 0.3, 25),
    },
    Level {
        id: 5,
        name: "Neon Nexus",
        description: "Reach the core of the system where reality bends to your will.",
        difficulty: "Insane",
        config: level_config(500, 300, 40, 0.6, 0.2, 0.2, 0.4, 0.4, 30),
    },
];

/// Look up a level by id
pub fn level(id: u32) -> Result<&'static Level, ConfigError> {
    LEVELS
        .iter()
        .find(|l| l.id == id)
        .ok_or(ConfigError::UnknownLevel(id))
}
