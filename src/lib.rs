//! Swipe Nexus - A falling-obstacle grid arcade game
//!
//! Core modules:
//! - `sim`: Deterministic grid simulation (obstacles, collisions, timers)
//! - `engine`: Lifecycle controller, scheduler and observer surface
//! - `tuning`: Data-driven difficulty and level catalog
//! - `persistence`: Key-value store contract for durable progress
//! - `platform`: Browser/native platform abstraction

pub mod achievements;
pub mod engine;
pub mod persistence;
pub mod platform;
pub mod progress;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use engine::{Engine, ObserverId, Snapshot};
pub use persistence::{KeyValueStore, MemoryStore, StoreError};
pub use settings::Settings;
pub use tuning::{ConfigError, DifficultyConfig, GridConfig};

/// Game configuration constants
pub mod consts {
    /// Default grid dimensions
    pub const GRID_WIDTH: u8 = 5;
    pub const GRID_HEIGHT: u8 = 8;

    /// Base tick interval at session start (ms)
    pub const INITIAL_TICK_INTERVAL_MS: u32 = 1000;
    /// Fastest the tick interval can ever get (ms)
    pub const MIN_TICK_INTERVAL_MS: u32 = 300;
    /// Interval reduction per speed boost pickup (ms)
    pub const SPEED_DECREASE_STEP_MS: u32 = 50;

    /// Per-column probability of spawning an obstacle in a new row
    pub const OBSTACLE_CHANCE: f64 = 0.4;
    /// Probability that a spawned obstacle is a powerup instead of a barrier
    pub const POWERUP_CHANCE: f64 = 0.2;

    /// Shield buff lifetime (ms of engine time)
    pub const SHIELD_DURATION_MS: u64 = 5000;

    /// Namespace prefix for every persisted key
    pub const STORAGE_PREFIX: &str = "swipe_nexus";
}
