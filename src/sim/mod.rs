//! Deterministic grid simulation
//!
//! All gameplay rules live here. This module must stay pure and deterministic:
//! - Engine-fed time only (no wall clock)
//! - Seeded RNG only
//! - No rendering or platform dependencies

pub mod collision;
pub mod generate;
pub mod state;
pub mod tick;
pub mod timer;

pub use collision::{Collision, resolve_collision};
pub use generate::{advance_and_generate, advance_obstacles, ensure_traversable, generate_row};
pub use state::{
    Direction, GameEvent, GamePhase, GameState, GridPosition, Obstacle, ObstacleKind, PlayerState,
    RunStats,
};
pub use tick::tick;
pub use timer::{ShieldTimer, TickScheduler};
