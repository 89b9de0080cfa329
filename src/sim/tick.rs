//! Discrete simulation tick
//!
//! One tick = scroll the field, roll a new top row, then resolve whatever
//! landed on (or was already on) the player's cell.

use rand::Rng;

use super::collision::{Collision, resolve_collision};
use super::generate::advance_and_generate;
use super::state::GameState;
use crate::tuning::DifficultyConfig;

/// Advance the field by one step. Does nothing unless the session is running.
pub fn tick<R: Rng + ?Sized>(
    state: &mut GameState,
    rng: &mut R,
    config: &DifficultyConfig,
) -> Collision {
    if !state.is_running() {
        return Collision::None;
    }

    state.stats.ticks += 1;
    advance_and_generate(state, rng, config);
    resolve_collision(state, config)
}
