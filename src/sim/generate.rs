//! Obstacle field generation
//!
//! Each tick the field scrolls down one row and a fresh row is rolled at the
//! top. A fully barred row is never emitted: one of its barriers is removed
//! at random so the player always has an open column to aim for.

use rand::Rng;

use super::state::{GameState, Obstacle, ObstacleKind};
use crate::tuning::{DifficultyConfig, GridConfig};

/// Move every obstacle one row down, discarding those that leave the grid.
/// Returns how many were discarded.
pub fn advance_obstacles(state: &mut GameState) -> usize {
    let height = state.grid.height;
    let before = state.obstacles.len();
    for obstacle in &mut state.obstacles {
        obstacle.position.y = obstacle.position.y.saturating_add(1);
    }
    state.obstacles.retain(|o| o.position.y < height);
    before - state.obstacles.len()
}

/// Roll a new row of obstacles for row 0
pub fn generate_row<R: Rng + ?Sized>(
    rng: &mut R,
    grid: &GridConfig,
    config: &DifficultyConfig,
) -> Vec<Obstacle> {
    let mut row = Vec::new();

    for x in 0..grid.width {
        if rng.random::<f64>() >= config.obstacle_chance {
            continue;
        }
        let kind = if rng.random::<f64>() < config.powerup_chance {
            config.kind_frequencies.pick(rng.random::<f64>())
        } else {
            ObstacleKind::Barrier
        };
        row.push(Obstacle::new(kind, x, 0));
    }

    ensure_traversable(rng, &mut row, grid.width);
    row
}

/// If every column of `row` holds a barrier, remove one of them at random.
/// Returns true when a barrier was removed.
pub fn ensure_traversable<R: Rng + ?Sized>(rng: &mut R, row: &mut Vec<Obstacle>, width: u8) -> bool {
    let barriers: Vec<usize> = row
        .iter()
        .enumerate()
        .filter(|(_, o)| o.kind == ObstacleKind::Barrier)
        .map(|(i, _)| i)
        .collect();

    if width == 0 || barriers.len() < width as usize {
        return false;
    }

    let victim = barriers[rng.random_range(0..barriers.len())];
    let removed = row.remove(victim);
    log::trace!("Row fully barred, opened column {}", removed.position.x);
    true
}

/// Scroll the field and append a freshly generated row
pub fn advance_and_generate<R: Rng + ?Sized>(
    state: &mut GameState,
    rng: &mut R,
    config: &DifficultyConfig,
) {
    advance_obstacles(state);
    let row = generate_row(rng, &state.grid, config);
    state.obstacles.extend(row);
    state.normalize_cells();
}
