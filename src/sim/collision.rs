//! Collision resolution between the player and the obstacle field
//!
//! The resolver applies every effect that lives in [`GameState`] (score,
//! shield flag, interval, obstacle removal) and reports what happened. Side
//! effects owned by the engine (timers, ending the session) are driven from
//! the returned [`Collision`].

use super::state::{GameState, ObstacleKind};
use crate::tuning::DifficultyConfig;

/// Outcome of a collision check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collision {
    /// Player cell is empty (or the session is not running)
    None,
    /// Energy collected, score incremented
    Energy { score: u32 },
    /// Speed boost collected; the scheduler should adopt `interval_ms`
    SpeedBoost { interval_ms: u32 },
    /// Shield collected; the expiry timer should be (re)armed
    Shield,
    /// Barrier absorbed by the shield; the expiry timer should be cancelled
    ShieldBlock,
    /// Unshielded barrier hit; the session must end
    Fatal,
}

/// Resolve whatever occupies the player's cell
pub fn resolve_collision(state: &mut GameState, config: &DifficultyConfig) -> Collision {
    if !state.is_running() {
        return Collision::None;
    }

    let pos = state.player.position;
    let hits = state.obstacles.iter().filter(|o| o.position == pos).count();
    if hits > 1 {
        log::warn!("{} obstacles share player cell ({}, {})", hits, pos.x, pos.y);
        state.normalize_cells();
    }

    let Some(index) = state.obstacle_at(pos) else {
        return Collision::None;
    };

    match state.obstacles[index].kind {
        ObstacleKind::Energy => {
            state.obstacles.remove(index);
            state.score += 1;
            state.stats.energy_collected += 1;
            Collision::Energy { score: state.score }
        }
        ObstacleKind::SpeedBoost => {
            state.obstacles.remove(index);
            state.tick_interval_ms = config.boosted_interval(state.tick_interval_ms);
            state.stats.speed_boosts_collected += 1;
            Collision::SpeedBoost {
                interval_ms: state.tick_interval_ms,
            }
        }
        ObstacleKind::Shield => {
            state.obstacles.remove(index);
            state.player.has_shield = true;
            state.stats.shields_collected += 1;
            Collision::Shield
        }
        ObstacleKind::Barrier if state.player.has_shield => {
            state.obstacles.remove(index);
            state.player.has_shield = false;
            state.stats.shield_blocks += 1;
            Collision::ShieldBlock
        }
        ObstacleKind::Barrier => Collision::Fatal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::{GamePhase, Obstacle};
    use crate::tuning::GridConfig;

    fn running_state() -> GameState {
        let mut state = GameState::new(GridConfig::default(), 1000);
        state.phase = GamePhase::Running;
        state
    }

    #[test]
    fn test_energy_scores_and_removes() {
        let mut state = running_state();
        state.obstacles.push(Obstacle::new(ObstacleKind::Energy, 2, 6));
        let result = resolve_collision(&mut state, &DifficultyConfig::default());
        assert_eq!(result, Collision::Energy { score: 1 });
        assert_eq!(state.score, 1);
        assert!(state.obstacles.is_empty());
    }

    #[test]
    fn test_speed_boost_shrinks_interval() {
        let mut state = running_state();
        state.obstacles.push(Obstacle::new(ObstacleKind::SpeedBoost, 2, 6));
        let result = resolve_collision(&mut state, &DifficultyConfig::default());
        assert_eq!(result, Collision::SpeedBoost { interval_ms: 950 });
        assert_eq!(state.tick_interval_ms, 950);
    }

    #[test]
    fn test_barrier_without_shield_is_fatal_and_stays() {
        let mut state = running_state();
        state.obstacles.push(Obstacle::new(ObstacleKind::Barrier, 2, 6));
        assert_eq!(
            resolve_collision(&mut state, &DifficultyConfig::default()),
            Collision::Fatal
        );
        assert_eq!(state.obstacles.len(), 1);
    }

    #[test]
    fn test_barrier_with_shield_consumes_shield() {
        let mut state = running_state();
        state.player.has_shield = true;
        state.obstacles.push(Obstacle::new(ObstacleKind::Barrier, 2, 6));
        assert_eq!(
            resolve_collision(&mut state, &DifficultyConfig::default()),
            Collision::ShieldBlock
        );
        assert!(!state.player.has_shield);
        assert!(state.obstacles.is_empty());
        assert_eq!(state.stats.shield_blocks, 1);
    }

    #[test]
    fn test_no_effect_when_paused_or_empty() {
        let mut state = running_state();
        state.obstacles.push(Obstacle::new(ObstacleKind::Energy, 0, 0));
        assert_eq!(
            resolve_collision(&mut state, &DifficultyConfig::default()),
            Collision::None
        );

        state.obstacles.push(Obstacle::new(ObstacleKind::Energy, 2, 6));
        state.phase = GamePhase::Paused;
        assert_eq!(
            resolve_collision(&mut state, &DifficultyConfig::default()),
            Collision::None
        );
        assert_eq!(state.score, 0);
    }

    #[test]
    fn test_duplicate_cell_is_normalized() {
        let mut state = running_state();
        state.obstacles.push(Obstacle::new(ObstacleKind::Energy, 2, 6));
        state.obstacles.push(Obstacle::new(ObstacleKind::Barrier, 2, 6));
        assert_eq!(
            resolve_collision(&mut state, &DifficultyConfig::default()),
            Collision::Energy { score: 1 }
        );
        assert!(state.obstacles.is_empty());
    }
}
