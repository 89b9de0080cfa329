//! Persistent player progress
//!
//! High score, per-level records and lifetime counters, all persisted through
//! the [`KeyValueStore`] contract. Loading never fails: missing or unreadable
//! data starts the player fresh.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::persistence::{KeyValueStore, StoreError, load_json, save_json, storage_key};
use crate::sim::RunStats;

const HIGH_SCORE: &str = "high_score";
const LEVELS: &str = "levels";
const LIFETIME: &str = "lifetime";

/// Read the best score (0 when never written)
pub fn read_high_score<S: KeyValueStore + ?Sized>(store: &S) -> Result<u32, StoreError> {
    let key = storage_key(HIGH_SCORE);
    match store.get(&key)? {
        Some(raw) => raw.trim().parse().map_err(|_| StoreError::Corrupt {
            key,
            reason: format!("'{}' is not a score", raw),
        }),
        None => Ok(0),
    }
}

/// Write the best score
pub fn write_high_score<S: KeyValueStore + ?Sized>(store: &mut S, score: u32) -> Result<(), StoreError> {
    store.set(&storage_key(HIGH_SCORE), &score.to_string())
}

/// Best result on a single level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelRecord {
    pub best_score: u32,
    pub completed: bool,
}

/// Completion state of every level played so far
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelProgress {
    pub levels: BTreeMap<u32, LevelRecord>,
}

impl LevelProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Level 1 is always open; later levels open once the previous is completed
    pub fn is_unlocked(&self, level_id: u32) -> bool {
        level_id <= 1 || self.is_completed(level_id - 1)
    }

    pub fn is_completed(&self, level_id: u32) -> bool {
        self.levels.get(&level_id).is_some_and(|r| r.completed)
    }

    pub fn record(&self, level_id: u32) -> Option<&LevelRecord> {
        self.levels.get(&level_id)
    }

    /// Fold a finished run into the level's record.
    /// Returns true when this run completed the level for the first time.
    pub fn record_run(&mut self, level_id: u32, score: u32, completed: bool) -> bool {
        let record = self.levels.entry(level_id).or_default();
        let first_completion = completed && !record.completed;
        record.best_score = record.best_score.max(score);
        record.completed |= completed;
        first_completion
    }

    pub fn load<S: KeyValueStore + ?Sized>(store: &S) -> Self {
        match load_json::<Self, S>(store, LEVELS) {
            Ok(Some(progress)) => {
                log::info!("Loaded progress for {} level(s)", progress.levels.len());
                progress
            }
            Ok(None) => Self::new(),
            Err(e) => {
                log::warn!("Level progress unavailable, starting fresh: {}", e);
                Self::new()
            }
        }
    }

    pub fn save<S: KeyValueStore + ?Sized>(&self, store: &mut S) {
        if let Err(e) = save_json(store, LEVELS, self) {
            log::warn!("Failed to save level progress: {}", e);
        }
    }
}

/// Counters accumulated across every run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifetimeStats {
    pub games_played: u32,
    pub energy_collected: u32,
    pub speed_boosts_collected: u32,
    pub shield_blocks: u32,
}

impl LifetimeStats {
    pub fn absorb(&mut self, run: &RunStats) {
        self.games_played += 1;
        self.energy_collected += run.energy_collected;
        self.speed_boosts_collected += run.speed_boosts_collected;
        self.shield_blocks += run.shield_blocks;
    }

    pub fn load<S: KeyValueStore + ?Sized>(store: &S) -> Self {
        load_json::<Self, S>(store, LIFETIME)
            .unwrap_or_else(|e| {
                log::warn!("Lifetime stats unavailable, starting fresh: {}", e);
                None
            })
            .unwrap_or_default()
    }

    pub fn save<S: KeyValueStore + ?Sized>(&self, store: &mut S) {
        if let Err(e) = save_json(store, LIFETIME, self) {
            log::warn!("Failed to save lifetime stats: {}", e);
        }
    }
}

/// Wipe level progress and the high score
pub fn reset_progress<S: KeyValueStore + ?Sized>(store: &mut S) -> Result<(), StoreError> {
    store.remove(&storage_key(LEVELS))?;
    store.remove(&storage_key(HIGH_SCORE))?;
    log::info!("Progress reset");
    Ok(())
}
