//! Achievement catalog and unlock tracking
//!
//! Achievements are evaluated once per finished run against that run's
//! counters, the lifetime totals and level progress.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::persistence::{KeyValueStore, load_json, save_json};
use crate::progress::{LevelProgress, LifetimeStats};
use crate::sim::RunStats;

const ACHIEVEMENTS_KEY: &str = "achievements";

/// Unlock condition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Criterion {
    GamesPlayed(u32),
    EnergyInGame(u32),
    EnergyTotal(u32),
    SpeedBoostsInGame(u32),
    ShieldBlocks(u32),
    LevelCompleted(u32),
    Score(u32),
    /// Level target reached without leaning on a shield
    PerfectLevel,
    /// Every other achievement unlocked
    AllOthers,
}

#[derive(Debug, Clone, Copy)]
pub struct Achievement {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    /// Hidden description until unlocked
    pub secret: bool,
    pub criterion: Criterion,
}

const fn achievement(
    id: &'static str,
    title: &'static str,
    description: &'static str,
    secret: bool,
    criterion: Criterion,
) -> Achievement {
    Achievement {
        id,
        title,
        description,
        secret,
        criterion,
    }
}

pub const ACHIEVEMENTS: &[Achievement] = &[
    achievement("first_game", "Digital Novice", "Play your first game.", false, Criterion::GamesPlayed(1)),
    achievement("collector", "Energy Collector", "Collect 10 energy orbs in a single game.", false, Criterion::EnergyInGame(10)),
    achievement("master_collector", "Energy Master", "Collect 50 energy orbs in total.", false, Criterion::EnergyTotal(50)),
    achievement("speed_demon", "Speed Demon", "Collect 3 speed boosts in a single game.", false, Criterion::SpeedBoostsInGame(3)),
    achievement("shield_master", "Shield Bearer", "Use a shield to survive a collision with a barrier.", false, Criterion::ShieldBlocks(1)),
    achievement("level_1_complete", "Neural Explorer", "Complete the Neural Gateway level.", false, Criterion::LevelCompleted(1)),
    achievement("level_2_complete", "Data Surfer", "Complete the Data Stream level.", false, Criterion::LevelCompleted(2)),
    achievement("level_3_complete", "Firewall Hacker", "Complete the Firewall Breach level.", false, Criterion::LevelCompleted(3)),
    achievement("level_4_complete", "Quantum Navigator", "Complete the Quantum Maze level.", false, Criterion::LevelCompleted(4)),
    achievement("level_5_complete", "Neon Master", "Complete the Neon Nexus level.", false, Criterion::LevelCompleted(5)),
    achievement("high_score_20", "Digital Prodigy", "Reach a score of 20 in any level.", false, Criterion::Score(20)),
    achievement("high_score_50", "Neon Legend", "Reach a score of 50 in any level.", false, Criterion::Score(50)),
    achievement("perfect_run", "Flawless Run", "Complete a level without any collisions.", true, Criterion::PerfectLevel),
    achievement("persistent", "Digital Persistence", "Play 10 games in total.", false, Criterion::GamesPlayed(10)),
    achievement("game_master", "Swipe Nexus Master", "Unlock all other achievements.", true, Criterion::AllOthers),
];

pub fn find(id: &str) -> Option<&'static Achievement> {
    ACHIEVEMENTS.iter().find(|a| a.id == id)
}

/// Everything known about a finished run
#[derive(Debug, Clone, Copy, Default)]
pub struct RunSummary {
    pub score: u32,
    pub stats: RunStats,
    pub target_reached: bool,
}

/// Set of unlocked achievement ids
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementBook {
    pub unlocked: BTreeSet<String>,
}

impl AchievementBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_unlocked(&self, id: &str) -> bool {
        self.unlocked.contains(id)
    }

    /// Unlock everything the run earned; returns the newly unlocked entries
    pub fn evaluate(
        &mut self,
        run: &RunSummary,
        lifetime: &LifetimeStats,
        levels: &LevelProgress,
    ) -> Vec<&'static Achievement> {
        let mut fresh = Vec::new();

        for entry in ACHIEVEMENTS {
            if self.is_unlocked(entry.id) {
                continue;
            }
            let earned = match entry.criterion {
                Criterion::GamesPlayed(n) => lifetime.games_played >= n,
                Criterion::EnergyInGame(n) => run.stats.energy_collected >= n,
                Criterion::EnergyTotal(n) => lifetime.energy_collected >= n,
                Criterion::SpeedBoostsInGame(n) => run.stats.speed_boosts_collected >= n,
                Criterion::ShieldBlocks(n) => lifetime.shield_blocks >= n,
                Criterion::LevelCompleted(level) => levels.is_completed(level),
                Criterion::Score(n) => run.score >= n,
                Criterion::PerfectLevel => run.target_reached && run.stats.shield_blocks == 0,
                // Checked below, once the rest of this pass has landed
                Criterion::AllOthers => false,
            };
            if earned {
                self.unlocked.insert(entry.id.to_string());
                fresh.push(entry);
            }
        }

        for entry in ACHIEVEMENTS {
            if entry.criterion == Criterion::AllOthers
                && !self.is_unlocked(entry.id)
                && ACHIEVEMENTS
                    .iter()
                    .filter(|a| a.criterion != Criterion::AllOthers)
                    .all(|a| self.is_unlocked(a.id))
            {
                self.unlocked.insert(entry.id.to_string());
                fresh.push(entry);
            }
        }

        fresh
    }

    pub fn load<S: KeyValueStore + ?Sized>(store: &S) -> Self {
        match load_json::<Self, S>(store, ACHIEVEMENTS_KEY) {
            Ok(book) => book.unwrap_or_default(),
            Err(e) => {
                log::warn!("Achievements unavailable, starting fresh: {}", e);
                Self::new()
            }
        }
    }

    pub fn save<S: KeyValueStore + ?Sized>(&self, store: &mut S) {
        if let Err(e) = save_json(store, ACHIEVEMENTS_KEY, self) {
            log::warn!("Failed to save achievements: {}", e);
        }
    }
}
