//! Achievements
//!
//! A fixed list of milestones checked at the end of each day and after item
//! pickups. Unlocked ids are stored as a JSON array.

use serde::{Deserialize, Serialize};

use crate::persistence::{load_json, save_json};
use crate::platform::PersistenceStore;
use crate::stats::Stats;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Achievement {
    FirstDay,
    WeekSurvivor,
    BigNumbers,
    Collector,
    SynergyMaster,
    PegBouncer,
}

/// What the checks look at
#[derive(Debug, Clone, Copy)]
pub struct Progress<'a> {
    pub day: u32,
    pub items_owned: usize,
    pub synergies: usize,
    pub stats: &'a Stats,
}

impl Achievement {
    pub const ALL: [Achievement; 6] = [
        Achievement::FirstDay,
        Achievement::WeekSurvivor,
        Achievement::BigNumbers,
        Achievement::Collector,
        Achievement::SynergyMaster,
        Achievement::PegBouncer,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Achievement::FirstDay => "First Day Survivor",
            Achievement::WeekSurvivor => "Week Survivor",
            Achievement::BigNumbers => "Big Numbers",
            Achievement::Collector => "Collector",
            Achievement::SynergyMaster => "Synergy Master",
            Achievement::PegBouncer => "Peg Bouncer",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Achievement::FirstDay => "Complete your first day at the Number Factory",
            Achievement::WeekSurvivor => "Survive for 7 days at the Number Factory",
            Achievement::BigNumbers => "Generate a number higher than 1000",
            Achievement::Collector => "Collect 10 different items",
            Achievement::SynergyMaster => "Discover 3 item synergies",
            Achievement::PegBouncer => "Bounce off 100 pegs",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Achievement::FirstDay => "🌞",
            Achievement::WeekSurvivor => "📅",
            Achievement::BigNumbers => "🔢",
            Achievement::Collector => "🧰",
            Achievement::SynergyMaster => "⚡",
            Achievement::PegBouncer => "🏓",
        }
    }

    pub fn is_met(self, p: &Progress<'_>) -> bool {
        match self {
            Achievement::FirstDay => p.day > 1,
            Achievement::WeekSurvivor => p.day > 7,
            Achievement::BigNumbers => p.stats.largest_number_generated > 1000,
            Achievement::Collector => p.items_owned >= 10,
            Achievement::SynergyMaster => p.synergies >= 3,
            Achievement::PegBouncer => p.stats.pegs_hit >= 100,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AchievementSystem {
    unlocked: Vec<Achievement>,
}

impl AchievementSystem {
    pub const STORAGE_KEY: &'static str = "NumbyAchievements";

    pub fn load(store: &dyn PersistenceStore) -> Self {
        Self {
            unlocked: load_json(store, Self::STORAGE_KEY).unwrap_or_default(),
        }
    }

    pub fn unlocked(&self) -> &[Achievement] {
        &self.unlocked
    }

    pub fn is_unlocked(&self, achievement: Achievement) -> bool {
        self.unlocked.contains(&achievement)
    }

    /// Unlock everything newly met; returns the new unlocks in list order
    pub fn check(&mut self, progress: &Progress<'_>, store: &mut dyn PersistenceStore) -> Vec<Achievement> {
        let fresh: Vec<Achievement> = Achievement::ALL
            .into_iter()
            .filter(|a| !self.is_unlocked(*a) && a.is_met(progress))
            .collect();

        if !fresh.is_empty() {
            for a in &fresh {
                log::info!("Achievement unlocked: {}", a.name());
            }
            self.unlocked.extend(&fresh);
            save_json(store, Self::STORAGE_KEY, &self.unlocked);
        }
        fresh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::MemoryStore;

    fn progress(day: u32, stats: &Stats) -> Progress<'_> {
        Progress {
            day,
            items_owned: 0,
            synergies: 0,
            stats,
        }
    }

    #[test]
    fn test_unlocks_once() {
        let mut store = MemoryStore::default();
        let mut system = AchievementSystem::load(&store);
        let stats = Stats::default();

        assert!(system.check(&progress(1, &stats), &mut store).is_empty());
        assert_eq!(
            system.check(&progress(2, &stats), &mut store),
            vec![Achievement::FirstDay]
        );
        assert!(system.check(&progress(3, &stats), &mut store).is_empty());
        assert_eq!(
            system.check(&progress(8, &stats), &mut store),
            vec![Achievement::WeekSurvivor]
        );
    }

    #[test]
    fn test_stat_based_unlocks() {
        let mut store = MemoryStore::default();
        let mut system = AchievementSystem::default();
        let stats = Stats {
            largest_number_generated: 1001,
            pegs_hit: 100,
            ..Stats::default()
        };
        let p = Progress {
            day: 1,
            items_owned: 10,
            synergies: 3,
            stats: &stats,
        };
        let unlocked = system.check(&p, &mut store);
        assert_eq!(
            unlocked,
            vec![
                Achievement::BigNumbers,
                Achievement::Collector,
                Achievement::SynergyMaster,
                Achievement::PegBouncer,
            ]
        );
    }

    #[test]
    fn test_unlocked_ids_persist() {
        let mut store = MemoryStore::default();
        let mut system = AchievementSystem::default();
        let stats = Stats::default();
        system.check(&progress(9, &stats), &mut store);

        assert_eq!(
            store.get(AchievementSystem::STORAGE_KEY).as_deref(),
            Some(r#"["first_day","week_survivor"]"#)
        );
        let reloaded = AchievementSystem::load(&store);
        assert!(reloaded.is_unlocked(Achievement::WeekSurvivor));
        assert!(!reloaded.is_unlocked(Achievement::PegBouncer));
    }
}
