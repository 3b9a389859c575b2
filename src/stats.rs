//! Lifetime player statistics
//!
//! Survives across runs. Per-hit counters stay in memory until [`StatsSystem::flush`];
//! everything else is saved as it changes.

use serde::{Deserialize, Serialize};

use crate::persistence::{load_json, save_json};
use crate::platform::PersistenceStore;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Stats {
    pub games_played: u32,
    pub highest_day: u32,
    pub total_numbers_generated: u64,
    pub largest_number_generated: u64,
    pub pegs_hit: u64,
    pub items_collected: u32,
    pub total_score: u64,
}

#[derive(Debug, Clone, Default)]
pub struct StatsSystem {
    stats: Stats,
    /// Changes not yet written to the store
    dirty: bool,
}

impl StatsSystem {
    pub const STORAGE_KEY: &'static str = "NumbyStats";

    pub fn load(store: &dyn PersistenceStore) -> Self {
        Self {
            stats: load_json(store, Self::STORAGE_KEY).unwrap_or_default(),
            dirty: false,
        }
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn save(&mut self, store: &mut dyn PersistenceStore) {
        save_json(store, Self::STORAGE_KEY, &self.stats);
        self.dirty = false;
    }

    /// Write pending per-hit counters
    pub fn flush(&mut self, store: &mut dyn PersistenceStore) {
        if self.dirty {
            self.save(store);
        }
    }

    pub fn record_game_played(&mut self, store: &mut dyn PersistenceStore) {
        self.stats.games_played += 1;
        self.save(store);
    }

    pub fn update_highest_day(&mut self, day: u32, store: &mut dyn PersistenceStore) {
        if day > self.stats.highest_day {
            self.stats.highest_day = day;
            self.save(store);
        }
    }

    pub fn record_number_generated(&mut self, value: u64) {
        let s = &mut self.stats;
        s.total_numbers_generated += 1;
        s.total_score = s.total_score.saturating_add(value);
        s.largest_number_generated = s.largest_number_generated.max(value);
        self.dirty = true;
    }

    pub fn record_peg_hit(&mut self) {
        self.stats.pegs_hit += 1;
        self.dirty = true;
    }

    pub fn record_item_collected(&mut self, store: &mut dyn PersistenceStore) {
        self.stats.items_collected += 1;
        self.save(store);
    }
}
