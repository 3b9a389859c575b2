//! High score table
//!
//! Best ten runs by final score, with the day each run reached. Stored as a
//! JSON document under [`HighScores::STORAGE_KEY`].

use serde::{Deserialize, Serialize};

use crate::persistence::{load_json, save_json};
use crate::platform::PersistenceStore;

/// Maximum number of high scores to keep
pub const MAX_HIGH_SCORES: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    pub score: u64,
    /// Day the run ended on
    pub day: u32,
    /// Unix timestamp (ms) when achieved
    pub timestamp: f64,
}

/// Sorted best first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct HighScores {
    pub entries: Vec<HighScoreEntry>,
}

impl HighScores {
    pub const STORAGE_KEY: &'static str = "numby_highscores";

    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a score qualifies for the table
    pub fn qualifies(&self, score: u64) -> bool {
        if score == 0 {
            return false;
        }
        if self.entries.len() < MAX_HIGH_SCORES {
            return true;
        }
        self.entries.last().is_none_or(|e| score > e.score)
    }

    /// Rank a score would achieve (1-indexed, None if it doesn't qualify)
    pub fn potential_rank(&self, score: u64) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }
        let rank = self.entries.iter().position(|e| score > e.score);
        Some(rank.unwrap_or(self.entries.len()) + 1)
    }

    /// Insert a finished run; returns the rank achieved
    pub fn add_score(&mut self, score: u64, day: u32, timestamp: f64) -> Option<usize> {
        let rank = self.potential_rank(score)?;
        self.entries.insert(
            rank - 1,
            HighScoreEntry {
                score,
                day,
                timestamp,
            },
        );
        self.entries.truncate(MAX_HIGH_SCORES);
        Some(rank)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }

    /// Load from storage, starting fresh when nothing usable is stored
    pub fn load(store: &dyn PersistenceStore) -> Self {
        match load_json::<HighScores>(store, Self::STORAGE_KEY) {
            Some(mut scores) => {
                scores.entries.sort_by(|a, b| b.score.cmp(&a.score));
                scores.entries.truncate(MAX_HIGH_SCORES);
                log::info!("Loaded {} high scores", scores.entries.len());
                scores
            }
            None => {
                log::info!("No high scores found, starting fresh");
                Self::new()
            }
        }
    }

    pub fn save(&self, store: &mut dyn PersistenceStore) {
        if save_json(store, Self::STORAGE_KEY, self) {
            log::info!("High scores saved ({} entries)", self.entries.len());
        }
    }
}

/// Relative age of a timestamp, e.g. "3 days ago"
pub fn format_age(timestamp: f64, now: f64) -> String {
    let mins = ((now - timestamp) / 60_000.0).max(0.0);
    let hours = mins / 60.0;
    let days = hours / 24.0;

    if days >= 1.0 {
        match days.floor() as u32 {
            1 => "Yesterday".to_string(),
            d => format!("{d} days ago"),
        }
    } else if hours >= 1.0 {
        match hours.floor() as u32 {
            1 => "1 hour ago".to_string(),
            h => format!("{h} hours ago"),
        }
    } else if mins >= 1.0 {
        match mins.floor() as u32 {
            1 => "1 min ago".to_string(),
            m => format!("{m} mins ago"),
        }
    } else {
        "Just now".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::MemoryStore;

    #[test]
    fn test_sorted_insert_and_rank() {
        let mut scores = HighScores::new();
        assert_eq!(scores.add_score(100, 2, 0.0), Some(1));
        assert_eq!(scores.add_score(300, 5, 0.0), Some(1));
        assert_eq!(scores.add_score(200, 4, 0.0), Some(2));
        assert_eq!(scores.add_score(0, 1, 0.0), None);

        let order: Vec<u64> = scores.entries.iter().map(|e| e.score).collect();
        assert_eq!(order, vec![300, 200, 100]);
        assert_eq!(scores.top_score(), Some(300));
    }

    #[test]
    fn test_table_is_capped() {
        let mut scores = HighScores::new();
        for s in 1..=MAX_HIGH_SCORES as u64 {
            scores.add_score(s * 10, 1, 0.0);
        }
        assert!(!scores.qualifies(10));
        assert_eq!(scores.potential_rank(55), Some(6));
        assert_eq!(scores.add_score(55, 3, 0.0), Some(6));
        assert_eq!(scores.entries.len(), MAX_HIGH_SCORES);
        assert_eq!(scores.entries.last().map(|e| e.score), Some(20));
    }

    #[test]
    fn test_persists_through_store() {
        let mut store = MemoryStore::default();
        let mut scores = HighScores::new();
        scores.add_score(420, 7, 1_000.0);
        scores.save(&mut store);

        assert_eq!(HighScores::load(&store), scores);

        store.set(HighScores::STORAGE_KEY, "garbage").unwrap();
        assert!(HighScores::load(&store).is_empty());
    }

    #[test]
    fn test_format_age() {
        let min = 60_000.0;
        assert_eq!(format_age(0.0, 10.0), "Just now");
        assert_eq!(format_age(0.0, 5.0 * min), "5 mins ago");
        assert_eq!(format_age(0.0, 60.0 * min), "1 hour ago");
        assert_eq!(format_age(0.0, 30.0 * 60.0 * min), "Yesterday");
        assert_eq!(format_age(0.0, 72.0 * 60.0 * min), "3 days ago");
    }
}
