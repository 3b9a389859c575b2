//! Run state: day, score, quota, lives
//!
//! Plus the phase machine and the events the simulation reports to the shell.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::challenge::DailyChallenge;
use super::character::BoardExit;
use crate::consts::DAY_ONE_QUOTA;
use crate::items::{ItemId, ItemOffer, Synergy, TemporaryEffect};

/// Current phase of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Numby waits at the launch point
    Aiming,
    /// Numby is bouncing around the board
    InFlight,
    /// Day cleared; waiting for a reward pick
    DayComplete {
        offers: Vec<ItemOffer>,
        waited_ticks: u32,
    },
    /// Run ended
    GameOver,
}

impl GamePhase {
    pub fn name(&self) -> &'static str {
        match self {
            GamePhase::Aiming => "aiming",
            GamePhase::InFlight => "in flight",
            GamePhase::DayComplete { .. } => "choosing a reward",
            GamePhase::GameOver => "game over",
        }
    }
}

/// Things that happened during a tick, in order
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    Launched {
        vel: Vec2,
    },
    /// Numby bounced off a peg
    PegHit {
        id: u32,
        pos: Vec2,
    },
    /// A hit produced a number
    NumberGenerated {
        peg: u32,
        pos: Vec2,
        base: u64,
        value: u64,
    },
    PegDestroyed {
        id: u32,
        pos: Vec2,
    },
    PegDuplicated {
        id: u32,
        pos: Vec2,
        score: u64,
    },
    PegsMerged {
        from: Vec2,
        to: Vec2,
        score: u64,
    },
    ScoreChanged {
        score: u64,
        quota: u64,
    },
    SynergyDiscovered(Synergy),
    ItemApplied {
        id: ItemId,
        level: u8,
        upgrade: bool,
    },
    /// Free retry after leaving through a side or the top (`None`: the
    /// flight ran too long)
    AttemptReset {
        exit: Option<BoardExit>,
    },
    LifeLost {
        lives: u8,
    },
    DayCompleted {
        day: u32,
        score: u64,
        lives_gained: u8,
    },
    ChallengeStarted(DailyChallenge),
    ShopOpened {
        offers: Vec<ItemOffer>,
    },
    GameOver {
        day: u32,
        score: u64,
    },
}

/// Quota for `day` before challenge modifiers
///
/// Gentle for the first ten days, then progressively steeper. Days past 100
/// are endless mode.
pub fn base_quota(day: u32) -> u64 {
    let d = u64::from(day.max(1));
    match d {
        1 => DAY_ONE_QUOTA,
        2..=10 => 50 + (d - 1) * 25,
        11..=30 => 275 + (d - 10) * 40,
        31..=60 => 1075 + (d - 30) * 75,
        61..=100 => 3325 + (d - 60) * 150,
        _ => 9325 + (d - 100) * 300,
    }
}

/// Lives restored when `finished_day` is completed with `score` against `quota`
fn lives_for_completion(finished_day: u32, score: u64, quota: u64) -> u8 {
    let mut gained = 1;
    if score >= quota.saturating_mul(2) {
        gained += 1;
    }
    let next_day = finished_day + 1;
    if next_day % 10 == 0 && next_day <= 100 {
        gained += 1;
    }
    gained
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub day: u32,
    pub current_score: u64,
    pub quota: u64,
    pub lives: u8,
    pub max_lives: u8,
    starting_lives: u8,
    /// Peg hits since the last launch
    pub consecutive_hits: u32,
    pub temporary_effects: Vec<TemporaryEffect>,
    pub daily_challenge: Option<DailyChallenge>,
    pub run_ended: bool,
}

impl GameState {
    pub fn new(starting_lives: u8, max_lives: u8) -> Self {
        let max_lives = max_lives.max(1);
        let starting_lives = starting_lives.clamp(1, max_lives);
        Self {
            day: 1,
            current_score: 0,
            quota: base_quota(1),
            lives: starting_lives,
            max_lives,
            starting_lives,
            consecutive_hits: 0,
            temporary_effects: Vec::new(),
            daily_challenge: None,
            run_ended: false,
        }
    }

    /// Back to day 1
    pub fn reset(&mut self) {
        *self = Self::new(self.starting_lives, self.max_lives);
    }

    pub fn add_to_score(&mut self, value: u64) {
        self.current_score = self.current_score.saturating_add(value);
    }

    pub fn quota_met(&self) -> bool {
        self.current_score >= self.quota
    }

    /// Today's quota including the challenge modifier
    pub fn calculate_daily_quota(&self) -> u64 {
        let base = base_quota(self.day);
        match self.daily_challenge.and_then(DailyChallenge::quota_modifier) {
            Some(modifier) => (base as f64 * modifier).floor() as u64,
            None => base,
        }
    }

    /// Activate a challenge for the current day
    pub fn set_challenge(&mut self, challenge: DailyChallenge) {
        self.daily_challenge = Some(challenge);
        self.quota = self.calculate_daily_quota();
    }

    /// Spend a life; false when none are left
    pub fn use_life(&mut self) -> bool {
        if self.lives == 0 {
            return false;
        }
        self.lives -= 1;
        true
    }

    /// Advance to the next day; returns the lives restored
    pub fn complete_day(&mut self) -> u8 {
        let gained = lives_for_completion(self.day, self.current_score, self.quota);
        let before = self.lives;
        self.lives = self.lives.saturating_add(gained).min(self.max_lives);

        self.day += 1;
        self.current_score = 0;
        self.consecutive_hits = 0;
        self.temporary_effects.clear();
        self.daily_challenge = None;
        self.quota = self.calculate_daily_quota();

        self.lives.saturating_sub(before)
    }

    pub fn end_game(&mut self) {
        self.run_ended = true;
    }

    pub fn add_temporary_effect(&mut self, effect: TemporaryEffect) {
        if effect.remaining > 0 {
            self.temporary_effects.push(effect);
        }
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new(crate::consts::STARTING_LIVES, crate::consts::MAX_LIVES)
    }
}
