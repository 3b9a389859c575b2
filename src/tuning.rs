//! Data-driven game balance
//!
//! Every knob the simulation reads lives here. Missing fields fall back to
//! [`crate::consts`], so a tuning document only needs the values it changes.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::ConfigError;
use crate::platform::PersistenceStore;

/// Largest accepted row or column count
pub const MAX_GRID_SIDE: u32 = 64;

/// Character physics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsTuning {
    pub radius: f32,
    pub gravity: f32,
    pub friction: f32,
    pub elasticity: f32,
    pub max_velocity: f32,
    pub launch_boost: f32,
    pub bounce_boost: f32,
    pub upward_boost: f32,
    pub min_upward_speed: f32,
    pub max_launch_speed: f32,
}

impl Default for PhysicsTuning {
    fn default() -> Self {
        Self {
            radius: CHARACTER_RADIUS,
            gravity: GRAVITY,
            friction: FRICTION,
            elasticity: ELASTICITY,
            max_velocity: MAX_VELOCITY,
            launch_boost: LAUNCH_BOOST,
            bounce_boost: BOUNCE_BOOST,
            upward_boost: UPWARD_BOOST,
            min_upward_speed: MIN_UPWARD_SPEED,
            max_launch_speed: MAX_LAUNCH_SPEED,
        }
    }
}

/// Peg board geometry and day-to-day peg policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardTuning {
    pub width: f32,
    pub height: f32,
    pub peg_radius: f32,
    pub edge_spacing: f32,
    pub wall_spacing: f32,
    pub top_margin_fraction: f32,
    pub rows: u32,
    pub cols: u32,
    pub max_pegs: usize,
    pub keep_fraction: f32,
    pub merge_fraction: f32,
}

impl Default for BoardTuning {
    fn default() -> Self {
        Self {
            width: BOARD_WIDTH,
            height: BOARD_HEIGHT,
            peg_radius: PEG_RADIUS,
            edge_spacing: PEG_EDGE_SPACING,
            wall_spacing: PEG_WALL_SPACING,
            top_margin_fraction: TOP_MARGIN_FRACTION,
            rows: GRID_ROWS,
            cols: GRID_COLS,
            max_pegs: MAX_PEGS,
            keep_fraction: KEEP_FRACTION,
            merge_fraction: MERGE_FRACTION,
        }
    }
}

/// How the board changes when a day is completed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayTransition {
    /// Move survivors to new slots and merge the top scorers
    #[default]
    Reshuffle,
    /// Rebuild the grid, keeping some survivors where they were
    Regenerate,
}

/// Run-level rules (lives, challenges, shop)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunTuning {
    pub starting_lives: u8,
    pub max_lives: u8,
    /// Every Nth day gets a daily challenge (0 disables them)
    pub challenge_interval: u32,
    pub shop_size: usize,
    /// Ticks to wait for a reward pick before taking the first offer
    pub shop_timeout_ticks: Option<u32>,
    pub max_flight_ticks: u32,
    pub day_transition: DayTransition,
}

impl Default for RunTuning {
    fn default() -> Self {
        Self {
            starting_lives: STARTING_LIVES,
            max_lives: MAX_LIVES,
            challenge_interval: CHALLENGE_INTERVAL,
            shop_size: SHOP_SIZE,
            shop_timeout_ticks: None,
            max_flight_ticks: MAX_FLIGHT_TICKS,
            day_transition: DayTransition::Reshuffle,
        }
    }
}

/// Complete balance sheet
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub physics: PhysicsTuning,
    pub board: BoardTuning,
    pub run: RunTuning,
}

impl Tuning {
    /// Storage key for an override document
    pub const STORAGE_KEY: &'static str = "numby_tuning";

    /// Parse and validate a JSON tuning document
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Load the override document from storage, falling back to defaults
    pub fn load(store: &dyn PersistenceStore) -> Self {
        let Some(json) = store.get(Self::STORAGE_KEY) else {
            return Self::default();
        };
        match Self::from_json(&json) {
            Ok(tuning) => {
                log::info!("Loaded tuning overrides");
                tuning
            }
            Err(e) => {
                log::warn!("Ignoring stored tuning: {e}");
                Self::default()
            }
        }
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.physics;
        if p.radius <= 0.0 {
            return Err(ConfigError::Invalid("physics.radius must be positive"));
        }
        if p.max_velocity <= 0.0 {
            return Err(ConfigError::Invalid("physics.max_velocity must be positive"));
        }
        if !(0.0..=1.0).contains(&p.friction) || !(0.0..=1.0).contains(&p.elasticity) {
            return Err(ConfigError::Invalid(
                "physics.friction and physics.elasticity must be within 0..=1",
            ));
        }

        let b = &self.board;
        if b.rows == 0 || b.cols == 0 {
            return Err(ConfigError::Invalid("board grid needs at least one row and column"));
        }
        if b.width <= 0.0 || b.height <= 0.0 || b.peg_radius <= 0.0 {
            return Err(ConfigError::Invalid("board dimensions must be positive"));
        }
        if b.rows > MAX_GRID_SIDE || b.cols > MAX_GRID_SIDE {
            return Err(ConfigError::Invalid("board grid is too large"));
        }
        let slots = u64::from(b.rows)
            .checked_mul(u64::from(b.cols))
            .ok_or(ConfigError::Invalid("board grid is too large"))?;
        if b.max_pegs == 0 || b.max_pegs as u64 > slots {
            return Err(ConfigError::Invalid("board.max_pegs must fit in the grid"));
        }
        if !(0.0..=1.0).contains(&b.keep_fraction) || !(0.0..=0.5).contains(&b.merge_fraction) {
            return Err(ConfigError::Invalid("board keep/merge fractions out of range"));
        }

        let r = &self.run;
        if r.max_lives == 0 || r.starting_lives == 0 || r.starting_lives > r.max_lives {
            return Err(ConfigError::Invalid(
                "run.starting_lives must be within 1..=run.max_lives",
            ));
        }
        if r.shop_size == 0 {
            return Err(ConfigError::Invalid("run.shop_size must be positive"));
        }
        if r.max_flight_ticks == 0 {
            return Err(ConfigError::Invalid("run.max_flight_ticks must be positive"));
        }
        Ok(())
    }
}
