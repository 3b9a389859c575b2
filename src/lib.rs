//! Numby's Number Factory - a pachinko/peg roguelike
//!
//! Core modules:
//! - `sim`: Deterministic simulation (kinematics, peg board, day/quota state machine)
//! - `items`: Item catalog and the score-effect pipeline
//! - `game`: Shell that drives a run and feeds the presentation collaborators
//! - `platform`: Collaborator traits plus headless and browser implementations
//! - `persistence`: Best-effort JSON documents on top of a key/value store
//! - `tuning`: Data-driven game balance

pub mod achievements;
pub mod audio;
pub mod error;
pub mod game;
pub mod highscores;
pub mod items;
pub mod persistence;
pub mod platform;
pub mod rng;
pub mod sim;
pub mod stats;
pub mod tuning;

pub use error::{BoardError, ConfigError, GameError, StoreError};
pub use game::Game;
pub use highscores::HighScores;
pub use tuning::Tuning;

/// Game configuration constants (defaults for [`Tuning`])
pub mod consts {
    /// Numby radius in pixels
    pub const CHARACTER_RADIUS: f32 = 15.0;
    /// Added to vertical velocity every tick
    pub const GRAVITY: f32 = 0.2;
    /// Per-tick velocity retention (air resistance)
    pub const FRICTION: f32 = 0.98;
    pub const ELASTICITY: f32 = 0.95;
    /// Hard ceiling for each velocity component
    pub const MAX_VELOCITY: f32 = 15.0;
    /// Launch velocity scale (makes up for the wide grid spacing)
    pub const LAUNCH_BOOST: f32 = 1.2;
    /// Peg bounces are livelier than walls
    pub const BOUNCE_BOOST: f32 = 1.5;
    /// Fraction of speed turned upward after a downward peg bounce
    pub const UPWARD_BOOST: f32 = 0.8;
    /// Floor for the upward correction so a resting ball still pops off
    pub const MIN_UPWARD_SPEED: f32 = 1.0;
    /// Launch speed at 100% power (before the launch boost)
    pub const MAX_LAUNCH_SPEED: f32 = 15.0;
    /// Spawn height below the top wall
    pub const START_OFFSET_Y: f32 = 30.0;
    /// Below this distance a contact normal is undefined
    pub const NORMAL_EPSILON: f32 = 1e-4;

    /// Board dimensions (660px container minus padding and border)
    pub const BOARD_WIDTH: f32 = 612.0;
    pub const BOARD_HEIGHT: f32 = 720.0;

    /// Peg radius, equal to Numby's diameter
    pub const PEG_RADIUS: f32 = 30.0;
    /// Gap between neighbouring peg edges
    pub const PEG_EDGE_SPACING: f32 = 60.0;
    /// Gap between the side walls and the outer peg edges
    pub const PEG_WALL_SPACING: f32 = 60.0;
    pub const TOP_MARGIN_FRACTION: f32 = 0.25;
    pub const GRID_ROWS: u32 = 5;
    pub const GRID_COLS: u32 = 5;
    pub const MAX_PEGS: usize = 15;
    /// Share of surviving pegs kept in place on a regenerated day
    pub const KEEP_FRACTION: f32 = 0.6;
    /// Share of pegs paired up by the end-of-day merge
    pub const MERGE_FRACTION: f32 = 0.3;
    /// Pegs at or above this score count as "special" numbers
    pub const SPECIAL_PEG_SCORE: u64 = 16;

    pub const STARTING_LIVES: u8 = 3;
    pub const MAX_LIVES: u8 = 5;
    /// Quota for the very first day
    pub const DAY_ONE_QUOTA: u64 = 50;
    /// A daily challenge starts on every Nth day
    pub const CHALLENGE_INTERVAL: u32 = 3;
    pub const SHOP_SIZE: usize = 3;
    /// Flights longer than this (60 s at 60 Hz) are ended as a free reset
    pub const MAX_FLIGHT_TICKS: u32 = 60 * 60;

    /// Highest item level
    pub const MAX_ITEM_LEVEL: u8 = 5;
    pub const SYNERGY_MULTIPLIER: f64 = 1.5;
}
