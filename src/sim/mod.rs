//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - One tick per frame, no wall-clock time
//! - Seeded RNG only (owned by the run)
//! - Stable iteration order (board order, inventory order)
//! - No rendering or platform dependencies

pub mod board;
pub mod challenge;
pub mod character;
pub mod collision;
pub mod run;
pub mod state;
pub mod tick;

pub use board::{Board, GridKey, GridLayout, InitialDayState, Peg, PegContact, PegUpdate, peg_score};
pub use challenge::DailyChallenge;
pub use character::{BoardExit, Character, CharacterTweak};
pub use collision::{WallContacts, circles_overlap, reflect_velocity};
pub use run::{Aim, Run};
pub use state::{GameEvent, GamePhase, GameState, base_quota};
pub use tick::{RewardChoice, TickInput, tick};
