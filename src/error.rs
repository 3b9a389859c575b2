//! Error types
//!
//! None of these abort a run. Callers log them and fall back to a sane default
//! (tuning defaults, a no-op board reset, an in-memory store).

use thiserror::Error;

/// Problems with a tuning document
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("tuning is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid tuning value: {0}")]
    Invalid(&'static str),
}

/// Rejected board operations
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum BoardError {
    #[error("cannot reset grid: no initial day state saved")]
    NoSnapshot,
    #[error("peg {0} is not on the board")]
    UnknownPeg(u32),
}

/// Rejected run-level actions
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GameError {
    #[error("cannot {action} while {phase}")]
    InvalidTransition {
        action: &'static str,
        phase: &'static str,
    },
    #[error("reward {index} does not exist ({available} offered)")]
    NoSuchOffer { index: usize, available: usize },
    #[error("required page element #{0} not found")]
    MissingAnchor(String),
}

/// Key/value storage failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("storage is unavailable")]
    Unavailable,
    #[error("storage rejected write to {key}: {reason}")]
    Write { key: String, reason: String },
}
