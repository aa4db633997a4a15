//! Tournament error types

use std::path::PathBuf;
use thiserror::Error;

use shared::SharedError;

/// Result type for tournament operations
pub type TournamentResult<T> = Result<T, TournamentError>;

/// Outcome classes of a trends query that did not produce scores
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoringError {
    #[error("trends source returned no data")]
    Empty,

    #[error("trends source rate limit exceeded")]
    RateLimited,

    #[error("trends request failed: {0}")]
    Transient(String),

    #[error("invalid batch of {size} subjects, expected between 1 and 5")]
    InvalidBatch { size: usize },

    #[error("gave up after {attempts} attempts for [{}]: {last}", .subjects.join(", "))]
    Fatal {
        subjects: Vec<String>,
        attempts: u32,
        last: Box<ScoringError>,
    },
}

/// Tournament error types
#[derive(Error, Debug)]
pub enum TournamentError {
    #[error("Roster error: {0}")]
    Roster(#[from] SharedError),

    #[error("Candidate pool is empty after filtering inactive players")]
    EmptyPool,

    #[error("Need at least {required} candidates, got {available}")]
    InsufficientCandidates { required: usize, available: usize },

    #[error("Scoring failed for batch [{}]: {source}", .candidates.join(", "))]
    BatchFailed {
        candidates: Vec<String>,
        source: ScoringError,
    },

    #[error("No metadata record for finalist {name}")]
    MetadataMissing { name: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Failed to persist results to {}: {source}", .path.display())]
    Persist {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl TournamentError {
    pub fn config(message: impl Into<String>) -> Self {
        TournamentError::ConfigError {
            message: message.into(),
        }
    }
}
