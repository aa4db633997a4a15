//! Shared error types for roster handling

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SharedError {
    #[error("Failed to parse roster {source_name}: {message}")]
    RosterParse { source_name: String, message: String },

    #[error("Invalid roster record #{index}: {reason}")]
    InvalidRecord { index: usize, reason: String },

    #[error("Candidate {name} has no comparison key (topic_id is empty)")]
    MissingComparisonKey { name: String },
}

pub type SharedResult<T> = Result<T, SharedError>;
