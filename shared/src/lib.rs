//! Shared types for the trending footballers tournament
//!
//! Holds the candidate data model consumed by every stage of the tournament,
//! the group-relative score types, and the logging setup used by the binary.

pub mod errors;
pub mod logging;
pub mod roster;
pub mod scores;

pub use errors::*;
pub use logging::{Stage, log_error, log_progress, log_shutdown, log_startup, log_success};
pub use roster::{Candidate, ComparisonKey, PlayerInfo, PlayerStatistics, parse_roster};
pub use scores::{InterestSeries, ScoreMap, round_score};
