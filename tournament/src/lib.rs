//! Trending footballers tournament engine
//!
//! Ranks a roster of players by current search interest using only
//! group-relative comparisons from a rate-limited trends source. The pool is
//! reduced by batch elimination rounds, then a knockout settles the top four
//! and recovers the best 5th, and the final five are written atomically.

pub mod config;
pub mod core;
pub mod error;
pub mod services;
pub mod traits;
pub mod types;

#[cfg(test)]
pub mod fixtures;

// Re-export commonly used types
pub use config::TournamentConfig;
pub use crate::core::{
    BatchScorer, KnockoutFinalizer, RetryPolicy, RoundRunner, Tournament, find_best_fifth,
    prepare_pool, run_pipeline,
};
pub use error::{ScoringError, TournamentError, TournamentResult};
pub use services::{RateLimiter, RealTrendsClient, ResultWriter, TokioClock, TrendsClientConfig};
pub use traits::{Clock, TrendsSource};
pub use types::{CallStats, FinalGroup, InterestTable, TimeWindow};
