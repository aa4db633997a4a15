//! Trait definitions with mockall annotations for testing
//!
//! The trends source and the clock are the two seams the tournament is
//! injected through: production wires the SerpApi client and the tokio clock,
//! tests wire scripted sources and a recording clock.

use async_trait::async_trait;
use std::time::Duration;
use tokio::time::Instant;

use crate::error::ScoringError;
use crate::types::{InterestTable, TimeWindow};

/// External group-comparison source
///
/// One invocation is exactly one network request; implementations never
/// retry internally. `subjects` holds 1 to 5 query strings.
#[mockall::automock]
#[async_trait]
pub trait TrendsSource: Send + Sync {
    /// Fetch relative interest over `window` for every subject in one query
    async fn interest_over_time(
        &self,
        subjects: &[String],
        window: &TimeWindow,
    ) -> Result<InterestTable, ScoringError>;
}

/// Time source for pacing and backoff
#[mockall::automock]
#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;

    async fn sleep(&self, duration: Duration);
}
