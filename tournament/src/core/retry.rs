//! Retry state machine around a single trends query
//!
//! Empty results are retried on a short schedule and then degrade to
//! `NoData`. Rate limiting and transient failures share a separate retry
//! budget; once that is spent the batch is fatal and the run must stop.

use std::future::Future;
use std::time::Duration;

use shared::{Stage, stage_error, stage_warn};

use crate::error::ScoringError;
use crate::traits::Clock;
use crate::types::InterestTable;

pub const DEFAULT_RETRY_DELAYS: [Duration; 3] = [
    Duration::from_secs(2),
    Duration::from_secs(5),
    Duration::from_secs(10),
];
pub const DEFAULT_MAX_NO_DATA_RETRIES: u32 = 2;
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_RATE_LIMIT_PAUSE: Duration = Duration::from_secs(60);

/// Result of driving one query through the policy
#[derive(Debug, Clone, PartialEq)]
pub enum RetryOutcome {
    Data(InterestTable),
    /// Every attempt came back empty
    NoData { attempts: u32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Waits before the 1st, 2nd, ... retry; the last entry repeats
    pub retry_delays: Vec<Duration>,
    pub max_no_data_retries: u32,
    /// Shared budget for rate-limited and transient failures
    pub max_retries: u32,
    pub rate_limit_pause: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retry_delays: DEFAULT_RETRY_DELAYS.to_vec(),
            max_no_data_retries: DEFAULT_MAX_NO_DATA_RETRIES,
            max_retries: DEFAULT_MAX_RETRIES,
            rate_limit_pause: DEFAULT_RATE_LIMIT_PAUSE,
        }
    }
}

impl RetryPolicy {
    pub fn with_rate_limit_pause(mut self, pause: Duration) -> Self {
        self.rate_limit_pause = pause;
        self
    }

    fn delay(&self, retry: u32) -> Duration {
        self.retry_delays
            .get(retry as usize)
            .or_else(|| self.retry_delays.last())
            .copied()
            .unwrap_or(Duration::ZERO)
    }

    /// Wait before the next attempt, or `None` when the budget for this kind
    /// of failure is spent. `retries` counts retries already made for it.
    pub fn backoff(&self, error: &ScoringError, retries: u32) -> Option<Duration> {
        match error {
            ScoringError::Empty if retries < self.max_no_data_retries => Some(self.delay(retries)),
            ScoringError::RateLimited if retries < self.max_retries => Some(self.rate_limit_pause),
            ScoringError::Transient(_) if retries < self.max_retries => Some(self.delay(retries)),
            _ => None,
        }
    }

    /// Run `query` until it yields data, degrades to `NoData`, or fails fatally
    pub async fn execute<C, F, Fut>(
        &self,
        clock: &C,
        stage: Stage,
        subjects: &[String],
        mut query: F,
    ) -> Result<RetryOutcome, ScoringError>
    where
        C: Clock + ?Sized,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<InterestTable, ScoringError>>,
    {
        let mut attempts = 0u32;
        let mut no_data_retries = 0u32;
        let mut retries = 0u32;

        loop {
            attempts += 1;
            let error = match query().await {
                Ok(table) if !table.is_empty() => return Ok(RetryOutcome::Data(table)),
                Ok(_) => ScoringError::Empty,
                Err(e) => e,
            };

            match &error {
                ScoringError::Empty => match self.backoff(&error, no_data_retries) {
                    Some(delay) => {
                        no_data_retries += 1;
                        stage_warn!(
                            stage,
                            "No data (attempt {}/{}), retrying in {}s for: {}",
                            no_data_retries,
                            self.max_no_data_retries + 1,
                            delay.as_secs_f64(),
                            subjects.join(", ")
                        );
                        clock.sleep(delay).await;
                    }
                    None => {
                        stage_warn!(
                            stage,
                            "No data after {} attempts for: {}",
                            attempts,
                            subjects.join(", ")
                        );
                        return Ok(RetryOutcome::NoData { attempts });
                    }
                },
                ScoringError::RateLimited | ScoringError::Transient(_) => {
                    match self.backoff(&error, retries) {
                        Some(delay) => {
                            retries += 1;
                            stage_warn!(
                                stage,
                                "{} (retry {}/{}), waiting {}s",
                                error,
                                retries,
                                self.max_retries,
                                delay.as_secs_f64()
                            );
                            clock.sleep(delay).await;
                        }
                        None => {
                            stage_error!(
                                stage,
                                "Giving up after {} attempts for: {} ({})",
                                attempts,
                                subjects.join(", "),
                                error
                            );
                            return Err(ScoringError::Fatal {
                                subjects: subjects.to_vec(),
                                attempts,
                                last: Box::new(error),
                            });
                        }
                    }
                }
                ScoringError::InvalidBatch { .. } | ScoringError::Fatal { .. } => return Err(error),
            }
        }
    }
}
