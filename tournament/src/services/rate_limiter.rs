//! Process-wide pacing of trends queries
//!
//! The upstream limit is calls per unit of time, so every query goes through a
//! single limiter that enforces a minimum gap between consecutive calls. The
//! last-call stamp sits behind an async mutex held for the whole wait, which
//! also serialises callers if batches are ever scored concurrently.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::traits::Clock;

/// Minimum gap between two trends queries
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_secs(1);

pub struct RateLimiter<C: Clock> {
    clock: Arc<C>,
    min_interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl<C: Clock> RateLimiter<C> {
    pub fn new(clock: Arc<C>, min_interval: Duration) -> Self {
        Self {
            clock,
            min_interval,
            last_call: Mutex::new(None),
        }
    }

    /// Sleep until the minimum interval since the previous call has elapsed,
    /// then stamp the current time as the latest call. Returns the time waited.
    pub async fn wait_if_needed(&self) -> Duration {
        let mut last_call = self.last_call.lock().await;

        let waited = match *last_call {
            Some(previous) => {
                let elapsed = self.clock.now().saturating_duration_since(previous);
                let remaining = self.min_interval.saturating_sub(elapsed);
                if !remaining.is_zero() {
                    self.clock.sleep(remaining).await;
                }
                remaining
            }
            None => Duration::ZERO,
        };

        *last_call = Some(self.clock.now());
        waited
    }
}
