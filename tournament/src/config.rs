//! Run configuration
//!
//! Tuning knobs come from the command line; credentials come from the
//! environment, optionally seeded from a `.env` file in the working directory
//! or one of its parents. Environment variables take precedence over `.env`.

use std::path::PathBuf;
use std::time::Duration;

use crate::core::retry::{DEFAULT_RATE_LIMIT_PAUSE, RetryPolicy};
use crate::core::round_runner::MIN_BATCH_SIZE;
use crate::error::{TournamentError, TournamentResult};
use crate::services::rate_limiter::DEFAULT_MIN_INTERVAL;
use crate::services::trends_client::TrendsClientConfig;
use crate::types::{MAX_SUBJECTS_PER_QUERY, TimeWindow};

pub const SERPAPI_KEY_VAR: &str = "SERPAPI_KEY";
pub const PROXY_LIST_VAR: &str = "PROXY_LIST";

pub const DEFAULT_INPUT: &str = "public/preprocessed_players.json";
pub const DEFAULT_OUTPUT: &str = "public/trending_footballers.json";
pub const DEFAULT_THRESHOLD: usize = 25;
pub const DEFAULT_KEEP_PER_BATCH: usize = 2;

/// The knockout needs a full final group, so rounds stop no lower than this
const MIN_THRESHOLD: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct TournamentConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Rounds run while the pool is larger than this
    pub threshold: usize,
    pub keep_per_batch: usize,
    pub batch_size: usize,
    pub window: TimeWindow,
    /// Use only the first N eligible players, unshuffled
    pub test_limit: Option<usize>,
    /// Seed for the pool shuffle
    pub seed: Option<u64>,
    pub min_delay: Duration,
    pub rate_limit_pause: Duration,
    pub fetch_detail: bool,
}

impl Default for TournamentConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from(DEFAULT_INPUT),
            output: PathBuf::from(DEFAULT_OUTPUT),
            threshold: DEFAULT_THRESHOLD,
            keep_per_batch: DEFAULT_KEEP_PER_BATCH,
            batch_size: MAX_SUBJECTS_PER_QUERY,
            window: TimeWindow::default(),
            test_limit: None,
            seed: None,
            min_delay: DEFAULT_MIN_INTERVAL,
            rate_limit_pause: DEFAULT_RATE_LIMIT_PAUSE,
            fetch_detail: true,
        }
    }
}

impl TournamentConfig {
    /// Reject settings under which rounds could not shrink the pool or the
    /// knockout could not be filled
    pub fn validate(&self) -> TournamentResult<()> {
        if !(MIN_BATCH_SIZE..=MAX_SUBJECTS_PER_QUERY).contains(&self.batch_size) {
            return Err(TournamentError::config(format!(
                "batch size must be between {MIN_BATCH_SIZE} and {MAX_SUBJECTS_PER_QUERY}, got {}",
                self.batch_size
            )));
        }
        if self.keep_per_batch == 0 {
            return Err(TournamentError::config("keep-per-batch must be at least 1"));
        }
        if self.keep_per_batch >= self.batch_size {
            return Err(TournamentError::config(format!(
                "keep-per-batch ({}) must be smaller than the batch size ({})",
                self.keep_per_batch, self.batch_size
            )));
        }
        if self.threshold < MIN_THRESHOLD {
            return Err(TournamentError::config(format!(
                "threshold must be at least {MIN_THRESHOLD}, got {}",
                self.threshold
            )));
        }
        if self.test_limit == Some(0) {
            return Err(TournamentError::config("test-limit must be at least 1"));
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::default().with_rate_limit_pause(self.rate_limit_pause)
    }
}

/// Load `.env` if one exists; a missing file is not an error
pub fn load_dotenv() {
    let _ = dotenvy::dotenv();
}

/// Split a comma-separated proxy list, dropping blanks
pub fn parse_proxy_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

impl TrendsClientConfig {
    /// Build client settings from the process environment
    pub fn from_env(endpoint: &str, min_interval: Duration) -> TournamentResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok(), endpoint, min_interval)
    }

    pub fn from_lookup<F>(lookup: F, endpoint: &str, min_interval: Duration) -> TournamentResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(SERPAPI_KEY_VAR)
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                TournamentError::config(format!(
                    "{SERPAPI_KEY_VAR} must be set in the environment or .env"
                ))
            })?;
        let proxies = lookup(PROXY_LIST_VAR)
            .map(|raw| parse_proxy_list(&raw))
            .unwrap_or_default();

        let mut config = TrendsClientConfig::new(api_key);
        config.endpoint = endpoint.to_string();
        config.proxies = proxies;
        config.min_interval = min_interval;
        Ok(config)
    }
}
