//! SerpApi Google Trends client
//!
//! Each query is a single `GET /search.json?engine=google_trends` request for
//! up to five comma-joined subjects. The response's timeline rows are folded
//! into an [`InterestTable`]; HTTP 429 maps to `RateLimited`, a readable body
//! with no timeline rows maps to `Empty`, and everything else that goes wrong
//! maps to `Transient`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use crate::error::{ScoringError, TournamentError, TournamentResult};
use crate::services::clock::TokioClock;
use crate::services::rate_limiter::{DEFAULT_MIN_INTERVAL, RateLimiter};
use crate::traits::{Clock, TrendsSource};
use crate::types::{CallStats, InterestTable, MAX_SUBJECTS_PER_QUERY, TimeWindow};

pub const DEFAULT_ENDPOINT: &str = "https://serpapi.com";

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Connection settings for the trends client
#[derive(Debug, Clone)]
pub struct TrendsClientConfig {
    pub endpoint: String,
    pub api_key: String,
    /// Proxy URLs rotated per request; empty for direct connections
    pub proxies: Vec<String>,
    pub timeout: Duration,
    pub min_interval: Duration,
}

impl TrendsClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: api_key.into(),
            proxies: Vec::new(),
            timeout: Duration::from_secs(30),
            min_interval: DEFAULT_MIN_INTERVAL,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TrendsResponse {
    #[serde(default)]
    interest_over_time: Option<InterestOverTime>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InterestOverTime {
    #[serde(default)]
    timeline_data: Vec<TimelineRow>,
}

#[derive(Debug, Deserialize)]
struct TimelineRow {
    #[serde(default)]
    date: String,
    #[serde(default)]
    timestamp: Option<Value>,
    #[serde(default)]
    values: Vec<TimelineValue>,
}

#[derive(Debug, Deserialize)]
struct TimelineValue {
    #[serde(default)]
    query: Option<String>,
    #[serde(default)]
    extracted_value: Option<f64>,
    #[serde(default)]
    value: Option<String>,
}

impl TimelineValue {
    fn interest(&self) -> f64 {
        self.extracted_value
            .or_else(|| self.value.as_deref().and_then(|v| v.trim().parse().ok()))
            .unwrap_or(0.0)
    }
}

/// Real trends client with request pacing and proxy rotation
pub struct RealTrendsClient<C: Clock = TokioClock> {
    config: TrendsClientConfig,
    http_clients: Vec<reqwest::Client>,
    next_client: AtomicUsize,
    limiter: RateLimiter<C>,
    calls: AtomicU64,
    call_micros: AtomicU64,
}

impl RealTrendsClient<TokioClock> {
    pub fn new(config: TrendsClientConfig) -> TournamentResult<Self> {
        Self::with_clock(config, Arc::new(TokioClock::new()))
    }
}

impl<C: Clock> RealTrendsClient<C> {
    pub fn with_clock(config: TrendsClientConfig, clock: Arc<C>) -> TournamentResult<Self> {
        let http_clients = Self::build_http_clients(&config)?;
        let limiter = RateLimiter::new(clock, config.min_interval);

        Ok(Self {
            config,
            http_clients,
            next_client: AtomicUsize::new(0),
            limiter,
            calls: AtomicU64::new(0),
            call_micros: AtomicU64::new(0),
        })
    }

    fn build_http_clients(config: &TrendsClientConfig) -> TournamentResult<Vec<reqwest::Client>> {
        let build = |proxy: Option<&str>| -> TournamentResult<reqwest::Client> {
            let mut builder = reqwest::Client::builder().timeout(config.timeout);
            if let Some(url) = proxy {
                let proxy = reqwest::Proxy::all(url)
                    .map_err(|e| TournamentError::config(format!("Invalid proxy {url}: {e}")))?;
                builder = builder.proxy(proxy);
            }
            builder
                .build()
                .map_err(|e| TournamentError::config(format!("Failed to build HTTP client: {e}")))
        };

        if config.proxies.is_empty() {
            return Ok(vec![build(None)?]);
        }
        config.proxies.iter().map(|p| build(Some(p))).collect()
    }

    /// Calls made so far and their accumulated duration
    pub fn stats(&self) -> CallStats {
        CallStats {
            calls: self.calls.load(Ordering::Relaxed),
            total_time: Duration::from_micros(self.call_micros.load(Ordering::Relaxed)),
        }
    }

    /// Round-robin through the configured proxies
    fn next_http_client(&self) -> &reqwest::Client {
        let index = self.next_client.fetch_add(1, Ordering::Relaxed);
        &self.http_clients[index % self.http_clients.len()]
    }

    fn search_url(&self) -> String {
        format!("{}/search.json", self.config.endpoint.trim_end_matches('/'))
    }

    async fn send_query(
        &self,
        subjects: &[String],
        window: &TimeWindow,
    ) -> Result<InterestTable, ScoringError> {
        let query = subjects.join(",");
        let category = window.category.to_string();

        let response = self
            .next_http_client()
            .get(self.search_url())
            .query(&[
                ("engine", "google_trends"),
                ("data_type", "TIMESERIES"),
                ("q", query.as_str()),
                ("date", window.timeframe.as_str()),
                ("geo", window.geo.as_str()),
                ("cat", category.as_str()),
                ("api_key", self.config.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| ScoringError::Transient(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ScoringError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(200).collect();
            return Err(ScoringError::Transient(format!(
                "trends API returned {status}: {snippet}"
            )));
        }

        let body: TrendsResponse = response
            .json()
            .await
            .map_err(|e| ScoringError::Transient(format!("Failed to parse trends response: {e}")))?;

        build_table(body, subjects)
    }
}

#[async_trait]
impl<C: Clock + 'static> TrendsSource for RealTrendsClient<C> {
    async fn interest_over_time(
        &self,
        subjects: &[String],
        window: &TimeWindow,
    ) -> Result<InterestTable, ScoringError> {
        if subjects.is_empty() || subjects.len() > MAX_SUBJECTS_PER_QUERY {
            return Err(ScoringError::InvalidBatch {
                size: subjects.len(),
            });
        }

        self.limiter.wait_if_needed().await;

        let started = std::time::Instant::now();
        let result = self.send_query(subjects, window).await;
        let elapsed = started.elapsed();

        self.calls.fetch_add(1, Ordering::Relaxed);
        self.call_micros
            .fetch_add(elapsed.as_micros() as u64, Ordering::Relaxed);
        tracing::debug!(
            subjects = %subjects.join(", "),
            elapsed_ms = elapsed.as_millis() as u64,
            ok = result.is_ok(),
            "trends query finished"
        );

        result
    }
}

fn format_row_date(row: &TimelineRow) -> String {
    let seconds = match &row.timestamp {
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        Some(Value::Number(n)) => n.as_i64(),
        _ => None,
    };
    seconds
        .and_then(|s| DateTime::<Utc>::from_timestamp(s, 0))
        .map(|dt| dt.format(DATE_FORMAT).to_string())
        .unwrap_or_else(|| row.date.clone())
}

/// Fold timeline rows into per-subject series. Values are matched to subjects
/// by their `query` echo, falling back to position within the row.
fn build_table(body: TrendsResponse, subjects: &[String]) -> Result<InterestTable, ScoringError> {
    let rows = body
        .interest_over_time
        .map(|iot| iot.timeline_data)
        .unwrap_or_default();

    if rows.is_empty() {
        if let Some(message) = body.error {
            tracing::debug!(message = %message, "trends source reported no results");
        }
        return Err(ScoringError::Empty);
    }

    let mut dates = Vec::with_capacity(rows.len());
    let mut series: HashMap<String, Vec<f64>> = subjects
        .iter()
        .map(|s| (s.clone(), Vec::with_capacity(rows.len())))
        .collect();

    for row in &rows {
        dates.push(format_row_date(row));
        for (position, subject) in subjects.iter().enumerate() {
            let value = row
                .values
                .iter()
                .find(|v| v.query.as_deref() == Some(subject.as_str()))
                .or_else(|| row.values.get(position))
                .map(TimelineValue::interest)
                .unwrap_or(0.0);
            if let Some(values) = series.get_mut(subject) {
                values.push(value);
            }
        }
    }

    Ok(InterestTable { dates, series })
}
