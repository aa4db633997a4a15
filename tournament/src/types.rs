//! Tournament-specific data types

use std::collections::HashMap;
use std::time::Duration;

use shared::{Candidate, InterestSeries, ScoreMap, round_score};

/// Maximum subjects the trends source compares in one query
pub const MAX_SUBJECTS_PER_QUERY: usize = 5;

/// Relative time window and filters a trends query is scoped to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeWindow {
    /// Relative window in the source's syntax, e.g. `now 1-d`
    pub timeframe: String,
    /// Region code, empty for worldwide
    pub geo: String,
    /// Category filter, 0 for all categories
    pub category: u32,
}

impl Default for TimeWindow {
    fn default() -> Self {
        Self {
            timeframe: "now 1-d".to_string(),
            geo: String::new(),
            category: 0,
        }
    }
}

/// Time-indexed relative interest (0-100) per queried subject
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InterestTable {
    /// Row timestamps rendered as `%Y-%m-%d %H:%M:%S` UTC
    pub dates: Vec<String>,
    /// One value per row, keyed by the subject string that was queried
    pub series: HashMap<String, Vec<f64>>,
}

impl InterestTable {
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty() || self.series.values().all(|v| v.is_empty())
    }

    /// Peak interest of `subject` over the window, rounded to two decimals
    pub fn peak(&self, subject: &str) -> Option<f64> {
        self.series
            .get(subject)
            .and_then(|values| values.iter().copied().reduce(f64::max))
            .map(round_score)
    }

    pub fn series_for(&self, subject: &str) -> Option<InterestSeries> {
        self.series.get(subject).map(|values| InterestSeries {
            values: values.clone(),
            dates: self.dates.clone(),
        })
    }
}

/// The five finalists in ranking order along with their final group scores
#[derive(Debug, Clone, PartialEq)]
pub struct FinalGroup {
    pub ranked: Vec<Candidate>,
    pub scores: ScoreMap,
}

impl FinalGroup {
    pub fn names(&self) -> Vec<&str> {
        self.ranked.iter().map(|c| c.name()).collect()
    }
}

/// Call counters kept by the trends client
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CallStats {
    pub calls: u64,
    pub total_time: Duration,
}

impl CallStats {
    pub fn average(&self) -> Duration {
        if self.calls == 0 {
            Duration::ZERO
        } else {
            self.total_time / self.calls as u32
        }
    }

    /// One-line run summary given the wall time of the whole run
    pub fn summary(&self, total: Duration) -> String {
        format!(
            "total time {:.1}s, {} API calls, average call {:.1}s",
            total.as_secs_f64(),
            self.calls,
            self.average().as_secs_f64()
        )
    }
}
