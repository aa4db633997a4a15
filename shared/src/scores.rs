//! Group-relative scores and interest series

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Round a score to two decimals, the precision scores are reported with
pub fn round_score(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Candidate name -> score for a single group query.
///
/// Scores from different queries are not comparable; only the order within
/// one map means anything. Missing names read as 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreMap(HashMap<String, f64>);

impl ScoreMap {
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    /// Every name mapped to 0, used when a batch degrades after exhausting no-data retries
    pub fn zeroed<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        Self(names.into_iter().map(|n| (n.to_string(), 0.0)).collect())
    }

    pub fn get(&self, name: &str) -> f64 {
        self.0.get(name).copied().unwrap_or(0.0)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, score: f64) {
        self.0.insert(name.into(), score);
    }

    /// Keep the higher of the existing and new score for `name`
    pub fn merge_max(&mut self, name: &str, score: f64) {
        self.0
            .entry(name.to_string())
            .and_modify(|s| *s = s.max(score))
            .or_insert(score);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Interest-over-time series for one finalist
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InterestSeries {
    pub values: Vec<f64>,
    pub dates: Vec<String>,
}
