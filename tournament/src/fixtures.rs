//! Test fixtures shared by the unit test modules

use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

use shared::Candidate;

use crate::error::ScoringError;
use crate::traits::{Clock, TrendsSource};
use crate::types::{InterestTable, TimeWindow};

pub fn candidate_with_team(name: &str, topic_id: &str, team: &str) -> Candidate {
    serde_json::from_value(json!({
        "player": {"id": 1, "name": name, "firstname": null, "lastname": null},
        "statistics": [{
            "team": {"id": 1, "name": team},
            "games": {"appearences": 3},
            "substitutes": {"bench": 0}
        }],
        "topic_id": topic_id,
        "topic_title": name,
        "topic_type": "Footballer"
    }))
    .expect("fixture candidate")
}

pub fn candidate(name: &str, topic_id: &str) -> Candidate {
    candidate_with_team(name, topic_id, "Test FC")
}

/// `count` candidates named `Player 01..` with topic ids `/m/p01..`
pub fn numbered(count: usize) -> Vec<Candidate> {
    (1..=count)
        .map(|i| candidate(&format!("Player {i:02}"), &format!("/m/p{i:02}")))
        .collect()
}

/// Trends source that answers every query from a fixed popularity table
/// keyed by query string, recording each call.
#[derive(Default)]
pub struct LookupSource {
    popularity: HashMap<String, f64>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl LookupSource {
    pub fn new<'a>(entries: impl IntoIterator<Item = (&'a str, f64)>) -> Self {
        Self {
            popularity: entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TrendsSource for LookupSource {
    async fn interest_over_time(
        &self,
        subjects: &[String],
        _window: &TimeWindow,
    ) -> Result<InterestTable, ScoringError> {
        self.calls.lock().unwrap().push(subjects.to_vec());
        let series = subjects
            .iter()
            .map(|s| {
                let value = self.popularity.get(s).copied().unwrap_or(0.0);
                (s.clone(), vec![value / 2.0, value])
            })
            .collect();
        Ok(InterestTable {
            dates: vec![
                "2024-01-01 00:00:00".to_string(),
                "2024-01-01 01:00:00".to_string(),
            ],
            series,
        })
    }
}

/// Clock that never blocks; sleeps are recorded and advance `now`
pub struct RecordingClock {
    start: Instant,
    sleeps: Mutex<Vec<Duration>>,
}

impl RecordingClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            sleeps: Mutex::new(Vec::new()),
        }
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

impl Default for RecordingClock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Clock for RecordingClock {
    fn now(&self) -> Instant {
        self.start + self.sleeps.lock().unwrap().iter().sum::<Duration>()
    }

    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
    }
}
