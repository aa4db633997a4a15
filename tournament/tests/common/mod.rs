//! Common test utilities for tournament integration tests

use serde_json::{Value, json};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::{Request, Respond, ResponseTemplate};

use tournament::{RealTrendsClient, TournamentConfig, TrendsClientConfig};

/// Roster record as the preprocessing step writes it
pub fn player_record(name: &str, topic_id: &str, appearances: Option<u32>, bench: Option<u32>) -> Value {
    json!({
        "player": {
            "id": 1000,
            "name": name,
            "firstname": name.split(' ').next(),
            "lastname": name.split(' ').last(),
            "age": 27,
            "nationality": "England",
            "photo": "https://media.example/players/1000.png"
        },
        "statistics": [{
            "team": {"id": 42, "name": "Arsenal", "logo": "https://media.example/teams/42.png"},
            "league": {"id": 39, "name": "Premier League"},
            "games": {"appearences": appearances, "lineups": 0, "position": "Midfielder"},
            "substitutes": {"in": 0, "out": 0, "bench": bench},
            "goals": {"total": 3}
        }],
        "topic_id": topic_id,
        "topic_title": name,
        "topic_type": "Footballer"
    })
}

/// `Player 01..` with topic ids `/m/p01..`; every tenth has no resolved topic
/// and is queried by name
pub fn numbered_roster(count: usize) -> Vec<Value> {
    (1..=count)
        .map(|i| {
            let name = format!("Player {i:02}");
            let topic = if i % 10 == 0 { name.clone() } else { format!("/m/p{i:02}") };
            player_record(&name, &topic, Some(5), None)
        })
        .collect()
}

/// Subject each numbered player is queried under
pub fn numbered_subject(i: usize) -> String {
    if i % 10 == 0 {
        format!("Player {i:02}")
    } else {
        format!("/m/p{i:02}")
    }
}

pub fn write_roster(dir: &Path, records: &[Value]) -> PathBuf {
    let path = dir.join("preprocessed_players.json");
    std::fs::write(&path, serde_json::to_string_pretty(records).unwrap()).unwrap();
    path
}

pub fn test_config(dir: &Path, input: PathBuf) -> TournamentConfig {
    TournamentConfig {
        input,
        output: dir.join("public").join("trending_footballers.json"),
        min_delay: Duration::ZERO,
        rate_limit_pause: Duration::ZERO,
        ..TournamentConfig::default()
    }
}

pub fn client_for(endpoint: &str) -> Arc<RealTrendsClient> {
    let mut config = TrendsClientConfig::new("integration-key");
    config.endpoint = endpoint.to_string();
    config.min_interval = Duration::ZERO;
    Arc::new(RealTrendsClient::new(config).unwrap())
}

/// Answers SerpApi timeseries queries from a fixed popularity table keyed by
/// subject, recording every `q` it sees
#[derive(Clone, Default)]
pub struct PopularityResponder {
    popularity: Arc<HashMap<String, f64>>,
    seen: Arc<Mutex<Vec<Vec<String>>>>,
}

impl PopularityResponder {
    pub fn new(popularity: HashMap<String, f64>) -> Self {
        Self {
            popularity: Arc::new(popularity),
            seen: Arc::default(),
        }
    }

    pub fn queries(&self) -> Vec<Vec<String>> {
        self.seen.lock().unwrap().clone()
    }
}

impl Respond for PopularityResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let q = request
            .url
            .query_pairs()
            .find(|(k, _)| k == "q")
            .map(|(_, v)| v.into_owned())
            .unwrap_or_default();
        let subjects: Vec<String> = q.split(',').map(str::to_string).collect();
        self.seen.lock().unwrap().push(subjects.clone());

        let rows: Vec<Value> = [(1_717_200_000, 0.5), (1_717_203_600, 1.0)]
            .iter()
            .map(|(timestamp, factor)| {
                let values: Vec<Value> = subjects
                    .iter()
                    .map(|s| {
                        let value = self.popularity.get(s).copied().unwrap_or(0.0) * factor;
                        json!({"query": s, "value": value.to_string(), "extracted_value": value})
                    })
                    .collect();
                json!({"date": "Jun 1, 2024", "timestamp": timestamp.to_string(), "values": values})
            })
            .collect();

        ResponseTemplate::new(200).set_body_json(json!({
            "search_metadata": {"status": "Success"},
            "interest_over_time": {"timeline_data": rows}
        }))
    }
}
