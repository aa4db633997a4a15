//! Typed candidate records as produced by the roster preprocessing step
//!
//! Only the fields the tournament reasons about are typed. Everything else in
//! the upstream payload (photos, league blocks, goal tallies, ...) is kept in
//! the flattened `extra` maps so it can be written back out untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::errors::{SharedError, SharedResult};

/// Prefixes of resolved entity identifiers on the trends source
const TOPIC_PREFIXES: [&str; 2] = ["/m/", "/g/"];

/// Identity block of a player record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firstname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lastname: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamRef {
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameStats {
    /// Spelling follows the upstream statistics API
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appearences: Option<u32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubstituteStats {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bench: Option<u32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One season/competition statistics entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerStatistics {
    pub team: TeamRef,
    #[serde(default)]
    pub games: GameStats,
    #[serde(default)]
    pub substitutes: SubstituteStats,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A player competing in the tournament
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub player: PlayerInfo,
    pub statistics: Vec<PlayerStatistics>,
    pub topic_id: String,
    pub topic_title: String,
    pub topic_type: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Key used to query the trends source for a candidate
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ComparisonKey {
    /// Resolved entity identifier such as `/m/0c9v2`
    Topic(String),
    /// Literal search term
    Term(String),
}

impl ComparisonKey {
    pub fn as_query(&self) -> &str {
        match self {
            ComparisonKey::Topic(id) => id,
            ComparisonKey::Term(term) => term,
        }
    }
}

impl fmt::Display for ComparisonKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_query())
    }
}

impl Candidate {
    pub fn name(&self) -> &str {
        &self.player.name
    }

    /// Team of the primary statistics entry
    pub fn team_name(&self) -> Option<&str> {
        self.statistics.first().map(|s| s.team.name.as_str())
    }

    pub fn appearances(&self) -> u32 {
        self.statistics
            .first()
            .and_then(|s| s.games.appearences)
            .unwrap_or(0)
    }

    pub fn bench(&self) -> u32 {
        self.statistics
            .first()
            .and_then(|s| s.substitutes.bench)
            .unwrap_or(0)
    }

    /// A player counts as active once they have played or sat on the bench
    pub fn is_active(&self) -> bool {
        self.appearances() > 0 || self.bench() > 0
    }

    /// The topic identifier when it names a resolved entity, the display name otherwise
    pub fn comparison_key(&self) -> ComparisonKey {
        if TOPIC_PREFIXES.iter().any(|p| self.topic_id.starts_with(p)) {
            ComparisonKey::Topic(self.topic_id.clone())
        } else {
            ComparisonKey::Term(self.player.name.clone())
        }
    }

    /// Fallback key for a candidate whose primary key is already taken in a batch
    pub fn disambiguated_key(&self) -> ComparisonKey {
        match self.team_name() {
            Some(team) => ComparisonKey::Term(format!("{} {}", self.player.name, team)),
            None => ComparisonKey::Term(self.player.name.clone()),
        }
    }

    /// Check the invariants the engine relies on. `index` is the record position in the roster.
    pub fn validate(&self, index: usize) -> SharedResult<()> {
        if self.player.name.trim().is_empty() {
            return Err(SharedError::InvalidRecord {
                index,
                reason: "player.name is empty".to_string(),
            });
        }
        if self.statistics.is_empty() {
            return Err(SharedError::InvalidRecord {
                index,
                reason: format!("{} has no statistics entry", self.player.name),
            });
        }
        if self.topic_id.trim().is_empty() {
            return Err(SharedError::MissingComparisonKey {
                name: self.player.name.clone(),
            });
        }
        Ok(())
    }
}

/// Parse and validate a roster document, either a bare array of records or an
/// object wrapping them under `players`. `source_name` is only used in error messages.
pub fn parse_roster(content: &str, source_name: &str) -> SharedResult<Vec<Candidate>> {
    let parse_error = |message: String| SharedError::RosterParse {
        source_name: source_name.to_string(),
        message,
    };

    let document: Value = serde_json::from_str(content).map_err(|e| parse_error(e.to_string()))?;
    let records = match document {
        Value::Array(_) => document,
        Value::Object(mut map) => map
            .remove("players")
            .filter(Value::is_array)
            .ok_or_else(|| parse_error("expected an array of players or a `players` array".to_string()))?,
        _ => return Err(parse_error("expected an array of players or a `players` array".to_string())),
    };

    let candidates: Vec<Candidate> =
        serde_json::from_value(records).map_err(|e| parse_error(e.to_string()))?;

    for (index, candidate) in candidates.iter().enumerate() {
        candidate.validate(index)?;
    }

    Ok(candidates)
}
