//! Ranked result persistence
//!
//! Finalists are joined back to their full roster record by name, ranked by
//! final score and written as a single JSON document. The file is replaced
//! atomically: the document is written and synced to `<path>.tmp`, then
//! renamed over the destination, so readers never observe a partial file.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

use shared::{Candidate, InterestSeries, PlayerInfo, PlayerStatistics, ScoreMap, Stage, stage_debug, stage_info};

use crate::error::{TournamentError, TournamentResult};

const UPDATED_AT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

/// The persisted document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendingReport {
    pub updated_at: String,
    pub players: Vec<TrendingEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendingEntry {
    pub rank: usize,
    pub trending_score: f64,
    pub player: PlayerInfo,
    pub statistics: Vec<PlayerStatistics>,
    pub topic_id: String,
    pub topic_title: String,
    pub topic_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interest_over_time: Option<InterestSeries>,
}

pub struct ResultWriter {
    output_path: PathBuf,
    lookup: HashMap<String, Candidate>,
}

impl ResultWriter {
    /// `metadata` is the full roster; when a name appears more than once the
    /// last record wins.
    pub fn new(output_path: impl Into<PathBuf>, metadata: &[Candidate]) -> Self {
        let lookup = metadata
            .iter()
            .map(|c| (c.name().to_string(), c.clone()))
            .collect();
        Self {
            output_path: output_path.into(),
            lookup,
        }
    }

    /// Rank finalists by score (descending, ties keep input order) and attach
    /// their roster metadata.
    pub fn build_report(
        &self,
        finalists: &[Candidate],
        scores: &ScoreMap,
        interest: Option<&HashMap<String, InterestSeries>>,
    ) -> TournamentResult<TrendingReport> {
        let mut ranked: Vec<&Candidate> = finalists.iter().collect();
        ranked.sort_by(|a, b| scores.get(b.name()).total_cmp(&scores.get(a.name())));

        let mut players = Vec::with_capacity(ranked.len());
        for (position, finalist) in ranked.into_iter().enumerate() {
            let name = finalist.name();
            let record = self
                .lookup
                .get(name)
                .ok_or_else(|| TournamentError::MetadataMissing {
                    name: name.to_string(),
                })?;

            let series = interest.and_then(|detail| detail.get(name)).cloned();
            if let Some(series) = &series {
                stage_debug!(
                    Stage::Persist,
                    "Attached {} interest points to {}",
                    series.values.len(),
                    name
                );
            }

            players.push(TrendingEntry {
                rank: position + 1,
                trending_score: scores.get(name),
                player: record.player.clone(),
                statistics: record.statistics.clone(),
                topic_id: record.topic_id.clone(),
                topic_title: record.topic_title.clone(),
                topic_type: record.topic_type.clone(),
                interest_over_time: series,
            });
        }

        Ok(TrendingReport {
            updated_at: Utc::now().format(UPDATED_AT_FORMAT).to_string(),
            players,
        })
    }

    /// Build the report and atomically replace the output file with it
    pub async fn write(
        &self,
        finalists: &[Candidate],
        scores: &ScoreMap,
        interest: Option<&HashMap<String, InterestSeries>>,
    ) -> TournamentResult<PathBuf> {
        let report = self.build_report(finalists, scores, interest)?;
        let bytes = serde_json::to_vec_pretty(&report)?;

        write_atomic(&self.output_path, &bytes)
            .await
            .map_err(|source| TournamentError::Persist {
                path: self.output_path.clone(),
                source,
            })?;

        stage_info!(
            Stage::Persist,
            "Saved {} players to {}",
            report.players.len(),
            self.output_path.display()
        );
        Ok(self.output_path.clone())
    }
}

/// Sibling temp path used while writing `path`
pub fn temp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

async fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let tmp = temp_path(path);
    let result = async {
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.sync_all().await?;
        drop(file);
        tokio::fs::rename(&tmp, path).await
    }
    .await;

    if result.is_err() {
        let _ = tokio::fs::remove_file(&tmp).await;
    }
    result
}
