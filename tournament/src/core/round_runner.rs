//! Batch elimination rounds

use std::collections::HashSet;
use std::sync::Arc;

use shared::{Candidate, ScoreMap, Stage, stage_info};

use crate::core::batch_scorer::BatchScorer;
use crate::error::TournamentResult;
use crate::traits::{Clock, TrendsSource};

/// Smallest batch that can be compared
pub const MIN_BATCH_SIZE: usize = 2;

/// Order `group` by descending score; equal scores keep their input order
pub fn rank_by_score(group: &[Candidate], scores: &ScoreMap) -> Vec<Candidate> {
    let mut ranked = group.to_vec();
    ranked.sort_by(|a, b| scores.get(b.name()).total_cmp(&scores.get(a.name())));
    ranked
}

/// Drop repeated names, keeping the first occurrence
pub fn dedup_by_name(candidates: Vec<Candidate>) -> Vec<Candidate> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|c| seen.insert(c.name().to_string()))
        .collect()
}

/// `★A(80) | ★B(61) | C(20)`, survivors starred
pub fn format_batch_line(ranked: &[Candidate], scores: &ScoreMap, survivors: usize) -> String {
    ranked
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let marker = if i < survivors { "★" } else { "" };
            format!("{marker}{}({})", c.name(), scores.get(c.name()))
        })
        .collect::<Vec<_>>()
        .join(" | ")
}

pub struct RoundRunner<S: TrendsSource, C: Clock> {
    scorer: Arc<BatchScorer<S, C>>,
    batch_size: usize,
    keep_per_batch: usize,
}

impl<S: TrendsSource, C: Clock> RoundRunner<S, C> {
    pub fn new(scorer: Arc<BatchScorer<S, C>>, batch_size: usize, keep_per_batch: usize) -> Self {
        Self {
            scorer,
            batch_size,
            keep_per_batch,
        }
    }

    /// One elimination pass over `pool`. Batches too small to compare are
    /// carried forward unscored.
    pub async fn run_round(&self, pool: &[Candidate], round: u32) -> TournamentResult<Vec<Candidate>> {
        let stage = Stage::Round(round);
        let total_batches = pool.len().div_ceil(self.batch_size);
        stage_info!(
            stage,
            "Processing {} players in {} batches",
            pool.len(),
            total_batches
        );

        let mut survivors = Vec::new();
        for (index, batch) in pool.chunks(self.batch_size).enumerate() {
            if batch.len() < MIN_BATCH_SIZE {
                stage_info!(
                    stage,
                    "Batch {}/{}: {} passes through unscored",
                    index + 1,
                    total_batches,
                    batch.iter().map(|c| c.name()).collect::<Vec<_>>().join(", ")
                );
                survivors.extend_from_slice(batch);
                continue;
            }

            let scores = self.scorer.score(stage, batch).await?;
            let ranked = rank_by_score(batch, &scores);
            let kept = self.keep_per_batch.min(ranked.len());

            stage_info!(
                stage,
                "Batch {}/{}: {}",
                index + 1,
                total_batches,
                format_batch_line(&ranked, &scores, kept)
            );
            survivors.extend(ranked.into_iter().take(kept));
        }

        let survivors = dedup_by_name(survivors);
        stage_info!(
            stage,
            "Round {} complete: {} -> {} players",
            round,
            pool.len(),
            survivors.len()
        );
        Ok(survivors)
    }
}
