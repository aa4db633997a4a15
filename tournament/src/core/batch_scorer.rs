//! Scores one batch of candidates with a single group query

use std::collections::HashMap;
use std::sync::Arc;

use shared::{Candidate, InterestSeries, ScoreMap, Stage, stage_debug, stage_warn};

use crate::core::retry::{RetryOutcome, RetryPolicy};
use crate::error::{TournamentError, TournamentResult};
use crate::traits::{Clock, TrendsSource};
use crate::types::TimeWindow;

/// Query subjects for a batch plus the candidate name each one answers for
#[derive(Debug, Clone, PartialEq)]
pub struct SubjectPlan {
    pub subjects: Vec<String>,
    /// (subject, candidate name), one per input candidate
    pub owners: Vec<(String, String)>,
}

impl SubjectPlan {
    /// Resolve comparison keys. A key already claimed by a different record
    /// is replaced with the candidate's team-suffixed key, even when the two
    /// records share a name. Only identical records (same name and team)
    /// share one subject.
    pub fn for_batch(candidates: &[Candidate]) -> Self {
        let mut claimed: HashMap<String, (String, Option<String>)> = HashMap::new();
        let mut subjects = Vec::new();
        let mut owners = Vec::with_capacity(candidates.len());

        for candidate in candidates {
            let name = candidate.name().to_string();
            let identity = (name.clone(), candidate.team_name().map(str::to_string));
            let mut subject = candidate.comparison_key().as_query().to_string();

            if claimed.get(&subject).is_some_and(|owner| *owner != identity) {
                subject = candidate.disambiguated_key().as_query().to_string();
            }
            if !claimed.contains_key(&subject) {
                claimed.insert(subject.clone(), identity);
                subjects.push(subject.clone());
            }
            owners.push((subject, name));
        }

        Self { subjects, owners }
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for (_, name) in &self.owners {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
        names
    }
}

pub struct BatchScorer<S: TrendsSource, C: Clock> {
    source: Arc<S>,
    clock: Arc<C>,
    policy: RetryPolicy,
    window: TimeWindow,
}

impl<S: TrendsSource, C: Clock> BatchScorer<S, C> {
    pub fn new(source: Arc<S>, clock: Arc<C>, policy: RetryPolicy, window: TimeWindow) -> Self {
        Self {
            source,
            clock,
            policy,
            window,
        }
    }

    /// Score `candidates` relative to each other. The map holds exactly one
    /// entry per distinct candidate name; a batch that never returns data
    /// scores zero across the board.
    pub async fn score(&self, stage: Stage, candidates: &[Candidate]) -> TournamentResult<ScoreMap> {
        if candidates.is_empty() {
            return Ok(ScoreMap::new());
        }

        let plan = SubjectPlan::for_batch(candidates);
        stage_debug!(stage, "Querying subjects: {}", plan.subjects.join(", "));

        let source = self.source.as_ref();
        let window = &self.window;
        let subjects = plan.subjects.as_slice();
        let outcome = self
            .policy
            .execute(self.clock.as_ref(), stage, subjects, move || {
                source.interest_over_time(subjects, window)
            })
            .await
            .map_err(|source| TournamentError::BatchFailed {
                candidates: plan.names(),
                source,
            })?;

        let scores = match outcome {
            RetryOutcome::Data(table) => {
                let mut scores = ScoreMap::new();
                for (subject, name) in &plan.owners {
                    scores.merge_max(name, table.peak(subject).unwrap_or(0.0));
                }
                scores
            }
            RetryOutcome::NoData { .. } => {
                let names = plan.names();
                ScoreMap::zeroed(names.iter().map(String::as_str))
            }
        };
        Ok(scores)
    }

    /// One unretried query for the finalists' full series, keyed by name.
    /// Any failure is logged and yields an empty map.
    pub async fn interest_detail(&self, finalists: &[Candidate]) -> HashMap<String, InterestSeries> {
        let plan = SubjectPlan::for_batch(finalists);
        stage_debug!(
            Stage::Persist,
            "Fetching interest over time for: {}",
            plan.subjects.join(", ")
        );

        match self.source.interest_over_time(&plan.subjects, &self.window).await {
            Ok(table) => plan
                .owners
                .iter()
                .filter_map(|(subject, name)| {
                    table.series_for(subject).map(|series| (name.clone(), series))
                })
                .collect(),
            Err(e) => {
                stage_warn!(Stage::Persist, "Could not fetch detailed interest data: {}", e);
                HashMap::new()
            }
        }
    }
}
