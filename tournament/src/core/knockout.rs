//! Final knockout over a pool at or below the round threshold
//!
//! Phases: seed the first five, challenge the running top four with every
//! other candidate, re-test every non-finalist against the settled top four
//! to recover the true 5th place, then score the final five together.

use std::sync::Arc;

use shared::{Candidate, Stage, stage_debug, stage_info};

use crate::core::batch_scorer::BatchScorer;
use crate::core::round_runner::{dedup_by_name, format_batch_line, rank_by_score};
use crate::error::{TournamentError, TournamentResult};
use crate::traits::{Clock, TrendsSource};
use crate::types::FinalGroup;

pub const FINAL_GROUP_SIZE: usize = 5;
const TOP_SIZE: usize = FINAL_GROUP_SIZE - 1;

/// State after the challenge phase
#[derive(Debug, Clone, PartialEq)]
pub struct ChallengeOutcome {
    pub top4: Vec<Candidate>,
    /// Best losing challenger and the score it had in its own comparison
    pub provisional_fifth: Option<(Candidate, f64)>,
}

/// Score each of `candidates` against `top4` and return the one scoring
/// highest in its own comparison. Ties go to the earlier candidate.
pub async fn find_best_fifth<S: TrendsSource, C: Clock>(
    top4: &[Candidate],
    candidates: &[Candidate],
    scorer: &BatchScorer<S, C>,
) -> TournamentResult<(Candidate, f64)> {
    let stage = Stage::FifthRecovery;
    stage_info!(
        stage,
        "Testing {} players for 5th place against the final top 4",
        candidates.len()
    );

    let mut best: Option<(Candidate, f64)> = None;
    for (index, candidate) in candidates.iter().enumerate() {
        let mut group = top4.to_vec();
        group.push(candidate.clone());

        let scores = scorer.score(stage, &group).await?;
        let score = scores.get(candidate.name());

        if best.as_ref().is_none_or(|(_, best_score)| score > *best_score) {
            stage_info!(stage, "New best 5th: {} ({})", candidate.name(), score);
            best = Some((candidate.clone(), score));
        }
        stage_debug!(
            stage,
            "Test {}/{}: {}",
            index + 1,
            candidates.len(),
            format_batch_line(&rank_by_score(&group, &scores), &scores, TOP_SIZE)
        );
    }

    best.ok_or(TournamentError::InsufficientCandidates {
        required: FINAL_GROUP_SIZE,
        available: top4.len(),
    })
}

pub struct KnockoutFinalizer<S: TrendsSource, C: Clock> {
    scorer: Arc<BatchScorer<S, C>>,
}

impl<S: TrendsSource, C: Clock> KnockoutFinalizer<S, C> {
    pub fn new(scorer: Arc<BatchScorer<S, C>>) -> Self {
        Self { scorer }
    }

    /// Score the first five of `pool` together, ranked
    pub async fn seed(&self, pool: &[Candidate]) -> TournamentResult<Vec<Candidate>> {
        let seed = &pool[..FINAL_GROUP_SIZE.min(pool.len())];
        let scores = self.scorer.score(Stage::Knockout, seed).await?;
        let ranked = rank_by_score(seed, &scores);

        stage_info!(
            Stage::Knockout,
            "Initial top 5: {}",
            format_batch_line(&ranked, &scores, TOP_SIZE)
        );
        Ok(ranked)
    }

    /// Challenge the running top four with each candidate in turn. A
    /// challenger that places in the top four of its comparison replaces
    /// the weakest member.
    pub async fn challenge(
        &self,
        top4: Vec<Candidate>,
        challengers: &[Candidate],
    ) -> TournamentResult<ChallengeOutcome> {
        let stage = Stage::Knockout;
        let mut top4 = top4;
        let mut provisional_fifth: Option<(Candidate, f64)> = None;

        for (index, challenger) in challengers.iter().enumerate() {
            let mut group = top4.clone();
            group.push(challenger.clone());

            let scores = self.scorer.score(stage, &group).await?;
            let ranked = rank_by_score(&group, &scores);

            if ranked[..TOP_SIZE].contains(challenger) {
                stage_info!(stage, "{} enters the top 4", challenger.name());
                top4 = ranked[..TOP_SIZE].to_vec();
            } else {
                let score = scores.get(challenger.name());
                if provisional_fifth
                    .as_ref()
                    .is_none_or(|(_, best_score)| score > *best_score)
                {
                    provisional_fifth = Some((challenger.clone(), score));
                }
            }

            stage_info!(
                stage,
                "Challenge {}/{}: {}",
                index + 1,
                challengers.len(),
                format_batch_line(&ranked, &scores, TOP_SIZE)
            );
        }

        Ok(ChallengeOutcome {
            top4,
            provisional_fifth,
        })
    }

    /// Run every phase over `pool` and return the final five in rank order.
    /// Repeated names are dropped first, keeping the first occurrence.
    pub async fn finalize(&self, pool: &[Candidate]) -> TournamentResult<FinalGroup> {
        let pool = dedup_by_name(pool.to_vec());
        if pool.len() < FINAL_GROUP_SIZE {
            return Err(TournamentError::InsufficientCandidates {
                required: FINAL_GROUP_SIZE,
                available: pool.len(),
            });
        }
        stage_info!(
            Stage::Knockout,
            "Starting knockout with {} players",
            pool.len()
        );

        let seeded = self.seed(&pool).await?;
        let outcome = self
            .challenge(seeded[..TOP_SIZE].to_vec(), &pool[FINAL_GROUP_SIZE..])
            .await?;

        if let Some((candidate, score)) = &outcome.provisional_fifth {
            stage_debug!(
                Stage::Knockout,
                "Challenge-phase 5th was {} ({}); re-testing all non-finalists",
                candidate.name(),
                score
            );
        }

        let remaining: Vec<Candidate> = pool
            .iter()
            .filter(|c| !outcome.top4.contains(c))
            .cloned()
            .collect();
        let (fifth, _) = find_best_fifth(&outcome.top4, &remaining, &self.scorer).await?;

        let mut group = outcome.top4;
        group.push(fifth);
        let scores = self.scorer.score(Stage::Final, &group).await?;
        let ranked = rank_by_score(&group, &scores);

        stage_info!(
            Stage::Final,
            "Final ranking: {}",
            format_batch_line(&ranked, &scores, FINAL_GROUP_SIZE)
        );
        Ok(FinalGroup { ranked, scores })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::retry::RetryPolicy;
    use crate::error::ScoringError;
    use crate::fixtures::{LookupSource, RecordingClock, candidate, numbered};
    use crate::types::{InterestTable, TimeWindow};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    fn scorer_for<S: TrendsSource>(source: Arc<S>) -> Arc<BatchScorer<S, RecordingClock>> {
        Arc::new(BatchScorer::new(
            source,
            Arc::new(RecordingClock::new()),
            RetryPolicy::default(),
            TimeWindow::default(),
        ))
    }

    fn index_source(count: usize) -> LookupSource {
        let keys: Vec<(String, f64)> = (1..=count)
            .map(|i| (format!("/m/p{i:02}"), i as f64 * 5.0))
            .collect();
        LookupSource::new(keys.iter().map(|(k, v)| (k.as_str(), *v)))
    }

    /// Fixed base popularity, except that `/m/x` is scored at 5 whenever
    /// `/m/t4` is in the same query
    struct ContextualSource {
        base: HashMap<&'static str, f64>,
        calls: Mutex<u32>,
    }

    #[async_trait]
    impl TrendsSource for ContextualSource {
        async fn interest_over_time(
            &self,
            subjects: &[String],
            _window: &TimeWindow,
        ) -> Result<InterestTable, ScoringError> {
            *self.calls.lock().unwrap() += 1;
            let with_t4 = subjects.iter().any(|s| s == "/m/t4");
            let series = subjects
                .iter()
                .map(|s| {
                    let value = if s == "/m/x" && with_t4 {
                        5.0
                    } else {
                        self.base.get(s.as_str()).copied().unwrap_or(0.0)
                    };
                    (s.clone(), vec![value])
                })
                .collect();
            Ok(InterestTable {
                dates: vec!["2024-01-01 00:00:00".to_string()],
                series,
            })
        }
    }

    fn recovery_pool() -> Vec<Candidate> {
        ["T1", "T2", "T3", "T4", "S5", "X", "Star", "W"]
            .iter()
            .map(|n| candidate(n, &format!("/m/{}", n.to_lowercase())))
            .collect()
    }

    fn contextual_source() -> ContextualSource {
        ContextualSource {
            base: HashMap::from([
                ("/m/t1", 90.0),
                ("/m/t2", 80.0),
                ("/m/t3", 70.0),
                ("/m/t4", 35.0),
                ("/m/s5", 10.0),
                ("/m/x", 40.0),
                ("/m/star", 95.0),
                ("/m/w", 30.0),
            ]),
            calls: Mutex::new(0),
        }
    }

    fn names(candidates: &[Candidate]) -> Vec<&str> {
        candidates.iter().map(|c| c.name()).collect()
    }

    #[tokio::test]
    async fn test_knockout_is_deterministic_for_fixed_scores() {
        let pool = numbered(12);

        let first = KnockoutFinalizer::new(scorer_for(Arc::new(index_source(12))))
            .finalize(&pool)
            .await
            .unwrap();
        let second = KnockoutFinalizer::new(scorer_for(Arc::new(index_source(12))))
            .finalize(&pool)
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(
            first.names(),
            vec!["Player 12", "Player 11", "Player 10", "Player 09", "Player 08"]
        );
        assert_eq!(first.scores.get("Player 12"), 60.0);
    }

    #[tokio::test]
    async fn test_challenge_phase_tracks_running_top_four() {
        let source = Arc::new(contextual_source());
        let finalizer = KnockoutFinalizer::new(scorer_for(source));
        let pool = recovery_pool();

        let seeded = finalizer.seed(&pool).await.unwrap();
        assert_eq!(names(&seeded), vec!["T1", "T2", "T3", "T4", "S5"]);

        let outcome = finalizer
            .challenge(seeded[..4].to_vec(), &pool[5..])
            .await
            .unwrap();
        assert_eq!(names(&outcome.top4), vec!["Star", "T1", "T2", "T3"]);

        let (fifth, score) = outcome.provisional_fifth.unwrap();
        assert_eq!(fifth.name(), "W");
        assert_eq!(score, 30.0);
    }

    #[tokio::test]
    async fn test_recovery_pass_picks_early_loser() {
        let source = Arc::new(contextual_source());
        let finalizer = KnockoutFinalizer::new(scorer_for(source.clone()));

        let result = finalizer.finalize(&recovery_pool()).await.unwrap();

        // X lost its challenge only because T4 was in the group
        assert_eq!(result.names(), vec!["Star", "T1", "T2", "T3", "X"]);
        assert_eq!(result.scores.get("X"), 40.0);
        // seed + 3 challenges + 4 recovery tests + final
        assert_eq!(*source.calls.lock().unwrap(), 9);
    }

    #[tokio::test]
    async fn test_find_best_fifth_keeps_earliest_on_tie() {
        let source = Arc::new(LookupSource::new([
            ("/m/a", 50.0),
            ("/m/b", 50.0),
            ("/m/c", 20.0),
        ]));
        let scorer = scorer_for(source);
        let top4 = numbered(4);
        let candidates = vec![
            candidate("C", "/m/c"),
            candidate("A", "/m/a"),
            candidate("B", "/m/b"),
        ];

        let (fifth, score) = find_best_fifth(&top4, &candidates, &scorer).await.unwrap();
        assert_eq!(fifth.name(), "A");
        assert_eq!(score, 50.0);
    }

    #[tokio::test]
    async fn test_repeated_name_reaches_final_once() {
        let source = Arc::new(LookupSource::new([
            ("/m/twin1", 90.0),
            ("/m/twin2", 10.0),
            ("/m/a", 80.0),
            ("/m/b", 70.0),
            ("/m/c", 60.0),
            ("/m/d", 50.0),
        ]));
        let pool = vec![
            candidate("Twin", "/m/twin1"),
            candidate("Twin", "/m/twin2"),
            candidate("A", "/m/a"),
            candidate("B", "/m/b"),
            candidate("C", "/m/c"),
            candidate("D", "/m/d"),
        ];

        let result = KnockoutFinalizer::new(scorer_for(source))
            .finalize(&pool)
            .await
            .unwrap();
        assert_eq!(result.names(), vec!["Twin", "A", "B", "C", "D"]);
    }

    #[tokio::test]
    async fn test_duplicates_can_leave_too_few_for_a_final() {
        let pool = vec![
            candidate("Twin", "/m/twin1"),
            candidate("Twin", "/m/twin2"),
            candidate("A", "/m/a"),
            candidate("B", "/m/b"),
            candidate("C", "/m/c"),
        ];
        let finalizer = KnockoutFinalizer::new(scorer_for(Arc::new(LookupSource::default())));
        assert!(matches!(
            finalizer.finalize(&pool).await,
            Err(TournamentError::InsufficientCandidates { required: 5, available: 4 })
        ));
    }

    #[tokio::test]
    async fn test_pool_smaller_than_five_is_rejected() {
        let finalizer = KnockoutFinalizer::new(scorer_for(Arc::new(index_source(4))));
        let result = finalizer.finalize(&numbered(4)).await;
        assert!(matches!(
            result,
            Err(TournamentError::InsufficientCandidates { required: 5, available: 4 })
        ));
    }
}
