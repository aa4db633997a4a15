//! Tournament driver: elimination rounds down to the threshold, then the knockout

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use shared::{Candidate, InterestSeries, Stage, log_progress, log_success, stage_info, stage_warn};

use crate::config::TournamentConfig;
use crate::core::batch_scorer::BatchScorer;
use crate::core::knockout::KnockoutFinalizer;
use crate::core::round_runner::RoundRunner;
use crate::error::{TournamentError, TournamentResult};
use crate::services::result_writer::ResultWriter;
use crate::services::roster::{eligible, load_roster};
use crate::traits::{Clock, TrendsSource};
use crate::types::FinalGroup;

/// Order the eligible pool for the run. A test limit keeps the first N in
/// roster order; otherwise the pool is shuffled, reproducibly when seeded.
pub fn prepare_pool(
    mut candidates: Vec<Candidate>,
    test_limit: Option<usize>,
    seed: Option<u64>,
) -> Vec<Candidate> {
    match test_limit {
        Some(limit) => {
            candidates.truncate(limit);
            stage_warn!(Stage::Setup, "Test mode: limited to {} players", candidates.len());
        }
        None => {
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            candidates.shuffle(&mut rng);
            stage_info!(Stage::Setup, "Shuffled {} players", candidates.len());
        }
    }
    candidates
}

pub struct Tournament<S: TrendsSource, C: Clock> {
    scorer: Arc<BatchScorer<S, C>>,
    rounds: RoundRunner<S, C>,
    knockout: KnockoutFinalizer<S, C>,
    threshold: usize,
}

impl<S: TrendsSource, C: Clock> Tournament<S, C> {
    pub fn new(source: Arc<S>, clock: Arc<C>, config: &TournamentConfig) -> Self {
        let scorer = Arc::new(BatchScorer::new(
            source,
            clock,
            config.retry_policy(),
            config.window.clone(),
        ));
        Self {
            rounds: RoundRunner::new(scorer.clone(), config.batch_size, config.keep_per_batch),
            knockout: KnockoutFinalizer::new(scorer.clone()),
            scorer,
            threshold: config.threshold,
        }
    }

    /// Reduce `pool` to the final five
    pub async fn run(&self, pool: Vec<Candidate>) -> TournamentResult<FinalGroup> {
        if pool.is_empty() {
            return Err(TournamentError::EmptyPool);
        }

        let mut pool = pool;
        let mut round = 1u32;
        while pool.len() > self.threshold {
            log_progress(
                Stage::Round(round),
                "Starting round",
                &format!("{} players, threshold {}", pool.len(), self.threshold),
            );
            let survivors = self.rounds.run_round(&pool, round).await?;
            if survivors.len() >= pool.len() {
                return Err(TournamentError::config(format!(
                    "round {round} did not shrink the pool of {} players",
                    pool.len()
                )));
            }
            pool = survivors;
            round += 1;
        }

        let final_group = self.knockout.finalize(&pool).await?;
        log_success(Stage::Final, &format!("Top 5: {}", final_group.names().join(", ")));
        Ok(final_group)
    }

    /// Time series for each finalist; empty when the lookup fails
    pub async fn interest_detail(&self, final_group: &FinalGroup) -> HashMap<String, InterestSeries> {
        self.scorer.interest_detail(&final_group.ranked).await
    }
}

/// Load the roster, run the tournament and persist the ranked top five.
/// Returns the path written.
pub async fn run_pipeline<S: TrendsSource, C: Clock>(
    config: &TournamentConfig,
    source: Arc<S>,
    clock: Arc<C>,
) -> TournamentResult<PathBuf> {
    config.validate()?;

    let roster = load_roster(&config.input).await?;
    let pool = prepare_pool(eligible(&roster)?, config.test_limit, config.seed);

    let tournament = Tournament::new(source, clock, config);
    let final_group = tournament.run(pool).await?;

    let detail = if config.fetch_detail {
        Some(tournament.interest_detail(&final_group).await)
    } else {
        None
    };

    ResultWriter::new(&config.output, &roster)
        .write(&final_group.ranked, &final_group.scores, detail.as_ref())
        .await
}
