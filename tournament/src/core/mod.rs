//! Tournament core business logic

pub mod batch_scorer;
pub mod knockout;
pub mod retry;
pub mod round_runner;
pub mod tournament;

pub use batch_scorer::{BatchScorer, SubjectPlan};
pub use knockout::{ChallengeOutcome, FINAL_GROUP_SIZE, KnockoutFinalizer, find_best_fifth};
pub use retry::{RetryOutcome, RetryPolicy};
pub use round_runner::{RoundRunner, dedup_by_name, rank_by_score};
pub use tournament::{Tournament, prepare_pool, run_pipeline};
