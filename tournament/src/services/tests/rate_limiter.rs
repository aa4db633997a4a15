//! Tests for RateLimiter

use mockall::Sequence;
use mockall::predicate::eq;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::services::clock::TokioClock;
use crate::services::rate_limiter::RateLimiter;
use crate::traits::MockClock;

#[tokio::test(start_paused = true)]
async fn test_first_call_does_not_wait() {
    let limiter = RateLimiter::new(Arc::new(TokioClock::new()), Duration::from_secs(1));
    assert_eq!(limiter.wait_if_needed().await, Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_back_to_back_calls_are_spaced() {
    let limiter = RateLimiter::new(Arc::new(TokioClock::new()), Duration::from_secs(1));
    let start = Instant::now();

    limiter.wait_if_needed().await;
    limiter.wait_if_needed().await;
    limiter.wait_if_needed().await;

    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_secs(2), "elapsed {elapsed:?}");
    assert!(elapsed < Duration::from_millis(2100), "elapsed {elapsed:?}");
}

#[tokio::test(start_paused = true)]
async fn test_no_wait_once_interval_has_passed() {
    let limiter = RateLimiter::new(Arc::new(TokioClock::new()), Duration::from_secs(1));

    limiter.wait_if_needed().await;
    tokio::time::sleep(Duration::from_millis(1500)).await;

    assert_eq!(limiter.wait_if_needed().await, Duration::ZERO);
}

#[tokio::test]
async fn test_sleeps_only_the_remaining_interval() {
    let base = Instant::now();
    let mut clock = MockClock::new();
    let mut seq = Sequence::new();

    clock
        .expect_now()
        .times(1)
        .in_sequence(&mut seq)
        .return_const(base);
    clock
        .expect_now()
        .times(1)
        .in_sequence(&mut seq)
        .return_const(base + Duration::from_millis(400));
    clock
        .expect_sleep()
        .with(eq(Duration::from_millis(600)))
        .times(1)
        .in_sequence(&mut seq)
        .return_const(());
    clock
        .expect_now()
        .times(1)
        .in_sequence(&mut seq)
        .return_const(base + Duration::from_secs(1));

    let limiter = RateLimiter::new(Arc::new(clock), Duration::from_secs(1));
    assert_eq!(limiter.wait_if_needed().await, Duration::ZERO);
    assert_eq!(limiter.wait_if_needed().await, Duration::from_millis(600));
}
