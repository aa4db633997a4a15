//! Tests for tournament services
//!
//! The trends client is exercised against a local wiremock server; pacing is
//! checked under paused tokio time.

pub mod rate_limiter;
