//! Tournament services implementations

pub mod clock;
pub mod rate_limiter;
pub mod result_writer;
pub mod roster;
pub mod trends_client;

#[cfg(test)]
pub mod tests;

pub use clock::*;
pub use rate_limiter::*;
pub use result_writer::*;
pub use roster::*;
pub use trends_client::*;
