//! # Coalescer
//!
//! Collapses an unbounded stream of "something changed" signals into at most
//! one scheduled or running cycle at a time. The first signal of a burst claims
//! the throttle and schedules a cycle `delay` later; every signal that arrives
//! before that cycle has finished is absorbed into it.

use async_trait::async_trait;

pub mod coalescer;
pub mod error;
pub mod state;

pub use coalescer::Coalescer;
pub use error::CoalescerError;
pub use state::ThrottleState;

/// The work performed once per coalesced burst.
///
/// A returned error (or a panic) is reported through the coalescer's
/// diagnostics sink and never reaches whoever called `signal()`.
#[async_trait]
pub trait CycleRunner: Send + Sync {
    async fn run_cycle(&self) -> anyhow::Result<()>;
}
