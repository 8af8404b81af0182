//! Workload rebalancing.
//!
//! Redistributes already-open tickets when agents drift apart in
//! utilization. Scheduled runs act only when automatic rebalancing is on
//! and team utilization has reached the configured threshold; manual
//! runs skip that gate. Targets are chosen with the same
//! [`ScoringEngine`](crate::scoring::ScoringEngine) used for new
//! assignments.

mod runner;
mod types;

pub use runner::Rebalancer;
pub use types::{RebalanceMove, RebalanceResult, RebalanceTrigger, StopReason};
