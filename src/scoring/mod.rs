//! Weighted multi-factor agent scoring.
//!
//! Agents that pass the eligibility gate (available, below capacity,
//! inside business hours, holding any required skills) are scored by a
//! weighted mean of pluggable [`ScoringFactor`]s plus an additive
//! expertise bonus, then ranked best first.
//!
//! # Design
//!
//! The three standard factors (free capacity, historical performance,
//! presence) take their weights from
//! [`AssignmentConfig`](crate::config::AssignmentConfig). Weights are
//! normalized at scoring time, so a sum other than 100 is tolerated.

mod engine;
mod factors;
mod types;

pub use engine::{rank, ScoringEngine};
pub use factors::{expertise, AvailabilityFactor, PerformanceFactor, WorkloadFactor};
pub use types::{
    FactorScore, Ineligibility, RankedAgent, ScoreBreakdown, ScoringContext, ScoringFactor,
};
