//! Support-ticket assignment engine.
//!
//! Routes incoming tickets to agents and keeps open work spread evenly:
//!
//! - **Rules**: Ordered, operator-defined assignment rules that pin a
//!   ticket to an agent or team, or constrain candidates by skill.
//! - **Scoring**: Weighted workload, performance, and availability factors
//!   with an expertise bonus, ranking eligible agents deterministically.
//! - **Rebalance**: Greedy redistribution of open tickets from overloaded
//!   to underloaded agents, gated by a team utilization threshold.
//! - **Workload**: Per-agent utilization and load classification for
//!   dashboards.
//! - **Dispatch**: Wires the engines to data, configuration, and
//!   assignment stores with capacity-checked commits.
//!
//! # Architecture
//!
//! The engines are pure functions over snapshots of agents, tickets, and
//! configuration. Only [`dispatch`] talks to storage, through the traits
//! it defines, so callers can plug in any backing store.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod model;
pub mod rebalance;
pub mod rules;
pub mod scoring;
pub mod workload;

pub use error::{AssignError, Result};
