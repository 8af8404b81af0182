//! Dispatch against external collaborators.
//!
//! The engines in [`rules`](crate::rules), [`scoring`](crate::scoring)
//! and [`rebalance`](crate::rebalance) are pure functions over snapshots.
//! This module wires them to a data provider, a configuration store and
//! an assignment store, and enforces the capacity contract: a commit never
//! takes an agent past capacity, and a lost race is retried on fresh
//! metrics.

mod dispatcher;
mod memory;
mod types;

pub use dispatcher::Dispatcher;
pub use memory::InMemoryBackend;
pub use types::{AgentDirectory, AssignmentDecision, AssignmentStore, ConfigStore};
