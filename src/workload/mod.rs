//! Workload dashboard view: per-agent and team utilization.

mod summary;

pub(crate) use summary::{at_threshold, classify, team_utilization};
pub use summary::{AgentLoad, LoadStatus, WorkloadSummary};
