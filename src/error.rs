//! Error types for the assignment engine.
//!
//! Only failures the caller has to react to live here. Bad rule data,
//! malformed time windows, and odd weights are logged and degraded in
//! place instead.

use crate::model::{AgentId, RuleId, TicketId};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AssignError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AssignError {
    /// The ticket/agent data provider or configuration store failed.
    #[error("data provider unavailable: {0}")]
    Provider(String),

    /// A conditional commit found the agent already at capacity.
    #[error("agent {agent} is at capacity ({workload}/{capacity})")]
    CapacityConflict {
        agent: AgentId,
        workload: u32,
        capacity: u32,
    },

    /// A rebalance move no longer matches the stored assignment.
    #[error("ticket {ticket} is no longer assigned to {expected}")]
    StaleMove { ticket: TicketId, expected: AgentId },

    #[error("agent not found: {0}")]
    AgentNotFound(AgentId),

    #[error("ticket not found: {0}")]
    TicketNotFound(TicketId),

    #[error("rule not found: {0}")]
    RuleNotFound(RuleId),

    #[error("rule already exists: {0}")]
    RuleExists(RuleId),

    #[error("rule priority {priority} is already used by enabled rule {existing}")]
    DuplicatePriority { priority: i32, existing: RuleId },

    /// Every commit attempt lost the capacity race.
    #[error("assignment of ticket {ticket} failed after {attempts} commit attempts")]
    RetriesExhausted { ticket: TicketId, attempts: u32 },
}

impl AssignError {
    /// Returns true when re-reading metrics and retrying may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AssignError::CapacityConflict { .. }
                | AssignError::StaleMove { .. }
                | AssignError::Provider(_)
        )
    }
}
