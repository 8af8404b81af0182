//! Rebalance inputs and results.

use crate::model::{AgentId, TicketId};

/// What started a rebalance run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebalanceTrigger {
    /// Timer-driven; gated by `auto_rebalance` and the utilization threshold.
    Scheduled,

    /// Operator-requested; bypasses the gate.
    Manual,
}

/// One ticket moved between agents.
#[derive(Debug, Clone, PartialEq)]
pub struct RebalanceMove {
    pub ticket_id: TicketId,
    pub from: AgentId,
    pub to: AgentId,
    /// Score of `to` for this ticket at the time of the move.
    pub score: f64,
}

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    AutoRebalanceDisabled,
    BelowThreshold,
    NoCapacity,
    /// No agent is above the team average by more than the margin.
    Balanced,
    /// Overloaded agents remain but nobody can take their tickets.
    NoEligibleTarget,
    /// Overloaded agents hold no movable open tickets.
    NoMovableTicket,
    MoveLimit,
    /// The store rejected a move; earlier moves stand.
    CommitFailed,
}

/// Outcome of a rebalance run.
///
/// `success` is false only when the run was not allowed to act at all.
/// A run that stops early still succeeds and keeps the moves it made.
#[derive(Debug, Clone, PartialEq)]
pub struct RebalanceResult {
    pub success: bool,
    pub message: String,
    pub moves: Vec<RebalanceMove>,
    pub stop_reason: StopReason,

    /// Team utilization (fraction). Moves never change it.
    pub team_utilization: f64,

    /// Highest individual utilization before the run.
    pub peak_utilization_before: f64,

    /// Highest individual utilization after the run.
    pub peak_utilization_after: f64,
}

impl RebalanceResult {
    pub fn move_count(&self) -> usize {
        self.moves.len()
    }
}
