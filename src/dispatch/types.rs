//! Collaborator traits and dispatch results.

use crate::config::AssignmentConfig;
use crate::error::Result;
use crate::model::{AgentId, AgentMetrics, RuleId, Ticket, TicketId};
use crate::rebalance::RebalanceMove;
use crate::rules::{AssignmentRule, RuleMatch};

/// Supplies fresh agent and ticket snapshots.
pub trait AgentDirectory {
    /// Current roster with freshly derived metrics.
    fn agents(&self) -> Result<Vec<AgentMetrics>>;

    /// Tickets that are currently open.
    fn open_tickets(&self) -> Result<Vec<Ticket>>;
}

/// Persists the configuration singleton and the rule list.
pub trait ConfigStore {
    fn config(&self) -> Result<AssignmentConfig>;

    /// Last writer wins.
    fn save_config(&self, config: AssignmentConfig) -> Result<()>;

    /// All rules, ordered by priority then creation time.
    fn rules(&self) -> Result<Vec<AssignmentRule>>;

    fn create_rule(&self, rule: AssignmentRule) -> Result<()>;

    fn update_rule(&self, rule: AssignmentRule) -> Result<()>;

    fn delete_rule(&self, id: &RuleId) -> Result<()>;

    fn set_rule_enabled(&self, id: &RuleId, enabled: bool) -> Result<()>;
}

/// Applies assignments under the capacity contract.
///
/// Implementations must make `commit_assignment` conditional: it succeeds
/// only if the agent's workload is still below capacity at commit time,
/// and otherwise returns
/// [`AssignError::CapacityConflict`](crate::error::AssignError::CapacityConflict).
pub trait AssignmentStore {
    fn commit_assignment(&self, ticket: &Ticket, agent: &AgentId) -> Result<()>;

    /// Moves a ticket between agents with the same capacity check on the
    /// target. Fails with `StaleMove` if the ticket is no longer held by
    /// `from`.
    fn apply_move(&self, mv: &RebalanceMove) -> Result<()>;
}

/// What the dispatcher did with a ticket.
#[derive(Debug, Clone, PartialEq)]
pub enum AssignmentDecision {
    /// A rule named the agent directly; scoring was skipped.
    Pinned {
        ticket_id: TicketId,
        agent_id: AgentId,
        rule: RuleMatch,
    },

    /// The agent won the scoring pass, possibly restricted by a rule
    /// (team pin or required skills).
    Scored {
        ticket_id: TicketId,
        agent_id: AgentId,
        score: f64,
        rule: Option<RuleMatch>,
    },

    /// Nobody was eligible. The caller should queue or alert.
    Unassigned {
        ticket_id: TicketId,
        rule: Option<RuleMatch>,
    },
}

impl AssignmentDecision {
    pub fn agent_id(&self) -> Option<&AgentId> {
        match self {
            AssignmentDecision::Pinned { agent_id, .. }
            | AssignmentDecision::Scored { agent_id, .. } => Some(agent_id),
            AssignmentDecision::Unassigned { .. } => None,
        }
    }

    pub fn rule(&self) -> Option<&RuleMatch> {
        match self {
            AssignmentDecision::Pinned { rule, .. } => Some(rule),
            AssignmentDecision::Scored { rule, .. } | AssignmentDecision::Unassigned { rule, .. } => {
                rule.as_ref()
            }
        }
    }
}
