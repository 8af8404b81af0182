//! Core trait for scoring factors.

use crate::config::AssignmentConfig;
use crate::model::{AgentId, AgentMetrics, Availability, Ticket};

/// What a factor may look at besides the agent itself.
#[derive(Debug, Clone, Copy)]
pub struct ScoringContext<'a> {
    pub ticket: &'a Ticket,
    pub config: &'a AssignmentConfig,
}

/// A signal that rates how suitable an agent is for a ticket.
///
/// Factors return scores in `[0, 1]` where **higher is better**. Values
/// outside that range are clamped by the engine, and non-finite values
/// count as 0.
///
/// # Examples
///
/// ```
/// use u_assign::model::AgentMetrics;
/// use u_assign::scoring::{ScoringContext, ScoringFactor};
///
/// // Prefer agents with a "vip" specialization.
/// struct VipAffinity;
///
/// impl ScoringFactor for VipAffinity {
///     fn name(&self) -> &str { "vip-affinity" }
///     fn score(&self, agent: &AgentMetrics, _ctx: &ScoringContext<'_>) -> f64 {
///         if agent.specializations.contains("vip") { 1.0 } else { 0.0 }
///     }
/// }
/// ```
pub trait ScoringFactor: Send + Sync {
    /// Returns the name of this factor.
    fn name(&self) -> &str;

    /// Rates `agent` for the ticket in `ctx`.
    fn score(&self, agent: &AgentMetrics, ctx: &ScoringContext<'_>) -> f64;
}

/// Why an agent was dropped before scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ineligibility {
    NotAvailable(Availability),
    AtCapacity { workload: u32, capacity: u32 },
    OutsideBusinessHours,
    MissingSkills,
}

/// One factor's contribution to a composite score.
#[derive(Debug, Clone, PartialEq)]
pub struct FactorScore {
    pub name: String,
    pub value: f64,
    pub weight: f64,
}

/// How a final score was put together.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreBreakdown {
    pub factors: Vec<FactorScore>,

    /// Weight-normalized composite of the factors, in `[0, 1]`.
    pub base: f64,

    /// Additive expertise tie-breaker.
    pub expertise_bonus: f64,

    /// `base + expertise_bonus`.
    pub total: f64,
}

/// An eligible candidate with its score.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedAgent {
    pub agent_id: AgentId,
    pub score: f64,
    pub current_workload: u32,
    pub breakdown: ScoreBreakdown,
}
