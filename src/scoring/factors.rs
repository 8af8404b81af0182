//! Built-in scoring factors.

use super::types::{ScoringContext, ScoringFactor};
use crate::model::{AgentMetrics, Ticket};

/// Replaces NaN and infinities with 0.
pub(crate) fn finite_or_zero(x: f64) -> f64 {
    if x.is_finite() {
        x
    } else {
        0.0
    }
}

pub(crate) fn unit(x: f64) -> f64 {
    finite_or_zero(x).clamp(0.0, 1.0)
}

/// Free capacity: `1 - workload / capacity`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WorkloadFactor;

impl ScoringFactor for WorkloadFactor {
    fn name(&self) -> &str {
        "workload"
    }

    fn score(&self, agent: &AgentMetrics, ctx: &ScoringContext<'_>) -> f64 {
        let capacity = agent.effective_capacity(ctx.config.max_concurrent_tickets);
        if capacity == 0 {
            return 0.0;
        }
        unit(1.0 - agent.current_workload as f64 / capacity as f64)
    }
}

/// Blend of resolution rate, resolution speed and satisfaction.
///
/// Speed is `1 / (1 + avg_hours / target_hours)`: an agent resolving in
/// exactly the target time scores 0.5, faster agents approach 1.
#[derive(Debug, Clone, Copy, Default)]
pub struct PerformanceFactor;

impl PerformanceFactor {
    fn resolution_speed(average_hours: f64, target_hours: f64) -> f64 {
        let avg = finite_or_zero(average_hours);
        if avg <= 0.0 {
            return 1.0;
        }
        let target = finite_or_zero(target_hours);
        if target <= 0.0 {
            return 0.0;
        }
        unit(1.0 / (1.0 + avg / target))
    }
}

impl ScoringFactor for PerformanceFactor {
    fn name(&self) -> &str {
        "performance"
    }

    fn score(&self, agent: &AgentMetrics, ctx: &ScoringContext<'_>) -> f64 {
        let blend = &ctx.config.performance;
        let parts = [
            (unit(agent.resolution_rate), blend.resolution_rate),
            (
                Self::resolution_speed(agent.average_resolution_time, blend.target_resolution_hours),
                blend.resolution_speed,
            ),
            (
                unit(finite_or_zero(agent.customer_satisfaction_score) / 5.0),
                blend.satisfaction,
            ),
        ];

        let weights: f64 = parts.iter().map(|(_, w)| finite_or_zero(*w).max(0.0)).sum();
        if weights > 0.0 {
            parts
                .iter()
                .map(|(v, w)| v * finite_or_zero(*w).max(0.0))
                .sum::<f64>()
                / weights
        } else {
            parts.iter().map(|(v, _)| v).sum::<f64>() / parts.len() as f64
        }
    }
}

/// Categorical presence score.
///
/// Eligibility already admits only available agents, so this is constant
/// in practice; it stays a factor so relaxed gates can reuse it.
#[derive(Debug, Clone, Copy, Default)]
pub struct AvailabilityFactor;

impl ScoringFactor for AvailabilityFactor {
    fn name(&self) -> &str {
        "availability"
    }

    fn score(&self, agent: &AgentMetrics, _ctx: &ScoringContext<'_>) -> f64 {
        agent.availability.score()
    }
}

/// Category expertise, raised by subcategory expertise when present.
pub fn expertise(agent: &AgentMetrics, ticket: &Ticket) -> f64 {
    let category = agent
        .category_expertise
        .get(&ticket.category_id)
        .map(|v| unit(*v))
        .unwrap_or(0.0);
    let subcategory = ticket
        .subcategory_id
        .as_ref()
        .and_then(|id| agent.subcategory_expertise.get(id))
        .map(|v| unit(*v));
    match subcategory {
        Some(sub) => category.max(sub),
        None => category,
    }
}
