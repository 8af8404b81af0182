//! Weighted factor composition and candidate ranking.

use super::factors::{expertise, finite_or_zero, unit, AvailabilityFactor, PerformanceFactor, WorkloadFactor};
use super::types::{
    FactorScore, Ineligibility, RankedAgent, ScoreBreakdown, ScoringContext, ScoringFactor,
};
use crate::config::AssignmentConfig;
use crate::model::{AgentMetrics, Availability, Ticket};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use tracing::debug;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// A factor paired with its weight.
struct WeightedFactor {
    factor: Box<dyn ScoringFactor>,
    weight: f64,
}

/// Ranks eligible agents for a ticket.
///
/// Each candidate's factor scores are combined by weighted mean (weights
/// need not sum to anything in particular). If every weight is zero the
/// plain mean is used instead. The expertise bonus is added on top of the
/// normalized base.
///
/// Ordering is descending by score, then ascending by current workload,
/// then ascending by agent id, so identical inputs always rank identically.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use u_assign::config::AssignmentConfig;
/// use u_assign::model::{AgentMetrics, Availability, Ticket, TicketPriority};
/// use u_assign::scoring::ScoringEngine;
///
/// let now = Utc.with_ymd_and_hms(2024, 5, 6, 10, 0, 0).unwrap();
/// let config = AssignmentConfig::default().with_weights(50, 25, 25);
/// let agents = vec![
///     AgentMetrics::new("A1").with_availability(Availability::Available).with_workload(9, 10),
///     AgentMetrics::new("A2").with_availability(Availability::Available).with_workload(2, 10),
/// ];
/// let ticket = Ticket::new("T1", TicketPriority::Medium, "billing", now);
///
/// let ranked = ScoringEngine::standard(&config).rank(&ticket, &agents, now);
/// assert_eq!(ranked[0].agent_id.as_str(), "A2");
/// ```
pub struct ScoringEngine {
    factors: Vec<WeightedFactor>,
    config: AssignmentConfig,
    epsilon: f64,
}

impl ScoringEngine {
    /// Creates an engine with no factors.
    pub fn new(config: AssignmentConfig) -> Self {
        Self {
            factors: Vec::new(),
            config,
            epsilon: 1e-9,
        }
    }

    /// Workload, performance and availability factors weighted per `config`.
    pub fn standard(config: &AssignmentConfig) -> Self {
        Self::new(config.clone())
            .with_weighted_factor(WorkloadFactor, config.workload_weight as f64)
            .with_weighted_factor(PerformanceFactor, config.performance_weight as f64)
            .with_weighted_factor(AvailabilityFactor, config.availability_weight as f64)
    }

    /// Adds a factor with a custom weight. Negative weights count as 0.
    pub fn with_weighted_factor<F: ScoringFactor + 'static>(mut self, factor: F, weight: f64) -> Self {
        self.factors.push(WeightedFactor {
            factor: Box::new(factor),
            weight: finite_or_zero(weight).max(0.0),
        });
        self
    }

    /// Sets the score resolution below which candidates count as tied.
    /// Zero or negative compares raw scores.
    pub fn with_epsilon(mut self, eps: f64) -> Self {
        self.epsilon = finite_or_zero(eps);
        self
    }

    pub fn factor_count(&self) -> usize {
        self.factors.len()
    }

    pub fn factor_names(&self) -> Vec<&str> {
        self.factors.iter().map(|wf| wf.factor.name()).collect()
    }

    pub fn config(&self) -> &AssignmentConfig {
        &self.config
    }

    /// Availability, capacity and skill gate for one agent.
    ///
    /// Business hours are checked once per ranking pass by the caller.
    pub fn eligibility(
        &self,
        agent: &AgentMetrics,
        required_skills: &BTreeSet<String>,
    ) -> Result<(), Ineligibility> {
        if agent.availability != Availability::Available {
            return Err(Ineligibility::NotAvailable(agent.availability));
        }
        let capacity = agent.effective_capacity(self.config.max_concurrent_tickets);
        if agent.current_workload >= capacity {
            return Err(Ineligibility::AtCapacity {
                workload: agent.current_workload,
                capacity,
            });
        }
        if !agent.has_skills(required_skills) {
            return Err(Ineligibility::MissingSkills);
        }
        Ok(())
    }

    /// Full gate including business hours at `now`.
    pub fn check(
        &self,
        agent: &AgentMetrics,
        now: DateTime<Utc>,
        required_skills: &BTreeSet<String>,
    ) -> Result<(), Ineligibility> {
        if !self.config.business_hours.is_open(now) {
            return Err(Ineligibility::OutsideBusinessHours);
        }
        self.eligibility(agent, required_skills)
    }

    /// Scores one agent without applying the eligibility gate.
    pub fn score(&self, ticket: &Ticket, agent: &AgentMetrics) -> ScoreBreakdown {
        let ctx = ScoringContext {
            ticket,
            config: &self.config,
        };

        let factors: Vec<FactorScore> = self
            .factors
            .iter()
            .map(|wf| FactorScore {
                name: wf.factor.name().to_string(),
                value: unit(wf.factor.score(agent, &ctx)),
                weight: wf.weight,
            })
            .collect();

        let weight_sum: f64 = factors.iter().map(|f| f.weight).sum();
        let base = if factors.is_empty() {
            0.0
        } else if weight_sum > 0.0 {
            factors.iter().map(|f| f.value * f.weight).sum::<f64>() / weight_sum
        } else {
            factors.iter().map(|f| f.value).sum::<f64>() / factors.len() as f64
        };

        let scale = finite_or_zero(self.config.expertise_bonus_scale).max(0.0);
        let expertise_bonus = expertise(agent, ticket) * scale;

        ScoreBreakdown {
            factors,
            base,
            expertise_bonus,
            total: base + expertise_bonus,
        }
    }

    /// Ranks eligible candidates, best first.
    ///
    /// Returns an empty list when nobody is eligible.
    pub fn rank(&self, ticket: &Ticket, candidates: &[AgentMetrics], now: DateTime<Utc>) -> Vec<RankedAgent> {
        self.rank_with_skills(ticket, candidates, now, &BTreeSet::new())
    }

    /// Ranks eligible candidates that also hold every required skill.
    pub fn rank_with_skills(
        &self,
        ticket: &Ticket,
        candidates: &[AgentMetrics],
        now: DateTime<Utc>,
        required_skills: &BTreeSet<String>,
    ) -> Vec<RankedAgent> {
        if !self.config.business_hours.is_open(now) {
            debug!(ticket = %ticket.id, "outside business hours; no candidates");
            return Vec::new();
        }

        let eligible: Vec<&AgentMetrics> = candidates
            .iter()
            .filter(|agent| match self.eligibility(agent, required_skills) {
                Ok(()) => true,
                Err(reason) => {
                    debug!(agent = %agent.id, ?reason, "agent not eligible");
                    false
                }
            })
            .collect();

        let mut ranked = self.score_all(ticket, &eligible);
        ranked.sort_by(|a, b| self.compare(a, b));

        if let Some(top) = ranked.first() {
            debug!(
                ticket = %ticket.id,
                agent = %top.agent_id,
                score = top.score,
                candidates = ranked.len(),
                "ranked candidates"
            );
        }
        ranked
    }

    /// Returns the best candidate, if any.
    pub fn select_best(&self, ticket: &Ticket, candidates: &[AgentMetrics], now: DateTime<Utc>) -> Option<RankedAgent> {
        self.rank(ticket, candidates, now).into_iter().next()
    }

    #[cfg(feature = "parallel")]
    fn score_all(&self, ticket: &Ticket, eligible: &[&AgentMetrics]) -> Vec<RankedAgent> {
        if self.config.parallel {
            eligible
                .par_iter()
                .map(|agent| self.ranked(ticket, agent))
                .collect()
        } else {
            eligible.iter().map(|agent| self.ranked(ticket, agent)).collect()
        }
    }

    #[cfg(not(feature = "parallel"))]
    fn score_all(&self, ticket: &Ticket, eligible: &[&AgentMetrics]) -> Vec<RankedAgent> {
        eligible.iter().map(|agent| self.ranked(ticket, agent)).collect()
    }

    fn ranked(&self, ticket: &Ticket, agent: &AgentMetrics) -> RankedAgent {
        let breakdown = self.score(ticket, agent);
        RankedAgent {
            agent_id: agent.id.clone(),
            score: breakdown.total,
            current_workload: agent.current_workload,
            breakdown,
        }
    }

    /// Scores are bucketed to multiples of epsilon so near-ties resolve on
    /// workload and id while the ordering stays total.
    fn compare(&self, a: &RankedAgent, b: &RankedAgent) -> Ordering {
        let by_score = if self.epsilon > 0.0 {
            self.bucket(b.score).cmp(&self.bucket(a.score))
        } else {
            b.score.total_cmp(&a.score)
        };
        by_score
            .then_with(|| a.current_workload.cmp(&b.current_workload))
            .then_with(|| a.agent_id.cmp(&b.agent_id))
    }

    fn bucket(&self, score: f64) -> i64 {
        (finite_or_zero(score) / self.epsilon).round() as i64
    }
}

/// Ranks `candidates` for `ticket` with the standard factors of `config`.
pub fn rank(
    ticket: &Ticket,
    candidates: &[AgentMetrics],
    config: &AssignmentConfig,
    now: DateTime<Utc>,
) -> Vec<RankedAgent> {
    ScoringEngine::standard(config).rank(ticket, candidates, now)
}
