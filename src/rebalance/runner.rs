//! Greedy rebalance loop.

use super::types::{RebalanceMove, RebalanceResult, RebalanceTrigger, StopReason};
use crate::config::AssignmentConfig;
use crate::model::{AgentId, AgentMetrics, Ticket};
use crate::scoring::ScoringEngine;
use crate::workload::{at_threshold, classify, team_utilization, LoadStatus};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::collections::{BTreeMap, VecDeque};
use tracing::{debug, info};

/// Moves open tickets from overloaded to underloaded agents.
///
/// Each step takes the most overloaded agent's newest open ticket and
/// hands it to the best-scoring underloaded agent, then reclassifies
/// everyone. Targets are only accepted if the move keeps them within the
/// overload margin, so no ticket ever bounces back. The heuristic is
/// greedy and does not look for a global optimum.
///
/// # Examples
///
/// ```
/// use chrono::{Duration, TimeZone, Utc};
/// use u_assign::config::{AssignmentConfig, BusinessHours};
/// use u_assign::model::{AgentMetrics, Availability, Ticket, TicketPriority};
/// use u_assign::rebalance::{RebalanceTrigger, Rebalancer};
///
/// let now = Utc.with_ymd_and_hms(2024, 5, 6, 12, 0, 0).unwrap();
/// let config = AssignmentConfig::default().with_business_hours(BusinessHours::always());
/// let agents = vec![
///     AgentMetrics::new("A1").with_availability(Availability::Available).with_workload(3, 3),
///     AgentMetrics::new("A2").with_availability(Availability::Available).with_workload(0, 3),
/// ];
/// let tickets: Vec<Ticket> = (0..3)
///     .map(|i| {
///         Ticket::new(format!("T{i}"), TicketPriority::Low, "general", now - Duration::hours(i))
///             .with_assignee("A1")
///     })
///     .collect();
///
/// let result = Rebalancer::run(&agents, &tickets, &config, RebalanceTrigger::Manual, now);
/// assert!(result.success);
/// assert_eq!(result.moves[0].ticket_id.as_str(), "T0");
/// ```
pub struct Rebalancer;

impl Rebalancer {
    /// Runs one rebalance pass over a snapshot of agents and tickets.
    pub fn run(
        agents: &[AgentMetrics],
        tickets: &[Ticket],
        config: &AssignmentConfig,
        trigger: RebalanceTrigger,
        now: DateTime<Utc>,
    ) -> RebalanceResult {
        let ceiling = config.max_concurrent_tickets;
        let mut roster: Vec<AgentMetrics> = agents.to_vec();

        let total_workload: u64 = roster.iter().map(|a| a.current_workload as u64).sum();
        let total_capacity: u64 = roster
            .iter()
            .map(|a| a.effective_capacity(ceiling) as u64)
            .sum();
        let team = team_utilization(total_workload, total_capacity);
        let peak_before = peak_utilization(&roster, ceiling);

        let finish = |success: bool, reason: StopReason, message: String, moves: Vec<RebalanceMove>, peak_after: f64| {
            RebalanceResult {
                success,
                message,
                moves,
                stop_reason: reason,
                team_utilization: team,
                peak_utilization_before: peak_before,
                peak_utilization_after: peak_after,
            }
        };

        if total_capacity == 0 {
            return finish(
                false,
                StopReason::NoCapacity,
                "no agent has capacity".to_string(),
                Vec::new(),
                peak_before,
            );
        }

        if trigger == RebalanceTrigger::Scheduled {
            if !config.auto_rebalance {
                return finish(
                    false,
                    StopReason::AutoRebalanceDisabled,
                    "automatic rebalancing is disabled".to_string(),
                    Vec::new(),
                    peak_before,
                );
            }
            if !at_threshold(total_workload, total_capacity, config.rebalance_threshold) {
                return finish(
                    true,
                    StopReason::BelowThreshold,
                    format!(
                        "team utilization {:.1}% is below the {:.1}% threshold",
                        team * 100.0,
                        config.rebalance_threshold
                    ),
                    Vec::new(),
                    peak_before,
                );
            }
        }

        let engine = ScoringEngine::standard(config);
        let margin = config.margin_fraction();
        let mut queues = movable_tickets(&roster, tickets);
        let mut moves = Vec::new();

        let reason = loop {
            if moves.len() >= config.max_rebalance_moves {
                break StopReason::MoveLimit;
            }

            let overloaded = overloaded_indices(&roster, ceiling, team, margin);
            if overloaded.is_empty() {
                break StopReason::Balanced;
            }

            let picked = overloaded.iter().find_map(|&i| {
                queues
                    .get_mut(&roster[i].id)
                    .and_then(VecDeque::pop_front)
                    .map(|ticket| (i, ticket))
            });
            let Some((source, ticket)) = picked else {
                break StopReason::NoMovableTicket;
            };

            let candidates: Vec<AgentMetrics> = roster
                .iter()
                .enumerate()
                .filter(|&(i, agent)| i != source && accepts_move(agent, ceiling, team, margin))
                .map(|(_, agent)| agent.clone())
                .collect();

            let Some(best) = engine.rank(&ticket, &candidates, now).into_iter().next() else {
                break StopReason::NoEligibleTarget;
            };
            let Some(target) = roster.iter().position(|a| a.id == best.agent_id) else {
                break StopReason::NoEligibleTarget;
            };

            roster[source].current_workload = roster[source].current_workload.saturating_sub(1);
            roster[target].current_workload += 1;

            debug!(
                ticket = %ticket.id,
                from = %roster[source].id,
                to = %roster[target].id,
                score = best.score,
                "rebalance move"
            );
            moves.push(RebalanceMove {
                ticket_id: ticket.id.clone(),
                from: roster[source].id.clone(),
                to: best.agent_id,
                score: best.score,
            });
        };

        let peak_after = peak_utilization(&roster, ceiling);
        let message = match reason {
            StopReason::Balanced => format!("moved {} ticket(s); workload balanced", moves.len()),
            StopReason::NoEligibleTarget => format!(
                "moved {} ticket(s); stopped early, no eligible underloaded agent",
                moves.len()
            ),
            StopReason::NoMovableTicket => format!(
                "moved {} ticket(s); overloaded agents have no movable open tickets",
                moves.len()
            ),
            StopReason::MoveLimit => format!("moved {} ticket(s); move limit reached", moves.len()),
            _ => format!("moved {} ticket(s)", moves.len()),
        };
        info!(
            moves = moves.len(),
            ?reason,
            team_utilization = team,
            "rebalance finished"
        );

        finish(true, reason, message, moves, peak_after)
    }
}

/// Open tickets per assignee, newest first.
fn movable_tickets(roster: &[AgentMetrics], tickets: &[Ticket]) -> BTreeMap<AgentId, VecDeque<Ticket>> {
    let mut queues: BTreeMap<AgentId, Vec<Ticket>> = BTreeMap::new();
    for ticket in tickets.iter().filter(|t| t.status.is_open()) {
        if let Some(assignee) = &ticket.assignee {
            if roster.iter().any(|a| &a.id == assignee) {
                queues.entry(assignee.clone()).or_default().push(ticket.clone());
            }
        }
    }
    queues
        .into_iter()
        .map(|(agent, mut list)| {
            list.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
            (agent, VecDeque::from(list))
        })
        .collect()
}

fn overloaded_indices(roster: &[AgentMetrics], ceiling: u32, team: f64, margin: f64) -> Vec<usize> {
    let mut indices: Vec<usize> = roster
        .iter()
        .enumerate()
        .filter(|(_, a)| {
            classify(a.effective_capacity(ceiling), a.utilization(ceiling), team, margin)
                == LoadStatus::Overloaded
        })
        .map(|(i, _)| i)
        .collect();
    indices.sort_by(|&a, &b| {
        roster[b]
            .utilization(ceiling)
            .partial_cmp(&roster[a].utilization(ceiling))
            .unwrap_or(Ordering::Equal)
            .then_with(|| roster[a].id.cmp(&roster[b].id))
    });
    indices
}

/// Underloaded now and still within the margin after taking one ticket.
fn accepts_move(agent: &AgentMetrics, ceiling: u32, team: f64, margin: f64) -> bool {
    let capacity = agent.effective_capacity(ceiling);
    if classify(capacity, agent.utilization(ceiling), team, margin) != LoadStatus::Underloaded {
        return false;
    }
    let after = (agent.current_workload + 1) as f64 / capacity as f64;
    after <= team + margin
}

fn peak_utilization(roster: &[AgentMetrics], ceiling: u32) -> f64 {
    roster
        .iter()
        .map(|a| a.utilization(ceiling))
        .fold(0.0, f64::max)
}
