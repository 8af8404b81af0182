//! Team workload snapshot.

use crate::config::AssignmentConfig;
use crate::model::{AgentId, AgentMetrics, Availability};
use std::cmp::Ordering;

/// Load classification relative to the team average.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    /// Above the team average by more than the rebalance margin.
    Overloaded,
    Balanced,
    /// Below the team average.
    Underloaded,
    /// No capacity at all.
    Unavailable,
}

/// One agent's row in the workload view.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentLoad {
    pub agent_id: AgentId,
    pub availability: Availability,
    pub workload: u32,
    pub capacity: u32,
    /// Workload over capacity, as a fraction.
    pub utilization: f64,
    pub status: LoadStatus,
}

impl AgentLoad {
    pub fn utilization_percent(&self) -> f64 {
        self.utilization * 100.0
    }
}

/// Aggregated workload across a roster.
///
/// # Examples
///
/// ```
/// use u_assign::config::AssignmentConfig;
/// use u_assign::model::AgentMetrics;
/// use u_assign::workload::{LoadStatus, WorkloadSummary};
///
/// let agents = vec![
///     AgentMetrics::new("A1").with_workload(9, 10),
///     AgentMetrics::new("A2").with_workload(1, 10),
/// ];
/// let summary = WorkloadSummary::compute(&agents, &AssignmentConfig::default());
/// assert!((summary.team_utilization - 0.5).abs() < 1e-10);
/// assert_eq!(summary.agents[0].status, LoadStatus::Overloaded);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct WorkloadSummary {
    pub agents: Vec<AgentLoad>,
    pub total_workload: u64,
    pub total_capacity: u64,
    /// `total_workload / total_capacity`, 0 without capacity.
    pub team_utilization: f64,
    pub available_agents: usize,
    /// Scheduled rebalancing would trigger on this snapshot.
    pub needs_rebalance: bool,
}

impl WorkloadSummary {
    pub fn compute(agents: &[AgentMetrics], config: &AssignmentConfig) -> Self {
        let ceiling = config.max_concurrent_tickets;
        let total_workload: u64 = agents.iter().map(|a| a.current_workload as u64).sum();
        let total_capacity: u64 = agents
            .iter()
            .map(|a| a.effective_capacity(ceiling) as u64)
            .sum();
        let team_utilization = team_utilization(total_workload, total_capacity);
        let margin = config.margin_fraction();

        let loads = agents
            .iter()
            .map(|agent| {
                let capacity = agent.effective_capacity(ceiling);
                let utilization = agent.utilization(ceiling);
                AgentLoad {
                    agent_id: agent.id.clone(),
                    availability: agent.availability,
                    workload: agent.current_workload,
                    capacity,
                    utilization,
                    status: classify(capacity, utilization, team_utilization, margin),
                }
            })
            .collect();

        Self {
            agents: loads,
            total_workload,
            total_capacity,
            team_utilization,
            available_agents: agents
                .iter()
                .filter(|a| a.availability == Availability::Available)
                .count(),
            needs_rebalance: config.auto_rebalance
                && at_threshold(total_workload, total_capacity, config.rebalance_threshold),
        }
    }

    pub fn team_utilization_percent(&self) -> f64 {
        self.team_utilization * 100.0
    }

    /// Overloaded agents, most loaded first.
    pub fn overloaded(&self) -> Vec<&AgentLoad> {
        self.by_status(LoadStatus::Overloaded)
    }

    /// Underloaded agents, least loaded first.
    pub fn underloaded(&self) -> Vec<&AgentLoad> {
        let mut rows = self.by_status(LoadStatus::Underloaded);
        rows.reverse();
        rows
    }

    pub fn get(&self, agent: &AgentId) -> Option<&AgentLoad> {
        self.agents.iter().find(|a| &a.agent_id == agent)
    }

    fn by_status(&self, status: LoadStatus) -> Vec<&AgentLoad> {
        let mut rows: Vec<&AgentLoad> = self.agents.iter().filter(|a| a.status == status).collect();
        rows.sort_by(|a, b| {
            b.utilization
                .partial_cmp(&a.utilization)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.agent_id.cmp(&b.agent_id))
        });
        rows
    }
}

pub(crate) fn team_utilization(workload: u64, capacity: u64) -> f64 {
    if capacity == 0 {
        0.0
    } else {
        workload as f64 / capacity as f64
    }
}

/// Team utilization has reached `threshold` percent.
///
/// Computed as `workload * 100 / capacity` so integral percentages compare
/// exactly against the threshold.
pub(crate) fn at_threshold(workload: u64, capacity: u64, threshold: f64) -> bool {
    capacity > 0 && workload as f64 * 100.0 / capacity as f64 >= threshold
}

pub(crate) fn classify(capacity: u32, utilization: f64, team: f64, margin: f64) -> LoadStatus {
    if capacity == 0 {
        LoadStatus::Unavailable
    } else if utilization > team + margin {
        LoadStatus::Overloaded
    } else if utilization < team {
        LoadStatus::Underloaded
    } else {
        LoadStatus::Balanced
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster() -> Vec<AgentMetrics> {
        vec![
            AgentMetrics::new("A1")
                .with_availability(Availability::Available)
                .with_workload(9, 10),
            AgentMetrics::new("A2")
                .with_availability(Availability::Available)
                .with_workload(5, 10),
            AgentMetrics::new("A3")
                .with_availability(Availability::Away)
                .with_workload(1, 10),
        ]
    }

    #[test]
    fn test_team_utilization() {
        let summary = WorkloadSummary::compute(&roster(), &AssignmentConfig::default());
        assert_eq!(summary.total_workload, 15);
        assert_eq!(summary.total_capacity, 30);
        assert!((summary.team_utilization_percent() - 50.0).abs() < 1e-10);
        assert_eq!(summary.available_agents, 2);
        assert!(!summary.needs_rebalance);
    }

    #[test]
    fn test_classification() {
        let summary = WorkloadSummary::compute(&roster(), &AssignmentConfig::default());
        let status = |id: &str| summary.get(&AgentId::from(id)).unwrap().status;
        assert_eq!(status("A1"), LoadStatus::Overloaded);
        assert_eq!(status("A2"), LoadStatus::Balanced);
        assert_eq!(status("A3"), LoadStatus::Underloaded);
    }

    #[test]
    fn test_margin_keeps_slightly_busy_agents_balanced() {
        let agents = vec![
            AgentMetrics::new("A1").with_workload(6, 10),
            AgentMetrics::new("A2").with_workload(4, 10),
        ];
        let config = AssignmentConfig::default().with_rebalance_margin(15.0);
        let summary = WorkloadSummary::compute(&agents, &config);
        assert!(summary.overloaded().is_empty());
        assert_eq!(summary.underloaded().len(), 1);
    }

    #[test]
    fn test_needs_rebalance_threshold() {
        let agents = vec![
            AgentMetrics::new("A1").with_workload(10, 10),
            AgentMetrics::new("A2").with_workload(7, 10),
        ];
        let on = AssignmentConfig::default().with_auto_rebalance(true, 80.0);
        let off = AssignmentConfig::default().with_auto_rebalance(false, 80.0);
        assert!(WorkloadSummary::compute(&agents, &on).needs_rebalance);
        assert!(!WorkloadSummary::compute(&agents, &off).needs_rebalance);

        // 16/20 is exactly the threshold
        let at = vec![
            AgentMetrics::new("A1").with_workload(9, 10),
            AgentMetrics::new("A2").with_workload(7, 10),
        ];
        assert!(WorkloadSummary::compute(&at, &on).needs_rebalance);
        assert!(!WorkloadSummary::compute(&at, &on.clone().with_auto_rebalance(true, 80.5)).needs_rebalance);
    }

    #[test]
    fn test_zero_capacity_roster() {
        let config = AssignmentConfig::default().with_max_concurrent_tickets(0);
        let summary = WorkloadSummary::compute(&roster(), &config);
        assert_eq!(summary.team_utilization, 0.0);
        assert!(summary
            .agents
            .iter()
            .all(|a| a.status == LoadStatus::Unavailable));
    }

    #[test]
    fn test_ordering_helpers() {
        let agents = vec![
            AgentMetrics::new("A1").with_workload(10, 10),
            AgentMetrics::new("A2").with_workload(9, 10),
            AgentMetrics::new("A3").with_workload(0, 10),
            AgentMetrics::new("A4").with_workload(1, 10),
        ];
        let config = AssignmentConfig::default().with_rebalance_margin(5.0);
        let summary = WorkloadSummary::compute(&agents, &config);
        let over: Vec<_> = summary.overloaded().iter().map(|a| a.agent_id.as_str()).collect();
        let under: Vec<_> = summary.underloaded().iter().map(|a| a.agent_id.as_str()).collect();
        assert_eq!(over, vec!["A1", "A2"]);
        assert_eq!(under, vec!["A3", "A4"]);
    }
}
