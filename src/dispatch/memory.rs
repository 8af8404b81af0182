//! In-process backend.

use super::types::{AgentDirectory, AssignmentStore, ConfigStore};
use crate::config::AssignmentConfig;
use crate::error::{AssignError, Result};
use crate::model::{AgentId, AgentMetrics, RuleId, Ticket, TicketId};
use crate::rebalance::RebalanceMove;
use crate::rules::{AssignmentRule, RuleEngine};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Default)]
struct State {
    config: AssignmentConfig,
    rules: Vec<AssignmentRule>,
    agents: BTreeMap<AgentId, AgentMetrics>,
    tickets: BTreeMap<TicketId, Ticket>,
}

impl State {
    fn capacity_of(&self, agent: &AgentMetrics) -> u32 {
        agent.effective_capacity(self.config.max_concurrent_tickets)
    }

    fn check_capacity(&self, id: &AgentId) -> Result<()> {
        let agent = self
            .agents
            .get(id)
            .ok_or_else(|| AssignError::AgentNotFound(id.clone()))?;
        let capacity = self.capacity_of(agent);
        if agent.current_workload >= capacity {
            return Err(AssignError::CapacityConflict {
                agent: id.clone(),
                workload: agent.current_workload,
                capacity,
            });
        }
        Ok(())
    }

    fn adjust_workload(&mut self, id: &AgentId, delta: i64) {
        if let Some(agent) = self.agents.get_mut(id) {
            let next = (agent.current_workload as i64 + delta).max(0);
            agent.current_workload = u32::try_from(next).unwrap_or(u32::MAX);
        }
    }

    /// Rejects an enabled rule whose priority another enabled rule holds.
    fn check_priority(&self, rule: &AssignmentRule) -> Result<()> {
        if !rule.enabled {
            return Ok(());
        }
        match self
            .rules
            .iter()
            .find(|r| r.enabled && r.id != rule.id && r.priority == rule.priority)
        {
            Some(existing) => Err(AssignError::DuplicatePriority {
                priority: rule.priority,
                existing: existing.id.clone(),
            }),
            None => Ok(()),
        }
    }

    fn rule_index(&self, id: &RuleId) -> Result<usize> {
        self.rules
            .iter()
            .position(|r| &r.id == id)
            .ok_or_else(|| AssignError::RuleNotFound(id.clone()))
    }
}

/// Mutex-guarded backend implementing every collaborator trait.
///
/// Commits check capacity and update workload under one lock, which is
/// the conditional-update contract the dispatcher relies on.
///
/// # Examples
///
/// ```
/// use u_assign::config::AssignmentConfig;
/// use u_assign::dispatch::{AgentDirectory, InMemoryBackend};
/// use u_assign::model::AgentMetrics;
///
/// let backend = InMemoryBackend::new(AssignmentConfig::default())
///     .with_agents([AgentMetrics::new("A1").with_workload(0, 5)]);
/// assert_eq!(backend.agents().unwrap().len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    state: Mutex<State>,
}

impl InMemoryBackend {
    pub fn new(config: AssignmentConfig) -> Self {
        Self {
            state: Mutex::new(State {
                config,
                ..State::default()
            }),
        }
    }

    pub fn with_agents(mut self, agents: impl IntoIterator<Item = AgentMetrics>) -> Self {
        let state = self.state.get_mut();
        for agent in agents {
            state.agents.insert(agent.id.clone(), agent);
        }
        self
    }

    pub fn with_tickets(mut self, tickets: impl IntoIterator<Item = Ticket>) -> Self {
        let state = self.state.get_mut();
        for ticket in tickets {
            state.tickets.insert(ticket.id.clone(), ticket);
        }
        self
    }

    pub fn upsert_agent(&self, agent: AgentMetrics) {
        self.state.lock().agents.insert(agent.id.clone(), agent);
    }

    pub fn insert_ticket(&self, ticket: Ticket) {
        self.state.lock().tickets.insert(ticket.id.clone(), ticket);
    }

    pub fn agent(&self, id: &AgentId) -> Option<AgentMetrics> {
        self.state.lock().agents.get(id).cloned()
    }

    pub fn ticket(&self, id: &TicketId) -> Option<Ticket> {
        self.state.lock().tickets.get(id).cloned()
    }
}

impl AgentDirectory for InMemoryBackend {
    fn agents(&self) -> Result<Vec<AgentMetrics>> {
        Ok(self.state.lock().agents.values().cloned().collect())
    }

    fn open_tickets(&self) -> Result<Vec<Ticket>> {
        Ok(self
            .state
            .lock()
            .tickets
            .values()
            .filter(|t| t.status.is_open())
            .cloned()
            .collect())
    }
}

impl ConfigStore for InMemoryBackend {
    fn config(&self) -> Result<AssignmentConfig> {
        Ok(self.state.lock().config.clone())
    }

    fn save_config(&self, config: AssignmentConfig) -> Result<()> {
        config.log_issues();
        self.state.lock().config = config;
        Ok(())
    }

    fn rules(&self) -> Result<Vec<AssignmentRule>> {
        let mut rules = self.state.lock().rules.clone();
        rules.sort_by_key(|r| (r.priority, r.created_at));
        Ok(rules)
    }

    fn create_rule(&self, rule: AssignmentRule) -> Result<()> {
        let mut state = self.state.lock();
        if state.rules.iter().any(|r| r.id == rule.id) {
            return Err(AssignError::RuleExists(rule.id));
        }
        state.check_priority(&rule)?;
        state.rules.push(rule);
        for issue in RuleEngine::audit(&state.rules) {
            debug!(?issue, "rule set audit");
        }
        Ok(())
    }

    fn update_rule(&self, rule: AssignmentRule) -> Result<()> {
        let mut state = self.state.lock();
        let idx = state.rule_index(&rule.id)?;
        state.check_priority(&rule)?;
        state.rules[idx] = rule;
        Ok(())
    }

    fn delete_rule(&self, id: &RuleId) -> Result<()> {
        let mut state = self.state.lock();
        let idx = state.rule_index(id)?;
        state.rules.remove(idx);
        Ok(())
    }

    fn set_rule_enabled(&self, id: &RuleId, enabled: bool) -> Result<()> {
        let mut state = self.state.lock();
        let idx = state.rule_index(id)?;
        let mut toggled = state.rules[idx].clone();
        toggled.enabled = enabled;
        state.check_priority(&toggled)?;
        state.rules[idx].enabled = enabled;
        Ok(())
    }
}

impl AssignmentStore for InMemoryBackend {
    fn commit_assignment(&self, ticket: &Ticket, agent: &AgentId) -> Result<()> {
        let mut state = self.state.lock();
        let previous = state
            .tickets
            .get(&ticket.id)
            .filter(|t| t.status.is_open())
            .and_then(|t| t.assignee.clone());

        let mut stored = ticket.clone();
        stored.assignee = Some(agent.clone());

        // Already held by this agent: refresh the record, workload unchanged
        if previous.as_ref() == Some(agent) {
            state.tickets.insert(stored.id.clone(), stored);
            return Ok(());
        }

        state.check_capacity(agent)?;
        if let Some(prev) = previous {
            state.adjust_workload(&prev, -1);
        }
        state.adjust_workload(agent, 1);
        state.tickets.insert(stored.id.clone(), stored);
        Ok(())
    }

    fn apply_move(&self, mv: &RebalanceMove) -> Result<()> {
        let mut state = self.state.lock();
        let held_by_source = state
            .tickets
            .get(&mv.ticket_id)
            .ok_or_else(|| AssignError::TicketNotFound(mv.ticket_id.clone()))?
            .assignee
            .as_ref()
            == Some(&mv.from);
        if !held_by_source {
            return Err(AssignError::StaleMove {
                ticket: mv.ticket_id.clone(),
                expected: mv.from.clone(),
            });
        }
        state.check_capacity(&mv.to)?;

        state.adjust_workload(&mv.from, -1);
        state.adjust_workload(&mv.to, 1);
        if let Some(ticket) = state.tickets.get_mut(&mv.ticket_id) {
            ticket.assignee = Some(mv.to.clone());
        }
        Ok(())
    }
}
