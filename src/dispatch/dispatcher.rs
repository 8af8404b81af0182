//! Ticket dispatch: rules, scoring, conditional commit.

use super::types::{AgentDirectory, AssignmentDecision, AssignmentStore, ConfigStore};
use crate::config::AssignmentConfig;
use crate::error::{AssignError, Result};
use crate::model::{AgentMetrics, TeamId, Ticket};
use crate::rebalance::{RebalanceResult, RebalanceTrigger, Rebalancer, StopReason};
use crate::rules::{AssignTarget, RuleEngine, RuleMatch, RuleOutcome};
use crate::scoring::ScoringEngine;
use crate::workload::WorkloadSummary;
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

/// Drives assignment and rebalancing against a backend.
///
/// Holds no state of its own: every call reads a fresh configuration,
/// rule list and roster from the backend.
pub struct Dispatcher<'a, B> {
    backend: &'a B,
}

impl<'a, B> Dispatcher<'a, B>
where
    B: AgentDirectory + ConfigStore + AssignmentStore,
{
    pub fn new(backend: &'a B) -> Self {
        Self { backend }
    }

    /// Routes `ticket` and commits the assignment.
    ///
    /// A rule pin to an agent is committed as is; a capacity conflict on
    /// it is returned to the caller. Every other path re-ranks on fresh
    /// metrics after a conflict, up to `max_commit_attempts` times.
    pub fn assign(&self, ticket: &Ticket, now: DateTime<Utc>) -> Result<AssignmentDecision> {
        let config = self.backend.config()?;
        let rules = self.backend.rules()?;
        let local_time = config.business_hours.local_time(now);

        match RuleEngine::evaluate(ticket, &rules, local_time) {
            RuleOutcome::Pinned(AssignTarget::Agent(agent_id), rule) => {
                self.backend.commit_assignment(ticket, &agent_id)?;
                info!(ticket = %ticket.id, agent = %agent_id, rule = %rule.rule_id, "pinned assignment");
                Ok(AssignmentDecision::Pinned {
                    ticket_id: ticket.id.clone(),
                    agent_id,
                    rule,
                })
            }
            RuleOutcome::Pinned(AssignTarget::Team(team), rule) => {
                self.assign_scored(ticket, &config, now, Some(&team), Some(rule))
            }
            RuleOutcome::Constrained(rule) => self.assign_scored(ticket, &config, now, None, Some(rule)),
            RuleOutcome::NoMatch => self.assign_scored(ticket, &config, now, None, None),
        }
    }

    fn assign_scored(
        &self,
        ticket: &Ticket,
        config: &AssignmentConfig,
        now: DateTime<Utc>,
        team: Option<&TeamId>,
        rule: Option<RuleMatch>,
    ) -> Result<AssignmentDecision> {
        let engine = ScoringEngine::standard(config);
        let skills = rule
            .as_ref()
            .map(|r| r.directives.require_skills.clone())
            .unwrap_or_default();

        for attempt in 1..=config.max_commit_attempts {
            let agents: Vec<AgentMetrics> = self
                .backend
                .agents()?
                .into_iter()
                .filter(|a| team.map_or(true, |t| a.team_id.as_ref() == Some(t)))
                .collect();

            let Some(best) = engine
                .rank_with_skills(ticket, &agents, now, &skills)
                .into_iter()
                .next()
            else {
                debug!(ticket = %ticket.id, "no eligible agent");
                return Ok(AssignmentDecision::Unassigned {
                    ticket_id: ticket.id.clone(),
                    rule,
                });
            };

            match self.backend.commit_assignment(ticket, &best.agent_id) {
                Ok(()) => {
                    info!(ticket = %ticket.id, agent = %best.agent_id, score = best.score, "scored assignment");
                    return Ok(AssignmentDecision::Scored {
                        ticket_id: ticket.id.clone(),
                        agent_id: best.agent_id,
                        score: best.score,
                        rule,
                    });
                }
                Err(e @ AssignError::CapacityConflict { .. }) => {
                    warn!(ticket = %ticket.id, attempt, "{e}; re-ranking on fresh metrics");
                }
                Err(e) => return Err(e),
            }
        }

        Err(AssignError::RetriesExhausted {
            ticket: ticket.id.clone(),
            attempts: config.max_commit_attempts,
        })
    }

    /// Plans a rebalance on a fresh snapshot and applies it move by move.
    ///
    /// A move the store rejects ends the batch; moves already applied
    /// stay and are reported.
    pub fn rebalance(&self, trigger: RebalanceTrigger, now: DateTime<Utc>) -> Result<RebalanceResult> {
        let config = self.backend.config()?;
        let agents = self.backend.agents()?;
        let tickets = self.backend.open_tickets()?;

        let mut result = Rebalancer::run(&agents, &tickets, &config, trigger, now);
        let planned = std::mem::take(&mut result.moves);
        let total = planned.len();

        for mv in planned {
            if let Err(e) = self.backend.apply_move(&mv) {
                warn!(ticket = %mv.ticket_id, "rebalance move rejected: {e}");
                result.message = format!(
                    "applied {} of {} planned move(s); stopped: {e}",
                    result.moves.len(),
                    total
                );
                result.stop_reason = StopReason::CommitFailed;
                break;
            }
            result.moves.push(mv);
        }

        Ok(result)
    }

    /// Current workload view for dashboards.
    pub fn workload(&self) -> Result<WorkloadSummary> {
        let config = self.backend.config()?;
        let agents = self.backend.agents()?;
        Ok(WorkloadSummary::compute(&agents, &config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BusinessHours;
    use crate::dispatch::InMemoryBackend;
    use crate::model::{AgentId, Availability, RuleId, TicketPriority};
    use crate::rebalance::RebalanceMove;
    use crate::rules::AssignmentRule;
    use chrono::{Duration, TimeZone};
    use std::cell::Cell;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 6, 12, 0, 0).unwrap()
    }

    fn config() -> AssignmentConfig {
        AssignmentConfig::default()
            .with_weights(34, 33, 33)
            .with_business_hours(BusinessHours::always())
    }

    fn agent(id: &str, workload: u32) -> AgentMetrics {
        AgentMetrics::new(id)
            .with_availability(Availability::Available)
            .with_workload(workload, 10)
            .with_resolution(0.8, 8.0)
            .with_satisfaction(4.0)
    }

    fn ticket(id: &str, priority: TicketPriority) -> Ticket {
        Ticket::new(id, priority, "general", now())
    }

    fn backend() -> InMemoryBackend {
        InMemoryBackend::new(config()).with_agents([
            agent("A1", 9),
            agent("A2", 2).with_team("billing").with_specialization("refunds"),
            agent("A3", 5).with_team("billing"),
        ])
    }

    #[test]
    fn test_unmatched_ticket_goes_to_best_scorer() {
        let b = backend();
        let decision = Dispatcher::new(&b)
            .assign(&ticket("T1", TicketPriority::Low), now())
            .unwrap();
        assert_eq!(decision.agent_id(), Some(&AgentId::from("A2")));
        assert!(decision.rule().is_none());
        assert_eq!(b.agent(&AgentId::from("A2")).unwrap().current_workload, 3);
    }

    #[test]
    fn test_rule_pin_bypasses_scoring() {
        let b = backend();
        b.create_rule(
            AssignmentRule::new("urgent", "urgent", 1, now())
                .with_priorities([TicketPriority::Urgent])
                .assign_to_agent("A1")
                .notify_manager(true),
        )
        .unwrap();

        let decision = Dispatcher::new(&b)
            .assign(&ticket("T1", TicketPriority::Urgent), now())
            .unwrap();
        match decision {
            AssignmentDecision::Pinned { agent_id, rule, .. } => {
                assert_eq!(agent_id, AgentId::from("A1"));
                assert!(rule.directives.notify_manager);
            }
            other => panic!("expected pinned decision, got {other:?}"),
        }
        assert_eq!(b.agent(&AgentId::from("A1")).unwrap().current_workload, 10);

        // A1 is now full; the pin surfaces the conflict
        let err = Dispatcher::new(&b)
            .assign(&ticket("T2", TicketPriority::Urgent), now())
            .unwrap_err();
        assert!(matches!(err, AssignError::CapacityConflict { .. }));
    }

    #[test]
    fn test_team_pin_ranks_team_members_only() {
        let b = backend();
        b.create_rule(AssignmentRule::new("team", "billing team", 1, now()).assign_to_team("billing"))
            .unwrap();
        b.upsert_agent(agent("A0", 0));

        let decision = Dispatcher::new(&b)
            .assign(&ticket("T1", TicketPriority::Low), now())
            .unwrap();
        assert_eq!(decision.agent_id(), Some(&AgentId::from("A2")));
        assert_eq!(decision.rule().unwrap().rule_id, RuleId::from("team"));
    }

    #[test]
    fn test_required_skills_constrain_scoring() {
        let b = InMemoryBackend::new(config()).with_agents([
            agent("A1", 0),
            agent("A2", 7).with_specialization("refunds"),
        ]);
        b.create_rule(
            AssignmentRule::new("skills", "refund skills", 1, now())
                .with_keywords(["refund"])
                .require_skills(["refunds"]),
        )
        .unwrap();

        let t = ticket("T1", TicketPriority::Low).with_text("Refund please", "");
        let decision = Dispatcher::new(&b).assign(&t, now()).unwrap();
        assert_eq!(decision.agent_id(), Some(&AgentId::from("A2")));
    }

    #[test]
    fn test_no_eligible_agent_is_unassigned() {
        let b = InMemoryBackend::new(config())
            .with_agents([agent("A1", 10), agent("A2", 0).with_availability(Availability::Away)]);
        let decision = Dispatcher::new(&b)
            .assign(&ticket("T1", TicketPriority::Low), now())
            .unwrap();
        assert!(matches!(decision, AssignmentDecision::Unassigned { .. }));
    }

    /// Fills the first-choice agent right before its first commit, as a
    /// concurrent dispatcher would.
    struct RacingBackend {
        inner: InMemoryBackend,
        raced: Cell<bool>,
    }

    impl AgentDirectory for RacingBackend {
        fn agents(&self) -> Result<Vec<AgentMetrics>> {
            self.inner.agents()
        }
        fn open_tickets(&self) -> Result<Vec<Ticket>> {
            self.inner.open_tickets()
        }
    }

    impl ConfigStore for RacingBackend {
        fn config(&self) -> Result<AssignmentConfig> {
            self.inner.config()
        }
        fn save_config(&self, config: AssignmentConfig) -> Result<()> {
            self.inner.save_config(config)
        }
        fn rules(&self) -> Result<Vec<AssignmentRule>> {
            self.inner.rules()
        }
        fn create_rule(&self, rule: AssignmentRule) -> Result<()> {
            self.inner.create_rule(rule)
        }
        fn update_rule(&self, rule: AssignmentRule) -> Result<()> {
            self.inner.update_rule(rule)
        }
        fn delete_rule(&self, id: &RuleId) -> Result<()> {
            self.inner.delete_rule(id)
        }
        fn set_rule_enabled(&self, id: &RuleId, enabled: bool) -> Result<()> {
            self.inner.set_rule_enabled(id, enabled)
        }
    }

    impl AssignmentStore for RacingBackend {
        fn commit_assignment(&self, ticket: &Ticket, agent: &AgentId) -> Result<()> {
            if !self.raced.replace(true) {
                let mut full = self.inner.agent(agent).unwrap();
                full.current_workload = full.max_concurrent_tickets;
                self.inner.upsert_agent(full);
            }
            self.inner.commit_assignment(ticket, agent)
        }
        fn apply_move(&self, mv: &RebalanceMove) -> Result<()> {
            self.inner.apply_move(mv)
        }
    }

    #[test]
    fn test_capacity_race_retries_on_fresh_metrics() {
        let b = RacingBackend {
            inner: InMemoryBackend::new(config()).with_agents([agent("A1", 1), agent("A2", 5)]),
            raced: Cell::new(false),
        };
        let decision = Dispatcher::new(&b)
            .assign(&ticket("T1", TicketPriority::Low), now())
            .unwrap();
        assert_eq!(decision.agent_id(), Some(&AgentId::from("A2")));
        assert_eq!(b.inner.agent(&AgentId::from("A1")).unwrap().current_workload, 10);
    }

    #[test]
    fn test_retries_exhausted() {
        let b = RacingBackend {
            inner: InMemoryBackend::new(config().with_max_commit_attempts(1))
                .with_agents([agent("A1", 1), agent("A2", 5)]),
            raced: Cell::new(false),
        };
        let err = Dispatcher::new(&b)
            .assign(&ticket("T1", TicketPriority::Low), now())
            .unwrap_err();
        assert!(matches!(err, AssignError::RetriesExhausted { attempts: 1, .. }));
    }

    #[test]
    fn test_rebalance_applies_moves() {
        let agents = [agent("A1", 10), agent("A2", 10), agent("A3", 10), agent("A4", 4)];
        let tickets = agents.iter().flat_map(|a| {
            (0..a.current_workload).map(move |i| {
                Ticket::new(
                    format!("{}-{i}", a.id),
                    TicketPriority::Medium,
                    "general",
                    now() - Duration::minutes(i as i64),
                )
                .with_assignee(a.id.clone())
            })
        });
        let b = InMemoryBackend::new(config().with_auto_rebalance(true, 80.0))
            .with_tickets(tickets)
            .with_agents(agents.clone());

        let dispatcher = Dispatcher::new(&b);
        let result = dispatcher.rebalance(RebalanceTrigger::Scheduled, now()).unwrap();
        assert!(result.success);
        assert_eq!(result.move_count(), 3);
        assert_eq!(b.agent(&AgentId::from("A4")).unwrap().current_workload, 7);

        let summary = dispatcher.workload().unwrap();
        assert!(summary.overloaded().is_empty());
    }

    #[test]
    fn test_rebalance_disabled_changes_nothing() {
        let b = InMemoryBackend::new(config().with_auto_rebalance(false, 80.0))
            .with_agents([agent("A1", 10), agent("A2", 7)])
            .with_tickets((0..10).map(|i| {
                Ticket::new(format!("T{i}"), TicketPriority::Low, "general", now()).with_assignee("A1")
            }));
        let result = Dispatcher::new(&b)
            .rebalance(RebalanceTrigger::Scheduled, now())
            .unwrap();
        assert!(!result.success);
        assert!(result.moves.is_empty());
        assert_eq!(b.agent(&AgentId::from("A1")).unwrap().current_workload, 10);
    }
}
