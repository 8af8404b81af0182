//! First-match rule evaluation.

use super::types::{
    AssignTarget, AssignmentRule, RuleConditions, RuleDirectives, RuleEvaluation, RuleIssue,
    RuleMatch, RuleOutcome,
};
use crate::config::ClockWindow;
use crate::model::{fold, Ticket};
use chrono::NaiveTime;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Conditions with time window parsed and keywords lowercased.
struct PreparedConditions<'a> {
    conditions: &'a RuleConditions,
    window: Option<ClockWindow>,
    keywords: Vec<String>,
}

impl<'a> PreparedConditions<'a> {
    fn prepare(conditions: &'a RuleConditions) -> Result<Self, String> {
        let window = conditions
            .time_of_day
            .as_ref()
            .map(|tod| ClockWindow::parse(&tod.start, &tod.end))
            .transpose()?;
        let keywords = conditions
            .keywords
            .iter()
            .map(|k| fold(k))
            .filter(|k| !k.is_empty())
            .collect();
        Ok(Self {
            conditions,
            window,
            keywords,
        })
    }

    /// ANDs every populated condition.
    fn matches(&self, ticket: &Ticket, haystack: &str, local_time: NaiveTime) -> bool {
        let c = self.conditions;

        if !c.categories.is_empty() && !c.categories.contains(&ticket.category_id) {
            return false;
        }
        if !c.priorities.is_empty() && !c.priorities.contains(&ticket.priority) {
            return false;
        }
        if !c.customer_tiers.is_empty() {
            let tier_ok = ticket.customer_tier.as_deref().map(fold).is_some_and(|tier| {
                c.customer_tiers.iter().any(|t| fold(t) == tier)
            });
            if !tier_ok {
                return false;
            }
        }
        if let Some(window) = self.window {
            if !window.contains(local_time) {
                return false;
            }
        }
        if !self.keywords.is_empty() && !self.keywords.iter().any(|k| haystack.contains(k)) {
            return false;
        }
        true
    }
}

/// Evaluates assignment rules against tickets.
///
/// Enabled rules are tried in ascending `priority`, ties broken by
/// `created_at` and then by input position. The first rule whose
/// conditions all hold decides the outcome; later rules are not looked at.
///
/// # Examples
///
/// ```
/// use chrono::{NaiveTime, Utc};
/// use u_assign::model::{Ticket, TicketPriority};
/// use u_assign::rules::{AssignTarget, AssignmentRule, RuleEngine, RuleOutcome};
///
/// let rules = vec![AssignmentRule::new("r1", "urgent", 1, Utc::now())
///     .with_priorities([TicketPriority::Urgent])
///     .assign_to_agent("A1")];
/// let ticket = Ticket::new("T1", TicketPriority::Urgent, "network", Utc::now());
/// let noon = NaiveTime::from_hms_opt(12, 0, 0).unwrap();
///
/// match RuleEngine::evaluate(&ticket, &rules, noon) {
///     RuleOutcome::Pinned(AssignTarget::Agent(agent), _) => assert_eq!(agent.as_str(), "A1"),
///     other => panic!("unexpected outcome: {other:?}"),
/// }
/// ```
pub struct RuleEngine;

impl RuleEngine {
    /// Enabled rules in evaluation order.
    pub fn ordered(rules: &[AssignmentRule]) -> Vec<&AssignmentRule> {
        let mut enabled: Vec<&AssignmentRule> = rules.iter().filter(|r| r.enabled).collect();
        // stable: equal (priority, created_at) keeps input order
        enabled.sort_by_key(|r| (r.priority, r.created_at));
        enabled
    }

    /// Evaluates `rules` against `ticket` at the given business-local time.
    pub fn evaluate(ticket: &Ticket, rules: &[AssignmentRule], local_time: NaiveTime) -> RuleOutcome {
        Self::evaluate_detailed(ticket, rules, local_time).outcome
    }

    /// Like [`RuleEngine::evaluate`], also reporting examined and skipped rules.
    pub fn evaluate_detailed(
        ticket: &Ticket,
        rules: &[AssignmentRule],
        local_time: NaiveTime,
    ) -> RuleEvaluation {
        let haystack = ticket.haystack();
        let mut examined = 0;
        let mut skipped = Vec::new();

        for rule in Self::ordered(rules) {
            let prepared = match PreparedConditions::prepare(&rule.conditions) {
                Ok(p) => p,
                Err(reason) => {
                    warn!(rule = %rule.id, "skipping malformed assignment rule: {reason}");
                    skipped.push(rule.id.clone());
                    continue;
                }
            };

            examined += 1;
            if !prepared.matches(ticket, &haystack, local_time) {
                continue;
            }

            debug!(rule = %rule.id, ticket = %ticket.id, "assignment rule matched");
            return RuleEvaluation {
                outcome: Self::outcome_for(rule),
                examined,
                skipped,
            };
        }

        RuleEvaluation {
            outcome: RuleOutcome::NoMatch,
            examined,
            skipped,
        }
    }

    fn outcome_for(rule: &AssignmentRule) -> RuleOutcome {
        let matched = RuleMatch {
            rule_id: rule.id.clone(),
            rule_name: rule.name.clone(),
            directives: RuleDirectives::from(&rule.actions),
        };
        match (&rule.actions.assign_to_agent, &rule.actions.assign_to_team) {
            (Some(agent), _) => RuleOutcome::Pinned(AssignTarget::Agent(agent.clone()), matched),
            (None, Some(team)) => RuleOutcome::Pinned(AssignTarget::Team(team.clone()), matched),
            (None, None) => RuleOutcome::Constrained(matched),
        }
    }

    /// Reports duplicate priorities, malformed windows, rules that match
    /// without doing anything, and catch-alls that hide later rules.
    pub fn audit(rules: &[AssignmentRule]) -> Vec<RuleIssue> {
        let mut issues = Vec::new();
        let ordered = Self::ordered(rules);

        let mut by_priority: BTreeMap<i32, Vec<_>> = BTreeMap::new();
        for rule in &ordered {
            by_priority
                .entry(rule.priority)
                .or_default()
                .push(rule.id.clone());
        }
        for (priority, ids) in by_priority {
            if ids.len() > 1 {
                issues.push(RuleIssue::DuplicatePriority {
                    priority,
                    rules: ids,
                });
            }
        }

        if let Some(pos) = ordered.iter().position(|r| r.conditions.is_empty()) {
            let shadowed: Vec<_> = ordered[pos + 1..].iter().map(|r| r.id.clone()).collect();
            if !shadowed.is_empty() {
                issues.push(RuleIssue::Shadows {
                    rule: ordered[pos].id.clone(),
                    shadowed,
                });
            }
        }

        for rule in ordered {
            if let Err(reason) = PreparedConditions::prepare(&rule.conditions) {
                issues.push(RuleIssue::MalformedTimeWindow {
                    rule: rule.id.clone(),
                    reason,
                });
            }
            let a = &rule.actions;
            if a.assign_to_agent.is_none()
                && a.assign_to_team.is_none()
                && a.require_skills.is_empty()
                && a.max_response_time.is_none()
                && a.escalate_after.is_none()
                && !a.notify_manager
            {
                issues.push(RuleIssue::NoEffect {
                    rule: rule.id.clone(),
                });
            }
        }
        issues
    }
}
