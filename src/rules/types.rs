//! Assignment rule data and evaluation outcomes.

use crate::model::{AgentId, CategoryId, RuleId, TeamId, TicketPriority};
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

/// Raw `HH:MM` window as stored by the rules manager.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeOfDay {
    pub start: String,
    pub end: String,
}

impl TimeOfDay {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }
}

/// Predicates a ticket must satisfy. Empty sets and `None` are unpopulated
/// and impose nothing; populated fields are ANDed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RuleConditions {
    pub categories: BTreeSet<CategoryId>,
    pub priorities: BTreeSet<TicketPriority>,
    pub customer_tiers: BTreeSet<String>,
    pub time_of_day: Option<TimeOfDay>,
    /// Any one keyword appearing in title or body satisfies the condition.
    pub keywords: BTreeSet<String>,
}

impl RuleConditions {
    /// True when no field is populated, making the rule a catch-all.
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
            && self.priorities.is_empty()
            && self.customer_tiers.is_empty()
            && self.time_of_day.is_none()
            && self.keywords.iter().all(|k| k.trim().is_empty())
    }
}

/// What happens when a rule matches.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RuleActions {
    pub assign_to_agent: Option<AgentId>,
    pub assign_to_team: Option<TeamId>,
    pub require_skills: BTreeSet<String>,
    /// Minutes.
    pub max_response_time: Option<u32>,
    /// Minutes.
    pub escalate_after: Option<u32>,
    pub notify_manager: bool,
}

/// An administrator-defined routing rule.
///
/// Lower `priority` is evaluated first; `created_at` breaks ties.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use u_assign::model::TicketPriority;
/// use u_assign::rules::AssignmentRule;
///
/// let rule = AssignmentRule::new("vip-urgent", "Urgent to A1", 1, Utc::now())
///     .with_priorities([TicketPriority::Urgent])
///     .assign_to_agent("A1");
/// assert!(rule.enabled);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AssignmentRule {
    pub id: RuleId,
    pub name: String,
    pub description: String,
    pub priority: i32,
    pub enabled: bool,
    pub conditions: RuleConditions,
    pub actions: RuleActions,
    pub created_at: DateTime<Utc>,
}

impl AssignmentRule {
    pub fn new(
        id: impl Into<RuleId>,
        name: impl Into<String>,
        priority: i32,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            priority,
            enabled: true,
            conditions: RuleConditions::default(),
            actions: RuleActions::default(),
            created_at,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_categories<I, C>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<CategoryId>,
    {
        self.conditions.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_priorities(mut self, priorities: impl IntoIterator<Item = TicketPriority>) -> Self {
        self.conditions.priorities = priorities.into_iter().collect();
        self
    }

    pub fn with_customer_tiers<I, S>(mut self, tiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.conditions.customer_tiers = tiers.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_time_of_day(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.conditions.time_of_day = Some(TimeOfDay::new(start, end));
        self
    }

    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.conditions.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    pub fn assign_to_agent(mut self, agent: impl Into<AgentId>) -> Self {
        self.actions.assign_to_agent = Some(agent.into());
        self
    }

    pub fn assign_to_team(mut self, team: impl Into<TeamId>) -> Self {
        self.actions.assign_to_team = Some(team.into());
        self
    }

    pub fn require_skills<I, S>(mut self, skills: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.actions.require_skills = skills.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_sla(mut self, max_response_time: Option<u32>, escalate_after: Option<u32>) -> Self {
        self.actions.max_response_time = max_response_time;
        self.actions.escalate_after = escalate_after;
        self
    }

    pub fn notify_manager(mut self, notify: bool) -> Self {
        self.actions.notify_manager = notify;
        self
    }
}

/// The pin target of a matching rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignTarget {
    Agent(AgentId),
    Team(TeamId),
}

/// Side-channel instructions for the ticket dispatcher.
///
/// The engine only returns these; acting on them (escalation timers,
/// manager notifications) belongs to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RuleDirectives {
    pub require_skills: BTreeSet<String>,
    pub max_response_time: Option<u32>,
    pub escalate_after: Option<u32>,
    pub notify_manager: bool,
}

impl From<&RuleActions> for RuleDirectives {
    fn from(actions: &RuleActions) -> Self {
        Self {
            require_skills: actions.require_skills.clone(),
            max_response_time: actions.max_response_time,
            escalate_after: actions.escalate_after,
            notify_manager: actions.notify_manager,
        }
    }
}

/// The rule that won evaluation and what it asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleMatch {
    pub rule_id: RuleId,
    pub rule_name: String,
    pub directives: RuleDirectives,
}

/// Result of evaluating a rule list against a ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleOutcome {
    /// A rule forces the ticket onto an agent or team, bypassing
    /// open scoring.
    Pinned(AssignTarget, RuleMatch),

    /// A rule matched without naming a target; its directives
    /// (notably required skills) constrain the scoring pass.
    Constrained(RuleMatch),

    NoMatch,
}

impl RuleOutcome {
    pub fn rule_match(&self) -> Option<&RuleMatch> {
        match self {
            RuleOutcome::Pinned(_, m) | RuleOutcome::Constrained(m) => Some(m),
            RuleOutcome::NoMatch => None,
        }
    }

    pub fn target(&self) -> Option<&AssignTarget> {
        match self {
            RuleOutcome::Pinned(target, _) => Some(target),
            _ => None,
        }
    }
}

/// Outcome plus bookkeeping of one evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleEvaluation {
    pub outcome: RuleOutcome,

    /// Enabled, well-formed rules whose conditions were tested.
    pub examined: usize,

    /// Enabled rules skipped as malformed.
    pub skipped: Vec<RuleId>,
}

/// A problem found when auditing a rule set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleIssue {
    /// Two enabled rules share a priority; the earlier-created one wins.
    DuplicatePriority {
        priority: i32,
        rules: Vec<RuleId>,
    },
    MalformedTimeWindow {
        rule: RuleId,
        reason: String,
    },
    /// The rule can never route anything useful.
    NoEffect { rule: RuleId },
    /// A catch-all rule matches every ticket, so the rules after it never run.
    Shadows { rule: RuleId, shadowed: Vec<RuleId> },
}
