//! Rule-based routing.
//!
//! An ordered list of administrator rules is matched against an incoming
//! ticket. The first enabled rule whose conditions all hold either pins
//! the ticket to an agent or team, or constrains the scoring pass; when
//! nothing matches the ticket goes to open scoring.
//!
//! Conditions are a typed record of optional predicates (category,
//! priority, customer tier, time-of-day window, keywords). A rule with a
//! window that cannot be parsed is skipped with a warning.

mod engine;
mod types;

pub use engine::RuleEngine;
pub use types::{
    AssignTarget, AssignmentRule, RuleActions, RuleConditions, RuleDirectives, RuleEvaluation,
    RuleIssue, RuleMatch, RuleOutcome, TimeOfDay,
};
