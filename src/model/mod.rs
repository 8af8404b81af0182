//! Domain data shared by every engine.
//!
//! Tickets and agent metrics arrive as snapshots from the caller's data
//! provider. Nothing in here is mutated by rule evaluation or scoring.

mod agent;
mod ids;
mod ticket;

pub use agent::{AgentMetrics, Availability};
pub use ids::{AgentId, CategoryId, RuleId, SubcategoryId, TeamId, TicketId};
pub use ticket::{Ticket, TicketPriority, TicketStatus};

/// Case folding shared by skills, customer tiers and keywords: trimmed,
/// Unicode lowercase.
pub(crate) fn fold(s: &str) -> String {
    s.trim().to_lowercase()
}
