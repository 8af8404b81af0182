//! The assignment-relevant view of a ticket.

use super::ids::{AgentId, CategoryId, SubcategoryId, TicketId};
use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;

/// Ticket urgency as set by the requester or triage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum TicketPriority {
    Low,
    Medium,
    High,
    Urgent,
}

impl TicketPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketPriority::Low => "low",
            TicketPriority::Medium => "medium",
            TicketPriority::High => "high",
            TicketPriority::Urgent => "urgent",
        }
    }
}

impl fmt::Display for TicketPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TicketPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(TicketPriority::Low),
            "medium" | "normal" => Ok(TicketPriority::Medium),
            "high" => Ok(TicketPriority::High),
            "urgent" | "critical" => Ok(TicketPriority::Urgent),
            other => Err(format!("unknown ticket priority: {other}")),
        }
    }
}

/// Lifecycle state of a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TicketStatus {
    #[default]
    Open,
    InProgress,
    Pending,
    Resolved,
    Closed,
}

impl TicketStatus {
    /// Open tickets count toward an agent's workload.
    pub fn is_open(&self) -> bool {
        matches!(
            self,
            TicketStatus::Open | TicketStatus::InProgress | TicketStatus::Pending
        )
    }
}

/// A ticket as seen by the rule engine, the scorer and the rebalancer.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Ticket {
    pub id: TicketId,
    pub title: String,
    pub body: String,
    pub priority: TicketPriority,
    pub category_id: CategoryId,
    pub subcategory_id: Option<SubcategoryId>,
    pub customer_tier: Option<String>,
    pub created_at: DateTime<Utc>,
    pub assignee: Option<AgentId>,
    pub status: TicketStatus,
}

impl Ticket {
    /// Creates an open, unassigned ticket.
    pub fn new(
        id: impl Into<TicketId>,
        priority: TicketPriority,
        category_id: impl Into<CategoryId>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            body: String::new(),
            priority,
            category_id: category_id.into(),
            subcategory_id: None,
            customer_tier: None,
            created_at,
            assignee: None,
            status: TicketStatus::Open,
        }
    }

    pub fn with_text(mut self, title: impl Into<String>, body: impl Into<String>) -> Self {
        self.title = title.into();
        self.body = body.into();
        self
    }

    pub fn with_subcategory(mut self, id: impl Into<SubcategoryId>) -> Self {
        self.subcategory_id = Some(id.into());
        self
    }

    pub fn with_customer_tier(mut self, tier: impl Into<String>) -> Self {
        self.customer_tier = Some(tier.into());
        self
    }

    pub fn with_assignee(mut self, agent: impl Into<AgentId>) -> Self {
        self.assignee = Some(agent.into());
        self
    }

    pub fn with_status(mut self, status: TicketStatus) -> Self {
        self.status = status;
        self
    }

    /// Lowercased title and body joined by a space, used for keyword matching.
    pub fn haystack(&self) -> String {
        let mut text = String::with_capacity(self.title.len() + self.body.len() + 1);
        text.push_str(&self.title);
        text.push(' ');
        text.push_str(&self.body);
        super::fold(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_priority_parse() {
        assert_eq!("Urgent".parse::<TicketPriority>(), Ok(TicketPriority::Urgent));
        assert_eq!(" low ".parse::<TicketPriority>(), Ok(TicketPriority::Low));
        assert!("whenever".parse::<TicketPriority>().is_err());
    }

    #[test]
    fn test_open_statuses() {
        assert!(TicketStatus::Pending.is_open());
        assert!(!TicketStatus::Resolved.is_open());
        assert!(!TicketStatus::Closed.is_open());
    }

    #[test]
    fn test_haystack_joins_title_and_body() {
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let ticket = Ticket::new("T1", TicketPriority::High, "billing", created)
            .with_text("Refund REQUEST", "Card charged twice");
        assert_eq!(ticket.haystack(), "refund request card charged twice");
    }
}
