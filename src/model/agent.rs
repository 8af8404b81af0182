//! Per-agent metrics snapshot.

use super::fold;
use super::ids::{AgentId, CategoryId, SubcategoryId, TeamId};
use std::collections::{BTreeSet, HashMap};

/// Presence state of an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Availability {
    Available,
    Busy,
    Away,
    #[default]
    Offline,
}

impl Availability {
    /// Categorical availability score.
    pub fn score(&self) -> f64 {
        match self {
            Availability::Available => 1.0,
            Availability::Busy => 0.5,
            Availability::Away => 0.2,
            Availability::Offline => 0.0,
        }
    }
}

/// Derived metrics for one agent.
///
/// Recomputed by the data provider for every scoring pass; the engine
/// never treats it as the source of truth.
///
/// # Examples
///
/// ```
/// use u_assign::model::{AgentMetrics, Availability};
///
/// let agent = AgentMetrics::new("A1")
///     .with_availability(Availability::Available)
///     .with_workload(3, 10)
///     .with_resolution(0.9, 4.0)
///     .with_satisfaction(4.5);
/// assert_eq!(agent.current_workload, 3);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AgentMetrics {
    pub id: AgentId,
    pub name: String,
    pub role: String,
    pub team_id: Option<TeamId>,
    pub availability: Availability,

    /// Open tickets currently assigned.
    pub current_workload: u32,

    /// Personal capacity. 0 defers to the configured ceiling.
    pub max_concurrent_tickets: u32,

    /// Mean hours from assignment to resolution.
    pub average_resolution_time: f64,

    /// Fraction of assigned tickets resolved, in [0, 1].
    pub resolution_rate: f64,

    /// Mean CSAT, in [0, 5].
    pub customer_satisfaction_score: f64,

    pub category_expertise: HashMap<CategoryId, f64>,
    pub subcategory_expertise: HashMap<SubcategoryId, f64>,
    pub specializations: BTreeSet<String>,
}

impl AgentMetrics {
    pub fn new(id: impl Into<AgentId>) -> Self {
        Self {
            id: id.into(),
            role: "agent".to_string(),
            ..Self::default()
        }
    }

    pub fn with_availability(mut self, availability: Availability) -> Self {
        self.availability = availability;
        self
    }

    pub fn with_workload(mut self, current: u32, max: u32) -> Self {
        self.current_workload = current;
        self.max_concurrent_tickets = max;
        self
    }

    pub fn with_team(mut self, team: impl Into<TeamId>) -> Self {
        self.team_id = Some(team.into());
        self
    }

    pub fn with_resolution(mut self, rate: f64, average_hours: f64) -> Self {
        self.resolution_rate = rate;
        self.average_resolution_time = average_hours;
        self
    }

    pub fn with_satisfaction(mut self, csat: f64) -> Self {
        self.customer_satisfaction_score = csat;
        self
    }

    pub fn with_category_expertise(mut self, category: impl Into<CategoryId>, score: f64) -> Self {
        self.category_expertise.insert(category.into(), score);
        self
    }

    pub fn with_subcategory_expertise(
        mut self,
        subcategory: impl Into<SubcategoryId>,
        score: f64,
    ) -> Self {
        self.subcategory_expertise.insert(subcategory.into(), score);
        self
    }

    pub fn with_specialization(mut self, skill: impl Into<String>) -> Self {
        self.specializations.insert(skill.into());
        self
    }

    /// Capacity after applying the configured per-agent ceiling.
    pub fn effective_capacity(&self, ceiling: u32) -> u32 {
        if self.max_concurrent_tickets == 0 {
            ceiling
        } else {
            self.max_concurrent_tickets.min(ceiling)
        }
    }

    /// Workload over capacity in [0, ∞). Zero capacity reports 0.
    pub fn utilization(&self, ceiling: u32) -> f64 {
        let capacity = self.effective_capacity(ceiling);
        if capacity == 0 {
            0.0
        } else {
            self.current_workload as f64 / capacity as f64
        }
    }

    /// Case-insensitive check that every skill is among the specializations.
    pub fn has_skills(&self, skills: &BTreeSet<String>) -> bool {
        if skills.is_empty() {
            return true;
        }
        let held: BTreeSet<String> = self.specializations.iter().map(|s| fold(s)).collect();
        skills.iter().all(|skill| held.contains(&fold(skill)))
    }
}
