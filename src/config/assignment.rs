//! Process-wide assignment configuration.
//!
//! [`AssignmentConfig`] is passed explicitly into every scoring,
//! rebalancing and dispatch call. Out-of-range values are tolerated and
//! reported through [`AssignmentConfig::issues`], never rejected.

use super::hours::BusinessHours;
use thiserror::Error;
use tracing::warn;

/// Sub-weights of the performance score.
///
/// The three components are blended by their relative weights; all-zero
/// weights fall back to an unweighted mean.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PerformanceBlend {
    /// Weight of `resolution_rate`.
    pub resolution_rate: f64,

    /// Weight of the normalized resolution speed.
    pub resolution_speed: f64,

    /// Weight of `customer_satisfaction_score / 5`.
    pub satisfaction: f64,

    /// Resolution time (hours) that scores 0.5 on the speed component.
    pub target_resolution_hours: f64,
}

impl Default for PerformanceBlend {
    fn default() -> Self {
        Self {
            resolution_rate: 1.0,
            resolution_speed: 1.0,
            satisfaction: 1.0,
            target_resolution_hours: 24.0,
        }
    }
}

impl PerformanceBlend {
    pub fn with_weights(mut self, resolution_rate: f64, resolution_speed: f64, satisfaction: f64) -> Self {
        self.resolution_rate = resolution_rate;
        self.resolution_speed = resolution_speed;
        self.satisfaction = satisfaction;
        self
    }

    pub fn with_target_resolution_hours(mut self, hours: f64) -> Self {
        self.target_resolution_hours = hours;
        self
    }
}

/// A tolerated but suspicious configuration value.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigIssue {
    #[error("scoring weights sum to {0}, expected 100; scores are normalized")]
    WeightSum(u32),

    #[error("{name} weight {value} exceeds 100")]
    WeightOutOfRange { name: &'static str, value: u32 },

    #[error("max_concurrent_tickets is 0; no agent is eligible")]
    ZeroCapacity,

    #[error("business hours: {0}")]
    BusinessHours(String),

    #[error("rebalance threshold {0} is outside 0..=100")]
    ThresholdOutOfRange(f64),

    #[error("rebalance margin {0} is negative or not finite")]
    InvalidMargin(f64),

    #[error("performance blend weight is negative or not finite")]
    InvalidBlend,

    #[error("max_commit_attempts is 0; every assignment will fail")]
    NoCommitAttempts,
}

/// Configuration shared by the scoring engine, the rebalancer and the
/// dispatcher.
///
/// # Examples
///
/// ```
/// use u_assign::config::{AssignmentConfig, BusinessHours};
///
/// let config = AssignmentConfig::default()
///     .with_weights(50, 30, 20)
///     .with_max_concurrent_tickets(12)
///     .with_business_hours(BusinessHours::new("08:00", "20:00", "Europe/Berlin"))
///     .with_auto_rebalance(true, 85.0);
/// assert!(config.issues().is_empty());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AssignmentConfig {
    /// Weight of free capacity, 0–100.
    pub workload_weight: u32,

    /// Weight of historical performance, 0–100.
    pub performance_weight: u32,

    /// Weight of presence state, 0–100.
    pub availability_weight: u32,

    /// Per-agent ceiling on open tickets.
    pub max_concurrent_tickets: u32,

    pub business_hours: BusinessHours,

    /// Whether scheduled rebalance runs may move tickets.
    pub auto_rebalance: bool,

    /// Team utilization percentage at or above which scheduled
    /// rebalancing triggers.
    pub rebalance_threshold: f64,

    /// Percentage points above the team average before an agent counts
    /// as overloaded.
    pub rebalance_margin: f64,

    /// Upper bound on moves per rebalance run.
    pub max_rebalance_moves: usize,

    pub performance: PerformanceBlend,

    /// Multiplier on the additive expertise bonus. 0 disables it.
    pub expertise_bonus_scale: f64,

    /// Conditional-commit attempts per assignment before giving up.
    pub max_commit_attempts: u32,

    /// Whether to score candidates in parallel using rayon.
    ///
    /// Only honored when the `parallel` feature is enabled.
    pub parallel: bool,
}

impl Default for AssignmentConfig {
    fn default() -> Self {
        Self {
            workload_weight: 40,
            performance_weight: 40,
            availability_weight: 20,
            max_concurrent_tickets: 10,
            business_hours: BusinessHours::default(),
            auto_rebalance: true,
            rebalance_threshold: 80.0,
            rebalance_margin: 10.0,
            max_rebalance_moves: 50,
            performance: PerformanceBlend::default(),
            expertise_bonus_scale: 1.0,
            max_commit_attempts: 3,
            parallel: false,
        }
    }
}

impl AssignmentConfig {
    /// Sets the workload, performance and availability weights.
    pub fn with_weights(mut self, workload: u32, performance: u32, availability: u32) -> Self {
        self.workload_weight = workload;
        self.performance_weight = performance;
        self.availability_weight = availability;
        self
    }

    pub fn with_max_concurrent_tickets(mut self, n: u32) -> Self {
        self.max_concurrent_tickets = n;
        self
    }

    pub fn with_business_hours(mut self, hours: BusinessHours) -> Self {
        self.business_hours = hours;
        self
    }

    /// Enables or disables scheduled rebalancing and sets its threshold
    /// (team utilization percentage).
    pub fn with_auto_rebalance(mut self, enabled: bool, threshold: f64) -> Self {
        self.auto_rebalance = enabled;
        self.rebalance_threshold = threshold;
        self
    }

    pub fn with_rebalance_margin(mut self, percentage_points: f64) -> Self {
        self.rebalance_margin = percentage_points;
        self
    }

    pub fn with_max_rebalance_moves(mut self, n: usize) -> Self {
        self.max_rebalance_moves = n;
        self
    }

    pub fn with_performance_blend(mut self, blend: PerformanceBlend) -> Self {
        self.performance = blend;
        self
    }

    pub fn with_expertise_bonus_scale(mut self, scale: f64) -> Self {
        self.expertise_bonus_scale = scale;
        self
    }

    pub fn with_max_commit_attempts(mut self, n: u32) -> Self {
        self.max_commit_attempts = n;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Sum of the three primary weights.
    pub fn weight_sum(&self) -> u32 {
        self.workload_weight
            .saturating_add(self.performance_weight)
            .saturating_add(self.availability_weight)
    }

    /// Lists every tolerated-but-flagged value.
    pub fn issues(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        for (name, value) in [
            ("workload", self.workload_weight),
            ("performance", self.performance_weight),
            ("availability", self.availability_weight),
        ] {
            if value > 100 {
                issues.push(ConfigIssue::WeightOutOfRange { name, value });
            }
        }
        if self.weight_sum() != 100 {
            issues.push(ConfigIssue::WeightSum(self.weight_sum()));
        }
        if self.max_concurrent_tickets == 0 {
            issues.push(ConfigIssue::ZeroCapacity);
        }
        if let Err(e) = self.business_hours.window() {
            issues.push(ConfigIssue::BusinessHours(e));
        }
        if let Err(e) = self.business_hours.parse_timezone() {
            issues.push(ConfigIssue::BusinessHours(e));
        }
        if !(0.0..=100.0).contains(&self.rebalance_threshold) {
            issues.push(ConfigIssue::ThresholdOutOfRange(self.rebalance_threshold));
        }
        if !self.rebalance_margin.is_finite() || self.rebalance_margin < 0.0 {
            issues.push(ConfigIssue::InvalidMargin(self.rebalance_margin));
        }
        let blend = &self.performance;
        if [blend.resolution_rate, blend.resolution_speed, blend.satisfaction]
            .iter()
            .any(|w| !w.is_finite() || *w < 0.0)
        {
            issues.push(ConfigIssue::InvalidBlend);
        }
        if self.max_commit_attempts == 0 {
            issues.push(ConfigIssue::NoCommitAttempts);
        }
        issues
    }

    /// Emits every issue as a warning and returns how many there were.
    pub fn log_issues(&self) -> usize {
        let issues = self.issues();
        for issue in &issues {
            warn!("assignment config: {issue}");
        }
        issues.len()
    }

    /// Margin as a fraction, with invalid values treated as 0.
    pub(crate) fn margin_fraction(&self) -> f64 {
        if self.rebalance_margin.is_finite() && self.rebalance_margin > 0.0 {
            self.rebalance_margin / 100.0
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AssignmentConfig::default();
        assert_eq!(config.weight_sum(), 100);
        assert_eq!(config.max_concurrent_tickets, 10);
        assert!(config.issues().is_empty());
    }

    #[test]
    fn test_weight_sum_is_flagged_not_rejected() {
        let config = AssignmentConfig::default().with_weights(50, 50, 50);
        assert_eq!(config.issues(), vec![ConfigIssue::WeightSum(150)]);
        assert_eq!(config.log_issues(), 1);
    }

    #[test]
    fn test_weight_above_hundred() {
        let config = AssignmentConfig::default().with_weights(120, 0, 0);
        let issues = config.issues();
        assert!(issues.contains(&ConfigIssue::WeightOutOfRange {
            name: "workload",
            value: 120
        }));
        assert!(issues.contains(&ConfigIssue::WeightSum(120)));
    }

    #[test]
    fn test_bad_business_hours_and_threshold() {
        let config = AssignmentConfig::default()
            .with_business_hours(BusinessHours::new("9am", "17:00", "Nowhere/City"))
            .with_auto_rebalance(true, 140.0)
            .with_rebalance_margin(-5.0)
            .with_max_commit_attempts(0);
        let issues = config.issues();
        assert_eq!(
            issues
                .iter()
                .filter(|i| matches!(i, ConfigIssue::BusinessHours(_)))
                .count(),
            2
        );
        assert!(issues.contains(&ConfigIssue::ThresholdOutOfRange(140.0)));
        assert!(issues.contains(&ConfigIssue::InvalidMargin(-5.0)));
        assert!(issues.contains(&ConfigIssue::NoCommitAttempts));
        assert_eq!(config.margin_fraction(), 0.0);
    }

    #[test]
    fn test_invalid_blend_flagged() {
        let config = AssignmentConfig::default()
            .with_performance_blend(PerformanceBlend::default().with_weights(1.0, -1.0, 1.0));
        assert!(config.issues().contains(&ConfigIssue::InvalidBlend));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_partial_json_uses_defaults() {
        let config: AssignmentConfig =
            serde_json::from_str(r#"{"workload_weight": 60, "auto_rebalance": false}"#).unwrap();
        assert_eq!(config.workload_weight, 60);
        assert!(!config.auto_rebalance);
        assert_eq!(config.max_concurrent_tickets, 10);
    }
}
