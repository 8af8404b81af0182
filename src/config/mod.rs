//! Assignment configuration and business-hour windows.

mod assignment;
mod hours;

pub use assignment::{AssignmentConfig, ConfigIssue, PerformanceBlend};
pub use hours::{parse_clock, BusinessHours, ClockWindow};
