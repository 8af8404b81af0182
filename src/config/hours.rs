//! Wall-clock windows and business hours.

use chrono::{DateTime, NaiveTime, Utc};
use chrono_tz::Tz;
use tracing::warn;

/// Parses `HH:MM` or `HH:MM:SS`.
pub fn parse_clock(s: &str) -> Result<NaiveTime, String> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .map_err(|_| format!("invalid time of day: {s:?}"))
}

/// A half-open `[start, end)` window on the 24-hour clock.
///
/// `end < start` wraps past midnight; `start == end` covers the whole day.
///
/// # Examples
///
/// ```
/// use chrono::NaiveTime;
/// use u_assign::config::ClockWindow;
///
/// let night = ClockWindow::parse("22:00", "06:00").unwrap();
/// assert!(night.contains(NaiveTime::from_hms_opt(23, 30, 0).unwrap()));
/// assert!(!night.contains(NaiveTime::from_hms_opt(12, 0, 0).unwrap()));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl ClockWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    pub fn parse(start: &str, end: &str) -> Result<Self, String> {
        Ok(Self::new(parse_clock(start)?, parse_clock(end)?))
    }

    pub fn spans_midnight(&self) -> bool {
        self.end < self.start
    }

    pub fn contains(&self, t: NaiveTime) -> bool {
        if self.start == self.end {
            true
        } else if self.spans_midnight() {
            t >= self.start || t < self.end
        } else {
            t >= self.start && t < self.end
        }
    }
}

/// Daily opening window in an IANA timezone.
///
/// Kept as raw strings so a bad value in a stored config degrades to a
/// logged warning at evaluation time instead of failing the load.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BusinessHours {
    pub start: String,
    pub end: String,
    pub timezone: String,
}

impl Default for BusinessHours {
    fn default() -> Self {
        Self {
            start: "09:00".to_string(),
            end: "17:00".to_string(),
            timezone: "UTC".to_string(),
        }
    }
}

impl BusinessHours {
    pub fn new(start: impl Into<String>, end: impl Into<String>, timezone: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
            timezone: timezone.into(),
        }
    }

    /// Around the clock, in UTC.
    pub fn always() -> Self {
        Self::new("00:00", "00:00", "UTC")
    }

    pub fn window(&self) -> Result<ClockWindow, String> {
        ClockWindow::parse(&self.start, &self.end)
    }

    pub fn parse_timezone(&self) -> Result<Tz, String> {
        self.timezone
            .trim()
            .parse::<Tz>()
            .map_err(|e| format!("unknown timezone {:?}: {e}", self.timezone))
    }

    /// The configured timezone, or UTC when it does not parse.
    pub fn tz(&self) -> Tz {
        self.parse_timezone().unwrap_or_else(|e| {
            warn!("{e}; falling back to UTC");
            Tz::UTC
        })
    }

    /// Wall-clock time at `now` in the business timezone.
    pub fn local_time(&self, now: DateTime<Utc>) -> NaiveTime {
        now.with_timezone(&self.tz()).time()
    }

    /// Whether `now` falls inside business hours.
    ///
    /// A malformed window leaves the gate open.
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        match self.window() {
            Ok(window) => window.contains(self.local_time(now)),
            Err(e) => {
                warn!("business hours ignored: {e}");
                true
            }
        }
    }
}
