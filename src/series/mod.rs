pub mod drift;
pub mod risk;

use std::fmt::{Display, Formatter};

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

pub use drift::{build_drift_daily_series, DailyDriftBucket};
pub use risk::{build_risk_daily_series, DailyRiskBucket};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum Window {
    #[default]
    #[serde(rename = "7d")]
    Days7,
    #[serde(rename = "14d")]
    Days14,
    #[serde(rename = "30d")]
    Days30,
}

impl Window {
    pub const ALL: [Window; 3] = [Window::Days7, Window::Days14, Window::Days30];

    /// Lenient parse: anything unrecognised falls back to 7 days.
    pub fn from_label(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "14d" | "14" => Self::Days14,
            "30d" | "30" => Self::Days30,
            _ => Self::Days7,
        }
    }

    pub fn days(self) -> u32 {
        match self {
            Self::Days7 => 7,
            Self::Days14 => 14,
            Self::Days30 => 30,
        }
    }

    pub fn as_label(self) -> &'static str {
        match self {
            Self::Days7 => "7d",
            Self::Days14 => "14d",
            Self::Days30 => "30d",
        }
    }
}

impl Display for Window {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_label())
    }
}

/// Inclusive `[start, end]` range of UTC days ending today.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DayRange {
    pub fn ending_at(now: DateTime<Utc>, days: u32) -> Self {
        let end = now.date_naive();
        let span = i64::from(days.max(1)) - 1;
        Self {
            start: end - Duration::days(span),
            end,
        }
    }

    pub fn preceding(&self, days: u32) -> Self {
        let end = self.start - Duration::days(1);
        let span = i64::from(days.max(1)) - 1;
        Self {
            start: end - Duration::days(span),
            end,
        }
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        day >= self.start && day <= self.end
    }

    pub fn days(&self) -> Vec<NaiveDate> {
        self.start
            .iter_days()
            .take_while(|day| *day <= self.end)
            .collect()
    }

    pub fn start_instant(&self) -> DateTime<Utc> {
        Utc.from_utc_datetime(&self.start.and_time(NaiveTime::MIN))
    }
}
