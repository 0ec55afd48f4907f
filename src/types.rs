use serde::{Deserialize, Serialize};

pub const DRIFT_SIGNAL_BUNDLE_KIND: &str = "drift_signal_bundle";
pub const DRIFT_SIGNAL_BUNDLE_VERSION: u32 = 2;
pub const DRIFT_TIMELINE_KIND: &str = "drift_timeline";
pub const DRIFT_TIMELINE_VERSION: u32 = 1;
pub const DRIFT_COMPARE_KIND: &str = "drift_compare";
pub const DRIFT_COMPARE_VERSION: u32 = 1;
pub const ASSOCIATION_BUNDLE_KIND: &str = "association_bundle";
pub const ASSOCIATION_BUNDLE_VERSION: u32 = 2;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SignalPolicy {
    pub signal_only: bool,
    pub affects_exit: bool,
}

impl SignalPolicy {
    pub const ADVISORY: SignalPolicy = SignalPolicy {
        signal_only: true,
        affects_exit: false,
    };
}

impl Default for SignalPolicy {
    fn default() -> Self {
        Self::ADVISORY
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TrendLabel {
    Accelerating,
    Stable,
    Cooling,
}

impl TrendLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Accelerating => "accelerating",
            Self::Stable => "stable",
            Self::Cooling => "cooling",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    Hour,
    #[default]
    Day,
}

impl Bucket {
    pub fn from_label(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("hour") {
            Self::Hour
        } else {
            Self::Day
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hour => "hour",
            Self::Day => "day",
        }
    }
}
