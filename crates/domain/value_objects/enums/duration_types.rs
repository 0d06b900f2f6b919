use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Unit a plan's `duration_count` is measured in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DurationType {
    Trial,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl DurationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DurationType::Trial => "trial",
            DurationType::Daily => "daily",
            DurationType::Weekly => "weekly",
            DurationType::Monthly => "monthly",
            DurationType::Yearly => "yearly",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "trial" => Some(DurationType::Trial),
            "daily" => Some(DurationType::Daily),
            "weekly" => Some(DurationType::Weekly),
            "monthly" => Some(DurationType::Monthly),
            "yearly" => Some(DurationType::Yearly),
            _ => None,
        }
    }

    /// Fixed day length of one unit. Months and years are not calendar
    /// aware: a monthly plan is always 30 days.
    pub fn unit_days(&self) -> i64 {
        match self {
            DurationType::Trial | DurationType::Daily => 1,
            DurationType::Weekly => 7,
            DurationType::Monthly => 30,
            DurationType::Yearly => 365,
        }
    }
}

impl Display for DurationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
