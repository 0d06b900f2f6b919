use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AssignedPlanKind {
    Workout,
    Diet,
}

impl AssignedPlanKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignedPlanKind::Workout => "workout",
            AssignedPlanKind::Diet => "diet",
        }
    }
}

impl Display for AssignedPlanKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
