use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Kind of record a notification links back to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    User,
    Subscription,
    Video,
    PlanAssignment,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::User => "user",
            EntityType::Subscription => "subscription",
            EntityType::Video => "video",
            EntityType::PlanAssignment => "plan_assignment",
        }
    }
}

impl Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
