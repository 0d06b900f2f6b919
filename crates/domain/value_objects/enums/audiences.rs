use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Who a notification is written for. Members get first-person wording,
/// staff audiences get wording about the member.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Audience {
    Member,
    Admin,
    Trainer,
}

impl Audience {
    pub fn as_str(&self) -> &'static str {
        match self {
            Audience::Member => "member",
            Audience::Admin => "admin",
            Audience::Trainer => "trainer",
        }
    }
}

impl Display for Audience {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
