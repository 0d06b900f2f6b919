use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    MemberRegistered,
    SubscriptionCreated,
    SubscriptionActivated,
    SubscriptionPastDue,
    SubscriptionCanceled,
    SubscriptionExpired,
    VideoUploaded,
    VideoReviewed,
    PlanAssigned,
}

impl NotificationType {
    pub const ALL: [NotificationType; 9] = [
        NotificationType::MemberRegistered,
        NotificationType::SubscriptionCreated,
        NotificationType::SubscriptionActivated,
        NotificationType::SubscriptionPastDue,
        NotificationType::SubscriptionCanceled,
        NotificationType::SubscriptionExpired,
        NotificationType::VideoUploaded,
        NotificationType::VideoReviewed,
        NotificationType::PlanAssigned,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::MemberRegistered => "member_registered",
            NotificationType::SubscriptionCreated => "subscription_created",
            NotificationType::SubscriptionActivated => "subscription_activated",
            NotificationType::SubscriptionPastDue => "subscription_past_due",
            NotificationType::SubscriptionCanceled => "subscription_canceled",
            NotificationType::SubscriptionExpired => "subscription_expired",
            NotificationType::VideoUploaded => "video_uploaded",
            NotificationType::VideoReviewed => "video_reviewed",
            NotificationType::PlanAssigned => "plan_assigned",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == value)
    }
}

impl Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
