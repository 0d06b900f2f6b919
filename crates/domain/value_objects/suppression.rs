use std::collections::HashMap;

use chrono::Duration;

use crate::domain::value_objects::enums::notification_types::NotificationType;

/// Trailing duplicate-suppression window per notification type.
///
/// The windows are deliberately independent per type; there is no rule that
/// derives one from another. A zero window turns suppression off for that
/// type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuppressionPolicy {
    default_window: Duration,
    overrides: HashMap<NotificationType, Duration>,
}

impl SuppressionPolicy {
    pub fn new(default_window: Duration) -> Self {
        Self {
            default_window,
            overrides: HashMap::new(),
        }
    }

    pub fn with_window(mut self, notification_type: NotificationType, window: Duration) -> Self {
        self.overrides.insert(notification_type, window);
        self
    }

    pub fn window_for(&self, notification_type: NotificationType) -> Duration {
        self.overrides
            .get(&notification_type)
            .copied()
            .unwrap_or(self.default_window)
    }

    pub fn default_window(&self) -> Duration {
        self.default_window
    }
}

impl Default for SuppressionPolicy {
    fn default() -> Self {
        Self::new(Duration::minutes(5))
            .with_window(NotificationType::MemberRegistered, Duration::minutes(5))
            .with_window(NotificationType::SubscriptionCreated, Duration::minutes(10))
            .with_window(NotificationType::SubscriptionActivated, Duration::minutes(10))
            .with_window(NotificationType::SubscriptionPastDue, Duration::minutes(10))
            .with_window(NotificationType::SubscriptionCanceled, Duration::minutes(10))
            .with_window(NotificationType::SubscriptionExpired, Duration::minutes(10))
            .with_window(NotificationType::VideoUploaded, Duration::minutes(2))
            .with_window(NotificationType::VideoReviewed, Duration::minutes(2))
            .with_window(NotificationType::PlanAssigned, Duration::minutes(5))
    }
}
