use std::sync::Arc;

use chrono::Duration;
use tracing::warn;
use uuid::Uuid;

use crate::domain::{
    clock::Clock,
    repositories::notifications::NotificationRepository,
    value_objects::{enums::notification_types::NotificationType, suppression::SuppressionPolicy},
};

/// Decides whether a notification would repeat one the same recipient got
/// for the same entity within the trailing window.
pub struct DuplicateSuppression {
    notification_repo: Arc<dyn NotificationRepository + Send + Sync>,
    clock: Arc<dyn Clock>,
    policy: SuppressionPolicy,
}

impl DuplicateSuppression {
    pub fn new(
        notification_repo: Arc<dyn NotificationRepository + Send + Sync>,
        clock: Arc<dyn Clock>,
        policy: SuppressionPolicy,
    ) -> Self {
        Self {
            notification_repo,
            clock,
            policy,
        }
    }

    pub fn window_for(&self, notification_type: NotificationType) -> Duration {
        self.policy.window_for(notification_type)
    }

    /// True when a matching notification exists with
    /// `created_at >= now - window`. A zero or negative window never
    /// suppresses. Lookup failures are logged and treated as "not seen" so
    /// the notification still goes out.
    pub async fn should_suppress(
        &self,
        recipient_id: Uuid,
        notification_type: NotificationType,
        entity_id: Uuid,
        window: Duration,
    ) -> bool {
        if window <= Duration::zero() {
            return false;
        }

        let since = self.clock.now() - window;
        match self
            .notification_repo
            .exists_since(recipient_id, notification_type, entity_id, since)
            .await
        {
            Ok(seen) => seen,
            Err(err) => {
                warn!(
                    %recipient_id,
                    %notification_type,
                    %entity_id,
                    db_error = ?err,
                    "suppression lookup failed; sending anyway"
                );
                false
            }
        }
    }

    pub async fn should_suppress_for(
        &self,
        recipient_id: Uuid,
        notification_type: NotificationType,
        entity_id: Uuid,
    ) -> bool {
        let window = self.window_for(notification_type);
        self.should_suppress(recipient_id, notification_type, entity_id, window)
            .await
    }
}
