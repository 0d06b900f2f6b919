use std::sync::Arc;

use anyhow::Result;
use tracing::{error, info};
use uuid::Uuid;

use crate::domain::{
    clock::Clock, repositories::notifications::NotificationRepository,
    value_objects::notifications::NotificationDto,
};

pub const DEFAULT_INBOX_LIMIT: i64 = 20;
pub const MAX_INBOX_LIMIT: i64 = 100;

pub struct NotificationInboxUseCase {
    notification_repo: Arc<dyn NotificationRepository + Send + Sync>,
    clock: Arc<dyn Clock>,
}

impl NotificationInboxUseCase {
    pub fn new(
        notification_repo: Arc<dyn NotificationRepository + Send + Sync>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            notification_repo,
            clock,
        }
    }

    /// Newest first. `limit` is clamped to `1..=100`, defaulting to 20.
    pub async fn list(
        &self,
        recipient_id: Uuid,
        unread_only: bool,
        limit: Option<i64>,
    ) -> Result<Vec<NotificationDto>> {
        let limit = limit
            .unwrap_or(DEFAULT_INBOX_LIMIT)
            .clamp(1, MAX_INBOX_LIMIT);

        let notifications = self
            .notification_repo
            .list_for_recipient(recipient_id, unread_only, limit)
            .await
            .inspect_err(|err| {
                error!(%recipient_id, db_error = ?err, "inbox: failed to list notifications");
            })?;

        Ok(notifications.into_iter().map(NotificationDto::from).collect())
    }

    /// `false` when the notification does not exist, belongs to someone else
    /// or was already read.
    pub async fn mark_read(&self, recipient_id: Uuid, notification_id: Uuid) -> Result<bool> {
        let updated = self
            .notification_repo
            .mark_read(recipient_id, notification_id, self.clock.now())
            .await
            .inspect_err(|err| {
                error!(
                    %recipient_id,
                    %notification_id,
                    db_error = ?err,
                    "inbox: failed to mark notification read"
                );
            })?;

        Ok(updated)
    }

    pub async fn mark_all_read(&self, recipient_id: Uuid) -> Result<usize> {
        let updated = self
            .notification_repo
            .mark_all_read(recipient_id, self.clock.now())
            .await
            .inspect_err(|err| {
                error!(%recipient_id, db_error = ?err, "inbox: failed to mark all read");
            })?;

        info!(%recipient_id, updated, "inbox: marked all notifications read");
        Ok(updated)
    }
}
