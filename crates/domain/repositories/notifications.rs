use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::notifications::{InsertNotificationEntity, NotificationEntity};
use crate::domain::value_objects::enums::notification_types::NotificationType;

#[automock]
#[async_trait]
pub trait NotificationRepository {
    async fn insert(&self, notification: InsertNotificationEntity) -> Result<NotificationEntity>;

    /// Whether `recipient_id` already has a `notification_type` notification
    /// about `entity_id` created at or after `since`.
    async fn exists_since(
        &self,
        recipient_id: Uuid,
        notification_type: NotificationType,
        entity_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<bool>;

    async fn list_for_recipient(
        &self,
        recipient_id: Uuid,
        unread_only: bool,
        limit: i64,
    ) -> Result<Vec<NotificationEntity>>;

    async fn mark_read(
        &self,
        recipient_id: Uuid,
        notification_id: Uuid,
        read_at: DateTime<Utc>,
    ) -> Result<bool>;

    async fn mark_all_read(&self, recipient_id: Uuid, read_at: DateTime<Utc>) -> Result<usize>;
}
