use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::notifications::NotificationEntity;
use crate::domain::entities::users::UserEntity;
use crate::domain::value_objects::enums::{
    audiences::Audience, entity_types::EntityType, notification_types::NotificationType,
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct EntityRef {
    pub entity_type: EntityType,
    pub id: Uuid,
}

impl EntityRef {
    pub fn new(entity_type: EntityType, id: Uuid) -> Self {
        Self { entity_type, id }
    }
}

/// A resolved fan-out target.
#[derive(Debug, Clone, PartialEq)]
pub struct Recipient {
    pub user: UserEntity,
    pub audience: Audience,
}

/// Structured payload stored with every notification, linking back to the
/// source entity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotificationPayload {
    pub event: NotificationType,
    pub audience: Audience,
    pub entity_type: EntityType,
    pub entity_id: Uuid,
    pub subject_user_id: Uuid,
}

/// What push providers receive for an already persisted notification.
#[derive(Debug, Clone, Serialize)]
pub struct PushMessage {
    pub notification_id: Uuid,
    pub recipient_id: Uuid,
    pub notification_type: String,
    pub title: String,
    pub message: String,
    pub link: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&NotificationEntity> for PushMessage {
    fn from(value: &NotificationEntity) -> Self {
        Self {
            notification_id: value.id,
            recipient_id: value.recipient_id,
            notification_type: value.notification_type.clone(),
            title: value.title.clone(),
            message: value.message.clone(),
            link: value.link.clone(),
            created_at: value.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct NotificationDto {
    pub id: Uuid,
    pub notification_type: String,
    pub audience: String,
    pub title: String,
    pub message: String,
    pub link: Option<String>,
    pub entity_type: String,
    pub entity_id: Uuid,
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

impl From<NotificationEntity> for NotificationDto {
    fn from(value: NotificationEntity) -> Self {
        Self {
            id: value.id,
            notification_type: value.notification_type,
            audience: value.audience,
            title: value.title,
            message: value.message,
            link: value.link,
            entity_type: value.entity_type,
            entity_id: value.entity_id,
            payload: value.payload,
            created_at: value.created_at,
            read_at: value.read_at,
        }
    }
}
