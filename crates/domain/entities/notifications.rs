use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::notifications;

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = notifications)]
pub struct NotificationEntity {
    pub id: Uuid,
    pub recipient_id: Uuid,
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

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = notifications)]
pub struct InsertNotificationEntity {
    pub recipient_id: Uuid,
    pub notification_type: String,
    pub audience: String,
    pub title: String,
    pub message: String,
    pub link: Option<String>,
    pub entity_type: String,
    pub entity_id: Uuid,
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
}
