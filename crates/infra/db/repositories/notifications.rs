use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{dsl::exists, insert_into, prelude::*, select, update};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain,
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::notifications},
};
use domain::{
    entities::notifications::{InsertNotificationEntity, NotificationEntity},
    repositories::notifications::NotificationRepository,
    value_objects::enums::notification_types::NotificationType,
};

pub struct NotificationPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl NotificationPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl NotificationRepository for NotificationPostgres {
    async fn insert(&self, notification: InsertNotificationEntity) -> Result<NotificationEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = insert_into(notifications::table)
            .values(&notification)
            .returning(NotificationEntity::as_select())
            .get_result::<NotificationEntity>(&mut conn)?;

        Ok(result)
    }

    async fn exists_since(
        &self,
        recipient_id: Uuid,
        notification_type: NotificationType,
        entity_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        // Served by the (recipient_id, notification_type, entity_id, created_at) index.
        let found = select(exists(
            notifications::table
                .filter(notifications::recipient_id.eq(recipient_id))
                .filter(notifications::notification_type.eq(notification_type.to_string()))
                .filter(notifications::entity_id.eq(entity_id))
                .filter(notifications::created_at.ge(since)),
        ))
        .get_result::<bool>(&mut conn)?;

        Ok(found)
    }

    async fn list_for_recipient(
        &self,
        recipient_id: Uuid,
        unread_only: bool,
        limit: i64,
    ) -> Result<Vec<NotificationEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let mut query = notifications::table
            .filter(notifications::recipient_id.eq(recipient_id))
            .into_boxed();

        if unread_only {
            query = query.filter(notifications::read_at.is_null());
        }

        let results = query
            .order((notifications::created_at.desc(), notifications::id.desc()))
            .limit(limit)
            .select(NotificationEntity::as_select())
            .load::<NotificationEntity>(&mut conn)?;

        Ok(results)
    }

    async fn mark_read(
        &self,
        recipient_id: Uuid,
        notification_id: Uuid,
        read_at: DateTime<Utc>,
    ) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let updated = update(notifications::table)
            .filter(notifications::id.eq(notification_id))
            .filter(notifications::recipient_id.eq(recipient_id))
            .filter(notifications::read_at.is_null())
            .set(notifications::read_at.eq(Some(read_at)))
            .execute(&mut conn)?;

        Ok(updated > 0)
    }

    async fn mark_all_read(&self, recipient_id: Uuid, read_at: DateTime<Utc>) -> Result<usize> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let updated = update(notifications::table)
            .filter(notifications::recipient_id.eq(recipient_id))
            .filter(notifications::read_at.is_null())
            .set(notifications::read_at.eq(Some(read_at)))
            .execute(&mut conn)?;

        Ok(updated)
    }
}
