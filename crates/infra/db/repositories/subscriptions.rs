use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{prelude::*, update};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain,
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::subscriptions},
};
use domain::{
    entities::subscriptions::{SubscriptionChangeset, SubscriptionEntity},
    repositories::subscriptions::SubscriptionRepository,
    value_objects::{
        enums::subscription_statuses::SubscriptionStatus, subscriptions::ExpirationCursor,
    },
};

pub struct SubscriptionPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl SubscriptionPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl SubscriptionRepository for SubscriptionPostgres {
    async fn find_by_id(&self, subscription_id: Uuid) -> Result<Option<SubscriptionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = subscriptions::table
            .find(subscription_id)
            .select(SubscriptionEntity::as_select())
            .first::<SubscriptionEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn list_expirable_batch(
        &self,
        now: DateTime<Utc>,
        after: Option<ExpirationCursor>,
        limit: i64,
    ) -> Result<Vec<SubscriptionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let mut query = subscriptions::table
            .filter(subscriptions::status.eq_any(SubscriptionStatus::expirable_values()))
            .filter(subscriptions::expiration_at.le(now))
            .into_boxed();

        if let Some(cursor) = after {
            query = query.filter(
                subscriptions::expiration_at.gt(cursor.expiration_at).or(subscriptions::expiration_at
                    .eq(cursor.expiration_at)
                    .and(subscriptions::id.gt(cursor.id))),
            );
        }

        let results = query
            .order((subscriptions::expiration_at.asc(), subscriptions::id.asc()))
            .limit(limit)
            .select(SubscriptionEntity::as_select())
            .load::<SubscriptionEntity>(&mut conn)?;

        Ok(results)
    }

    async fn mark_expired(
        &self,
        subscription_ids: &[Uuid],
        now: DateTime<Utc>,
    ) -> Result<Vec<Uuid>> {
        if subscription_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = Arc::clone(&self.db_pool).get()?;

        let expired_ids = update(subscriptions::table)
            .filter(subscriptions::id.eq_any(subscription_ids.to_vec()))
            .filter(subscriptions::status.eq_any(SubscriptionStatus::expirable_values()))
            .filter(subscriptions::expiration_at.le(now))
            .set((
                subscriptions::status.eq(SubscriptionStatus::Expired.to_string()),
                subscriptions::updated_at.eq(now),
            ))
            .returning(subscriptions::id)
            .get_results::<Uuid>(&mut conn)?;

        Ok(expired_ids)
    }

    async fn list_batch_after_id(
        &self,
        after: Option<Uuid>,
        limit: i64,
        only_missing_expiration: bool,
    ) -> Result<Vec<SubscriptionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let mut query = subscriptions::table.into_boxed();

        if let Some(after) = after {
            query = query.filter(subscriptions::id.gt(after));
        }
        if only_missing_expiration {
            query = query.filter(subscriptions::expiration_at.is_null());
        }

        let results = query
            .order(subscriptions::id.asc())
            .limit(limit)
            .select(SubscriptionEntity::as_select())
            .load::<SubscriptionEntity>(&mut conn)?;

        Ok(results)
    }

    async fn update_expiration(
        &self,
        subscription_id: Uuid,
        expiration_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        update(subscriptions::table.find(subscription_id))
            .set((
                subscriptions::expiration_at.eq(Some(expiration_at)),
                subscriptions::updated_at.eq(now),
            ))
            .execute(&mut conn)?;

        Ok(())
    }

    async fn apply_changes(
        &self,
        subscription_id: Uuid,
        expected_status: SubscriptionStatus,
        changes: SubscriptionChangeset,
    ) -> Result<Option<SubscriptionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = update(subscriptions::table)
            .filter(subscriptions::id.eq(subscription_id))
            .filter(subscriptions::status.eq(expected_status.to_string()))
            .set(&changes)
            .returning(SubscriptionEntity::as_select())
            .get_result::<SubscriptionEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }
}
