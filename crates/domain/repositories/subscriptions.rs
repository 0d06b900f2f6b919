use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::subscriptions::{SubscriptionChangeset, SubscriptionEntity};
use crate::domain::value_objects::{
    enums::subscription_statuses::SubscriptionStatus, subscriptions::ExpirationCursor,
};

#[automock]
#[async_trait]
pub trait SubscriptionRepository {
    async fn find_by_id(&self, subscription_id: Uuid) -> Result<Option<SubscriptionEntity>>;

    /// Expirable subscriptions (`trialing | active | past_due`) whose
    /// `expiration_at <= now`, ordered by `(expiration_at, id)` and strictly
    /// after `after` when given.
    async fn list_expirable_batch(
        &self,
        now: DateTime<Utc>,
        after: Option<ExpirationCursor>,
        limit: i64,
    ) -> Result<Vec<SubscriptionEntity>>;

    /// Flips the given subscriptions to `expired`, re-checking the status and
    /// expiration filter in the same statement. Returns the ids that changed.
    async fn mark_expired(
        &self,
        subscription_ids: &[Uuid],
        now: DateTime<Utc>,
    ) -> Result<Vec<Uuid>>;

    /// Subscriptions ordered by id, strictly after `after` when given.
    async fn list_batch_after_id(
        &self,
        after: Option<Uuid>,
        limit: i64,
        only_missing_expiration: bool,
    ) -> Result<Vec<SubscriptionEntity>>;

    async fn update_expiration(
        &self,
        subscription_id: Uuid,
        expiration_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<()>;

    /// Applies `changes` only while the stored status still equals
    /// `expected_status`. `None` means another writer got there first.
    async fn apply_changes(
        &self,
        subscription_id: Uuid,
        expected_status: SubscriptionStatus,
        changes: SubscriptionChangeset,
    ) -> Result<Option<SubscriptionEntity>>;
}
