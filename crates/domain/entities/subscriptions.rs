use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::{
    domain::value_objects::{
        enums::subscription_statuses::SubscriptionStatus, subscriptions::ExpirationAnchors,
    },
    infra::db::postgres::schema::subscriptions,
};

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = subscriptions)]
pub struct SubscriptionEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan_id: Uuid,
    pub gateway: String,
    pub gateway_subscription_id: Option<String>,
    pub status: String,
    pub trial_end_at: Option<DateTime<Utc>>,
    pub next_billing_at: Option<DateTime<Utc>>,
    pub expiration_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub canceled_at: Option<DateTime<Utc>>,
    pub gateway_metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SubscriptionEntity {
    pub fn status(&self) -> Option<SubscriptionStatus> {
        SubscriptionStatus::from_str(&self.status)
    }

    pub fn anchors(&self) -> ExpirationAnchors {
        ExpirationAnchors {
            started_at: self.started_at,
            trial_end_at: self.trial_end_at,
            next_billing_at: self.next_billing_at,
        }
    }
}

/// Partial update applied by lifecycle transitions. `None` leaves the column
/// untouched.
#[derive(Debug, Clone, PartialEq, AsChangeset)]
#[diesel(table_name = subscriptions)]
pub struct SubscriptionChangeset {
    pub status: Option<String>,
    pub trial_end_at: Option<DateTime<Utc>>,
    pub next_billing_at: Option<DateTime<Utc>>,
    pub expiration_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub canceled_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}
