use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::subscriptions::SubscriptionEntity;
use crate::domain::value_objects::enums::{
    payment_gateways::PaymentGateway, subscription_statuses::SubscriptionStatus,
};

/// Dates an expiration can be derived from, in the order the evaluator
/// consults them: trial end, next billing, start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpirationAnchors {
    pub started_at: Option<DateTime<Utc>>,
    pub trial_end_at: Option<DateTime<Utc>>,
    pub next_billing_at: Option<DateTime<Utc>>,
}

/// Anchors reported by the payment gateway alongside a status change.
/// Missing values keep whatever the subscription already stores.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct GatewaySnapshot {
    pub trial_end_at: Option<DateTime<Utc>>,
    pub next_billing_at: Option<DateTime<Utc>>,
}

/// Keyset position for walking expirable subscriptions ordered by
/// `(expiration_at, id)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpirationCursor {
    pub expiration_at: DateTime<Utc>,
    pub id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct SubscriptionDto {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan_id: Uuid,
    pub gateway: Option<PaymentGateway>,
    pub status: Option<SubscriptionStatus>,
    pub trial_end_at: Option<DateTime<Utc>>,
    pub next_billing_at: Option<DateTime<Utc>>,
    pub expiration_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub canceled_at: Option<DateTime<Utc>>,
}

impl From<SubscriptionEntity> for SubscriptionDto {
    fn from(value: SubscriptionEntity) -> Self {
        Self {
            id: value.id,
            user_id: value.user_id,
            plan_id: value.plan_id,
            gateway: PaymentGateway::from_str(&value.gateway),
            status: SubscriptionStatus::from_str(&value.status),
            trial_end_at: value.trial_end_at,
            next_billing_at: value.next_billing_at,
            expiration_at: value.expiration_at,
            started_at: value.started_at,
            canceled_at: value.canceled_at,
        }
    }
}
