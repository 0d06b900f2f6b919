use std::sync::Arc;

use chrono::{DateTime, Utc};
use http::StatusCode;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{
    domain::{
        clock::Clock,
        entities::{
            plans::PlanEntity,
            subscriptions::{SubscriptionChangeset, SubscriptionEntity},
        },
        repositories::{plans::PlanRepository, subscriptions::SubscriptionRepository},
        value_objects::{
            enums::subscription_statuses::SubscriptionStatus,
            events::DomainEvent,
            subscriptions::{ExpirationAnchors, GatewaySnapshot},
        },
    },
    usecases::event_bus::EventPublisher,
};

/// Derives when a subscription stops granting access.
///
/// Precedence: a trial end (for plans with a trial) beats the gateway's next
/// billing date, which beats the start date. Returns `None` when none of the
/// applicable anchors is set or the plan's duration type is unknown.
pub fn calculate_expiration(
    plan: &PlanEntity,
    anchors: &ExpirationAnchors,
) -> Option<DateTime<Utc>> {
    if plan.has_trial() {
        if let Some(trial_end_at) = anchors.trial_end_at {
            if plan.is_pure_trial() {
                return Some(trial_end_at);
            }
            return trial_end_at.checked_add_signed(plan.billing_period()?);
        }
    }

    if let Some(next_billing_at) = anchors.next_billing_at {
        return Some(next_billing_at);
    }

    let started_at = anchors.started_at?;
    started_at.checked_add_signed(plan.billing_period()?)
}

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("subscription {0} not found")]
    SubscriptionNotFound(Uuid),
    #[error("plan {0} not found")]
    PlanNotFound(Uuid),
    #[error("subscription {subscription_id} has no anchor date to derive an expiration from")]
    MissingAnchorDate { subscription_id: Uuid },
    #[error("subscription {subscription_id} has unknown status {status:?}")]
    UnknownStatus {
        subscription_id: Uuid,
        status: String,
    },
    #[error("invalid status transition from {from} to {to}")]
    InvalidTransition {
        from: SubscriptionStatus,
        to: SubscriptionStatus,
    },
    #[error("subscription {subscription_id} changed status concurrently")]
    StaleStatus { subscription_id: Uuid },
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl LifecycleError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            LifecycleError::SubscriptionNotFound(_) | LifecycleError::PlanNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            LifecycleError::MissingAnchorDate { .. } | LifecycleError::UnknownStatus { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            LifecycleError::InvalidTransition { .. } | LifecycleError::StaleStatus { .. } => {
                StatusCode::CONFLICT
            }
            LifecycleError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type LifecycleResult<T> = std::result::Result<T, LifecycleError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StampOutcome {
    Stamped(DateTime<Utc>),
    Unchanged(DateTime<Utc>),
}

pub struct SubscriptionLifecycleUseCase {
    subscription_repo: Arc<dyn SubscriptionRepository + Send + Sync>,
    plan_repo: Arc<dyn PlanRepository + Send + Sync>,
    publisher: Arc<dyn EventPublisher + Send + Sync>,
    clock: Arc<dyn Clock>,
}

impl SubscriptionLifecycleUseCase {
    pub fn new(
        subscription_repo: Arc<dyn SubscriptionRepository + Send + Sync>,
        plan_repo: Arc<dyn PlanRepository + Send + Sync>,
        publisher: Arc<dyn EventPublisher + Send + Sync>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            subscription_repo,
            plan_repo,
            publisher,
            clock,
        }
    }

    pub async fn load_plan(&self, plan_id: Uuid) -> LifecycleResult<PlanEntity> {
        self.plan_repo
            .find_by_id(plan_id)
            .await
            .map_err(|err| {
                error!(%plan_id, db_error = ?err, "lifecycle: failed to load plan");
                LifecycleError::Internal(err)
            })?
            .ok_or(LifecycleError::PlanNotFound(plan_id))
    }

    /// Writes the derived expiration when it differs from what is stored.
    /// Re-running with unchanged anchors performs no write.
    pub async fn stamp_expiration(
        &self,
        subscription: &SubscriptionEntity,
        plan: &PlanEntity,
    ) -> LifecycleResult<StampOutcome> {
        let expiration_at = calculate_expiration(plan, &subscription.anchors()).ok_or(
            LifecycleError::MissingAnchorDate {
                subscription_id: subscription.id,
            },
        )?;

        if subscription.expiration_at == Some(expiration_at) {
            return Ok(StampOutcome::Unchanged(expiration_at));
        }

        self.subscription_repo
            .update_expiration(subscription.id, expiration_at, self.clock.now())
            .await
            .map_err(|err| {
                error!(
                    subscription_id = %subscription.id,
                    db_error = ?err,
                    "lifecycle: failed to stamp expiration"
                );
                LifecycleError::Internal(err)
            })?;

        debug!(
            subscription_id = %subscription.id,
            %expiration_at,
            "lifecycle: expiration stamped"
        );

        Ok(StampOutcome::Stamped(expiration_at))
    }

    /// Moves a subscription to `target`, folding in the gateway's anchors and
    /// re-deriving `expiration_at`. Publishes the matching domain event when
    /// the status actually changes.
    pub async fn transition(
        &self,
        subscription_id: Uuid,
        target: SubscriptionStatus,
        snapshot: GatewaySnapshot,
    ) -> LifecycleResult<SubscriptionEntity> {
        let subscription = self
            .subscription_repo
            .find_by_id(subscription_id)
            .await
            .map_err(|err| {
                error!(
                    %subscription_id,
                    db_error = ?err,
                    "lifecycle: failed to load subscription"
                );
                LifecycleError::Internal(err)
            })?
            .ok_or(LifecycleError::SubscriptionNotFound(subscription_id))?;

        let current = subscription
            .status()
            .ok_or_else(|| LifecycleError::UnknownStatus {
                subscription_id,
                status: subscription.status.clone(),
            })?;

        if !current.can_transition_to(target) {
            let err = LifecycleError::InvalidTransition {
                from: current,
                to: target,
            };
            warn!(
                %subscription_id,
                from = %current,
                to = %target,
                status = err.status_code().as_u16(),
                "lifecycle: rejected status transition"
            );
            return Err(err);
        }

        let plan = self.load_plan(subscription.plan_id).await?;
        let now = self.clock.now();
        let changes = self.build_changes(&subscription, &plan, current, target, snapshot, now);

        let updated = self
            .subscription_repo
            .apply_changes(subscription_id, current, changes)
            .await
            .map_err(|err| {
                error!(
                    %subscription_id,
                    db_error = ?err,
                    "lifecycle: failed to apply transition"
                );
                LifecycleError::Internal(err)
            })?
            .ok_or_else(|| {
                warn!(
                    %subscription_id,
                    expected = %current,
                    "lifecycle: status changed underneath transition"
                );
                LifecycleError::StaleStatus { subscription_id }
            })?;

        info!(
            %subscription_id,
            user_id = %updated.user_id,
            from = %current,
            to = %target,
            expiration_at = ?updated.expiration_at,
            "lifecycle: subscription transitioned"
        );

        if current != target {
            if let Some(event) = transition_event(&updated, target, &plan) {
                if let Err(err) = self.publisher.publish(event).await {
                    error!(
                        %subscription_id,
                        error = ?err,
                        "lifecycle: failed to publish transition event"
                    );
                }
            }
        }

        Ok(updated)
    }

    fn build_changes(
        &self,
        subscription: &SubscriptionEntity,
        plan: &PlanEntity,
        current: SubscriptionStatus,
        target: SubscriptionStatus,
        snapshot: GatewaySnapshot,
        now: DateTime<Utc>,
    ) -> SubscriptionChangeset {
        let started_at = match (subscription.started_at, target) {
            (None, SubscriptionStatus::Trialing | SubscriptionStatus::Active) => Some(now),
            (started_at, _) => started_at,
        };

        let anchors = ExpirationAnchors {
            started_at,
            trial_end_at: snapshot.trial_end_at.or(subscription.trial_end_at),
            next_billing_at: snapshot.next_billing_at.or(subscription.next_billing_at),
        };

        // Terminal transitions keep the last derived expiration as history.
        let expiration_at = if target.is_terminal() {
            None
        } else {
            let derived = calculate_expiration(plan, &anchors);
            if derived.is_none() {
                let err = LifecycleError::MissingAnchorDate {
                    subscription_id: subscription.id,
                };
                warn!(
                    subscription_id = %subscription.id,
                    error = %err,
                    "lifecycle: keeping previous expiration"
                );
            }
            derived
        };

        let canceled_at = (target == SubscriptionStatus::Canceled
            && current != SubscriptionStatus::Canceled)
            .then_some(now);

        SubscriptionChangeset {
            status: Some(target.to_string()),
            trial_end_at: anchors.trial_end_at,
            next_billing_at: anchors.next_billing_at,
            expiration_at,
            started_at,
            canceled_at,
            updated_at: now,
        }
    }
}

fn transition_event(
    subscription: &SubscriptionEntity,
    target: SubscriptionStatus,
    plan: &PlanEntity,
) -> Option<DomainEvent> {
    let subscription_id = subscription.id;
    let user_id = subscription.user_id;
    let plan_name = Some(plan.name.clone());

    match target {
        SubscriptionStatus::Trialing | SubscriptionStatus::Active => {
            Some(DomainEvent::SubscriptionActivated {
                subscription_id,
                user_id,
                plan_name,
            })
        }
        SubscriptionStatus::PastDue => Some(DomainEvent::SubscriptionPastDue {
            subscription_id,
            user_id,
            plan_name,
        }),
        SubscriptionStatus::Canceled => Some(DomainEvent::SubscriptionCanceled {
            subscription_id,
            user_id,
            plan_name,
        }),
        SubscriptionStatus::Expired => Some(DomainEvent::SubscriptionExpired {
            subscription_id,
            user_id,
            plan_name,
        }),
        SubscriptionStatus::Pending => None,
    }
}
