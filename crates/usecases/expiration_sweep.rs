use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use http::StatusCode;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    domain::{
        clock::Clock,
        repositories::{job_leases::JobLeaseRepository, subscriptions::SubscriptionRepository},
        value_objects::{events::DomainEvent, subscriptions::ExpirationCursor},
    },
    usecases::event_bus::EventPublisher,
};

pub const EXPIRATION_SWEEP_LEASE: &str = "subscription_expiration_sweep";

const REPORTED_ID_LIMIT: usize = 20;

#[derive(Debug, Clone, Copy)]
pub struct ExpirationSweepParams {
    pub batch_size: i64,
    pub lease_ttl: Duration,
}

impl Default for ExpirationSweepParams {
    fn default() -> Self {
        Self {
            batch_size: 100,
            lease_ttl: Duration::minutes(5),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub batches: usize,
    pub scanned: usize,
    pub expired: usize,
    pub failed_batches: usize,
    pub events_published: usize,
    pub expired_ids: Vec<Uuid>,
    /// The lease could not be renewed between batches and the run stopped early.
    pub lease_lost: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SweepOutcome {
    Completed(SweepReport),
    /// Another holder owns the lease.
    Skipped,
}

#[derive(Debug, Error)]
pub enum SweepError {
    #[error("sweep batch {batch} failed")]
    BatchFailure {
        batch: usize,
        #[source]
        source: anyhow::Error,
    },
    #[error("failed to acquire sweep lease")]
    Lease(#[source] anyhow::Error),
}

impl SweepError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            SweepError::BatchFailure { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            SweepError::Lease(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

pub struct ExpirationSweepUseCase {
    subscription_repo: Arc<dyn SubscriptionRepository + Send + Sync>,
    lease_repo: Arc<dyn JobLeaseRepository + Send + Sync>,
    publisher: Arc<dyn EventPublisher + Send + Sync>,
    clock: Arc<dyn Clock>,
}

impl ExpirationSweepUseCase {
    pub fn new(
        subscription_repo: Arc<dyn SubscriptionRepository + Send + Sync>,
        lease_repo: Arc<dyn JobLeaseRepository + Send + Sync>,
        publisher: Arc<dyn EventPublisher + Send + Sync>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            subscription_repo,
            lease_repo,
            publisher,
            clock,
        }
    }

    /// Flips every expirable subscription whose `expiration_at` has passed to
    /// `expired`. `now` is read once, so rows expiring mid-run wait for the
    /// next run.
    pub async fn run(&self, params: ExpirationSweepParams) -> Result<SweepOutcome, SweepError> {
        let now = self.clock.now();
        let holder = Uuid::new_v4().to_string();

        let acquired = self
            .lease_repo
            .try_acquire(EXPIRATION_SWEEP_LEASE, &holder, now, params.lease_ttl)
            .await
            .map_err(|err| {
                error!(db_error = ?err, "expiration_sweep: failed to acquire lease");
                SweepError::Lease(err)
            })?;

        if !acquired {
            info!("expiration_sweep: lease held elsewhere; skipping run");
            return Ok(SweepOutcome::Skipped);
        }

        let report = self.sweep(now, &holder, params).await;

        if let Err(err) = self
            .lease_repo
            .release(EXPIRATION_SWEEP_LEASE, &holder)
            .await
        {
            warn!(
                db_error = ?err,
                "expiration_sweep: failed to release lease; it lapses after its ttl"
            );
        }

        info!(
            batches = report.batches,
            scanned = report.scanned,
            expired = report.expired,
            failed_batches = report.failed_batches,
            events_published = report.events_published,
            lease_lost = report.lease_lost,
            "expiration_sweep: completed"
        );

        Ok(SweepOutcome::Completed(report))
    }

    async fn sweep(
        &self,
        now: DateTime<Utc>,
        holder: &str,
        params: ExpirationSweepParams,
    ) -> SweepReport {
        let batch_size = params.batch_size.max(1);
        let mut report = SweepReport::default();
        let mut cursor: Option<ExpirationCursor> = None;

        loop {
            let batch_no = report.batches + 1;
            if batch_no > 1 && !self.renew_lease(holder, params.lease_ttl).await {
                report.lease_lost = true;
                break;
            }

            let batch = match self
                .subscription_repo
                .list_expirable_batch(now, cursor, batch_size)
                .await
            {
                Ok(batch) => batch,
                Err(source) => {
                    // Without the page there is no cursor to move past it.
                    let err = SweepError::BatchFailure {
                        batch: batch_no,
                        source,
                    };
                    error!(error = %err, cause = ?err, "expiration_sweep: failed to list batch; stopping");
                    report.failed_batches += 1;
                    break;
                }
            };

            if batch.is_empty() {
                break;
            }
            report.batches = batch_no;
            report.scanned += batch.len();

            let next_cursor = batch.last().and_then(|last| {
                last.expiration_at.map(|expiration_at| ExpirationCursor {
                    expiration_at,
                    id: last.id,
                })
            });

            let ids: Vec<Uuid> = batch.iter().map(|subscription| subscription.id).collect();
            match self.subscription_repo.mark_expired(&ids, now).await {
                Ok(updated_ids) => {
                    report.expired += updated_ids.len();
                    for subscription in batch.iter().filter(|s| updated_ids.contains(&s.id)) {
                        if report.expired_ids.len() < REPORTED_ID_LIMIT {
                            report.expired_ids.push(subscription.id);
                        }

                        let event = DomainEvent::SubscriptionExpired {
                            subscription_id: subscription.id,
                            user_id: subscription.user_id,
                            plan_name: None,
                        };
                        match self.publisher.publish(event).await {
                            Ok(()) => report.events_published += 1,
                            Err(err) => error!(
                                subscription_id = %subscription.id,
                                error = ?err,
                                "expiration_sweep: failed to publish expired event"
                            ),
                        }
                    }
                }
                Err(source) => {
                    let err = SweepError::BatchFailure {
                        batch: batch_no,
                        source,
                    };
                    error!(
                        error = %err,
                        cause = ?err,
                        first_id = %ids[0],
                        size = ids.len(),
                        "expiration_sweep: failed to expire batch; continuing"
                    );
                    report.failed_batches += 1;
                }
            }

            if (batch.len() as i64) < batch_size || next_cursor.is_none() {
                break;
            }
            cursor = next_cursor;
        }

        report
    }

    /// Extends the lease from the live clock rather than the run's `now`.
    async fn renew_lease(&self, holder: &str, lease_ttl: Duration) -> bool {
        match self
            .lease_repo
            .try_acquire(EXPIRATION_SWEEP_LEASE, holder, self.clock.now(), lease_ttl)
            .await
        {
            Ok(true) => true,
            Ok(false) => {
                warn!("expiration_sweep: lease taken over by another holder; stopping");
                false
            }
            Err(err) => {
                warn!(db_error = ?err, "expiration_sweep: failed to renew lease; stopping");
                false
            }
        }
    }
}
