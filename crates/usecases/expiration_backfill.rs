use std::{collections::HashMap, sync::Arc};

use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    domain::{entities::plans::PlanEntity, repositories::subscriptions::SubscriptionRepository},
    usecases::subscription_lifecycle::{
        LifecycleError, LifecycleResult, StampOutcome, SubscriptionLifecycleUseCase,
    },
};

#[derive(Debug, Clone, Copy)]
pub struct ExpirationBackfillParams {
    pub batch_size: i64,
    pub only_missing: bool,
}

impl Default for ExpirationBackfillParams {
    fn default() -> Self {
        Self {
            batch_size: 100,
            only_missing: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackfillReport {
    pub scanned: usize,
    pub stamped: usize,
    pub unchanged: usize,
    pub skipped_missing_anchor: usize,
    pub failed: usize,
}

/// Stamps `expiration_at` on existing subscriptions, walking them by id.
pub struct ExpirationBackfillUseCase {
    subscription_repo: Arc<dyn SubscriptionRepository + Send + Sync>,
    lifecycle: Arc<SubscriptionLifecycleUseCase>,
}

impl ExpirationBackfillUseCase {
    pub fn new(
        subscription_repo: Arc<dyn SubscriptionRepository + Send + Sync>,
        lifecycle: Arc<SubscriptionLifecycleUseCase>,
    ) -> Self {
        Self {
            subscription_repo,
            lifecycle,
        }
    }

    pub async fn run(&self, params: ExpirationBackfillParams) -> LifecycleResult<BackfillReport> {
        let batch_size = params.batch_size.max(1);
        let mut report = BackfillReport::default();
        let mut plans: HashMap<Uuid, Option<PlanEntity>> = HashMap::new();
        let mut after: Option<Uuid> = None;

        loop {
            let batch = self
                .subscription_repo
                .list_batch_after_id(after, batch_size, params.only_missing)
                .await
                .map_err(|err| {
                    error!(?after, db_error = ?err, "expiration_backfill: failed to list batch");
                    LifecycleError::Internal(err)
                })?;

            let Some(last) = batch.last() else {
                break;
            };
            after = Some(last.id);
            report.scanned += batch.len();

            for subscription in &batch {
                if !plans.contains_key(&subscription.plan_id) {
                    let plan = match self.lifecycle.load_plan(subscription.plan_id).await {
                        Ok(plan) => Some(plan),
                        Err(err) => {
                            warn!(
                                subscription_id = %subscription.id,
                                error = %err,
                                "expiration_backfill: plan unavailable; skipping"
                            );
                            None
                        }
                    };
                    plans.insert(subscription.plan_id, plan);
                }

                let Some(Some(plan)) = plans.get(&subscription.plan_id) else {
                    report.failed += 1;
                    continue;
                };

                match self.lifecycle.stamp_expiration(subscription, plan).await {
                    Ok(StampOutcome::Stamped(_)) => report.stamped += 1,
                    Ok(StampOutcome::Unchanged(_)) => report.unchanged += 1,
                    Err(err @ LifecycleError::MissingAnchorDate { .. }) => {
                        warn!(error = %err, "expiration_backfill: skipping");
                        report.skipped_missing_anchor += 1;
                    }
                    Err(err) => {
                        error!(
                            subscription_id = %subscription.id,
                            error = %err,
                            "expiration_backfill: failed to stamp"
                        );
                        report.failed += 1;
                    }
                }
            }

            if (batch.len() as i64) < batch_size {
                break;
            }
        }

        info!(
            scanned = report.scanned,
            stamped = report.stamped,
            unchanged = report.unchanged,
            skipped_missing_anchor = report.skipped_missing_anchor,
            failed = report.failed,
            only_missing = params.only_missing,
            "expiration_backfill: completed"
        );

        Ok(report)
    }
}
