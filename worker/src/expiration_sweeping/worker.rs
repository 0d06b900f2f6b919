use std::{sync::Arc, time::Duration};

use anyhow::Result;
use memberhub::usecases::expiration_sweep::{
    ExpirationSweepParams, ExpirationSweepUseCase, SweepOutcome,
};
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, error, info};

pub async fn run(
    usecase: Arc<ExpirationSweepUseCase>,
    params: ExpirationSweepParams,
    every: Duration,
) -> Result<()> {
    info!(
        interval_secs = every.as_secs(),
        batch_size = params.batch_size,
        "expiration_sweep: starting worker loop"
    );

    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;

        match usecase.run(params).await {
            Ok(SweepOutcome::Completed(report)) if report.expired > 0 => {
                info!(
                    expired = report.expired,
                    failed_batches = report.failed_batches,
                    "expiration_sweep: tick expired subscriptions"
                );
            }
            Ok(SweepOutcome::Completed(_)) => debug!("expiration_sweep: nothing due"),
            Ok(SweepOutcome::Skipped) => debug!("expiration_sweep: tick skipped"),
            Err(err) => {
                error!(error = %err, cause = ?err, "expiration_sweep: tick failed");
            }
        }
    }
}
