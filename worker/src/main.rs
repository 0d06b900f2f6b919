use anyhow::{Context, Result};
use memberhub::{
    domain::{
        clock::{Clock, SystemClock},
        repositories::{
            job_leases::JobLeaseRepository, notifications::NotificationRepository,
            plans::PlanRepository, push_providers::PushProvider, recipients::RecipientDirectory,
            subscriptions::SubscriptionRepository,
        },
    },
    infra::{
        db::{
            postgres::postgres_connection,
            repositories::{
                job_leases::JobLeasePostgres, notifications::NotificationPostgres,
                plans::PlanPostgres, recipients::RecipientPostgres,
                subscriptions::SubscriptionPostgres,
            },
        },
        push::webhook::WebhookPushProvider,
    },
    usecases::{
        duplicate_suppression::DuplicateSuppression,
        event_bus::{EventBus, EventPublisher},
        expiration_backfill::ExpirationBackfillUseCase,
        expiration_sweep::{ExpirationSweepParams, ExpirationSweepUseCase},
        notification_dispatcher::NotificationDispatcher,
        notification_inbox::NotificationInboxUseCase,
        push_notifier::PushNotifier,
        subscription_lifecycle::SubscriptionLifecycleUseCase,
    },
};
use std::{sync::Arc, time::Duration};
use tracing::{error, info};
use worker::{
    axum_http::{self, http_serve::HttpUseCases},
    config, event_dispatching, expiration_sweeping,
};

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(error) = run().await {
        error!("Worker exited with error: {:#}", error);
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    let service = memberhub::observability::init_observability("worker")?;

    let dotenvy_env = Arc::new(config::config_loader::load()?);
    info!(service = %service.service_name, "ENV has been loaded");

    let postgres_pool = postgres_connection::establish_connection(
        &dotenvy_env.database.url,
        dotenvy_env.database.max_connections,
    )
    .context("failed to build postgres pool")?;
    info!("Postgres connection has been established");

    let db_pool_arc = Arc::new(postgres_pool);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let subscription_repo: Arc<dyn SubscriptionRepository + Send + Sync> =
        Arc::new(SubscriptionPostgres::new(Arc::clone(&db_pool_arc)));
    let plan_repo: Arc<dyn PlanRepository + Send + Sync> =
        Arc::new(PlanPostgres::new(Arc::clone(&db_pool_arc)));
    let notification_repo: Arc<dyn NotificationRepository + Send + Sync> =
        Arc::new(NotificationPostgres::new(Arc::clone(&db_pool_arc)));
    let recipient_directory: Arc<dyn RecipientDirectory + Send + Sync> =
        Arc::new(RecipientPostgres::new(Arc::clone(&db_pool_arc)));
    let lease_repo: Arc<dyn JobLeaseRepository + Send + Sync> =
        Arc::new(JobLeasePostgres::new(Arc::clone(&db_pool_arc)));

    // Event queue between producers (lifecycle, sweep, HTTP) and the dispatcher
    let (event_bus, event_receiver) =
        EventBus::channel(dotenvy_env.notifications.event_queue_capacity);
    let publisher: Arc<dyn EventPublisher + Send + Sync> = Arc::new(event_bus);

    let suppression = Arc::new(DuplicateSuppression::new(
        Arc::clone(&notification_repo),
        Arc::clone(&clock),
        dotenvy_env.notifications.suppression.clone(),
    ));
    let mut dispatcher = NotificationDispatcher::new(
        recipient_directory,
        Arc::clone(&notification_repo),
        suppression,
        Arc::clone(&clock),
    );
    if let Some(webhook_url) = dotenvy_env.notifications.push_webhook_url.clone() {
        let provider: Arc<dyn PushProvider> = Arc::new(WebhookPushProvider::new(webhook_url)?);
        dispatcher = dispatcher.with_push_notifier(PushNotifier::new(vec![provider]));
        info!("Push webhook delivery enabled");
    }
    let dispatcher = Arc::new(dispatcher);

    let lifecycle_usecase = Arc::new(SubscriptionLifecycleUseCase::new(
        Arc::clone(&subscription_repo),
        plan_repo,
        Arc::clone(&publisher),
        Arc::clone(&clock),
    ));
    let sweep_usecase = Arc::new(ExpirationSweepUseCase::new(
        Arc::clone(&subscription_repo),
        lease_repo,
        Arc::clone(&publisher),
        Arc::clone(&clock),
    ));
    let backfill_usecase = Arc::new(ExpirationBackfillUseCase::new(
        subscription_repo,
        Arc::clone(&lifecycle_usecase),
    ));
    let inbox_usecase = Arc::new(NotificationInboxUseCase::new(
        notification_repo,
        Arc::clone(&clock),
    ));

    // Spawn background loops
    let event_dispatch_loop = tokio::spawn(event_dispatching::worker::run(
        dispatcher,
        event_receiver,
    ));

    let sweep = dotenvy_env.sweep.clone();
    let sweep_usecase_loop = Arc::clone(&sweep_usecase);
    let expiration_sweep_loop = tokio::spawn(async move {
        if !sweep.enabled {
            info!("expiration_sweep: disabled by SWEEP_ENABLED");
            return std::future::pending::<Result<()>>().await;
        }
        expiration_sweeping::worker::run(
            sweep_usecase_loop,
            ExpirationSweepParams {
                batch_size: sweep.batch_size,
                lease_ttl: sweep.lease_ttl,
            },
            Duration::from_secs(sweep.interval_secs),
        )
        .await
    });

    let server_config = Arc::clone(&dotenvy_env);
    let http_server = tokio::spawn(axum_http::http_serve::start(
        server_config,
        HttpUseCases {
            lifecycle: lifecycle_usecase,
            sweep: sweep_usecase,
            backfill: backfill_usecase,
            inbox: inbox_usecase,
            publisher,
        },
    ));

    info!("Worker started");

    tokio::select! {
        result = http_server => result??,
        result = event_dispatch_loop => result??,
        result = expiration_sweep_loop => result??,
    };
    Ok(())
}
