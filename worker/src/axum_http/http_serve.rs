use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Result;
use axum::{
    Router,
    http::{
        Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    middleware,
    routing::get,
};
use memberhub::usecases::{
    event_bus::EventPublisher, expiration_backfill::ExpirationBackfillUseCase,
    expiration_sweep::{ExpirationSweepParams, ExpirationSweepUseCase},
    notification_inbox::NotificationInboxUseCase,
    subscription_lifecycle::SubscriptionLifecycleUseCase,
};
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer, limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use tracing::info;

use crate::{
    axum_http::{
        default_routers,
        internal_auth::{InternalAuth, require_internal_token},
        routers::{self, subscriptions::SubscriptionsRouteState},
    },
    config::config_model::DotEnvyConfig,
};

#[derive(Clone)]
pub struct HttpUseCases {
    pub lifecycle: Arc<SubscriptionLifecycleUseCase>,
    pub sweep: Arc<ExpirationSweepUseCase>,
    pub backfill: Arc<ExpirationBackfillUseCase>,
    pub inbox: Arc<NotificationInboxUseCase>,
    pub publisher: Arc<dyn EventPublisher + Send + Sync>,
}

pub fn build_router(config: &DotEnvyConfig, usecases: HttpUseCases) -> Result<Router> {
    let allowed_origins = vec![
        "http://localhost".parse()?,
        "http://127.0.0.1".parse()?,
        "http://localhost:3000".parse()?,
        "http://127.0.0.1:3000".parse()?,
    ];

    let sweep_params = ExpirationSweepParams {
        batch_size: config.sweep.batch_size,
        lease_ttl: config.sweep.lease_ttl,
    };

    let internal = Router::new()
        .nest(
            "/v1/subscriptions",
            routers::subscriptions::routes(SubscriptionsRouteState {
                lifecycle: usecases.lifecycle,
                sweep: usecases.sweep,
                backfill: usecases.backfill,
                sweep_params,
            }),
        )
        .nest("/v1/events", routers::events::routes(usecases.publisher))
        .nest(
            "/v1/notifications",
            routers::notifications::routes(usecases.inbox),
        )
        .layer(middleware::from_fn_with_state(
            InternalAuth::new(config.internal_api.token.clone()),
            require_internal_token,
        ));

    let app = Router::new()
        .fallback(default_routers::not_found)
        .nest("/internal", internal)
        .route("/health-check", get(default_routers::health_check))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.worker_server.timeout,
        )))
        .layer(RequestBodyLimitLayer::new(
            config.worker_server.body_limit_bytes,
        ))
        .layer(
            CorsLayer::new()
                .allow_methods([Method::GET, Method::POST])
                .allow_headers([AUTHORIZATION, CONTENT_TYPE])
                .allow_origin(allowed_origins),
        )
        .layer(TraceLayer::new_for_http());

    Ok(app)
}

pub async fn start(config: Arc<DotEnvyConfig>, usecases: HttpUseCases) -> Result<()> {
    let app = build_router(&config, usecases)?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.worker_server.port));
    let listener = TcpListener::bind(addr).await?;
    info!("Worker HTTP server running on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to install CTRL+C signal handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to install SIGTERM signal handler");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received ctrl+C signal"),
        _ = terminate => info!("Received terminate signal"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use memberhub::{
        domain::{
            clock::SystemClock,
            repositories::{
                job_leases::MockJobLeaseRepository, notifications::MockNotificationRepository,
                plans::MockPlanRepository, subscriptions::MockSubscriptionRepository,
            },
        },
        usecases::event_bus::MockEventPublisher,
    };
    use tower::ServiceExt;

    use crate::config::config_loader::load_from;

    fn config(token: Option<&str>) -> DotEnvyConfig {
        let token = token.map(str::to_string);
        load_from(move |key| match key {
            "SERVER_PORT_WORKER" => Some("0".to_string()),
            "DATABASE_URL" => Some("postgres://localhost/memberhub".to_string()),
            "INTERNAL_API_TOKEN" => token.clone(),
            _ => None,
        })
        .unwrap()
    }

    fn usecases(publisher: MockEventPublisher) -> HttpUseCases {
        usecases_with(publisher, MockSubscriptionRepository::new())
    }

    fn usecases_with(
        publisher: MockEventPublisher,
        subscription_repo: MockSubscriptionRepository,
    ) -> HttpUseCases {
        let publisher: Arc<dyn EventPublisher + Send + Sync> = Arc::new(publisher);
        let subscription_repo = Arc::new(subscription_repo);
        let lifecycle = Arc::new(SubscriptionLifecycleUseCase::new(
            subscription_repo.clone(),
            Arc::new(MockPlanRepository::new()),
            Arc::clone(&publisher),
            Arc::new(SystemClock),
        ));

        HttpUseCases {
            lifecycle: Arc::clone(&lifecycle),
            sweep: Arc::new(ExpirationSweepUseCase::new(
                subscription_repo.clone(),
                Arc::new(MockJobLeaseRepository::new()),
                Arc::clone(&publisher),
                Arc::new(SystemClock),
            )),
            backfill: Arc::new(ExpirationBackfillUseCase::new(subscription_repo, lifecycle)),
            inbox: Arc::new(NotificationInboxUseCase::new(
                Arc::new(MockNotificationRepository::new()),
                Arc::new(SystemClock),
            )),
            publisher,
        }
    }

    fn sweep_request(auth: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/internal/v1/subscriptions/expiration-sweep");
        if let Some(auth) = auth {
            builder = builder.header("authorization", auth);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn internal_routes_are_unavailable_without_a_token() {
        let app = build_router(&config(None), usecases(MockEventPublisher::new())).unwrap();

        let response = app.oneshot(sweep_request(Some("Bearer anything"))).await.unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn wrong_token_is_unauthorized() {
        let app = build_router(&config(Some("s3cret")), usecases(MockEventPublisher::new()))
            .unwrap();

        let response = app.oneshot(sweep_request(Some("Bearer guess"))).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn health_check_stays_open() {
        let app = build_router(&config(None), usecases(MockEventPublisher::new())).unwrap();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health-check")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn events_are_accepted_once_queued() {
        let mut publisher = MockEventPublisher::new();
        publisher.expect_publish().times(1).returning(|_| Ok(()));
        let app = build_router(&config(Some("s3cret")), usecases(publisher)).unwrap();

        let body = serde_json::json!({
            "event": "member_registered",
            "user_id": uuid::Uuid::new_v4(),
        });
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/internal/v1/events")
                    .header("authorization", "Bearer s3cret")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    fn backfill_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/internal/v1/subscriptions/expiration-backfill")
            .header("authorization", "Bearer s3cret")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn malformed_backfill_body_is_rejected_before_any_write() {
        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo.expect_list_batch_after_id().never();
        subscription_repo.expect_update_expiration().never();
        let app = build_router(
            &config(Some("s3cret")),
            usecases_with(MockEventPublisher::new(), subscription_repo),
        )
        .unwrap();

        let response = app
            .oneshot(backfill_request(r#"{"batch_size":"abc"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn empty_backfill_body_runs_with_defaults() {
        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo
            .expect_list_batch_after_id()
            .withf(|after, batch_size, only_missing| {
                after.is_none() && *batch_size == 100 && *only_missing
            })
            .times(1)
            .returning(|_, _, _| Ok(Vec::new()));
        let app = build_router(
            &config(Some("s3cret")),
            usecases_with(MockEventPublisher::new(), subscription_repo),
        )
        .unwrap();

        let response = app.oneshot(backfill_request("")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
