use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use chrono::{DateTime, Utc};
use memberhub::{
    domain::value_objects::{
        enums::subscription_statuses::SubscriptionStatus,
        subscriptions::{GatewaySnapshot, SubscriptionDto},
    },
    usecases::{
        expiration_backfill::{ExpirationBackfillParams, ExpirationBackfillUseCase},
        expiration_sweep::{ExpirationSweepParams, ExpirationSweepUseCase, SweepOutcome},
        subscription_lifecycle::SubscriptionLifecycleUseCase,
    },
};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};
use uuid::Uuid;

use crate::axum_http::error_responses::{error_response, from_status};

// Run example
//   curl -X POST "http://localhost:$SERVER_PORT_WORKER/internal/v1/subscriptions/expiration-sweep" \
//     -H "Authorization: Bearer $INTERNAL_API_TOKEN"

#[derive(Clone)]
pub struct SubscriptionsRouteState {
    pub lifecycle: Arc<SubscriptionLifecycleUseCase>,
    pub sweep: Arc<ExpirationSweepUseCase>,
    pub backfill: Arc<ExpirationBackfillUseCase>,
    pub sweep_params: ExpirationSweepParams,
}

pub fn routes(state: SubscriptionsRouteState) -> Router {
    Router::new()
        .route("/expiration-sweep", post(run_expiration_sweep))
        .route("/expiration-backfill", post(run_expiration_backfill))
        .route("/:subscription_id/status", post(transition_status))
        .with_state(state)
}

#[derive(Debug, Serialize)]
pub struct SweepResponse {
    pub skipped: bool,
    pub batches: usize,
    pub scanned: usize,
    pub expired: usize,
    pub failed_batches: usize,
    pub events_published: usize,
    pub expired_ids: Vec<Uuid>,
    pub lease_lost: bool,
}

pub async fn run_expiration_sweep(State(state): State<SubscriptionsRouteState>) -> Response {
    match state.sweep.run(state.sweep_params).await {
        Ok(SweepOutcome::Completed(report)) => Json(SweepResponse {
            skipped: false,
            batches: report.batches,
            scanned: report.scanned,
            expired: report.expired,
            failed_batches: report.failed_batches,
            events_published: report.events_published,
            expired_ids: report.expired_ids,
            lease_lost: report.lease_lost,
        })
        .into_response(),
        Ok(SweepOutcome::Skipped) => (
            StatusCode::CONFLICT,
            Json(SweepResponse {
                skipped: true,
                batches: 0,
                scanned: 0,
                expired: 0,
                failed_batches: 0,
                events_published: 0,
                expired_ids: Vec::new(),
                lease_lost: false,
            }),
        )
            .into_response(),
        Err(err) => {
            error!(error = %err, cause = ?err, "expiration_sweep: usecase failed");
            from_status(err.status_code(), &err)
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct BackfillRequest {
    pub only_missing: Option<bool>,
    pub batch_size: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct BackfillResponse {
    pub only_missing: bool,
    pub scanned: usize,
    pub stamped: usize,
    pub unchanged: usize,
    pub skipped_missing_anchor: usize,
    pub failed: usize,
}

/// An empty body runs with defaults; anything else must be a valid request.
pub async fn run_expiration_backfill(
    State(state): State<SubscriptionsRouteState>,
    body: Bytes,
) -> Response {
    let payload = if body.iter().all(u8::is_ascii_whitespace) {
        BackfillRequest::default()
    } else {
        match serde_json::from_slice::<BackfillRequest>(&body) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(error = %err, "expiration_backfill: rejected malformed body");
                return error_response(
                    StatusCode::BAD_REQUEST,
                    format!("invalid backfill request: {err}"),
                );
            }
        }
    };
    let defaults = ExpirationBackfillParams::default();
    let params = ExpirationBackfillParams {
        batch_size: payload.batch_size.unwrap_or(defaults.batch_size),
        only_missing: payload.only_missing.unwrap_or(defaults.only_missing),
    };

    match state.backfill.run(params).await {
        Ok(report) => Json(BackfillResponse {
            only_missing: params.only_missing,
            scanned: report.scanned,
            stamped: report.stamped,
            unchanged: report.unchanged,
            skipped_missing_anchor: report.skipped_missing_anchor,
            failed: report.failed,
        })
        .into_response(),
        Err(err) => {
            error!(error = %err, "expiration_backfill: usecase failed");
            from_status(err.status_code(), &err)
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TransitionRequest {
    pub status: String,
    pub trial_end_at: Option<DateTime<Utc>>,
    pub next_billing_at: Option<DateTime<Utc>>,
}

pub async fn transition_status(
    State(state): State<SubscriptionsRouteState>,
    Path(subscription_id): Path<Uuid>,
    Json(payload): Json<TransitionRequest>,
) -> Response {
    let Some(target) = SubscriptionStatus::from_str(&payload.status) else {
        return error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            format!("unknown subscription status {:?}", payload.status),
        );
    };

    let snapshot = GatewaySnapshot {
        trial_end_at: payload.trial_end_at,
        next_billing_at: payload.next_billing_at,
    };

    match state
        .lifecycle
        .transition(subscription_id, target, snapshot)
        .await
    {
        Ok(subscription) => Json(SubscriptionDto::from(subscription)).into_response(),
        Err(err) => from_status(err.status_code(), &err),
    }
}
