use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use memberhub::{
    domain::value_objects::events::DomainEvent, usecases::event_bus::EventPublisher,
};
use serde::Serialize;
use tracing::{error, info};

use crate::axum_http::error_responses::error_response;

// Run example
//   curl -X POST "http://localhost:$SERVER_PORT_WORKER/internal/v1/events" \
//     -H "Authorization: Bearer $INTERNAL_API_TOKEN" \
//     -H "Content-Type: application/json" \
//     -d '{"event":"video_uploaded","video_id":"...","user_id":"...","title":"Squat form"}'

pub fn routes(publisher: Arc<dyn EventPublisher + Send + Sync>) -> Router {
    Router::new()
        .route("/", post(enqueue_event))
        .with_state(publisher)
}

#[derive(Debug, Serialize)]
pub struct EnqueuedResponse {
    pub accepted: bool,
    pub event: String,
}

pub async fn enqueue_event(
    State(publisher): State<Arc<dyn EventPublisher + Send + Sync>>,
    Json(event): Json<DomainEvent>,
) -> Response {
    let notification_type = event.notification_type();
    let user_id = event.subject_user_id();

    match publisher.publish(event).await {
        Ok(()) => {
            info!(%notification_type, %user_id, "events: enqueued");
            (
                StatusCode::ACCEPTED,
                Json(EnqueuedResponse {
                    accepted: true,
                    event: notification_type.to_string(),
                }),
            )
                .into_response()
        }
        Err(err) => {
            error!(%notification_type, %user_id, error = ?err, "events: failed to enqueue");
            error_response(StatusCode::SERVICE_UNAVAILABLE, "event queue unavailable")
        }
    }
}
