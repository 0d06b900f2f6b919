use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use memberhub::usecases::notification_inbox::NotificationInboxUseCase;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::axum_http::error_responses::error_response;

pub fn routes(inbox: Arc<NotificationInboxUseCase>) -> Router {
    Router::new()
        .route("/:recipient_id", get(list_notifications))
        .route(
            "/:recipient_id/:notification_id/read",
            post(mark_notification_read),
        )
        .route("/:recipient_id/read-all", post(mark_all_read))
        .with_state(inbox)
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub unread_only: Option<bool>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct MarkedResponse {
    pub updated: usize,
}

pub async fn list_notifications(
    State(inbox): State<Arc<NotificationInboxUseCase>>,
    Path(recipient_id): Path<Uuid>,
    Query(query): Query<ListQuery>,
) -> Response {
    match inbox
        .list(recipient_id, query.unread_only.unwrap_or(false), query.limit)
        .await
    {
        Ok(notifications) => Json(notifications).into_response(),
        Err(_) => error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal error"),
    }
}

pub async fn mark_notification_read(
    State(inbox): State<Arc<NotificationInboxUseCase>>,
    Path((recipient_id, notification_id)): Path<(Uuid, Uuid)>,
) -> Response {
    match inbox.mark_read(recipient_id, notification_id).await {
        Ok(updated) => Json(MarkedResponse {
            updated: usize::from(updated),
        })
        .into_response(),
        Err(_) => error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal error"),
    }
}

pub async fn mark_all_read(
    State(inbox): State<Arc<NotificationInboxUseCase>>,
    Path(recipient_id): Path<Uuid>,
) -> Response {
    match inbox.mark_all_read(recipient_id).await {
        Ok(updated) => Json(MarkedResponse { updated }).into_response(),
        Err(_) => error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal error"),
    }
}
