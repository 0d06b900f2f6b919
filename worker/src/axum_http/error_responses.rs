use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
        .into_response()
}

/// Client errors carry the error text; server errors stay generic so
/// database details never leave the worker.
pub fn from_status(status: StatusCode, message: impl ToString) -> Response {
    if status.is_server_error() {
        error_response(status, "internal error")
    } else {
        error_response(status, message.to_string())
    }
}
