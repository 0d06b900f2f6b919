use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Response},
};
use subtle::ConstantTimeEq;
use tracing::warn;

#[derive(Clone)]
pub struct InternalAuth {
    token: Option<Arc<str>>,
}

impl InternalAuth {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: token.map(Arc::from),
        }
    }
}

pub async fn require_internal_token(
    State(auth): State<InternalAuth>,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected_token) = auth.token.as_deref() else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            "internal api token is not configured",
        )
            .into_response();
    };

    if let Err(status) = authorize_bearer(request.headers(), expected_token) {
        warn!(path = %request.uri().path(), "internal api: rejected request");
        return (status, "unauthorized").into_response();
    }

    next.run(request).await
}

fn authorize_bearer(headers: &HeaderMap, expected_token: &str) -> Result<(), StatusCode> {
    let auth = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let token = auth
        .strip_prefix("Bearer ")
        .ok_or(StatusCode::UNAUTHORIZED)?;

    if tokens_match(token, expected_token) {
        Ok(())
    } else {
        Err(StatusCode::UNAUTHORIZED)
    }
}

fn tokens_match(given: &str, expected: &str) -> bool {
    let (given, expected) = (given.as_bytes(), expected.as_bytes());
    given.len() == expected.len() && bool::from(given.ct_eq(expected))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn accepts_matching_bearer() {
        assert!(authorize_bearer(&headers("Bearer s3cret"), "s3cret").is_ok());
    }

    #[test]
    fn rejects_other_schemes_and_tokens() {
        assert_eq!(
            authorize_bearer(&headers("Basic s3cret"), "s3cret"),
            Err(StatusCode::UNAUTHORIZED)
        );
        assert_eq!(
            authorize_bearer(&headers("Bearer nope"), "s3cret"),
            Err(StatusCode::UNAUTHORIZED)
        );
        assert_eq!(
            authorize_bearer(&HeaderMap::new(), "s3cret"),
            Err(StatusCode::UNAUTHORIZED)
        );
    }

    #[test]
    fn token_comparison_needs_exact_bytes() {
        assert!(tokens_match("s3cret", "s3cret"));
        assert!(!tokens_match("s3cre", "s3cret"));
        assert!(!tokens_match("s3cret!", "s3cret"));
        assert!(!tokens_match("S3cret", "s3cret"));
        assert!(!tokens_match("", "s3cret"));
    }
}
