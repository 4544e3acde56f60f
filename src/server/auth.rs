//! API-key check applied to the HTTP transport.
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use tracing::warn;

use crate::tools::base::format_error_response;

pub const API_KEY_HEADER: &str = "x-api-key";
pub const UNAUTHORIZED: &str = "UNAUTHORIZED";

/// Authentication status of one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    /// No key is configured.
    Open,
    Matched,
    Missing,
    Mismatch,
}

impl AuthStatus {
    pub fn is_allowed(self) -> bool {
        matches!(self, AuthStatus::Open | AuthStatus::Matched)
    }
}

/// Expected `X-API-Key` value, if the server requires one.
#[derive(Debug, Clone, Default)]
pub struct ApiKeyGuard {
    expected: Option<Arc<str>>,
}

impl ApiKeyGuard {
    pub fn new(expected: Option<&str>) -> Self {
        Self {
            expected: expected.map(Arc::from),
        }
    }

    pub fn status(&self, headers: &HeaderMap) -> AuthStatus {
        let Some(expected) = self.expected.as_deref() else {
            return AuthStatus::Open;
        };
        match headers.get(API_KEY_HEADER).map(|value| value.to_str()) {
            None => AuthStatus::Missing,
            Some(Ok(provided)) if provided == expected => AuthStatus::Matched,
            Some(_) => AuthStatus::Mismatch,
        }
    }
}

/// Reject requests without the configured key with 401 and the error envelope.
pub async fn require_api_key(
    State(guard): State<ApiKeyGuard>,
    request: Request,
    next: Next,
) -> Response {
    let status = guard.status(request.headers());
    if status.is_allowed() {
        return next.run(request).await;
    }
    warn!(
        target: "mcp_template::runtime",
        path = %request.uri().path(),
        status = ?status,
        "Rejected request without a valid API key"
    );
    let message = match status {
        AuthStatus::Missing => "Missing API key",
        _ => "Invalid API key",
    };
    (
        StatusCode::UNAUTHORIZED,
        Json(format_error_response(message, UNAUTHORIZED, None)),
    )
        .into_response()
}
