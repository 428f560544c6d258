//! Server error types and the HTTP error mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::warn;
use wayfarer_guard::{GuardError, QuotaSnapshot};
use wayfarer_metrics::{
    ERROR_CONFIG, ERROR_UPSTREAM, record_access_denied, record_error, record_upload_decision,
};

/// Server startup and runtime error.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("config: {0}")]
    Config(String),
    #[error("guard: {0}")]
    Guard(#[from] GuardError),
}

impl ServerError {
    /// Get the error type string for metrics.
    pub fn error_type(&self) -> &'static str {
        match self {
            ServerError::Io(_) => ERROR_UPSTREAM,
            ServerError::Config(_) => ERROR_CONFIG,
            ServerError::Guard(e) => e.error_type(),
        }
    }
}

/// A guard failure on its way out as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub GuardError);

impl From<GuardError> for ApiError {
    fn from(err: GuardError) -> Self {
        Self(err)
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    quota: Option<&'a QuotaSnapshot>,
}

/// HTTP status for a guard error.
pub fn status_for(err: &GuardError) -> StatusCode {
    match err {
        GuardError::Unauthenticated => StatusCode::UNAUTHORIZED,
        GuardError::NotFoundOrForbidden => StatusCode::NOT_FOUND,
        GuardError::Forbidden { .. } => StatusCode::FORBIDDEN,
        GuardError::Validation(_) => StatusCode::BAD_REQUEST,
        GuardError::QuotaExceeded(_) => StatusCode::PAYLOAD_TOO_LARGE,
        GuardError::ExperienceLimit { .. } => StatusCode::FORBIDDEN,
        GuardError::Upstream(_) | GuardError::Configuration(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        let status = status_for(&err);
        // Internal details stay in the log.
        let message = match &err {
            GuardError::Upstream(detail) | GuardError::Configuration(detail) => {
                warn!(error_type = err.error_type(), detail = %detail, "request failed");
                record_error(err.error_type());
                "internal error, please retry".to_string()
            }
            other => other.to_string(),
        };
        match &err {
            GuardError::NotFoundOrForbidden
            | GuardError::Forbidden { .. }
            | GuardError::ExperienceLimit { .. } => record_access_denied(err.error_type()),
            GuardError::QuotaExceeded(_) => record_upload_decision(false),
            _ => {}
        }
        let quota = match &err {
            GuardError::QuotaExceeded(q) => Some(q),
            _ => None,
        };
        let body = ErrorBody {
            error: err.error_type(),
            message,
            quota,
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayfarer_guard::Tier;

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(&GuardError::Unauthenticated), StatusCode::UNAUTHORIZED);
        assert_eq!(status_for(&GuardError::NotFoundOrForbidden), StatusCode::NOT_FOUND);
        assert_eq!(
            status_for(&GuardError::Forbidden {
                required: Tier::Traveler
            }),
            StatusCode::FORBIDDEN
        );
        assert_eq!(status_for(&GuardError::validation("x")), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_for(&GuardError::QuotaExceeded(QuotaSnapshot::new(10, 5))),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            status_for(&GuardError::ExperienceLimit { limit: 3 }),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_for(&GuardError::upstream("db down")),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_upstream_detail_not_echoed() {
        let resp = ApiError(GuardError::upstream("password=hunter2")).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = axum::body::to_bytes(resp.into_body(), 1024).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(!text.contains("hunter2"));
        assert!(text.contains("upstream_error"));
    }
}
