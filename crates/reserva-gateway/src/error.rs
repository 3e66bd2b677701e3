//! Gateway-level error responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use reserva_core::BackendError;

/// Errors a request handler can surface to the caller.
///
/// Store failures never appear here: cache errors degrade to misses and
/// rate-limit store failures are absorbed by the configured failure policy,
/// so the only explicit failures a caller sees are backend errors and quota
/// violations.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A backend call failed (terminally, or after exhausting retries).
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// The caller exceeded its request quota.
    #[error("rate limit exceeded")]
    QuotaExceeded,

    /// Anything that should never reach a caller with detail attached.
    #[error("internal gateway error")]
    Internal(String),
}

impl ApiError {
    /// Creates an `Internal` error; the detail is logged, not returned.
    #[must_use]
    pub fn internal(detail: impl Into<String>) -> Self {
        Self::Internal(detail.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            Self::Backend(err) => {
                let status = StatusCode::from_u16(err.http_status())
                    .unwrap_or(StatusCode::BAD_GATEWAY);
                // Terminal client errors keep the backend's message; server
                // errors collapse into a generic unavailable response so the
                // caller learns nothing about internal topology.
                let message = if err.is_client_error() {
                    err.message.clone()
                } else {
                    "backend unavailable".to_string()
                };
                (status, err.code.to_string(), message)
            }
            Self::QuotaExceeded => (
                StatusCode::TOO_MANY_REQUESTS,
                "QUOTA_EXCEEDED".to_string(),
                "rate limit exceeded, retry later".to_string(),
            ),
            Self::Internal(detail) => {
                tracing::error!(detail = %detail, "internal gateway error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL".to_string(),
                    "internal gateway error".to_string(),
                )
            }
        };

        let body = json!({
            "error": {
                "code": code,
                "message": message,
            }
        });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reserva_core::ErrorCode;

    #[test]
    fn test_terminal_backend_error_keeps_message() {
        let err = ApiError::from(BackendError::not_found("booking 42 not found"));
        let res = err.into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_transient_backend_error_is_masked() {
        let err = ApiError::from(
            BackendError::new(ErrorCode::Unavailable, "redis://10.0.0.3 refused")
                .with_details("pool exhausted"),
        );
        let res = err.into_response();
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_quota_exceeded_is_429() {
        let res = ApiError::QuotaExceeded.into_response();
        assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    }
}
