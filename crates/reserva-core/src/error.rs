use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Normalized failure classification for internal RPC backends.
///
/// The gateway never inspects the wire format of a backend failure; every
/// RPC client adapter maps its transport errors into this code set before
/// the error reaches the retry or response path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// The backend rejected the request payload.
    InvalidArgument,
    /// The requested entity does not exist.
    NotFound,
    /// The entity already exists (create conflicts).
    AlreadyExists,
    /// The caller is authenticated but not allowed.
    PermissionDenied,
    /// The caller is not authenticated.
    Unauthenticated,
    /// The backend ran out of quota or capacity.
    ResourceExhausted,
    /// The backend hit an internal failure.
    Internal,
    /// The backend is temporarily unreachable.
    Unavailable,
    /// The backend did not answer within its own deadline.
    DeadlineExceeded,
    /// Anything the adapter could not classify.
    Unknown,
}

impl ErrorCode {
    /// Parses the wire form (`SCREAMING_SNAKE_CASE`) of a code.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "INVALID_ARGUMENT" => Some(Self::InvalidArgument),
            "NOT_FOUND" => Some(Self::NotFound),
            "ALREADY_EXISTS" => Some(Self::AlreadyExists),
            "PERMISSION_DENIED" => Some(Self::PermissionDenied),
            "UNAUTHENTICATED" => Some(Self::Unauthenticated),
            "RESOURCE_EXHAUSTED" => Some(Self::ResourceExhausted),
            "INTERNAL" => Some(Self::Internal),
            "UNAVAILABLE" => Some(Self::Unavailable),
            "DEADLINE_EXCEEDED" => Some(Self::DeadlineExceeded),
            "UNKNOWN" => Some(Self::Unknown),
            _ => None,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::NotFound => "NOT_FOUND",
            Self::AlreadyExists => "ALREADY_EXISTS",
            Self::PermissionDenied => "PERMISSION_DENIED",
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::ResourceExhausted => "RESOURCE_EXHAUSTED",
            Self::Internal => "INTERNAL",
            Self::Unavailable => "UNAVAILABLE",
            Self::DeadlineExceeded => "DEADLINE_EXCEEDED",
            Self::Unknown => "UNKNOWN",
        };
        write!(f, "{s}")
    }
}

/// A normalized backend failure, independent of the RPC transport.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct BackendError {
    /// Failure classification, drives retryability and HTTP mapping.
    pub code: ErrorCode,
    /// Human-readable description from the backend.
    pub message: String,
    /// Optional diagnostic context attached by the backend.
    pub details: Option<String>,
}

impl BackendError {
    /// Creates a new error with the given code and message.
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Attaches diagnostic details to the error.
    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Creates an `Unavailable` error.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unavailable, message)
    }

    /// Creates a `DeadlineExceeded` error.
    #[must_use]
    pub fn deadline_exceeded(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DeadlineExceeded, message)
    }

    /// Creates an `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, message)
    }

    /// Creates a `NotFound` error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    /// Whether this failure is worth retrying.
    ///
    /// A transient code alone is not enough: the error must also carry a
    /// non-empty `details` field. Errors missing diagnostic context are
    /// surfaced immediately even when the code looks transient.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        let transient_code = matches!(
            self.code,
            ErrorCode::Unavailable
                | ErrorCode::DeadlineExceeded
                | ErrorCode::ResourceExhausted
                | ErrorCode::Internal
        );
        transient_code && self.details.as_deref().is_some_and(|d| !d.is_empty())
    }

    /// Whether this is a client-side failure (caller mistake).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::InvalidArgument
                | ErrorCode::NotFound
                | ErrorCode::AlreadyExists
                | ErrorCode::PermissionDenied
                | ErrorCode::Unauthenticated
        )
    }

    /// HTTP status the gateway should answer with for this failure.
    #[must_use]
    pub fn http_status(&self) -> u16 {
        match self.code {
            ErrorCode::InvalidArgument => 400,
            ErrorCode::Unauthenticated => 401,
            ErrorCode::PermissionDenied => 403,
            ErrorCode::NotFound => 404,
            ErrorCode::AlreadyExists => 409,
            ErrorCode::ResourceExhausted => 429,
            ErrorCode::Internal | ErrorCode::Unknown => 502,
            ErrorCode::Unavailable => 503,
            ErrorCode::DeadlineExceeded => 504,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_code_and_message() {
        let err = BackendError::unavailable("inventory-service down");
        assert_eq!(err.to_string(), "UNAVAILABLE: inventory-service down");
    }

    #[test]
    fn test_transient_code_with_details_is_retryable() {
        for code in [
            ErrorCode::Unavailable,
            ErrorCode::DeadlineExceeded,
            ErrorCode::ResourceExhausted,
            ErrorCode::Internal,
        ] {
            let err = BackendError::new(code, "boom").with_details("connection reset");
            assert!(err.is_retryable(), "{code} with details should retry");
        }
    }

    #[test]
    fn test_transient_code_without_details_is_not_retryable() {
        let err = BackendError::unavailable("boom");
        assert!(!err.is_retryable());

        // An empty details string does not satisfy the gate either.
        let err = BackendError::unavailable("boom").with_details("");
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_terminal_codes_never_retry() {
        for code in [
            ErrorCode::InvalidArgument,
            ErrorCode::NotFound,
            ErrorCode::AlreadyExists,
            ErrorCode::PermissionDenied,
            ErrorCode::Unauthenticated,
            ErrorCode::Unknown,
        ] {
            let err = BackendError::new(code, "boom").with_details("full context");
            assert!(!err.is_retryable(), "{code} should never retry");
        }
    }

    #[test]
    fn test_client_error_classification() {
        assert!(BackendError::not_found("missing").is_client_error());
        assert!(!BackendError::unavailable("down").is_client_error());
        assert!(!BackendError::internal("oops").is_client_error());
    }

    #[test]
    fn test_http_status_mapping() {
        assert_eq!(BackendError::new(ErrorCode::InvalidArgument, "x").http_status(), 400);
        assert_eq!(BackendError::not_found("x").http_status(), 404);
        assert_eq!(BackendError::new(ErrorCode::ResourceExhausted, "x").http_status(), 429);
        assert_eq!(BackendError::unavailable("x").http_status(), 503);
        assert_eq!(BackendError::deadline_exceeded("x").http_status(), 504);
        assert_eq!(BackendError::internal("x").http_status(), 502);
    }

    #[test]
    fn test_serde_round_trip_keeps_screaming_snake_codes() {
        let err = BackendError::unavailable("down").with_details("tcp reset");
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("\"UNAVAILABLE\""));
        let back: BackendError = serde_json::from_str(&json).unwrap();
        assert_eq!(back.code, ErrorCode::Unavailable);
        assert_eq!(back.details.as_deref(), Some("tcp reset"));
    }
}
