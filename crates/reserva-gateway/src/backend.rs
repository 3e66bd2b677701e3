//! Backend RPC dispatch.
//!
//! The gateway does not own business logic; it forwards each API operation
//! to an internal service as a JSON-over-HTTP RPC and translates failures
//! into [`BackendError`] values the retry layer understands.

use async_trait::async_trait;
use serde_json::Value;

use reserva_core::{BackendError, ErrorCode};

use crate::config::UpstreamsConfig;

/// A single-attempt call into an internal service.
///
/// Implementations must not retry internally; the retrying client owns the
/// retry loop. `service` selects the upstream, `operation` the RPC method
/// on it.
#[async_trait]
pub trait BackendDispatcher: Send + Sync {
    async fn dispatch(
        &self,
        service: &str,
        operation: &str,
        payload: Value,
    ) -> Result<Value, BackendError>;
}

/// Dispatches RPCs as `POST {base_url}/rpc/{operation}` with a JSON body.
pub struct HttpRpcDispatcher {
    client: reqwest::Client,
    upstreams: UpstreamsConfig,
}

impl HttpRpcDispatcher {
    pub fn new(upstreams: UpstreamsConfig) -> Self {
        Self { client: reqwest::Client::new(), upstreams }
    }
}

#[async_trait]
impl BackendDispatcher for HttpRpcDispatcher {
    async fn dispatch(
        &self,
        service: &str,
        operation: &str,
        payload: Value,
    ) -> Result<Value, BackendError> {
        let base = self.upstreams.url_for(service).ok_or_else(|| {
            BackendError::internal(format!("unknown backend service '{service}'"))
        })?;
        let url = format!("{}/rpc/{operation}", base.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| transport_error(service, operation, &e))?;

        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);

        if status.is_success() {
            return Ok(body);
        }
        Err(error_from_response(status, body))
    }
}

fn transport_error(service: &str, operation: &str, err: &reqwest::Error) -> BackendError {
    let code = if err.is_timeout() {
        ErrorCode::DeadlineExceeded
    } else {
        ErrorCode::Unavailable
    };
    BackendError::new(code, format!("{service}.{operation} transport failure"))
        .with_details(err.to_string())
}

/// Reconstructs a structured error from an upstream failure body of the
/// form `{"error": {"code", "message", "details"}}`. Responses without
/// that shape fall back to a status-derived code; the details field is
/// carried through because it gates retryability downstream.
fn error_from_response(status: reqwest::StatusCode, body: Value) -> BackendError {
    let error = body.get("error").cloned().unwrap_or(Value::Null);
    let code = error
        .get("code")
        .and_then(Value::as_str)
        .and_then(ErrorCode::parse)
        .unwrap_or_else(|| code_for_status(status));
    let message = error
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("upstream request failed")
        .to_string();
    let details = error
        .get("details")
        .and_then(Value::as_str)
        .map(str::to_string);

    BackendError { code, message, details }
}

fn code_for_status(status: reqwest::StatusCode) -> ErrorCode {
    use reqwest::StatusCode;
    match status {
        StatusCode::BAD_REQUEST => ErrorCode::InvalidArgument,
        StatusCode::UNAUTHORIZED => ErrorCode::Unauthenticated,
        StatusCode::FORBIDDEN => ErrorCode::PermissionDenied,
        StatusCode::NOT_FOUND => ErrorCode::NotFound,
        StatusCode::CONFLICT => ErrorCode::AlreadyExists,
        StatusCode::TOO_MANY_REQUESTS => ErrorCode::ResourceExhausted,
        StatusCode::GATEWAY_TIMEOUT => ErrorCode::DeadlineExceeded,
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE => ErrorCode::Unavailable,
        s if s.is_server_error() => ErrorCode::Internal,
        _ => ErrorCode::Unknown,
    }
}
