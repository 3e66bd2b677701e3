//! # reserva-core
//!
//! Shared types for the Reserva gateway's request-resilience layer.
//!
//! This crate defines the normalized backend failure model ([`BackendError`])
//! and the bounded retry client ([`RetryingBackendClient`]) that wraps every
//! outbound call to an internal RPC service. It is deliberately free of HTTP
//! framework dependencies so that both the gateway and any worker binaries
//! can share the same failure semantics.

mod error;
mod retry;

pub use error::{BackendError, ErrorCode};
pub use retry::{RetryPolicy, RetryingBackendClient};

/// Convenience result type for backend calls.
pub type BackendResult<T> = Result<T, BackendError>;
