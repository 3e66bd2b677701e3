//! Request-resilience gateway for the reservation platform.
//!
//! The gateway fronts the internal RPC services and wraps every API call
//! in three layers: a retrying backend client, a shared-store response
//! cache with scoped invalidation, and a distributed fixed-window rate
//! limiter. See the crate-level modules for each concern.

pub mod backend;
pub mod cache;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod observability;
pub mod policy;
pub mod rate_limit;
pub mod routes;
pub mod server;
pub mod state;
