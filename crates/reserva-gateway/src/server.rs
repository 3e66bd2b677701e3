//! Server assembly and lifecycle.

use std::net::SocketAddr;

use axum::{Router, extract::DefaultBodyLimit, middleware as axum_middleware};
use tokio::sync::watch;
use tower_http::trace::TraceLayer;

use crate::cache;
use crate::config::AppConfig;
use crate::middleware;
use crate::rate_limit;
use crate::routes;
use crate::state::AppState;

/// Builds the full application router around the given state.
///
/// Layer order, outermost first: trace, request-id, caller context, rate
/// limit, cache. The limiter must sit outside the cache so that cache hits
/// still count against the caller's quota.
pub fn build_app(state: AppState, body_limit_bytes: usize) -> Router {
    routes::api_router()
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            cache::response_cache,
        ))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            rate_limit::enforce_quota,
        ))
        .layer(axum_middleware::from_fn(middleware::caller_context))
        .layer(axum_middleware::from_fn(middleware::request_id))
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(body_limit_bytes))
        .with_state(state)
}

/// Runs the gateway until a shutdown signal arrives.
///
/// Owns the background sweep task: it starts with the server and is told
/// to stop before the listener finishes draining.
pub async fn run(config: AppConfig, state: AppState) -> anyhow::Result<()> {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweeper = cache::spawn_sweeper(
        state.invalidator.clone(),
        state.cache.sweep_interval(),
        state.cache.sweep_max_age(),
        shutdown_rx,
    );

    let app = build_app(state, config.server.body_limit_bytes);
    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "gateway listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    let _ = shutdown_tx.send(true);
    sweeper.await?;
    tracing::info!("gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install ctrl-c handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install sigterm handler");
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
