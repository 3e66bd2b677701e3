use std::sync::Arc;

use reserva_gateway::backend::HttpRpcDispatcher;
use reserva_gateway::config::loader::load_config;
use reserva_gateway::observability::{apply_logging_level, init_tracing};
use reserva_gateway::routes::policy_registry;
use reserva_gateway::state::AppState;
use reserva_gateway::{metrics, server};
use reserva_store::RedisSharedStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config_path = config_path_from_args();
    let config = load_config(config_path.as_deref()).map_err(anyhow::Error::msg)?;
    apply_logging_level(&config.logging.level);

    if !metrics::init_metrics() {
        tracing::warn!("metrics recorder already installed");
    }

    let store = RedisSharedStore::from_url(
        &config.redis.url,
        config.redis.pool_size,
        config.redis.wait_timeout(),
    )?;
    store.ping().await?;
    tracing::info!(url = %config.redis.url, "shared store connected");

    let dispatcher = Arc::new(HttpRpcDispatcher::new(config.upstreams.clone()));
    let state = AppState::new(
        Arc::new(store),
        policy_registry(),
        dispatcher,
        config.cache.clone(),
        config.rate_limit.clone(),
        reserva_core::RetryingBackendClient::new(config.retry.policy()),
    );

    server::run(config, state).await
}

/// `--config <path>` on the command line, else the `RESERVA_CONFIG`
/// environment variable, else the loader's default lookup.
fn config_path_from_args() -> Option<String> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            return args.next();
        }
        if let Some(path) = arg.strip_prefix("--config=") {
            return Some(path.to_string());
        }
    }
    std::env::var("RESERVA_CONFIG").ok()
}
