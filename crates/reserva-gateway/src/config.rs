use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, time::Duration};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Shared store (Redis) configuration
    #[serde(default)]
    pub redis: RedisConfig,
    /// Response cache configuration
    #[serde(default)]
    pub cache: CacheSettings,
    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitSettings,
    /// Backend retry configuration
    #[serde(default)]
    pub retry: RetrySettings,
    /// Upstream RPC service locations
    #[serde(default)]
    pub upstreams: UpstreamsConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("server.port must be > 0".into());
        }
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        if self.redis.url.is_empty() {
            return Err("redis.url must not be empty".into());
        }
        if self.redis.pool_size == 0 {
            return Err("redis.pool_size must be > 0".into());
        }
        if self.cache.default_ttl_secs == 0 {
            return Err("cache.default_ttl_secs must be > 0".into());
        }
        if self.cache.sweep_interval_secs == 0 {
            return Err("cache.sweep_interval_secs must be > 0".into());
        }
        if self.cache.scan_page_size == 0 {
            return Err("cache.scan_page_size must be > 0".into());
        }
        if self.rate_limit.window_secs == 0 {
            return Err("rate_limit.window_secs must be > 0".into());
        }
        if self.rate_limit.max_requests <= 0 {
            return Err("rate_limit.max_requests must be > 0".into());
        }
        Ok(())
    }

    pub fn addr(&self) -> SocketAddr {
        use std::net::{IpAddr, Ipv4Addr};
        let host: IpAddr = self
            .server
            .host
            .parse()
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));
        SocketAddr::from((host, self.server.port))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    8080
}
fn default_body_limit() -> usize {
    1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            body_limit_bytes: default_body_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}
fn default_log_level() -> String {
    "info".into()
}
impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Shared store configuration. Every gateway instance must point at the
/// same Redis; it is the single source of truth for cache entries and
/// rate-limit windows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    /// Redis connection URL (e.g., "redis://localhost:6379")
    #[serde(default = "default_redis_url")]
    pub url: String,

    /// Connection pool size
    #[serde(default = "default_redis_pool_size")]
    pub pool_size: usize,

    /// Pool wait timeout in milliseconds
    #[serde(default = "default_redis_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_redis_pool_size() -> usize {
    10
}

fn default_redis_timeout_ms() -> u64 {
    5000
}

impl RedisConfig {
    pub fn wait_timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
            pool_size: default_redis_pool_size(),
            timeout_ms: default_redis_timeout_ms(),
        }
    }
}

/// Response cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Global kill-switch: disables all caching behavior when false
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,

    /// TTL applied to routes without an explicit override
    #[serde(default = "default_cache_ttl_secs")]
    pub default_ttl_secs: u64,

    /// How often the background sweep runs
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    /// Entries older than this are evicted by the sweep
    #[serde(default = "default_sweep_max_age_secs")]
    pub sweep_max_age_secs: u64,

    /// SCAN page-size hint for invalidation and sweeps
    #[serde(default = "default_scan_page_size")]
    pub scan_page_size: usize,
}

fn default_cache_enabled() -> bool {
    true
}

fn default_cache_ttl_secs() -> u64 {
    300
}

fn default_sweep_interval_secs() -> u64 {
    86_400 // daily
}

fn default_sweep_max_age_secs() -> u64 {
    86_400
}

fn default_scan_page_size() -> usize {
    100
}

impl CacheSettings {
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn sweep_max_age(&self) -> Duration {
        Duration::from_secs(self.sweep_max_age_secs)
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            default_ttl_secs: default_cache_ttl_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
            sweep_max_age_secs: default_sweep_max_age_secs(),
            scan_page_size: default_scan_page_size(),
        }
    }
}

/// Global rate-limit defaults; individual routes may override the quota.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitSettings {
    /// Fixed window length in seconds
    #[serde(default = "default_rl_window_secs")]
    pub window_secs: u64,

    /// Request ceiling per window
    #[serde(default = "default_rl_max_requests")]
    pub max_requests: i64,

    /// What to do when the shared store is unreachable
    #[serde(default)]
    pub on_store_failure: StoreFailurePolicy,
}

fn default_rl_window_secs() -> u64 {
    60
}

fn default_rl_max_requests() -> i64 {
    100
}

impl RateLimitSettings {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            window_secs: default_rl_window_secs(),
            max_requests: default_rl_max_requests(),
            on_store_failure: StoreFailurePolicy::default(),
        }
    }
}

/// Policy applied when the rate-limit store cannot be reached.
///
/// `Closed` (the default) reports the window as fully consumed and rejects
/// the request, which is safer against abuse but worse for availability. `Open` admits
/// the request as if the window were empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreFailurePolicy {
    #[default]
    Closed,
    Open,
}

/// Backend retry configuration, loaded once and shared across all calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Maximum retries after the initial attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Fixed delay between attempts in milliseconds (no jitter)
    #[serde(default = "default_retry_delay_ms")]
    pub delay_ms: u64,
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    1000
}

impl RetrySettings {
    pub fn policy(&self) -> reserva_core::RetryPolicy {
        reserva_core::RetryPolicy::new(self.max_retries, self.delay_ms)
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            delay_ms: default_retry_delay_ms(),
        }
    }
}

/// Base URLs of the internal RPC services fronted by the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamsConfig {
    #[serde(default = "default_users_url")]
    pub users: String,
    #[serde(default = "default_inventory_url")]
    pub inventory: String,
    #[serde(default = "default_bookings_url")]
    pub bookings: String,
    #[serde(default = "default_reporting_url")]
    pub reporting: String,
}

fn default_users_url() -> String {
    "http://localhost:7002".into()
}
fn default_inventory_url() -> String {
    "http://localhost:7003".into()
}
fn default_bookings_url() -> String {
    "http://localhost:7004".into()
}
fn default_reporting_url() -> String {
    "http://localhost:7005".into()
}

impl UpstreamsConfig {
    /// Resolves a service name to its base URL.
    pub fn url_for(&self, service: &str) -> Option<&str> {
        match service {
            "users" => Some(&self.users),
            "inventory" => Some(&self.inventory),
            "bookings" => Some(&self.bookings),
            "reporting" => Some(&self.reporting),
            _ => None,
        }
    }
}

impl Default for UpstreamsConfig {
    fn default() -> Self {
        Self {
            users: default_users_url(),
            inventory: default_inventory_url(),
            bookings: default_bookings_url(),
            reporting: default_reporting_url(),
        }
    }
}

pub mod loader {
    use super::AppConfig;
    use config::{Config, Environment, File};
    use std::path::PathBuf;

    pub fn load_config(path: Option<&str>) -> Result<AppConfig, String> {
        let mut builder = Config::builder();
        match path {
            Some(p) => {
                let pathbuf = PathBuf::from(p);
                if pathbuf.exists() {
                    builder = builder.add_source(File::from(pathbuf));
                }
            }
            None => {
                let default_path = PathBuf::from("reserva.toml");
                if default_path.exists() {
                    builder = builder.add_source(File::from(default_path));
                }
            }
        }
        // Environment variable overrides, e.g., RESERVA__SERVER__PORT=9090
        builder = builder.add_source(
            Environment::with_prefix("RESERVA")
                .try_parsing(true)
                .separator("__"),
        );
        let cfg = builder
            .build()
            .map_err(|e| format!("config build error: {e}"))?;
        let merged: AppConfig = cfg
            .try_deserialize()
            .map_err(|e| format!("config deserialize error: {e}"))?;
        merged.validate()?;
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let cfg = AppConfig::default();
        assert!(cfg.validate().is_ok());
        assert!(cfg.cache.enabled);
        assert_eq!(cfg.rate_limit.max_requests, 100);
        assert_eq!(cfg.rate_limit.on_store_failure, StoreFailurePolicy::Closed);
        assert_eq!(cfg.retry.max_retries, 3);
    }

    #[test]
    fn test_validation_rejects_zero_window() {
        let mut cfg = AppConfig::default();
        cfg.rate_limit.window_secs = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_bad_log_level() {
        let mut cfg = AppConfig::default();
        cfg.logging.level = "verbose".into();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_failure_policy_parses_lowercase() {
        let toml = r#"
            [rate_limit]
            on_store_failure = "open"
        "#;
        let cfg: AppConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.rate_limit.on_store_failure, StoreFailurePolicy::Open);
    }

    #[test]
    fn test_upstream_lookup() {
        let ups = UpstreamsConfig::default();
        assert!(ups.url_for("inventory").is_some());
        assert!(ups.url_for("billing").is_none());
    }
}
