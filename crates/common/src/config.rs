//! Application configuration.

use serde::Deserialize;
use std::path::Path;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Redis configuration.
    pub redis: RedisConfig,
    /// Webhook delivery configuration.
    pub webhooks: WebhooksConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Admin token for the management API. When unset the API is open,
    /// which is only acceptable behind a trusted proxy.
    #[serde(default)]
    pub admin_token: Option<String>,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Redis configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    /// Redis connection URL.
    pub url: String,
}

/// Webhook delivery configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhooksConfig {
    /// Whether outbound webhook delivery is disabled entirely.
    #[serde(default)]
    pub disabled: bool,
    /// Logical queue name delivery jobs are recorded on.
    #[serde(default = "default_queue_namespace")]
    pub queue_namespace: String,
    /// Per-request timeout for delivery attempts, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Maximum number of subscribers a store may register.
    #[serde(default = "default_max_subscribers")]
    pub max_subscribers: u64,
}

impl Default for WebhooksConfig {
    fn default() -> Self {
        Self {
            disabled: false,
            queue_namespace: default_queue_namespace(),
            request_timeout_secs: default_request_timeout_secs(),
            max_subscribers: default_max_subscribers(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_max_connections() -> u32 {
    100
}

const fn default_min_connections() -> u32 {
    5
}

fn default_queue_namespace() -> String {
    "spree_webhooks".to_string()
}

const fn default_request_timeout_secs() -> u64 {
    10
}

const fn default_max_subscribers() -> u64 {
    25
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `STOREHOOK_ENV`)
    /// 3. Environment variables with `STOREHOOK` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        let env = std::env::var("STOREHOOK_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("STOREHOOK")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("STOREHOOK")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_webhooks_defaults() {
        let webhooks = WebhooksConfig::default();

        assert!(!webhooks.disabled);
        assert_eq!(webhooks.queue_namespace, "spree_webhooks");
        assert_eq!(webhooks.request_timeout_secs, 10);
        assert_eq!(webhooks.max_subscribers, 25);
    }
}
