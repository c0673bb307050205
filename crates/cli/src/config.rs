//! Configuration loading and management

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub feed: FeedConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// sqlite or memory
    #[serde(default = "default_store_backend")]
    pub backend: String,

    #[serde(default = "default_sqlite_path")]
    pub sqlite_path: PathBuf,

    #[serde(default = "default_store_timeout_ms")]
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// redis, sqlite, memory or none
    #[serde(default = "default_cache_backend")]
    pub backend: String,

    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    #[serde(default = "default_cache_sqlite_path")]
    pub sqlite_path: PathBuf,

    #[serde(default = "default_cache_timeout_ms")]
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_jwt_secret_env")]
    pub jwt_secret_env: String,

    #[serde(default = "default_token_ttl_minutes")]
    pub token_ttl_minutes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "default_feed_limit")]
    pub limit: usize,
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_store_backend() -> String {
    "sqlite".to_string()
}

fn default_sqlite_path() -> PathBuf {
    PathBuf::from("./birdfeed.sqlite")
}

fn default_store_timeout_ms() -> u64 {
    2_000
}

fn default_cache_backend() -> String {
    "redis".to_string()
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379/0".to_string()
}

fn default_cache_sqlite_path() -> PathBuf {
    PathBuf::from("./birdfeed-cache.sqlite")
}

fn default_cache_timeout_ms() -> u64 {
    250
}

fn default_jwt_secret_env() -> String {
    "BIRDFEED_JWT_SECRET".to_string()
}

fn default_token_ttl_minutes() -> u64 {
    60
}

fn default_feed_limit() -> usize {
    30
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
            sqlite_path: default_sqlite_path(),
            timeout_ms: default_store_timeout_ms(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: default_cache_backend(),
            redis_url: default_redis_url(),
            sqlite_path: default_cache_sqlite_path(),
            timeout_ms: default_cache_timeout_ms(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret_env: default_jwt_secret_env(),
            token_ttl_minutes: default_token_ttl_minutes(),
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            limit: default_feed_limit(),
        }
    }
}

impl StoreConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl CacheConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl AuthConfig {
    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_minutes * 60)
    }
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        // Try default config path if none specified
        let default_path = PathBuf::from("./config.toml");
        let path = config_path.unwrap_or(&default_path);

        if path.exists() {
            builder = builder.add_source(config::File::from(path));
        } else if config_path.is_some() {
            // User specified a path that doesn't exist
            anyhow::bail!("Config file not found: {}", path.display());
        }

        // Add environment variable overrides
        builder = builder.add_source(
            config::Environment::with_prefix("BIRDFEED")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Generate example configuration as TOML string
    pub fn example_toml() -> String {
        r#"# birdfeed configuration
# Any key can be overridden from the environment, e.g.
# BIRDFEED__STORE__SQLITE_PATH=/var/lib/birdfeed.sqlite

[general]
log_level = "info"

[store]
backend = "sqlite"  # sqlite, memory
sqlite_path = "./birdfeed.sqlite"
timeout_ms = 2000

[cache]
# redis, sqlite, memory, none; an unreachable redis runs uncached
backend = "redis"
redis_url = "redis://127.0.0.1:6379/0"
sqlite_path = "./birdfeed-cache.sqlite"
timeout_ms = 250

[auth]
# Name of the env var holding the token signing secret
jwt_secret_env = "BIRDFEED_JWT_SECRET"
token_ttl_minutes = 60

[feed]
limit = 30
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_example_toml_matches_defaults() {
        let parsed: AppConfig = toml::from_str(&AppConfig::example_toml()).unwrap();
        let defaults = AppConfig::default();

        assert_eq!(parsed.store.backend, defaults.store.backend);
        assert_eq!(parsed.store.sqlite_path, defaults.store.sqlite_path);
        assert_eq!(parsed.cache.backend, defaults.cache.backend);
        assert_eq!(parsed.cache.backend, "redis");
        assert_eq!(parsed.cache.sqlite_path, defaults.cache.sqlite_path);
        assert_eq!(parsed.auth.jwt_secret_env, defaults.auth.jwt_secret_env);
        assert_eq!(parsed.feed.limit, 30);
        assert_eq!(parsed.auth.token_ttl(), Duration::from_secs(3600));
    }

    #[test]
    fn test_missing_sections_fall_back_to_defaults() {
        let parsed: AppConfig = toml::from_str("[cache]\nbackend = \"none\"\n").unwrap();
        assert_eq!(parsed.cache.backend, "none");
        assert_eq!(parsed.cache.timeout(), Duration::from_millis(250));
        assert_eq!(parsed.store.timeout(), Duration::from_secs(2));
    }
}
