//! Builds the service from configuration

use anyhow::{Context, Result, bail};
use birdfeed_adapters::{
    auth::{Argon2PasswordHasher, JwtAuthority},
    cache::{InMemoryCache, NoCache, RedisCache, SqliteCache},
    store::{InMemoryDocumentStore, SqliteDocumentStore},
    timeout::{TimeoutCache, TimeoutStore},
};
use birdfeed_domain::{
    Cache, Dependencies, DocumentStore, Response, ServiceConfig, SocialService, SystemClock,
};
use secrecy::SecretString;
use std::sync::Arc;

use crate::config::AppConfig;

pub(crate) async fn build_store(config: &AppConfig) -> Result<Arc<dyn DocumentStore>> {
    let store: Arc<dyn DocumentStore> = match config.store.backend.as_str() {
        "sqlite" => Arc::new(
            SqliteDocumentStore::new(&config.store.sqlite_path)
                .await
                .with_context(|| {
                    format!(
                        "Failed to open SQLite store at {}",
                        config.store.sqlite_path.display()
                    )
                })?,
        ),
        "memory" => {
            tracing::warn!("Using in-memory store; data is lost when the process exits");
            Arc::new(InMemoryDocumentStore::new())
        }
        other => bail!("Unknown store backend: {} (expected sqlite or memory)", other),
    };

    Ok(Arc::new(TimeoutStore::new(store, config.store.timeout())))
}

pub(crate) async fn build_cache(config: &AppConfig) -> Result<Arc<dyn Cache>> {
    let cache: Arc<dyn Cache> = match config.cache.backend.as_str() {
        "memory" => {
            tracing::warn!("Using in-memory cache; entries are lost when the process exits");
            Arc::new(InMemoryCache::new())
        }
        "none" => Arc::new(NoCache),
        "sqlite" => Arc::new(
            SqliteCache::open(&config.cache.sqlite_path)
                .await
                .with_context(|| {
                    format!(
                        "Failed to open SQLite cache at {}",
                        config.cache.sqlite_path.display()
                    )
                })?,
        ),
        "redis" => {
            let connect = RedisCache::connect(&config.cache.redis_url);
            match tokio::time::timeout(config.cache.timeout() * 4, connect).await {
                Ok(Ok(cache)) => Arc::new(cache),
                // The cache is optional: run uncached rather than refuse to start
                Ok(Err(e)) => {
                    tracing::warn!(error = %e, "Redis unavailable, running without cache");
                    Arc::new(NoCache)
                }
                Err(_) => {
                    tracing::warn!("Redis connect timed out, running without cache");
                    Arc::new(NoCache)
                }
            }
        }
        other => bail!(
            "Unknown cache backend: {} (expected redis, sqlite, memory or none)",
            other
        ),
    };

    Ok(Arc::new(TimeoutCache::new(cache, config.cache.timeout())))
}

pub(crate) fn load_jwt_secret(env_var: &str) -> Result<SecretString> {
    if env_var.trim().is_empty() {
        bail!("No JWT secret env var configured");
    }

    let secret = std::env::var(env_var)
        .with_context(|| format!("Missing JWT secret env var {}", env_var))?;

    if secret.trim().is_empty() {
        bail!("JWT secret env var {} is empty", env_var);
    }

    Ok(SecretString::new(secret.into()))
}

pub(crate) fn build_authority(config: &AppConfig) -> Result<Arc<JwtAuthority>> {
    let secret = load_jwt_secret(&config.auth.jwt_secret_env)?;
    let authority = JwtAuthority::new(&secret).context("Failed to initialize token authority")?;
    Ok(Arc::new(authority))
}

pub(crate) async fn build_service(config: &AppConfig) -> Result<SocialService> {
    if config.feed.limit == 0 {
        bail!("feed.limit must be at least 1");
    }

    let authority = build_authority(config)?;
    let deps = Dependencies {
        store: build_store(config).await?,
        cache: build_cache(config).await?,
        verifier: authority.clone(),
        issuer: authority,
        hasher: Arc::new(Argon2PasswordHasher::new()),
        clock: Arc::new(SystemClock),
    };

    tracing::debug!(
        store = %config.store.backend,
        cache = %config.cache.backend,
        limit = config.feed.limit,
        "Service ready"
    );

    Ok(SocialService::new(
        deps,
        ServiceConfig {
            tweet_limit: config.feed.limit,
            token_ttl: config.auth.token_ttl(),
        },
    ))
}

/// Print the response and fail the process when the operation was rejected
pub(crate) fn emit(response: &Response) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(response)?);

    if !response.success {
        std::process::exit(1);
    }
    Ok(())
}
