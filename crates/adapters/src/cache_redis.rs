//! Redis cache adapter

use async_trait::async_trait;
use birdfeed_domain::{Cache, CacheError};
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use std::time::Duration;

/// Cache backed by a Redis server through a reconnecting connection manager
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
}

impl RedisCache {
    /// Connect to the server at `url` (e.g. `redis://127.0.0.1:6379/0`)
    pub async fn connect(url: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(url).map_err(transport)?;
        let conn = client.get_connection_manager().await.map_err(transport)?;
        tracing::debug!(url = %redact(url), "Connected to Redis");
        Ok(Self { conn })
    }

    /// Round-trip a PING
    pub async fn ping(&self) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(transport)?;
        Ok(())
    }
}

#[async_trait]
impl Cache for RedisCache {
    async fn get(&self, key: &str) -> Result<String, CacheError> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await.map_err(transport)?;
        value.ok_or_else(|| CacheError::NotFound(key.to_string()))
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        match ttl {
            // SET EX takes whole seconds; round sub-second TTLs up
            Some(ttl) => {
                let secs = ttl.as_secs() + u64::from(ttl.subsec_nanos() > 0);
                let _: () = conn.set_ex(key, value, secs.max(1)).await.map_err(transport)?;
            }
            None => {
                let _: () = conn.set(key, value).await.map_err(transport)?;
            }
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(key).await.map_err(transport)?;
        Ok(())
    }
}

fn transport(e: redis::RedisError) -> CacheError {
    CacheError::Transport(e.to_string())
}

/// Strip credentials from a connection URL before logging it
fn redact(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}://***@{}", &url[..scheme_end], &url[at + 1..])
        }
        _ => url.to_string(),
    }
}
