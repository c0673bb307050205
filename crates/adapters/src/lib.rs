//! birdfeed adapters crate
//!
//! This crate contains infrastructure adapters implementing the domain ports:
//! - `store`: SQLite and in-memory document stores
//! - `cache`: Redis, SQLite file, in-memory and no-op caches
//! - `auth`: JWT tokens and Argon2 password hashing
//! - `timeout`: per-call deadlines around store and cache

mod auth_jwt;
mod cache_memory;
mod cache_redis;
mod cache_sqlite;
mod password_argon2;
mod store_memory;
mod store_sqlite;

pub mod timeout;

/// Re-exports for document store adapters
pub mod store {
    pub use crate::store_memory::InMemoryDocumentStore;
    pub use crate::store_sqlite::SqliteDocumentStore;
}

/// Re-exports for cache adapters
pub mod cache {
    pub use crate::cache_memory::{InMemoryCache, NoCache};
    pub use crate::cache_redis::RedisCache;
    pub use crate::cache_sqlite::SqliteCache;
}

/// Re-exports for authentication adapters
pub mod auth {
    pub use crate::auth_jwt::JwtAuthority;
    pub use crate::password_argon2::Argon2PasswordHasher;
}
