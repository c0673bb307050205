//! Port definitions (traits) for external dependencies
//!
//! These traits define the boundaries between the domain and external systems.
//! Adapters implement these traits to connect to real infrastructure.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use time::OffsetDateTime;

use crate::document::{Collection, Document, Filter, FindOptions, Update};
use crate::model::Claims;

/// Error type for document store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),
    #[error("Document not found in {0}")]
    NotFound(Collection),
    #[error("Failed to decode {collection} document: {message}")]
    Decode {
        collection: Collection,
        message: String,
    },
    #[error("Invalid update: {0}")]
    InvalidUpdate(String),
    #[error("Store call timed out after {0:?}")]
    Timeout(Duration),
}

/// Port for the document database holding users, tweets and follow edges
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a new document
    async fn insert(&self, collection: Collection, document: Document) -> Result<(), StoreError>;

    /// Find the first document matching the filter
    async fn find_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Option<Document>, StoreError>;

    /// Find all documents matching the filter, sorted, projected and limited
    async fn find_many(
        &self,
        collection: Collection,
        filter: &Filter,
        options: &FindOptions,
    ) -> Result<Vec<Document>, StoreError>;

    /// Apply an update to the first matching document, `NotFound` if none matches
    async fn update_one(
        &self,
        collection: Collection,
        filter: &Filter,
        update: &Update,
    ) -> Result<(), StoreError>;

    /// Delete the first matching document, returns whether one was removed
    async fn delete_one(&self, collection: Collection, filter: &Filter)
    -> Result<bool, StoreError>;

    /// Count matching documents
    async fn count(&self, collection: Collection, filter: &Filter) -> Result<u64, StoreError>;
}

/// Error type for cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache key not found: {0}")]
    NotFound(String),
    #[error("Cache transport error: {0}")]
    Transport(String),
    #[error("Cache call timed out after {0:?}")]
    Timeout(Duration),
}

/// Port for the key-value cache
#[async_trait]
pub trait Cache: Send + Sync {
    /// Read a value, `CacheError::NotFound` when the key is absent
    async fn get(&self, key: &str) -> Result<String, CacheError>;

    /// Write a value, `None` means no expiration
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), CacheError>;

    /// Remove a key
    async fn delete(&self, key: &str) -> Result<(), CacheError>;
}

/// Error type for token operations
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid token: {0}")]
    InvalidToken(String),
    #[error("Token expired")]
    Expired,
    #[error("Failed to issue token: {0}")]
    Issue(String),
}

/// Port that turns an opaque credential into a caller identity
pub trait IdentityVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<Claims, AuthError>;
}

/// Port that issues credentials for a signed-in account
pub trait TokenIssuer: Send + Sync {
    fn issue(&self, user_uuid: &str, account_id: &str, ttl: Duration) -> Result<String, AuthError>;
}

/// Error type for password hashing
#[derive(Debug, Error)]
#[error("Password hashing failed: {0}")]
pub struct HashError(pub String);

/// Port for password hashing
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> Result<String, HashError>;

    fn verify(&self, password: &str, hash: &str) -> bool;
}

/// Port for time/clock operations (enables deterministic testing)
pub trait Clock: Send + Sync {
    /// Get the current time
    fn now(&self) -> OffsetDateTime;
}

/// Real clock implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}
