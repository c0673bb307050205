//! Read-through cache for a caller's own tweet listing
//!
//! Entries are snapshots: nothing in the service invalidates them when new
//! tweets are posted or follows change, so a cached listing may lag the
//! store indefinitely. Cache failures never reach the caller; they are
//! logged and treated as a miss.

use std::sync::Arc;

use crate::{
    model::{FeedSource, Tweet},
    ports::{Cache, CacheError, StoreError},
    usecases::fanout::TweetQuery,
};

/// Namespace of tweet listing keys
pub const CACHE_KEY_PREFIX: &str = "GET_TWEETS:";

/// Cache key for a user's tweet listing
pub fn cache_key(user_uuid: &str) -> String {
    format!("{}{}", CACHE_KEY_PREFIX, user_uuid)
}

/// Tweet listing served through a cache
#[derive(Clone)]
pub struct TweetListingCache {
    cache: Arc<dyn Cache>,
    query: TweetQuery,
}

impl TweetListingCache {
    pub fn new(cache: Arc<dyn Cache>, query: TweetQuery) -> Self {
        Self { cache, query }
    }

    /// Tweets of `account_id`, keyed in the cache by `user_uuid`
    pub async fn get_tweets(
        &self,
        user_uuid: &str,
        account_id: &str,
    ) -> Result<(Vec<Tweet>, FeedSource), StoreError> {
        let key = cache_key(user_uuid);

        match self.cache.get(&key).await {
            Ok(payload) => match serde_json::from_str::<Vec<Tweet>>(&payload) {
                Ok(tweets) => {
                    tracing::debug!(key = %key, count = tweets.len(), "Tweet listing cache hit");
                    return Ok((tweets, FeedSource::Cache));
                }
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "Cached tweet listing is undecodable");
                }
            },
            Err(CacheError::NotFound(_)) => {
                tracing::debug!(key = %key, "Tweet listing cache miss");
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Cache read failed, falling back to store");
            }
        }

        let tweets = self.query.fetch_tweets_for_account(account_id).await?;

        match serde_json::to_string(&tweets) {
            Ok(payload) => {
                if let Err(e) = self.cache.set(&key, &payload, None).await {
                    tracing::warn!(key = %key, error = %e, "Cache write failed");
                }
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Failed to serialize tweet listing");
            }
        }

        Ok((tweets, FeedSource::Store))
    }

    /// Drop a user's cached listing so the next read goes to the store
    pub async fn invalidate(&self, user_uuid: &str) -> Result<(), CacheError> {
        self.cache.delete(&cache_key(user_uuid)).await
    }
}
