//! Fan-out tweet query across many authors

use crate::{
    document::Filter,
    model::Tweet,
    ports::StoreError,
    repository::Repository,
};

/// Upper bound on tweets returned by a listing or feed
pub const DEFAULT_TWEET_LIMIT: usize = 30;

/// Reads the most recent tweets of one or many accounts
#[derive(Clone)]
pub struct TweetQuery {
    repo: Repository,
    limit: usize,
}

impl TweetQuery {
    pub fn new(repo: Repository, limit: usize) -> Self {
        Self {
            repo,
            limit: limit.max(1),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Newest tweets authored by any of `account_ids`, in one store query.
    ///
    /// An empty set of accounts yields an empty listing without touching
    /// the store.
    pub async fn fetch_recent_tweets(&self, account_ids: &[String]) -> Result<Vec<Tweet>, StoreError> {
        if account_ids.is_empty() {
            tracing::debug!("No accounts to fan out over");
            return Ok(vec![]);
        }

        let filter = Filter::new().is_in("account_id", account_ids.iter().cloned());
        let tweets = self.repo.find_tweets(&filter, self.limit).await?;

        tracing::debug!(
            accounts = account_ids.len(),
            count = tweets.len(),
            "Fetched recent tweets"
        );

        Ok(tweets)
    }

    /// Newest tweets authored by a single account
    pub async fn fetch_tweets_for_account(&self, account_id: &str) -> Result<Vec<Tweet>, StoreError> {
        let filter = Filter::new().eq("account_id", account_id);
        self.repo.find_tweets(&filter, self.limit).await
    }
}
