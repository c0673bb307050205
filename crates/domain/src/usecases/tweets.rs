//! Posting tweets

use std::sync::Arc;

use crate::{
    document::Update,
    error::ServiceError,
    model::{Claims, TweetRecord},
    ports::Clock,
    repository::Repository,
    validate,
};

/// Maximum tweet length in characters
pub const MAX_TWEET_CHARS: usize = 280;

/// Use case for creating tweets
#[derive(Clone)]
pub struct PostTweetUseCase {
    repo: Repository,
    clock: Arc<dyn Clock>,
}

impl PostTweetUseCase {
    pub fn new(repo: Repository, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }

    /// Store a tweet for the caller and bump their tweet counter.
    ///
    /// Feed caches are not touched.
    pub async fn create_tweet(&self, claims: &Claims, text: &str) -> Result<TweetRecord, ServiceError> {
        validate::require("tweet", text)?;
        if text.chars().count() > MAX_TWEET_CHARS {
            return Err(ServiceError::FieldError(format!(
                "Tweet should be at most {} characters.",
                MAX_TWEET_CHARS
            )));
        }

        let author = self
            .repo
            .find_account_by_uuid(&claims.user_uuid)
            .await?
            .ok_or(ServiceError::UserNotFound)?;

        let tweet = TweetRecord::new(&author, text, self.clock.now());
        self.repo.insert_tweet(&tweet).await?;

        // The tweet is already stored; a lost increment is tolerated drift.
        if let Err(e) = self
            .repo
            .update_account_metrics(&author.account_id, &Update::inc("metrics.total_tweets_count"))
            .await
        {
            tracing::warn!(
                account_id = %author.account_id,
                error = %e,
                "Failed to increment tweet count"
            );
        }

        tracing::info!(
            account_id = %author.account_id,
            tweet_uuid = %tweet.tweet_uuid,
            "Tweet saved"
        );
        Ok(tweet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Collection;
    use crate::testing::{FakeStore, seed_account};
    use time::OffsetDateTime;

    struct FixedClock(OffsetDateTime);

    impl Clock for FixedClock {
        fn now(&self) -> OffsetDateTime {
            self.0
        }
    }

    fn claims_for(account_id: &str) -> Claims {
        Claims {
            user_uuid: format!("user-{}", account_id.trim_start_matches('#')),
            account_id: account_id.to_string(),
            exp: 0,
        }
    }

    #[tokio::test]
    async fn test_create_tweet_increments_counter() {
        let store = Arc::new(FakeStore::new());
        let repo = Repository::new(store.clone());
        seed_account(&repo, "#A").await;
        let at = OffsetDateTime::from_unix_timestamp(1_700_000_500).unwrap();
        let usecase = PostTweetUseCase::new(repo.clone(), Arc::new(FixedClock(at)));

        let tweet = usecase.create_tweet(&claims_for("#A"), "hello world").await.unwrap();

        assert_eq!(tweet.account_id, "#A");
        assert_eq!(tweet.created_at, at);
        assert_eq!(tweet.metrics.characters_count, 11);
        assert_eq!(store.all(Collection::Tweets).len(), 1);

        let author = repo.find_account_by_uuid("user-A").await.unwrap().unwrap();
        assert_eq!(author.metrics.total_tweets_count, 1);
    }

    #[tokio::test]
    async fn test_create_tweet_unknown_author() {
        let store = Arc::new(FakeStore::new());
        let usecase = PostTweetUseCase::new(
            Repository::new(store.clone()),
            Arc::new(FixedClock(OffsetDateTime::now_utc())),
        );

        let result = usecase.create_tweet(&claims_for("#GHOST"), "boo").await;
        assert!(matches!(result, Err(ServiceError::UserNotFound)));
        assert_eq!(store.mutations(), 0);
    }

    #[tokio::test]
    async fn test_create_tweet_rejects_overlong_text() {
        let store = Arc::new(FakeStore::new());
        let usecase = PostTweetUseCase::new(
            Repository::new(store.clone()),
            Arc::new(FixedClock(OffsetDateTime::now_utc())),
        );

        let result = usecase
            .create_tweet(&claims_for("#A"), &"x".repeat(MAX_TWEET_CHARS + 1))
            .await;
        assert!(matches!(result, Err(ServiceError::FieldError(_))));
    }
}
