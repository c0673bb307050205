//! Feed assembly: following set -> fan-out query

use crate::{
    model::Tweet,
    ports::StoreError,
    usecases::{fanout::TweetQuery, follow_graph::FollowGraph},
};

/// Builds a caller's chronological feed
#[derive(Clone)]
pub struct FeedAssembler {
    graph: FollowGraph,
    query: TweetQuery,
}

impl FeedAssembler {
    pub fn new(graph: FollowGraph, query: TweetQuery) -> Self {
        Self { graph, query }
    }

    /// Newest tweets from everyone `account_id` follows.
    ///
    /// Either step failing aborts the whole feed.
    pub async fn feed(&self, account_id: &str) -> Result<Vec<Tweet>, StoreError> {
        let following = self.graph.list_following(account_id).await?;
        let tweets = self.query.fetch_recent_tweets(&following).await?;

        tracing::info!(
            account_id = %account_id,
            following = following.len(),
            tweets = tweets.len(),
            "Assembled feed"
        );

        Ok(tweets)
    }
}
