//! Follow graph: resolving who an account follows and creating edges

use futures::future::join;

use crate::{
    document::Update,
    error::ServiceError,
    model::FollowEdge,
    ports::StoreError,
    repository::Repository,
};

const FOLLOWING_COUNT: &str = "metrics.following_count";
const FOLLOWERS_COUNT: &str = "metrics.followers_count";

/// Outcome of a follow request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowOutcome {
    Created,
    AlreadyFollowing,
}

/// Reads and writes follow edges
#[derive(Clone)]
pub struct FollowGraph {
    repo: Repository,
}

impl FollowGraph {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Accounts followed by `account_id`; no follows is an empty list
    pub async fn list_following(&self, account_id: &str) -> Result<Vec<String>, StoreError> {
        let following = self.repo.following_ids(account_id).await?;
        tracing::debug!(
            account_id = %account_id,
            following = following.len(),
            "Resolved following set"
        );
        Ok(following)
    }

    /// Create the edge `follower -> following` and bump both counters.
    ///
    /// Following twice is a successful no-op. If a counter update fails after
    /// the edge was inserted, the edge is removed and any counter already
    /// incremented is decremented again before the error is returned.
    pub async fn follow(&self, follower: &str, following: &str) -> Result<FollowOutcome, ServiceError> {
        if follower == following {
            return Err(ServiceError::FieldError(
                "An account cannot follow itself.".to_string(),
            ));
        }

        if !self.repo.account_exists(following).await? {
            return Err(ServiceError::UserNotFound);
        }

        if self.repo.edge_exists(follower, following).await? {
            tracing::debug!(follower = %follower, following = %following, "Already following");
            return Ok(FollowOutcome::AlreadyFollowing);
        }

        let edge = FollowEdge::new(follower, following);
        self.repo.insert_edge(&edge).await?;

        let (following_result, followers_result) = join(
            self.repo
                .update_account_metrics(follower, &Update::inc(FOLLOWING_COUNT)),
            self.repo
                .update_account_metrics(following, &Update::inc(FOLLOWERS_COUNT)),
        )
        .await;

        match (following_result, followers_result) {
            (Ok(()), Ok(())) => {
                tracing::info!(follower = %follower, following = %following, "Follow created");
                Ok(FollowOutcome::Created)
            }
            (following_result, followers_result) => {
                let following_ok = following_result.is_ok();
                let followers_ok = followers_result.is_ok();
                let error = following_result
                    .err()
                    .or(followers_result.err())
                    .unwrap_or_else(|| StoreError::Database("counter update failed".to_string()));

                tracing::warn!(
                    follower = %follower,
                    following = %following,
                    error = %error,
                    "Counter update failed, compensating follow"
                );

                self.compensate(&edge, following_ok, followers_ok).await;
                Err(ServiceError::Store(error))
            }
        }
    }

    async fn compensate(&self, edge: &FollowEdge, following_ok: bool, followers_ok: bool) {
        if let Err(e) = self.repo.delete_edge(&edge.id).await {
            tracing::error!(edge_id = %edge.id, error = %e, "Failed to remove follow edge");
        }
        if following_ok {
            if let Err(e) = self
                .repo
                .update_account_metrics(&edge.follower_account_id, &Update::dec(FOLLOWING_COUNT))
                .await
            {
                tracing::error!(error = %e, "Failed to revert following count");
            }
        }
        if followers_ok {
            if let Err(e) = self
                .repo
                .update_account_metrics(&edge.following_account_id, &Update::dec(FOLLOWERS_COUNT))
                .await
            {
                tracing::error!(error = %e, "Failed to revert followers count");
            }
        }
    }
}
