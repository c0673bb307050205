//! Typed access to the three collections
//!
//! Every document read back from the store is decoded strictly into its
//! schema type. A document that does not fit is a `StoreError::Decode`.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

use crate::document::{Collection, Document, Filter, FindOptions, SortKey, Update};
use crate::model::{Account, FollowEdge, Tweet, TweetRecord};
use crate::ports::{DocumentStore, StoreError};

/// Typed repository over a `DocumentStore`
#[derive(Clone)]
pub struct Repository {
    store: Arc<dyn DocumentStore>,
}

impl Repository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    // Users

    pub async fn insert_account(&self, account: &Account) -> Result<(), StoreError> {
        let document = encode(Collection::Users, account)?;
        self.store.insert(Collection::Users, document).await
    }

    pub async fn find_account_by_uuid(&self, uuid: &str) -> Result<Option<Account>, StoreError> {
        self.find_account(&Filter::new().eq("uuid", uuid)).await
    }

    pub async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        self.find_account(&Filter::new().eq("email", email)).await
    }

    async fn find_account(&self, filter: &Filter) -> Result<Option<Account>, StoreError> {
        self.store
            .find_one(Collection::Users, filter)
            .await?
            .map(|doc| decode(Collection::Users, doc))
            .transpose()
    }

    pub async fn email_exists(&self, email: &str) -> Result<bool, StoreError> {
        let count = self
            .store
            .count(Collection::Users, &Filter::new().eq("email", email))
            .await?;
        Ok(count > 0)
    }

    pub async fn account_exists(&self, account_id: &str) -> Result<bool, StoreError> {
        let count = self
            .store
            .count(Collection::Users, &Filter::new().eq("account_id", account_id))
            .await?;
        Ok(count > 0)
    }

    pub async fn delete_account(&self, uuid: &str) -> Result<bool, StoreError> {
        self.store
            .delete_one(Collection::Users, &Filter::new().eq("uuid", uuid))
            .await
    }

    /// Replace the stored password hash; false when no account has the UUID
    pub async fn update_password(&self, uuid: &str, password_hash: &str) -> Result<bool, StoreError> {
        let result = self
            .store
            .update_one(
                Collection::Users,
                &Filter::new().eq("uuid", uuid),
                &Update::set("password", password_hash),
            )
            .await;
        match result {
            Ok(()) => Ok(true),
            Err(StoreError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Apply a counter update to the account with the given public handle
    pub async fn update_account_metrics(
        &self,
        account_id: &str,
        update: &Update,
    ) -> Result<(), StoreError> {
        self.store
            .update_one(
                Collection::Users,
                &Filter::new().eq("account_id", account_id),
                update,
            )
            .await
    }

    // Tweets

    pub async fn insert_tweet(&self, tweet: &TweetRecord) -> Result<(), StoreError> {
        let document = encode(Collection::Tweets, tweet)?;
        self.store.insert(Collection::Tweets, document).await
    }

    /// Newest-first tweet views matching the filter, ties broken by tweet ID
    pub async fn find_tweets(&self, filter: &Filter, limit: usize) -> Result<Vec<Tweet>, StoreError> {
        let options = FindOptions::new()
            .sort(SortKey::desc("created_at"))
            .sort(SortKey::asc("tweet_uuid"))
            .project(&Tweet::PROJECTION)
            .limit(limit);

        self.store
            .find_many(Collection::Tweets, filter, &options)
            .await?
            .into_iter()
            .map(|doc| decode(Collection::Tweets, doc))
            .collect()
    }

    // Followers

    pub async fn edge_exists(&self, follower: &str, following: &str) -> Result<bool, StoreError> {
        let filter = Filter::new()
            .eq("follower_account_id", follower)
            .eq("following_account_id", following);
        Ok(self.store.count(Collection::Followers, &filter).await? > 0)
    }

    pub async fn insert_edge(&self, edge: &FollowEdge) -> Result<(), StoreError> {
        let document = encode(Collection::Followers, edge)?;
        self.store.insert(Collection::Followers, document).await
    }

    pub async fn delete_edge(&self, id: &str) -> Result<bool, StoreError> {
        self.store
            .delete_one(Collection::Followers, &Filter::new().eq("id", id))
            .await
    }

    /// IDs of every account followed by `follower`
    pub async fn following_ids(&self, follower: &str) -> Result<Vec<String>, StoreError> {
        let options = FindOptions::new().project(&["following_account_id"]);
        let documents = self
            .store
            .find_many(
                Collection::Followers,
                &Filter::new().eq("follower_account_id", follower),
                &options,
            )
            .await?;

        documents
            .into_iter()
            .map(|doc| match doc.get("following_account_id") {
                Some(Value::String(id)) => Ok(id.clone()),
                _ => Err(StoreError::Decode {
                    collection: Collection::Followers,
                    message: "missing following_account_id".to_string(),
                }),
            })
            .collect()
    }
}

/// Serialize a value into a document
pub fn encode<T: Serialize>(collection: Collection, value: &T) -> Result<Document, StoreError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(document)) => Ok(document),
        Ok(other) => Err(StoreError::Decode {
            collection,
            message: format!("expected an object, got {}", other),
        }),
        Err(e) => Err(StoreError::Decode {
            collection,
            message: e.to_string(),
        }),
    }
}

/// Strictly decode a document into its schema type
pub fn decode<T: DeserializeOwned>(collection: Collection, document: Document) -> Result<T, StoreError> {
    serde_json::from_value(Value::Object(document)).map_err(|e| StoreError::Decode {
        collection,
        message: e.to_string(),
    })
}
