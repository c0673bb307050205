//! In-memory document store for testing and offline mode

use async_trait::async_trait;
use birdfeed_domain::{Collection, Document, DocumentStore, Filter, FindOptions, StoreError, Update};
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory document store implementation
pub struct InMemoryDocumentStore {
    collections: RwLock<HashMap<Collection, Vec<Document>>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn insert(&self, collection: Collection, document: Document) -> Result<(), StoreError> {
        let mut collections = self
            .collections
            .write()
            .map_err(|e| StoreError::Database(e.to_string()))?;
        collections.entry(collection).or_default().push(document);
        Ok(())
    }

    async fn find_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Option<Document>, StoreError> {
        let collections = self
            .collections
            .read()
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(collections
            .get(&collection)
            .and_then(|docs| docs.iter().find(|d| filter.matches(d)))
            .cloned())
    }

    async fn find_many(
        &self,
        collection: Collection,
        filter: &Filter,
        options: &FindOptions,
    ) -> Result<Vec<Document>, StoreError> {
        let matching = {
            let collections = self
                .collections
                .read()
                .map_err(|e| StoreError::Database(e.to_string()))?;
            collections
                .get(&collection)
                .map(|docs| docs.iter().filter(|d| filter.matches(d)).cloned().collect())
                .unwrap_or_default()
        };
        Ok(options.apply(matching))
    }

    async fn update_one(
        &self,
        collection: Collection,
        filter: &Filter,
        update: &Update,
    ) -> Result<(), StoreError> {
        let mut collections = self
            .collections
            .write()
            .map_err(|e| StoreError::Database(e.to_string()))?;
        let document = collections
            .get_mut(&collection)
            .and_then(|docs| docs.iter_mut().find(|d| filter.matches(d)))
            .ok_or(StoreError::NotFound(collection))?;

        // Apply to a copy so a failed update leaves the document untouched
        let mut updated = document.clone();
        update.apply(&mut updated)?;
        *document = updated;
        Ok(())
    }

    async fn delete_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<bool, StoreError> {
        let mut collections = self
            .collections
            .write()
            .map_err(|e| StoreError::Database(e.to_string()))?;
        let Some(docs) = collections.get_mut(&collection) else {
            return Ok(false);
        };
        match docs.iter().position(|d| filter.matches(d)) {
            Some(index) => {
                docs.remove(index);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn count(&self, collection: Collection, filter: &Filter) -> Result<u64, StoreError> {
        let collections = self
            .collections
            .read()
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(collections
            .get(&collection)
            .map(|docs| docs.iter().filter(|d| filter.matches(d)).count() as u64)
            .unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use birdfeed_domain::SortKey;
    use serde_json::{Value, json};

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_find_many_filters_sorts_and_projects() {
        let store = InMemoryDocumentStore::new();
        for (account, at) in [("#A", 1), ("#B", 2), ("#A", 3), ("#C", 4)] {
            store
                .insert(
                    Collection::Tweets,
                    doc(json!({ "account_id": account, "created_at": at, "email": "x" })),
                )
                .await
                .unwrap();
        }

        let result = store
            .find_many(
                Collection::Tweets,
                &Filter::new().is_in("account_id", ["#A", "#B"]),
                &FindOptions::new()
                    .sort(SortKey::desc("created_at"))
                    .project(&["created_at"])
                    .limit(2),
            )
            .await
            .unwrap();

        assert_eq!(result, vec![doc(json!({ "created_at": 3 })), doc(json!({ "created_at": 2 }))]);
    }

    #[tokio::test]
    async fn test_update_missing_document() {
        let store = InMemoryDocumentStore::new();
        let result = store
            .update_one(
                Collection::Users,
                &Filter::new().eq("account_id", "#NOPE"),
                &Update::inc("metrics.followers_count"),
            )
            .await;
        assert!(matches!(result, Err(StoreError::NotFound(Collection::Users))));
    }

    #[tokio::test]
    async fn test_counter_never_negative() {
        let store = InMemoryDocumentStore::new();
        store
            .insert(
                Collection::Users,
                doc(json!({ "account_id": "#A", "metrics": { "followers_count": 0 } })),
            )
            .await
            .unwrap();

        let filter = Filter::new().eq("account_id", "#A");
        store
            .update_one(Collection::Users, &filter, &Update::dec("metrics.followers_count"))
            .await
            .unwrap();

        let account = store.find_one(Collection::Users, &filter).await.unwrap().unwrap();
        assert_eq!(account["metrics"]["followers_count"], json!(0));
    }

    #[tokio::test]
    async fn test_delete_and_count() {
        let store = InMemoryDocumentStore::new();
        let edge = doc(json!({ "id": "e1", "follower_account_id": "#A" }));
        store.insert(Collection::Followers, edge).await.unwrap();

        let filter = Filter::new().eq("follower_account_id", "#A");
        assert_eq!(store.count(Collection::Followers, &filter).await.unwrap(), 1);
        assert!(store.delete_one(Collection::Followers, &filter).await.unwrap());
        assert!(!store.delete_one(Collection::Followers, &filter).await.unwrap());
        assert_eq!(store.count(Collection::Followers, &filter).await.unwrap(), 0);
    }
}
