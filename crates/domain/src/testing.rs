//! Fakes shared by the use case tests

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use time::OffsetDateTime;

use crate::document::{Collection, Document, Filter, FindOptions, Update};
use crate::model::{Account, AccountMetrics, TweetRecord};
use crate::ports::{Cache, CacheError, DocumentStore, StoreError};
use crate::repository::Repository;

/// In-memory store that counts calls and can be told to fail
#[derive(Default)]
pub struct FakeStore {
    documents: Mutex<HashMap<Collection, Vec<Document>>>,
    calls: AtomicUsize,
    mutations: AtomicUsize,
    fail_updates_on: Mutex<Option<String>>,
    fail_reads: AtomicBool,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn mutations(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }

    /// Make every `update_one` touching `field` fail
    pub fn fail_updates_on(&self, field: &str) {
        *self.fail_updates_on.lock().unwrap() = Some(field.to_string());
    }

    pub fn fail_reads(&self) {
        self.fail_reads.store(true, Ordering::SeqCst);
    }

    pub fn all(&self, collection: Collection) -> Vec<Document> {
        self.documents
            .lock()
            .unwrap()
            .get(&collection)
            .cloned()
            .unwrap_or_default()
    }

    fn read_guard(&self) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Database("read failed".to_string()));
        }
        Ok(())
    }

    fn write_guard(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.mutations.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl DocumentStore for FakeStore {
    async fn insert(&self, collection: Collection, document: Document) -> Result<(), StoreError> {
        self.write_guard();
        self.documents
            .lock()
            .unwrap()
            .entry(collection)
            .or_default()
            .push(document);
        Ok(())
    }

    async fn find_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Option<Document>, StoreError> {
        self.read_guard()?;
        Ok(self.all(collection).into_iter().find(|d| filter.matches(d)))
    }

    async fn find_many(
        &self,
        collection: Collection,
        filter: &Filter,
        options: &FindOptions,
    ) -> Result<Vec<Document>, StoreError> {
        self.read_guard()?;
        let matching = self
            .all(collection)
            .into_iter()
            .filter(|d| filter.matches(d))
            .collect();
        Ok(options.apply(matching))
    }

    async fn update_one(
        &self,
        collection: Collection,
        filter: &Filter,
        update: &Update,
    ) -> Result<(), StoreError> {
        self.write_guard();
        if self.fail_updates_on.lock().unwrap().as_deref() == Some(update.field()) {
            return Err(StoreError::Database(format!("update of {} failed", update.field())));
        }
        let mut documents = self.documents.lock().unwrap();
        let document = documents
            .entry(collection)
            .or_default()
            .iter_mut()
            .find(|d| filter.matches(d))
            .ok_or(StoreError::NotFound(collection))?;
        update.apply(document)
    }

    async fn delete_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<bool, StoreError> {
        self.write_guard();
        let mut documents = self.documents.lock().unwrap();
        let docs = documents.entry(collection).or_default();
        match docs.iter().position(|d| filter.matches(d)) {
            Some(index) => {
                docs.remove(index);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn count(&self, collection: Collection, filter: &Filter) -> Result<u64, StoreError> {
        self.read_guard()?;
        Ok(self
            .all(collection)
            .iter()
            .filter(|d| filter.matches(d))
            .count() as u64)
    }
}

/// In-memory cache with switchable failures
#[derive(Default)]
pub struct FakeCache {
    entries: Mutex<HashMap<String, String>>,
    fail_get: AtomicBool,
    fail_set: AtomicBool,
    sets: AtomicUsize,
}

impl FakeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_get(&self) {
        self.fail_get.store(true, Ordering::SeqCst);
    }

    pub fn fail_set(&self) {
        self.fail_set.store(true, Ordering::SeqCst);
    }

    pub fn sets(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    pub fn put_raw(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }
}

#[async_trait]
impl Cache for FakeCache {
    async fn get(&self, key: &str) -> Result<String, CacheError> {
        if self.fail_get.load(Ordering::SeqCst) {
            return Err(CacheError::Transport("connection refused".to_string()));
        }
        self.raw(key)
            .ok_or_else(|| CacheError::NotFound(key.to_string()))
    }

    async fn set(&self, key: &str, value: &str, _ttl: Option<Duration>) -> Result<(), CacheError> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        if self.fail_set.load(Ordering::SeqCst) {
            return Err(CacheError::Transport("connection refused".to_string()));
        }
        self.put_raw(key, value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }
}

pub fn sample_account(account_id: &str, email: &str) -> Account {
    let now = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
    Account {
        uuid: format!("user-{}", account_id.trim_start_matches('#')),
        account_id: account_id.to_string(),
        first_name: "Test".to_string(),
        last_name: "User".to_string(),
        age: 30,
        email: email.to_string(),
        password: "hashed:password123".to_string(),
        metrics: AccountMetrics::default(),
        created_at: now,
        updated_at: now,
    }
}

pub async fn seed_account(repo: &Repository, account_id: &str) -> Account {
    let email = format!("{}@example.com", account_id.trim_start_matches('#').to_lowercase());
    let account = sample_account(account_id, &email);
    repo.insert_account(&account).await.unwrap();
    account
}

/// Insert a tweet by `account_id` created `secs` seconds after a fixed epoch
pub async fn seed_tweet(repo: &Repository, account_id: &str, text: &str, secs: i64) -> TweetRecord {
    let author = sample_account(account_id, "author@example.com");
    let at = OffsetDateTime::from_unix_timestamp(1_700_000_000 + secs).unwrap();
    let tweet = TweetRecord::new(&author, text, at);
    repo.insert_tweet(&tweet).await.unwrap();
    tweet
}
