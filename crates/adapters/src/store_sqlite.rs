//! SQLite document store implementation
//!
//! Each collection is a table of JSON bodies. Filters and sort keys are
//! pushed down as `json_extract` expressions; projection happens after the
//! rows are read. Counter updates run as a single `json_set` statement;
//! field assignments are compare-and-swap on the stored body.

use async_trait::async_trait;
use birdfeed_domain::document::project;
use birdfeed_domain::{
    Collection, Document, DocumentStore, Filter, FindOptions, Predicate, StoreError, Update,
};
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::path::Path;
use std::time::Duration;

const MAX_SET_ATTEMPTS: u32 = 10;
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite-backed document store
pub struct SqliteDocumentStore {
    pool: SqlitePool,
}

impl SqliteDocumentStore {
    /// Create a new SQLite document store, initializing the database if needed
    pub async fn new(db_path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db_path = db_path.as_ref();

        // Create parent directories if needed
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Database(format!("Failed to create directory: {}", e)))?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(db_error)?;

        let store = Self { pool };
        store.run_migrations().await?;

        Ok(store)
    }

    /// Create an in-memory SQLite store (for testing)
    pub async fn in_memory() -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(db_error)?;

        let store = Self { pool };
        store.run_migrations().await?;

        Ok(store)
    }

    /// Cheap round-trip used by health checks
    pub async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(())
    }

    /// Counter arithmetic in one statement, clamped at zero
    async fn add_to_counter(
        &self,
        collection: Collection,
        filter: &Filter,
        field: &str,
        by: u64,
        sign: i64,
    ) -> Result<(), StoreError> {
        let path = json_path(field)?;
        let delta = i64::try_from(by)
            .map(|by| by * sign)
            .map_err(|_| StoreError::InvalidUpdate(format!("{} is out of range for {}", by, field)))?;

        let mut query = QueryBuilder::<Sqlite>::new(format!(
            r#"UPDATE "{0}" SET body = json_set(body, {1}, max(0, coalesce(json_extract(body, {1}), 0) + "#,
            collection.name(),
            path
        ));
        query.push_bind(delta);
        query.push(format!(
            r#")) WHERE (json_type(body, {0}) IS NULL OR json_type(body, {0}) = 'integer') AND id = (SELECT id FROM "{1}""#,
            path,
            collection.name()
        ));
        push_where(&mut query, filter)?;
        query.push(" LIMIT 1)");

        let result = query.build().execute(&self.pool).await.map_err(db_error)?;
        if result.rows_affected() > 0 {
            return Ok(());
        }

        // Nothing changed: either no match or the field is not a counter
        if self.count(collection, filter).await? == 0 {
            Err(StoreError::NotFound(collection))
        } else {
            Err(StoreError::InvalidUpdate(format!("{} is not an unsigned counter", field)))
        }
    }

    /// Compare-and-swap on the previous body, retried when another writer won
    async fn swap_body(
        &self,
        collection: Collection,
        filter: &Filter,
        update: &Update,
    ) -> Result<(), StoreError> {
        for attempt in 1..=MAX_SET_ATTEMPTS {
            let mut query = select(collection, "id, body", filter)?;
            query.push(" LIMIT 1");
            let row: Option<(i64, String)> = query
                .build_query_as()
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error)?;

            let Some((id, previous)) = row else {
                return Err(StoreError::NotFound(collection));
            };

            let mut document = parse_body(collection, &previous)?;
            update.apply(&mut document)?;
            let body = serde_json::to_string(&document).map_err(|e| StoreError::Decode {
                collection,
                message: e.to_string(),
            })?;

            let result = sqlx::query(&format!(
                r#"UPDATE "{}" SET body = ? WHERE id = ? AND body = ?"#,
                collection.name()
            ))
            .bind(body)
            .bind(id)
            .bind(previous)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

            if result.rows_affected() == 1 {
                return Ok(());
            }
            tracing::debug!(%collection, attempt, "Document changed underneath update, retrying");
            tokio::time::sleep(Duration::from_millis(u64::from(attempt) * 5)).await;
        }

        Err(StoreError::Database(format!(
            "update of {} lost {} races",
            collection, MAX_SET_ATTEMPTS
        )))
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        for collection in Collection::ALL {
            sqlx::query(&format!(
                r#"
                CREATE TABLE IF NOT EXISTS "{}" (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    body TEXT NOT NULL
                )
                "#,
                collection.name()
            ))
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        }

        let indexes = [
            (Collection::Users, "idx_users_uuid", vec!["uuid"]),
            (Collection::Users, "idx_users_email", vec!["email"]),
            (Collection::Users, "idx_users_account", vec!["account_id"]),
            (
                Collection::Tweets,
                "idx_tweets_account_created",
                vec!["account_id", "created_at"],
            ),
            (
                Collection::Followers,
                "idx_followers_pair",
                vec!["follower_account_id", "following_account_id"],
            ),
        ];

        for (collection, name, fields) in indexes {
            let columns = fields
                .iter()
                .map(|f| json_expr(f))
                .collect::<Result<Vec<_>, _>>()?
                .join(", ");
            sqlx::query(&format!(
                r#"CREATE INDEX IF NOT EXISTS {} ON "{}" ({})"#,
                name,
                collection.name(),
                columns
            ))
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        }

        Ok(())
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn insert(&self, collection: Collection, document: Document) -> Result<(), StoreError> {
        let body = serde_json::to_string(&document).map_err(|e| StoreError::Decode {
            collection,
            message: e.to_string(),
        })?;

        sqlx::query(&format!(r#"INSERT INTO "{}" (body) VALUES (?)"#, collection.name()))
            .bind(body)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        Ok(())
    }

    async fn find_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Option<Document>, StoreError> {
        let mut query = select(collection, "body", filter)?;
        query.push(" LIMIT 1");

        let row: Option<(String,)> = query
            .build_query_as()
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;

        row.map(|(body,)| parse_body(collection, &body)).transpose()
    }

    async fn find_many(
        &self,
        collection: Collection,
        filter: &Filter,
        options: &FindOptions,
    ) -> Result<Vec<Document>, StoreError> {
        let mut query = select(collection, "body", filter)?;

        if !options.sort.is_empty() {
            let keys = options
                .sort
                .iter()
                .map(|key| {
                    json_expr(&key.field)
                        .map(|expr| format!("{} {}", expr, if key.descending { "DESC" } else { "ASC" }))
                })
                .collect::<Result<Vec<_>, _>>()?;
            query.push(" ORDER BY ").push(keys.join(", "));
        }

        if let Some(limit) = options.limit {
            query.push(" LIMIT ").push_bind(limit as i64);
        }

        let rows: Vec<(String,)> = query
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;

        rows.iter()
            .map(|(body,)| {
                let document = parse_body(collection, body)?;
                Ok(match &options.projection {
                    Some(fields) => project(&document, fields),
                    None => document,
                })
            })
            .collect()
    }

    async fn update_one(
        &self,
        collection: Collection,
        filter: &Filter,
        update: &Update,
    ) -> Result<(), StoreError> {
        match update {
            Update::Inc { field, by } => self.add_to_counter(collection, filter, field, *by, 1).await,
            Update::Dec { field, by } => self.add_to_counter(collection, filter, field, *by, -1).await,
            Update::Set { .. } => self.swap_body(collection, filter, update).await,
        }
    }

    async fn delete_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<bool, StoreError> {
        let mut query = QueryBuilder::<Sqlite>::new(format!(
            r#"DELETE FROM "{0}" WHERE id = (SELECT id FROM "{0}""#,
            collection.name()
        ));
        push_where(&mut query, filter)?;
        query.push(" LIMIT 1)");

        let result = query.build().execute(&self.pool).await.map_err(db_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn count(&self, collection: Collection, filter: &Filter) -> Result<u64, StoreError> {
        let mut query = select(collection, "COUNT(*)", filter)?;
        let (count,): (i64,) = query
            .build_query_as()
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(count.max(0) as u64)
    }
}

fn db_error(e: sqlx::Error) -> StoreError {
    StoreError::Database(e.to_string())
}

fn parse_body(collection: Collection, body: &str) -> Result<Document, StoreError> {
    serde_json::from_str(body).map_err(|e| StoreError::Decode {
        collection,
        message: e.to_string(),
    })
}

/// Quoted JSON path literal for a dotted field; field names are restricted
/// to identifier characters since they are inlined into the statement
fn json_path(field: &str) -> Result<String, StoreError> {
    let valid = !field.is_empty()
        && field
            .split('.')
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
    if !valid {
        return Err(StoreError::Database(format!("Invalid field path: {}", field)));
    }
    Ok(format!("'$.{}'", field))
}

fn json_expr(field: &str) -> Result<String, StoreError> {
    json_path(field).map(|path| format!("json_extract(body, {})", path))
}

fn select<'a>(
    collection: Collection,
    columns: &str,
    filter: &Filter,
) -> Result<QueryBuilder<'a, Sqlite>, StoreError> {
    let mut query = QueryBuilder::<Sqlite>::new(format!(
        r#"SELECT {} FROM "{}""#,
        columns,
        collection.name()
    ));
    push_where(&mut query, filter)?;
    Ok(query)
}

fn push_where(query: &mut QueryBuilder<'_, Sqlite>, filter: &Filter) -> Result<(), StoreError> {
    for (i, predicate) in filter.predicates.iter().enumerate() {
        query.push(if i == 0 { " WHERE " } else { " AND " });
        let expr = json_expr(predicate.field())?;

        match predicate {
            Predicate::Eq {
                value: Value::Null, ..
            } => {
                query.push(expr).push(" IS NULL");
            }
            Predicate::Eq { value, .. } => {
                query.push(expr).push(" = ");
                push_value(query, value);
            }
            Predicate::In { values, .. } if values.is_empty() => {
                query.push("0 = 1");
            }
            Predicate::In { values, .. } => {
                query.push(expr).push(" IN (");
                for (j, value) in values.iter().enumerate() {
                    if j > 0 {
                        query.push(", ");
                    }
                    push_value(query, value);
                }
                query.push(")");
            }
        }
    }
    Ok(())
}

fn push_value(query: &mut QueryBuilder<'_, Sqlite>, value: &Value) {
    match value {
        Value::String(s) => {
            query.push_bind(s.clone());
        }
        Value::Number(n) => match n.as_i64() {
            Some(i) => {
                query.push_bind(i);
            }
            None => {
                query.push_bind(n.as_f64().unwrap_or_default());
            }
        },
        Value::Bool(b) => {
            query.push_bind(i64::from(*b));
        }
        other => {
            query.push_bind(other.to_string());
        }
    }
}
