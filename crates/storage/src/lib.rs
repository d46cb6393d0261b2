use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use tokio::sync::Mutex;
use tracing::debug;

use shared::{domain::Collection, error::StorageError};

pub mod firestore;

pub use firestore::{FirestoreClient, FirestoreConfig};

/// Address of a document accepted by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRef {
    pub collection: Collection,
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppendReceipt {
    Stored(DocumentRef),
    /// No store is configured; the write was dropped on purpose.
    Skipped,
}

impl AppendReceipt {
    pub fn is_stored(&self) -> bool {
        matches!(self, AppendReceipt::Stored(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub collection: Collection,
    pub body: Value,
    pub created_at: DateTime<Utc>,
}

/// Append-only document sink organized into named collections.
///
/// There is no read, update or delete path on purpose; backends that can be
/// inspected expose that through their own inherent methods.
#[async_trait]
pub trait PersistenceClient: Send + Sync {
    async fn append(
        &self,
        collection: Collection,
        document: Value,
    ) -> Result<AppendReceipt, StorageError>;

    fn backend_name(&self) -> &'static str;
}

/// Serializes `record` and appends it to `collection`.
pub async fn append_record<T>(
    client: &dyn PersistenceClient,
    collection: Collection,
    record: &T,
) -> Result<AppendReceipt, StorageError>
where
    T: Serialize + Sync,
{
    let document = serde_json::to_value(record)
        .map_err(|source| StorageError::Encode { collection, source })?;
    client.append(collection, document).await
}

/// Used when no document store is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledStore;

#[async_trait]
impl PersistenceClient for DisabledStore {
    async fn append(
        &self,
        collection: Collection,
        _document: Value,
    ) -> Result<AppendReceipt, StorageError> {
        debug!(%collection, "document store disabled; skipping append");
        Ok(AppendReceipt::Skipped)
    }

    fn backend_name(&self) -> &'static str {
        "disabled"
    }
}

/// Process-local store, mostly for demos and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: Mutex<Vec<StoredDocument>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn documents(&self, collection: Collection) -> Vec<StoredDocument> {
        self.documents
            .lock()
            .await
            .iter()
            .filter(|doc| doc.collection == collection)
            .cloned()
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.documents.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.lock().await.is_empty()
    }
}

#[async_trait]
impl PersistenceClient for MemoryStore {
    async fn append(
        &self,
        collection: Collection,
        document: Value,
    ) -> Result<AppendReceipt, StorageError> {
        let id = uuid::Uuid::new_v4().to_string();
        self.documents.lock().await.push(StoredDocument {
            id: id.clone(),
            collection,
            body: document,
            created_at: Utc::now(),
        });
        Ok(AppendReceipt::Stored(DocumentRef { collection, id }))
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

/// SQLite-backed document store; every append becomes one immutable row.
#[derive(Clone)]
pub struct DocumentStore {
    pool: Pool<Sqlite>,
}

impl DocumentStore {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    pub async fn insert_document(
        &self,
        collection: Collection,
        document: &Value,
    ) -> Result<DocumentRef> {
        let id = uuid::Uuid::new_v4().to_string();
        let body = serde_json::to_string(document)
            .with_context(|| format!("failed to encode {collection} document"))?;
        sqlx::query("INSERT INTO documents (id, collection, body, created_at) VALUES (?, ?, ?, ?)")
            .bind(&id)
            .bind(collection.name())
            .bind(body)
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to insert {collection} document"))?;
        Ok(DocumentRef { collection, id })
    }

    /// Documents of one collection in insertion order.
    pub async fn documents(&self, collection: Collection) -> Result<Vec<StoredDocument>> {
        let rows = sqlx::query(
            "SELECT id, body, created_at FROM documents WHERE collection = ? ORDER BY rowid",
        )
        .bind(collection.name())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let body: String = row.try_get("body")?;
                Ok(StoredDocument {
                    id: row.try_get("id")?,
                    collection,
                    body: serde_json::from_str(&body)
                        .with_context(|| format!("corrupt {collection} document body"))?,
                    created_at: row.try_get("created_at")?,
                })
            })
            .collect()
    }

    pub async fn count(&self, collection: Collection) -> Result<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM documents WHERE collection = ?")
            .bind(collection.name())
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl PersistenceClient for DocumentStore {
    async fn append(
        &self,
        collection: Collection,
        document: Value,
    ) -> Result<AppendReceipt, StorageError> {
        self.insert_document(collection, &document)
            .await
            .map(AppendReceipt::Stored)
            .map_err(|err| StorageError::backend(collection, format!("{err:#}")))
    }

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }
}

/// Normalizes a configured database location into a sqlite URL.
pub fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.starts_with("sqlite::memory:")
        || raw_database_url.starts_with("sqlite://")
        || raw_database_url.contains("://")
    {
        return raw_database_url.to_string();
    }

    if let Some(path) = raw_database_url.strip_prefix("sqlite:") {
        let path = path.replace('\\', "/");
        return format!("sqlite://{path}");
    }

    format!("sqlite://{}", raw_database_url.replace('\\', "/"))
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url == "sqlite::memory:" || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
