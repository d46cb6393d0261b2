//! Firestore REST backend: one `createDocument` call per append.

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::debug;
use url::Url;

use shared::{domain::Collection, error::StorageError, records::FIELD_TIMESTAMP};

use crate::{AppendReceipt, DocumentRef, PersistenceClient};

pub const DEFAULT_FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com";
pub const DEFAULT_DATABASE: &str = "(default)";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirestoreConfig {
    pub base_url: String,
    pub project_id: String,
    pub database: String,
    pub api_key: Option<String>,
}

impl FirestoreConfig {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_FIRESTORE_BASE_URL.to_string(),
            project_id: project_id.into(),
            database: DEFAULT_DATABASE.to_string(),
            api_key: None,
        }
    }
}

#[derive(Clone)]
pub struct FirestoreClient {
    http: Client,
    base_url: Url,
    project_id: String,
    database: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreatedDocument {
    name: String,
}

impl FirestoreClient {
    pub fn new(config: FirestoreConfig) -> anyhow::Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .with_context(|| format!("invalid firestore base url '{}'", config.base_url))?;
        if base_url.cannot_be_a_base() {
            return Err(anyhow!(
                "firestore base url '{}' cannot carry a path",
                config.base_url
            ));
        }
        if config.project_id.trim().is_empty() {
            return Err(anyhow!("firestore project id must not be empty"));
        }

        Ok(Self {
            http: Client::new(),
            base_url,
            project_id: config.project_id,
            database: config.database,
            api_key: config.api_key.filter(|key| !key.trim().is_empty()),
        })
    }

    /// `{base}/v1/projects/{project}/databases/{database}/documents/{collection}`
    pub fn collection_url(&self, collection: Collection) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend([
                "v1",
                "projects",
                self.project_id.as_str(),
                "databases",
                self.database.as_str(),
                "documents",
                collection.name(),
            ]);
        }
        if let Some(key) = &self.api_key {
            url.query_pairs_mut().append_pair("key", key);
        }
        url
    }
}

#[async_trait]
impl PersistenceClient for FirestoreClient {
    async fn append(
        &self,
        collection: Collection,
        document: Value,
    ) -> Result<AppendReceipt, StorageError> {
        let url = self.collection_url(collection);
        let body = json!({ "fields": encode_fields(&document) });

        let response = self
            .http
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|err| StorageError::Transport {
                collection,
                message: err.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::Rejected {
                collection,
                status: status.as_u16(),
                body,
            });
        }

        let created: CreatedDocument = response
            .json()
            .await
            .map_err(|err| StorageError::backend(collection, format!("unreadable reply: {err}")))?;
        let id = created
            .name
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string();
        debug!(%collection, %id, "firestore document created");

        Ok(AppendReceipt::Stored(DocumentRef { collection, id }))
    }

    fn backend_name(&self) -> &'static str {
        "firestore"
    }
}

/// Maps a JSON object onto Firestore's typed `fields` map.
///
/// The record's `timestamp` field becomes a `timestampValue`; every other string
/// stays a `stringValue` whatever it looks like. Non-object documents are stored
/// under a single `value` field.
pub fn encode_fields(document: &Value) -> Map<String, Value> {
    match document {
        Value::Object(map) => map
            .iter()
            .map(|(key, value)| {
                let encoded = match value {
                    Value::String(text) if key == FIELD_TIMESTAMP => {
                        json!({ "timestampValue": text })
                    }
                    other => encode_value(other),
                };
                (key.clone(), encoded)
            })
            .collect(),
        other => {
            let mut fields = Map::new();
            fields.insert("value".to_string(), encode_value(other));
            fields
        }
    }
}

pub fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(flag) => json!({ "booleanValue": flag }),
        Value::Number(number) => match number.as_i64() {
            Some(int) => json!({ "integerValue": int.to_string() }),
            None => json!({ "doubleValue": number.as_f64() }),
        },
        Value::String(text) => json!({ "stringValue": text }),
        Value::Array(items) => json!({
            "arrayValue": { "values": items.iter().map(encode_value).collect::<Vec<_>>() }
        }),
        Value::Object(_) => json!({ "mapValue": { "fields": encode_fields(value) } }),
    }
}

#[cfg(test)]
#[path = "tests/firestore_tests.rs"]
mod tests;
