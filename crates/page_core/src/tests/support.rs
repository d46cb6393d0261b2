//! Document-store doubles shared by the flow tests.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use shared::{domain::Collection, error::StorageError};
use storage::{AppendReceipt, DocumentRef, PersistenceClient};
use tokio::sync::Mutex;

/// Records every append; optionally fails each one after recording the attempt,
/// or holds the answer back for `latency`.
#[derive(Default)]
pub struct RecordingStore {
    pub appends: Mutex<Vec<(Collection, Value)>>,
    fail_with: Option<String>,
    latency: Option<Duration>,
}

impl RecordingStore {
    pub fn ok() -> Self {
        Self::default()
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            fail_with: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn slow(latency: Duration) -> Self {
        Self {
            latency: Some(latency),
            ..Self::default()
        }
    }

    pub async fn appended(&self) -> Vec<(Collection, Value)> {
        self.appends.lock().await.clone()
    }
}

#[async_trait]
impl PersistenceClient for RecordingStore {
    async fn append(
        &self,
        collection: Collection,
        document: Value,
    ) -> Result<AppendReceipt, StorageError> {
        let count = {
            let mut appends = self.appends.lock().await;
            appends.push((collection, document));
            appends.len()
        };
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if let Some(message) = &self.fail_with {
            return Err(StorageError::Transport {
                collection,
                message: message.clone(),
            });
        }
        Ok(AppendReceipt::Stored(DocumentRef {
            collection,
            id: format!("doc-{count}"),
        }))
    }

    fn backend_name(&self) -> &'static str {
        "recording"
    }
}
