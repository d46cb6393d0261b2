use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::Collection;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Validation,
    Storage,
    Transition,
    Internal,
}

/// Raised by the capture form; recovered locally as a transient field marker.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("malformed email address: {input}")]
    MalformedEmail { input: String },
}

impl ValidationError {
    pub fn code(&self) -> ErrorCode {
        ErrorCode::Validation
    }
}

/// Failure of a single append to the document store.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to encode {collection} document: {source}")]
    Encode {
        collection: Collection,
        #[source]
        source: serde_json::Error,
    },
    #[error("document store unreachable while writing {collection}: {message}")]
    Transport {
        collection: Collection,
        message: String,
    },
    #[error("document store rejected {collection} write with status {status}: {body}")]
    Rejected {
        collection: Collection,
        status: u16,
        body: String,
    },
    #[error("document store backend error on {collection}: {message}")]
    Backend {
        collection: Collection,
        message: String,
    },
}

impl StorageError {
    pub fn code(&self) -> ErrorCode {
        ErrorCode::Storage
    }

    pub fn collection(&self) -> Collection {
        match self {
            StorageError::Encode { collection, .. }
            | StorageError::Transport { collection, .. }
            | StorageError::Rejected { collection, .. }
            | StorageError::Backend { collection, .. } => *collection,
        }
    }

    pub fn backend(collection: Collection, message: impl Into<String>) -> Self {
        Self::Backend {
            collection,
            message: message.into(),
        }
    }
}
