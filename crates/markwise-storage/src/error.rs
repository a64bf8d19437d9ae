use std::io::ErrorKind;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("object not found: {key}")]
    NotFound { key: String },

    #[error("object already exists: {key}")]
    AlreadyExists { key: String },

    #[error("precondition failed for key: {key}")]
    PreconditionFailed { key: String },

    #[error("invalid key: {0:?}")]
    InvalidKey(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error on {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("storage unavailable for {key} after {attempts} attempts: {source}")]
    Transient {
        key: String,
        attempts: u32,
        #[source]
        source: Box<StorageError>,
    },
}

impl StorageError {
    pub(crate) fn io(key: &str, source: std::io::Error) -> Self {
        StorageError::Io {
            key: key.to_string(),
            source,
        }
    }

    /// Whether another attempt might succeed. Exhausted retries
    /// ([`StorageError::Transient`]) are not transient any more.
    pub fn is_transient(&self) -> bool {
        match self {
            StorageError::Io { source, .. } => matches!(
                source.kind(),
                ErrorKind::Interrupted
                    | ErrorKind::WouldBlock
                    | ErrorKind::TimedOut
                    | ErrorKind::ResourceBusy
            ),
            _ => false,
        }
    }
}
