use std::path::{Component, Path, PathBuf};

use tokio::sync::Mutex;
use tracing::info;

use crate::error::StorageError;
use crate::retry::RetryPolicy;

/// A directory acting as an object store.
///
/// The compare-and-rename step of conditional writes (`if_match`) runs under
/// an in-process lock, so a single `Bucket` must be shared by everything
/// writing to the same root.
pub struct Bucket {
    root: PathBuf,
    retry: RetryPolicy,
    pub(crate) cas_lock: Mutex<()>,
}

impl Bucket {
    /// Open (creating if needed) a bucket rooted at `root`.
    pub async fn open(root: impl Into<PathBuf>, retry: RetryPolicy) -> Result<Self, StorageError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root)
            .await
            .map_err(|e| StorageError::io(&root.display().to_string(), e))?;

        info!(root = %root.display(), max_attempts = retry.max_attempts, "opened storage bucket");

        Ok(Self {
            root,
            retry,
            cas_lock: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Resolve a key to a path inside the root. Rejects anything that could
    /// escape it.
    pub(crate) fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        if key.is_empty() || key.contains('\\') || key.ends_with('/') {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        let relative = Path::new(key);
        let mut path = self.root.clone();
        for component in relative.components() {
            match component {
                Component::Normal(part) => path.push(part),
                _ => return Err(StorageError::InvalidKey(key.to_string())),
            }
        }
        Ok(path)
    }

    /// Like [`Bucket::path_for`] but for a listing prefix, which may be empty
    /// or end in `/`.
    pub(crate) fn dir_for(&self, prefix: &str) -> Result<PathBuf, StorageError> {
        let trimmed = prefix.trim_end_matches('/');
        if trimmed.is_empty() {
            return Ok(self.root.clone());
        }
        self.path_for(trimmed)
    }
}
