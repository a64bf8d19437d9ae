use std::hash::{DefaultHasher, Hash, Hasher};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

use crate::bucket::Bucket;
use crate::error::StorageError;
use crate::retry::with_retry;

const TMP_SUFFIX: &str = ".tmp";

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Result of a GET operation, including the body and ETag.
pub struct GetObjectOutput {
    pub body: Vec<u8>,
    pub etag: String,
}

/// Content hash used as the ETag of a stored object.
pub fn etag_of(body: &[u8]) -> String {
    let mut hasher = DefaultHasher::new();
    body.len().hash(&mut hasher);
    body.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

/// Get an object.
pub async fn get_object(bucket: &Bucket, key: &str) -> Result<GetObjectOutput, StorageError> {
    let path = bucket.path_for(key)?;
    let body = tokio::fs::read(&path)
        .await
        .map_err(|e| not_found_or_io(key, e))?;
    let etag = etag_of(&body);
    Ok(GetObjectOutput { body, etag })
}

/// Whether an object exists under `key`.
pub async fn object_exists(bucket: &Bucket, key: &str) -> Result<bool, StorageError> {
    let path = bucket.path_for(key)?;
    tokio::fs::try_exists(&path)
        .await
        .map_err(|e| StorageError::io(key, e))
}

/// Put an object, replacing any existing value. Returns the new ETag.
pub async fn put_object(bucket: &Bucket, key: &str, body: Vec<u8>) -> Result<String, StorageError> {
    let path = bucket.path_for(key)?;
    let attempt = || write_atomic(key, &path, &body);
    with_retry(bucket.retry_policy(), key, attempt).await?;
    debug!(key, bytes = body.len(), "put object");
    Ok(etag_of(&body))
}

/// Put an object only if nothing is stored under `key` yet. Returns the new
/// ETag, or `StorageError::AlreadyExists`.
pub async fn put_object_if_absent(
    bucket: &Bucket,
    key: &str,
    body: Vec<u8>,
) -> Result<String, StorageError> {
    let path = bucket.path_for(key)?;
    let attempt = || create_exclusive(key, &path, &body);
    with_retry(bucket.retry_policy(), key, attempt).await?;
    debug!(key, bytes = body.len(), "created object");
    Ok(etag_of(&body))
}

/// Put an object with an If-Match precondition (ETag optimistic locking).
/// Returns the new ETag on success, or `StorageError::PreconditionFailed` if
/// the object is missing or its ETag doesn't match.
pub async fn put_object_if_match(
    bucket: &Bucket,
    key: &str,
    body: Vec<u8>,
    expected_etag: &str,
) -> Result<String, StorageError> {
    let path = bucket.path_for(key)?;
    let attempt = || swap_if_match(bucket, key, &path, &body, expected_etag);
    with_retry(bucket.retry_policy(), key, attempt).await?;
    Ok(etag_of(&body))
}

/// Delete an object. Deleting a missing object is not an error.
pub async fn delete_object(bucket: &Bucket, key: &str) -> Result<(), StorageError> {
    let path = bucket.path_for(key)?;
    match tokio::fs::remove_file(&path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(StorageError::io(key, e)),
    }
}

/// List all keys under a prefix, recursively, in lexical order.
pub async fn list_objects(bucket: &Bucket, prefix: &str) -> Result<Vec<String>, StorageError> {
    let base = bucket.dir_for(prefix)?;
    let mut keys = Vec::new();
    let mut pending = vec![base];

    while let Some(dir) = pending.pop() {
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => continue,
            Err(e) => return Err(StorageError::io(prefix, e)),
        };

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StorageError::io(prefix, e))?
        {
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| StorageError::io(prefix, e))?;
            let path = entry.path();
            if file_type.is_dir() {
                pending.push(path);
            } else if let Some(key) = key_for(bucket.root(), &path) {
                if !key.ends_with(TMP_SUFFIX) {
                    keys.push(key);
                }
            }
        }
    }

    keys.sort();
    Ok(keys)
}

fn key_for(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<&str> = relative
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<_>>()?;
    Some(parts.join("/"))
}

fn not_found_or_io(key: &str, err: std::io::Error) -> StorageError {
    if err.kind() == ErrorKind::NotFound {
        StorageError::NotFound {
            key: key.to_string(),
        }
    } else {
        StorageError::io(key, err)
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let n = TMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(format!(".{}-{n}{TMP_SUFFIX}", std::process::id()));
    path.with_file_name(name)
}

async fn write_tmp(key: &str, path: &Path, body: &[u8]) -> Result<PathBuf, StorageError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| StorageError::io(key, e))?;
    }
    let tmp = tmp_path(path);
    tokio::fs::write(&tmp, body)
        .await
        .map_err(|e| StorageError::io(key, e))?;
    Ok(tmp)
}

/// Write via temp file + rename so readers never observe a partial object.
async fn write_atomic(key: &str, path: &Path, body: &[u8]) -> Result<(), StorageError> {
    let tmp = write_tmp(key, path, body).await?;
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(StorageError::io(key, e));
    }
    Ok(())
}

/// Stage the body, then compare and rename while holding the bucket's CAS
/// lock. Only the compare and the rename run under the lock; staging and
/// retry backoff do not.
async fn swap_if_match(
    bucket: &Bucket,
    key: &str,
    path: &Path,
    body: &[u8],
    expected_etag: &str,
) -> Result<(), StorageError> {
    let tmp = write_tmp(key, path, body).await?;
    let swapped = {
        let _guard = bucket.cas_lock.lock().await;
        compare_and_rename(key, path, &tmp, expected_etag).await
    };
    if swapped.is_err() {
        let _ = tokio::fs::remove_file(&tmp).await;
    }
    swapped
}

async fn compare_and_rename(
    key: &str,
    path: &Path,
    tmp: &Path,
    expected_etag: &str,
) -> Result<(), StorageError> {
    let current = match tokio::fs::read(path).await {
        Ok(current) => current,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(StorageError::PreconditionFailed {
                key: key.to_string(),
            });
        }
        Err(e) => return Err(StorageError::io(key, e)),
    };
    if etag_of(&current) != expected_etag {
        return Err(StorageError::PreconditionFailed {
            key: key.to_string(),
        });
    }
    tokio::fs::rename(tmp, path)
        .await
        .map_err(|e| StorageError::io(key, e))
}

/// Hard-linking the temp file into place fails if the target exists, which
/// gives an atomic create-if-absent.
async fn create_exclusive(key: &str, path: &Path, body: &[u8]) -> Result<(), StorageError> {
    let tmp = write_tmp(key, path, body).await?;
    let linked = tokio::fs::hard_link(&tmp, path).await;
    let _ = tokio::fs::remove_file(&tmp).await;
    match linked {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(StorageError::AlreadyExists {
            key: key.to_string(),
        }),
        Err(e) => Err(StorageError::io(key, e)),
    }
}
