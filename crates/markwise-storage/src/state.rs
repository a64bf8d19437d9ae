use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;

use crate::bucket::Bucket;
use crate::error::StorageError;
use crate::objects;

/// Rounds of read-modify-write before [`update_state`] gives up under
/// contention.
const MAX_UPDATE_ROUNDS: usize = 16;

/// Load a JSON state file. Returns the deserialized value and its ETag.
pub async fn load_state<T: DeserializeOwned>(
    bucket: &Bucket,
    key: &str,
) -> Result<(T, String), StorageError> {
    let output = objects::get_object(bucket, key).await?;
    let value: T = serde_json::from_slice(&output.body)?;
    Ok((value, output.etag))
}

/// Load a JSON state file, returning `None` when it does not exist.
pub async fn load_state_opt<T: DeserializeOwned>(
    bucket: &Bucket,
    key: &str,
) -> Result<Option<T>, StorageError> {
    match load_state(bucket, key).await {
        Ok((value, _)) => Ok(Some(value)),
        Err(StorageError::NotFound { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Save a JSON state file. Returns the new ETag.
pub async fn save_state<T: Serialize>(
    bucket: &Bucket,
    key: &str,
    value: &T,
) -> Result<String, StorageError> {
    let body = serde_json::to_vec_pretty(value)?;
    objects::put_object(bucket, key, body).await
}

/// Save a JSON state file only if the key is unused.
pub async fn create_state<T: Serialize>(
    bucket: &Bucket,
    key: &str,
    value: &T,
) -> Result<String, StorageError> {
    let body = serde_json::to_vec_pretty(value)?;
    objects::put_object_if_absent(bucket, key, body).await
}

/// Save a JSON state file with ETag optimistic locking.
pub async fn save_state_if_match<T: Serialize>(
    bucket: &Bucket,
    key: &str,
    value: &T,
    expected_etag: &str,
) -> Result<String, StorageError> {
    let body = serde_json::to_vec_pretty(value)?;
    objects::put_object_if_match(bucket, key, body, expected_etag).await
}

/// Read-modify-write a JSON state file under optimistic locking.
///
/// A missing file starts from `T::default()`. Lost races re-read and apply
/// `modify` again. Returns the value that was written.
pub async fn update_state<T, F>(
    bucket: &Bucket,
    key: &str,
    mut modify: F,
) -> Result<T, StorageError>
where
    T: Serialize + DeserializeOwned + Default,
    F: FnMut(&mut T),
{
    for round in 0..MAX_UPDATE_ROUNDS {
        let outcome = match load_state::<T>(bucket, key).await {
            Ok((mut value, etag)) => {
                modify(&mut value);
                save_state_if_match(bucket, key, &value, &etag)
                    .await
                    .map(|_| value)
            }
            Err(StorageError::NotFound { .. }) => {
                let mut value = T::default();
                modify(&mut value);
                create_state(bucket, key, &value).await.map(|_| value)
            }
            Err(e) => return Err(e),
        };

        match outcome {
            Ok(value) => return Ok(value),
            Err(StorageError::PreconditionFailed { .. } | StorageError::AlreadyExists { .. }) => {
                debug!(key, round, "concurrent update, retrying");
            }
            Err(e) => return Err(e),
        }
    }

    Err(StorageError::PreconditionFailed {
        key: key.to_string(),
    })
}
