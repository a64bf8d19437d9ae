use std::collections::HashMap;
use std::sync::Arc;

use markwise_core::store_keys;
use markwise_storage::state::{load_state_opt, save_state};
use markwise_storage::{Bucket, StorageError};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use super::stage::SessionState;

/// Prune idle lock entries once the map grows past this.
const LOCK_MAP_SOFT_LIMIT: usize = 1024;

/// Sessions persisted as JSON next to the domain data, plus one async lock
/// per participant so their events are applied strictly in order.
pub struct SessionStore {
    bucket: Arc<Bucket>,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl SessionStore {
    pub fn new(bucket: Arc<Bucket>) -> Self {
        Self {
            bucket,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Wait for exclusive use of a participant's session. Other participants
    /// are never blocked by this.
    pub async fn lock(&self, participant_id: &str) -> OwnedMutexGuard<()> {
        let entry = {
            let mut locks = self.locks.lock().await;
            if locks.len() > LOCK_MAP_SOFT_LIMIT {
                locks.retain(|_, m| Arc::strong_count(m) > 1);
            }
            locks
                .entry(participant_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        entry.lock_owned().await
    }

    /// Load a session, starting a fresh idle one on first contact.
    pub async fn load(&self, participant_id: &str) -> Result<SessionState, StorageError> {
        let key = store_keys::session(participant_id);
        match load_state_opt(&self.bucket, &key).await? {
            Some(state) => Ok(state),
            None => {
                debug!(participant = participant_id, "new session");
                Ok(SessionState::new(participant_id))
            }
        }
    }

    pub async fn save(&self, state: &SessionState) -> Result<(), StorageError> {
        let key = store_keys::session(&state.participant_id);
        save_state(&self.bucket, &key, state).await?;
        Ok(())
    }
}
