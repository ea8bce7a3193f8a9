use std::sync::{Arc, Mutex};

use crate::{StoreError, SubscriberStore};

/// In-memory store. Clones share the same contents, so a test can keep a
/// handle and inspect what the registry persisted.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    saved: Arc<Mutex<Vec<String>>>,
    fail_saves: Arc<Mutex<bool>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_subscribers(subscribers: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let store = Self::default();
        if let Ok(mut saved) = store.saved.lock() {
            *saved = subscribers.into_iter().map(Into::into).collect();
        }
        store
    }

    /// Snapshot of the last saved membership.
    pub fn snapshot(&self) -> Vec<String> {
        self.saved.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Make subsequent saves fail, for exercising error paths.
    pub fn set_fail_saves(&self, fail: bool) {
        if let Ok(mut flag) = self.fail_saves.lock() {
            *flag = fail;
        }
    }
}

impl SubscriberStore for MemoryStore {
    fn load(&self) -> Result<Vec<String>, StoreError> {
        self.saved
            .lock()
            .map(|s| s.clone())
            .map_err(|_| StoreError::LockPoisoned)
    }

    fn save(&self, subscribers: &[String]) -> Result<(), StoreError> {
        let fail = *self.fail_saves.lock().map_err(|_| StoreError::LockPoisoned)?;
        if fail {
            return Err(StoreError::Io {
                path: "<memory>".into(),
                source: std::io::Error::other("save disabled"),
            });
        }
        let mut saved = self.saved.lock().map_err(|_| StoreError::LockPoisoned)?;
        *saved = subscribers.to_vec();
        Ok(())
    }
}
