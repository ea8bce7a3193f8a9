//! Durable set of broadcast recipients.
//!
//! [`SubscriberRegistry`] holds membership in memory and rewrites the whole
//! set through a [`SubscriberStore`] after every mutation.

pub mod file;
pub mod memory;
pub mod registry;

pub use file::JsonFileStore;
pub use memory::MemoryStore;
pub use registry::SubscriberRegistry;

/// Persistence backend for the subscriber set.
///
/// `save` receives the complete, ordered membership each time; stores do not
/// track deltas.
pub trait SubscriberStore: Send {
    fn load(&self) -> Result<Vec<String>, StoreError>;
    fn save(&self, subscribers: &[String]) -> Result<(), StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid subscriber identity: {0:?}")]
    InvalidIdentity(String),

    #[error("Store lock poisoned")]
    LockPoisoned,
}
