use std::collections::BTreeSet;

use crate::{StoreError, SubscriberStore};

/// Subscriber membership with write-through persistence.
///
/// The admin identity is inserted at construction and cannot be removed.
/// If persisting a mutation fails the error is returned, but the in-memory
/// change is kept.
pub struct SubscriberRegistry {
    members: BTreeSet<String>,
    admin: String,
    store: Box<dyn SubscriberStore>,
}

impl std::fmt::Debug for SubscriberRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriberRegistry")
            .field("members", &self.members)
            .field("admin", &self.admin)
            .finish_non_exhaustive()
    }
}

impl SubscriberRegistry {
    /// Load persisted members and make sure the admin is one of them.
    pub fn open(store: Box<dyn SubscriberStore>, admin: &str) -> Result<Self, StoreError> {
        let admin = normalize(admin)?;
        let mut members: BTreeSet<String> = store
            .load()?
            .iter()
            .filter_map(|id| normalize(id).ok())
            .collect();
        let added_admin = members.insert(admin.clone());

        let registry = Self {
            members,
            admin,
            store,
        };
        if added_admin {
            registry.persist()?;
        }
        tracing::info!(count = registry.members.len(), "Subscriber registry loaded");
        Ok(registry)
    }

    /// Add `identity`. Returns `Ok(true)` when it was not already a member.
    pub fn register(&mut self, identity: &str) -> Result<bool, StoreError> {
        let identity = normalize(identity)?;
        if !self.members.insert(identity.clone()) {
            return Ok(false);
        }
        tracing::info!(subscriber = %identity, total = self.members.len(), "New subscriber");
        self.persist()?;
        Ok(true)
    }

    /// Remove `identity`. The admin is never removed.
    pub fn unregister(&mut self, identity: &str) -> Result<bool, StoreError> {
        let identity = normalize(identity)?;
        if identity == self.admin || !self.members.remove(&identity) {
            return Ok(false);
        }
        tracing::info!(subscriber = %identity, total = self.members.len(), "Subscriber removed");
        self.persist()?;
        Ok(true)
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.members.contains(identity.trim())
    }

    /// Members in registry order (ascending).
    pub fn members(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn admin(&self) -> &str {
        &self.admin
    }

    fn persist(&self) -> Result<(), StoreError> {
        let snapshot: Vec<String> = self.members.iter().cloned().collect();
        self.store.save(&snapshot)
    }
}

fn normalize(identity: &str) -> Result<String, StoreError> {
    let trimmed = identity.trim();
    if trimmed.is_empty() {
        return Err(StoreError::InvalidIdentity(identity.to_string()));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;

    fn registry(store: &MemoryStore) -> SubscriberRegistry {
        SubscriberRegistry::open(Box::new(store.clone()), "100").unwrap()
    }

    #[test]
    fn admin_present_after_open() {
        let store = MemoryStore::new();
        let reg = registry(&store);
        assert!(reg.contains("100"));
        assert_eq!(reg.len(), 1);
        assert_eq!(store.snapshot(), vec!["100"]);
    }

    #[test]
    fn open_keeps_persisted_members() {
        let store = MemoryStore::with_subscribers(["300", "200", "100"]);
        let reg = registry(&store);
        assert_eq!(reg.members().collect::<Vec<_>>(), vec!["100", "200", "300"]);
    }

    #[test]
    fn register_is_idempotent() {
        let store = MemoryStore::new();
        let mut reg = registry(&store);
        assert!(reg.register("555").unwrap());
        assert!(!reg.register("555").unwrap());
        assert!(!reg.register(" 555 ").unwrap());
        assert_eq!(reg.len(), 2);
        assert_eq!(store.snapshot(), vec!["100", "555"]);
    }

    #[test]
    fn register_rejects_empty_identity() {
        let mut reg = registry(&MemoryStore::new());
        assert!(matches!(
            reg.register("   "),
            Err(StoreError::InvalidIdentity(_))
        ));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn unregister_never_removes_admin() {
        let store = MemoryStore::new();
        let mut reg = registry(&store);
        reg.register("555").unwrap();
        assert!(!reg.unregister("100").unwrap());
        assert!(reg.unregister("555").unwrap());
        assert!(!reg.unregister("555").unwrap());
        assert_eq!(store.snapshot(), vec!["100"]);
    }

    #[test]
    fn failed_save_keeps_membership() {
        let store = MemoryStore::new();
        let mut reg = registry(&store);
        store.set_fail_saves(true);
        assert!(reg.register("777").is_err());
        assert!(reg.contains("777"));
        assert!(!reg.register("777").unwrap());
    }

    #[test]
    fn json_store_round_trip_through_registry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("subscribers.json");
        {
            let mut reg =
                SubscriberRegistry::open(Box::new(crate::JsonFileStore::new(&path)), "1").unwrap();
            reg.register("2").unwrap();
        }
        let reg = SubscriberRegistry::open(Box::new(crate::JsonFileStore::new(&path)), "1").unwrap();
        assert_eq!(reg.members().collect::<Vec<_>>(), vec!["1", "2"]);
    }
}
