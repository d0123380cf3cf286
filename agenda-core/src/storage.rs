//! Key-value storage abstraction.
//!
//! The throttle persists its whole state as a single serialized value under one
//! string key. Anything that can read, replace and remove a string by key can
//! back it: the in-memory [`MemoryStore`] here, or a durable store from a
//! storage crate.

use std::sync::Arc;

use dashmap::DashMap;

use crate::error::StorageError;

/// Synchronous string key-value store.
///
/// Implementations must make a completed `write` visible to the next `read` on
/// the same store. No cross-writer coordination is expected; the last write to a
/// key wins.
pub trait KeyValueStore: Send + Sync + 'static {
    /// Read the value stored under `key`, or `None` if the key is absent.
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the value stored under `key`.
    fn write(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key`. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Check that `key` can be stored without colliding with another key.
    ///
    /// Backends with a restricted key space override this; the default accepts
    /// any key.
    fn validate_key(&self, _key: &str) -> Result<(), StorageError> {
        Ok(())
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Arc<S> {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).read(key)
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).write(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }

    fn validate_key(&self, key: &str) -> Result<(), StorageError> {
        (**self).validate_key(key)
    }
}

impl KeyValueStore for Box<dyn KeyValueStore> {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).read(key)
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).write(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }

    fn validate_key(&self, key: &str) -> Result<(), StorageError> {
        (**self).validate_key(key)
    }
}

/// Process-local store. Contents are lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: DashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The raw stored value for `key`.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.values.get(key).map(|v| v.value().clone())
    }

    /// Store `value` verbatim, bypassing any serialization.
    pub fn insert_raw(&self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.raw(key))
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.values.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryStore::new();
        assert_eq!(store.read("login-attempts").unwrap(), None);

        store.write("login-attempts", "[]").unwrap();
        assert_eq!(store.read("login-attempts").unwrap().as_deref(), Some("[]"));

        store.write("login-attempts", "[1]").unwrap();
        assert_eq!(store.raw("login-attempts").as_deref(), Some("[1]"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_memory_store_remove() {
        let store = MemoryStore::new();
        store.insert_raw("k", "v");
        store.remove("k").unwrap();
        assert!(store.is_empty());

        // Removing an absent key is fine
        store.remove("k").unwrap();
    }

    #[test]
    fn test_shared_store_sees_writes() {
        let store = Arc::new(MemoryStore::new());
        let shared: Arc<MemoryStore> = Arc::clone(&store);
        shared.write("k", "v").unwrap();
        assert_eq!(store.raw("k").as_deref(), Some("v"));
    }

    #[test]
    fn test_boxed_store_delegates() {
        let store: Box<dyn KeyValueStore> = Box::new(MemoryStore::new());
        store.write("k", "v").unwrap();
        assert_eq!(store.read("k").unwrap().as_deref(), Some("v"));
    }
}
