//! Persistence for the login attempt log.
//!
//! The whole log lives under a single key as a JSON array. This repository is the
//! only place that knows about that encoding. Reads report what they found as an
//! [`AttemptLogRead`] so the fail-open policy is an explicit, testable step rather
//! than an error silently swallowed deep inside the store.

use std::sync::Arc;

use crate::{Error, LoginAttempt, error::ValidationError, policy, storage::KeyValueStore};

/// Default storage key for the attempt log.
pub const DEFAULT_STORAGE_KEY: &str = "login-attempts";

/// Check that `key` can name the attempt log.
pub fn validate_storage_key(key: &str) -> Result<(), ValidationError> {
    if key.trim().is_empty() {
        return Err(ValidationError::MissingField(
            "Storage key is required".to_string(),
        ));
    }

    if key.chars().any(char::is_control) {
        return Err(ValidationError::InvalidField(format!(
            "Storage key contains control characters: {key:?}"
        )));
    }

    Ok(())
}

/// Reject attempts stamped so close to the end of representable time that a
/// lockout starting at them could not be computed.
fn validate_timestamps(attempts: &[LoginAttempt]) -> Result<(), ValidationError> {
    let lockout = policy::lockout_duration();
    match attempts
        .iter()
        .find(|a| a.timestamp.checked_add_signed(lockout).is_none())
    {
        Some(a) => Err(ValidationError::InvalidField(format!(
            "Attempt timestamp out of range: {}",
            a.timestamp.timestamp_millis()
        ))),
        None => Ok(()),
    }
}

/// Outcome of reading the attempt log from the store.
#[derive(Debug)]
pub enum AttemptLogRead {
    /// A well-formed log was found.
    Loaded(Vec<LoginAttempt>),
    /// Nothing has been stored under the key yet.
    Absent,
    /// The store failed, or the stored value is not a valid attempt log.
    Unreadable(Error),
}

impl AttemptLogRead {
    /// Collapse the outcome into the attempts to operate on.
    ///
    /// An unreadable log is treated as empty: the throttle fails open rather
    /// than blocking a login because its own storage is broken.
    pub fn into_attempts(self) -> Vec<LoginAttempt> {
        match self {
            AttemptLogRead::Loaded(attempts) => attempts,
            AttemptLogRead::Absent => Vec::new(),
            AttemptLogRead::Unreadable(error) => {
                tracing::warn!(
                    error = %error,
                    "Login attempt log is unreadable, treating it as empty"
                );
                Vec::new()
            }
        }
    }

    pub fn is_unreadable(&self) -> bool {
        matches!(self, AttemptLogRead::Unreadable(_))
    }
}

/// Reads and writes the attempt log through a [`KeyValueStore`].
pub struct AttemptLogRepository<S: KeyValueStore> {
    store: Arc<S>,
    key: String,
}

impl<S: KeyValueStore> AttemptLogRepository<S> {
    pub fn new(store: Arc<S>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Read and decode the stored log.
    pub fn load(&self) -> AttemptLogRead {
        let raw = match self.store.read(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return AttemptLogRead::Absent,
            Err(e) => return AttemptLogRead::Unreadable(e.into()),
        };

        let attempts = match serde_json::from_str::<Vec<LoginAttempt>>(&raw) {
            Ok(attempts) => attempts,
            Err(e) => return AttemptLogRead::Unreadable(e.into()),
        };

        match validate_timestamps(&attempts) {
            Ok(()) => AttemptLogRead::Loaded(attempts),
            Err(e) => AttemptLogRead::Unreadable(e.into()),
        }
    }

    /// Replace the stored log with `attempts`.
    ///
    /// Failures are logged and dropped. Losing a throttle record is acceptable;
    /// failing the caller's login flow is not.
    pub fn save(&self, attempts: &[LoginAttempt]) {
        if let Err(error) = self.try_save(attempts) {
            tracing::warn!(
                key = %self.key,
                error = %error,
                "Failed to persist login attempt log"
            );
        }
    }

    /// Remove the stored log entirely. Failures are logged and dropped.
    pub fn clear(&self) {
        if let Err(error) = self.store.remove(&self.key) {
            tracing::warn!(
                key = %self.key,
                error = %error,
                "Failed to clear login attempt log"
            );
        }
    }

    fn try_save(&self, attempts: &[LoginAttempt]) -> Result<(), Error> {
        let raw = serde_json::to_string(attempts)?;
        self.store.write(&self.key, &raw)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::StorageError, storage::MemoryStore};
    use chrono::{TimeZone, Utc};

    /// Store whose every operation fails
    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn read(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Unavailable("storage disabled".to_string()))
        }

        fn write(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("quota exceeded".to_string()))
        }

        fn remove(&self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("storage disabled".to_string()))
        }
    }

    fn attempt(identifier: &str, ms: i64, succeeded: bool) -> LoginAttempt {
        LoginAttempt::new(identifier, Utc.timestamp_millis_opt(ms).unwrap(), succeeded)
    }

    #[test]
    fn test_validate_storage_key() {
        assert!(validate_storage_key(DEFAULT_STORAGE_KEY).is_ok());
        assert!(validate_storage_key("agenda/login-attempts").is_ok());
        assert!(matches!(
            validate_storage_key("  "),
            Err(ValidationError::MissingField(_))
        ));
        assert!(matches!(
            validate_storage_key("login\nattempts"),
            Err(ValidationError::InvalidField(_))
        ));
    }

    #[test]
    fn test_absent_key_reads_as_absent() {
        let repo = AttemptLogRepository::new(Arc::new(MemoryStore::new()), DEFAULT_STORAGE_KEY);
        assert!(matches!(repo.load(), AttemptLogRead::Absent));
        assert!(repo.load().into_attempts().is_empty());
    }

    #[test]
    fn test_save_then_load_preserves_order() {
        let store = Arc::new(MemoryStore::new());
        let repo = AttemptLogRepository::new(store.clone(), DEFAULT_STORAGE_KEY);

        let attempts = vec![
            attempt("b@x.com", 2_000, false),
            attempt("a@x.com", 1_000, true),
        ];
        repo.save(&attempts);

        match repo.load() {
            AttemptLogRead::Loaded(loaded) => assert_eq!(loaded, attempts),
            other => panic!("Expected loaded log, got {other:?}"),
        }
        assert_eq!(
            store.raw(DEFAULT_STORAGE_KEY).as_deref(),
            Some(
                r#"[{"email":"b@x.com","timestamp":2000,"success":false},{"email":"a@x.com","timestamp":1000,"success":true}]"#
            )
        );
    }

    #[test]
    fn test_malformed_value_is_unreadable() {
        let store = Arc::new(MemoryStore::new());
        store.insert_raw(DEFAULT_STORAGE_KEY, "{not json");
        let repo = AttemptLogRepository::new(store, DEFAULT_STORAGE_KEY);

        let read = repo.load();
        assert!(read.is_unreadable());
        assert!(read.into_attempts().is_empty());
    }

    #[test]
    fn test_out_of_range_timestamp_is_unreadable() {
        let store = Arc::new(MemoryStore::new());
        let max_ms = chrono::DateTime::<Utc>::MAX_UTC.timestamp_millis();
        store.insert_raw(
            DEFAULT_STORAGE_KEY,
            format!(r#"[{{"email":"x@y.com","timestamp":{max_ms},"success":false}}]"#),
        );
        let repo = AttemptLogRepository::new(store, DEFAULT_STORAGE_KEY);

        match repo.load() {
            AttemptLogRead::Unreadable(error) => assert!(error.is_validation_error()),
            other => panic!("Expected unreadable log, got {other:?}"),
        }
    }

    #[test]
    fn test_wrong_shape_is_unreadable() {
        let store = Arc::new(MemoryStore::new());
        store.insert_raw(DEFAULT_STORAGE_KEY, r#"{"email":"a@b.com"}"#);
        let repo = AttemptLogRepository::new(store, DEFAULT_STORAGE_KEY);
        assert!(repo.load().is_unreadable());
    }

    #[test]
    fn test_broken_store_fails_open() {
        let repo = AttemptLogRepository::new(Arc::new(BrokenStore), DEFAULT_STORAGE_KEY);
        let read = repo.load();
        assert!(matches!(
            read,
            AttemptLogRead::Unreadable(Error::Storage(StorageError::Unavailable(_)))
        ));

        // Writes and clears are swallowed
        repo.save(&[attempt("a@b.com", 0, false)]);
        repo.clear();
    }

    #[test]
    fn test_clear_removes_key() {
        let store = Arc::new(MemoryStore::new());
        let repo = AttemptLogRepository::new(store.clone(), "custom-key");
        repo.save(&[attempt("a@b.com", 0, false)]);
        assert!(store.raw("custom-key").is_some());

        repo.clear();
        assert!(store.raw("custom-key").is_none());
        assert_eq!(repo.key(), "custom-key");
    }
}
