//! Builder pattern for constructing login throttles
//!
//! This module provides a type-safe builder for creating [`LoginThrottleService`]
//! instances with compile-time validation that a store has been chosen.
//!
//! # Example
//!
//! ```rust
//! use agenda::LoginThrottleBuilder;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let throttle = LoginThrottleBuilder::new()
//!     .with_memory_store()
//!     .with_storage_key("login-attempts")
//!     .build()?;
//!
//! throttle.record_attempt("parent@example.com", false);
//! assert_eq!(throttle.remaining_attempts("parent@example.com"), 4);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use agenda_core::{
    AttemptLogRepository, Clock, DEFAULT_STORAGE_KEY, KeyValueStore, LoginThrottleService,
    MemoryStore, SystemClock, repositories::validate_storage_key,
};

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur when building a login throttle.
#[derive(Debug, thiserror::Error)]
pub enum LoginThrottleBuilderError {
    /// Failed to open the storage backend
    #[error("Storage connection failed: {0}")]
    StorageConnection(String),

    /// Invalid configuration provided
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

// ============================================================================
// Type-State Markers
// ============================================================================

/// Marker type indicating no store has been configured yet.
///
/// This is the initial state of [`LoginThrottleBuilder`].
pub struct NoStore;

/// Marker type indicating a store has been configured.
pub struct WithStore<S: KeyValueStore> {
    store: Arc<S>,
}

// ============================================================================
// Builder Implementation
// ============================================================================

/// A type-safe builder for constructing [`LoginThrottleService`] instances.
///
/// # Type States
///
/// - [`NoStore`]: Initial state, a store must be configured
/// - [`WithStore<S>`]: Store configured, ready to build
pub struct LoginThrottleBuilder<Store> {
    store: Store,
    storage_key: String,
    clock: Arc<dyn Clock>,
}

impl Default for LoginThrottleBuilder<NoStore> {
    fn default() -> Self {
        Self::new()
    }
}

impl LoginThrottleBuilder<NoStore> {
    /// Create a new builder with default configuration.
    ///
    /// # Defaults
    ///
    /// - Storage key: `"login-attempts"`
    /// - Clock: system wall clock
    pub fn new() -> Self {
        Self {
            store: NoStore,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Use an existing store.
    pub fn with_store<S: KeyValueStore>(self, store: Arc<S>) -> LoginThrottleBuilder<WithStore<S>> {
        LoginThrottleBuilder {
            store: WithStore { store },
            storage_key: self.storage_key,
            clock: self.clock,
        }
    }

    /// Keep attempts in process memory only. Nothing survives a restart.
    pub fn with_memory_store(self) -> LoginThrottleBuilder<WithStore<MemoryStore>> {
        self.with_store(Arc::new(MemoryStore::new()))
    }

    /// Persist attempts as JSON files under `dir`, creating it if needed.
    #[cfg(feature = "file")]
    pub fn with_file_store<P: AsRef<std::path::Path>>(
        self,
        dir: P,
    ) -> Result<LoginThrottleBuilder<WithStore<crate::FileStore>>, LoginThrottleBuilderError> {
        let store = crate::FileStore::new(dir)
            .map_err(|e| LoginThrottleBuilderError::StorageConnection(e.to_string()))?;

        Ok(self.with_store(Arc::new(store)))
    }
}

impl<Store> LoginThrottleBuilder<Store> {
    /// Set the key the attempt log is stored under.
    ///
    /// Default: `"login-attempts"`
    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    /// Set the time source used for windows, lockouts and delays.
    ///
    /// Default: [`SystemClock`]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

impl<S: KeyValueStore> LoginThrottleBuilder<WithStore<S>> {
    /// Build the throttle.
    ///
    /// # Errors
    ///
    /// Returns [`LoginThrottleBuilderError::InvalidConfiguration`] if the storage
    /// key is empty, contains control characters, or is not accepted by the
    /// chosen store.
    pub fn build(self) -> Result<LoginThrottleService<S>, LoginThrottleBuilderError> {
        validate_storage_key(&self.storage_key)
            .map_err(|e| LoginThrottleBuilderError::InvalidConfiguration(e.to_string()))?;
        self.store
            .store
            .validate_key(&self.storage_key)
            .map_err(|e| LoginThrottleBuilderError::InvalidConfiguration(e.to_string()))?;

        tracing::debug!(storage_key = %self.storage_key, "Building login throttle");

        let repository = AttemptLogRepository::new(self.store.store, self.storage_key);
        Ok(LoginThrottleService::new(repository, self.clock))
    }
}
