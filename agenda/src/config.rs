use std::{path::PathBuf, sync::Arc};

use agenda_core::{DEFAULT_STORAGE_KEY, KeyValueStore, LoginThrottleService, MemoryStore};
use serde::{Deserialize, Serialize};

use crate::{LoginThrottleBuilder, LoginThrottleBuilderError};

/// Environment variable overriding the storage key.
pub const STORAGE_KEY_ENV: &str = "AGENDA_THROTTLE_STORAGE_KEY";

/// Environment variable selecting the file store and its directory.
pub const STORE_DIR_ENV: &str = "AGENDA_THROTTLE_STORE_DIR";

/// A throttle whose store was chosen at runtime.
pub type DynLoginThrottle = LoginThrottleService<Box<dyn KeyValueStore>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThrottleConfig {
    pub storage_key: String,
    pub store: StoreConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreConfig {
    Memory,
    File { dir: PathBuf },
}

impl ThrottleConfig {
    pub fn from_env() -> Result<Self, LoginThrottleBuilderError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, LoginThrottleBuilderError> {
        let store = match lookup(STORE_DIR_ENV) {
            Some(dir) if dir.trim().is_empty() => {
                return Err(LoginThrottleBuilderError::InvalidConfiguration(format!(
                    "{STORE_DIR_ENV} is set but empty"
                )));
            }
            Some(dir) => StoreConfig::File {
                dir: PathBuf::from(dir),
            },
            None => StoreConfig::Memory,
        };

        Ok(Self {
            storage_key: lookup(STORAGE_KEY_ENV).unwrap_or_else(|| DEFAULT_STORAGE_KEY.to_string()),
            store,
        })
    }

    pub fn build_throttle(&self) -> Result<DynLoginThrottle, LoginThrottleBuilderError> {
        let store: Box<dyn KeyValueStore> = match &self.store {
            StoreConfig::Memory => Box::new(MemoryStore::new()),
            #[cfg(feature = "file")]
            StoreConfig::File { dir } => Box::new(
                crate::FileStore::new(dir)
                    .map_err(|e| LoginThrottleBuilderError::StorageConnection(e.to_string()))?,
            ),
            #[cfg(not(feature = "file"))]
            StoreConfig::File { .. } => {
                return Err(LoginThrottleBuilderError::InvalidConfiguration(
                    "file store support is not enabled".to_string(),
                ));
            }
        };

        LoginThrottleBuilder::new()
            .with_storage_key(self.storage_key.clone())
            .with_store(Arc::new(store))
            .build()
    }
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            store: StoreConfig::Memory,
        }
    }
}
