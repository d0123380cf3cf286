//! File-backed storage for the agenda client.
//!
//! [`FileStore`] keeps each key in its own `<key>.json` file inside a directory,
//! giving the login throttle a store that outlives the process, the way browser
//! local storage outlives a page reload.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use agenda_core::{AttemptLogRepository, DEFAULT_STORAGE_KEY, LoginThrottleService, SystemClock};
//! use agenda_storage_file::FileStore;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(FileStore::new("./.agenda")?);
//! let repository = AttemptLogRepository::new(store, DEFAULT_STORAGE_KEY);
//! let throttle = LoginThrottleService::new(repository, Arc::new(SystemClock));
//! throttle.record_attempt("parent@example.com", false);
//! # Ok(())
//! # }
//! ```
use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use agenda_core::{
    KeyValueStore, error::StorageError, error::utilities::StorageResultExt,
    map_storage_err_with_context,
};

#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self, StorageError> {
        let dir = dir.as_ref().to_path_buf();

        if dir.exists() && !dir.is_dir() {
            return Err(StorageError::Unavailable(format!(
                "{} is not a directory",
                dir.display()
            )));
        }

        if !dir.exists() {
            map_storage_err_with_context!(
                fs::create_dir_all(&dir),
                format!("Failed to create store directory {}", dir.display())
            )?;
        }

        tracing::debug!(dir = %dir.display(), "Opened file store");

        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file holding `key`.
    pub fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        Ok(self.dir.join(format!("{}.json", file_stem(key)?)))
    }
}

/// The key itself is the file stem, so only characters that are safe in a file
/// name and cannot leave the store directory are accepted.
fn file_stem(key: &str) -> Result<&str, StorageError> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey("key must not be empty".to_string()));
    }

    if let Some(c) = key
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
    {
        return Err(StorageError::InvalidKey(format!(
            "{key:?} contains {c:?}; only ASCII letters, digits, '-' and '_' are allowed"
        )));
    }

    Ok(key)
}

impl KeyValueStore for FileStore {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).map_storage_err_with_context(&format!("Reading {}", path.display())),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        // Readers only ever see the old file or the complete new one
        let tmp = path.with_extension("json.tmp");

        fs::write(&tmp, value)
            .map_storage_err_with_context(&format!("Writing {}", tmp.display()))?;

        if let Err(e) = fs::rename(&tmp, &path) {
            if let Err(cleanup) = fs::remove_file(&tmp) {
                tracing::debug!(
                    path = %tmp.display(),
                    error = %cleanup,
                    "Failed to remove temporary file"
                );
            }
            return Err(e).map_storage_err_with_context(&format!("Replacing {}", path.display()));
        }

        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).map_storage_err_with_context(&format!("Removing {}", path.display())),
        }
    }

    fn validate_key(&self, key: &str) -> Result<(), StorageError> {
        file_stem(key).map(|_| ())
    }
}
