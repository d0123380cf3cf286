use crate::error::StorageError;

/// Extension trait for Result types to simplify storage error mapping
///
/// Store backends deal with `std::io` and similar foreign errors; this trait turns
/// them into [`StorageError::Io`] without repeating the `map_err` closure everywhere.
///
/// # Example
///
/// ```rust
/// use agenda_core::error::utilities::StorageResultExt;
///
/// let result: Result<(), std::io::Error> =
///     Err(std::io::Error::new(std::io::ErrorKind::Other, "boom"));
/// let mapped = result.map_storage_err_with_context("Writing login-attempts");
/// assert!(mapped.is_err());
/// ```
pub trait StorageResultExt<T> {
    /// Convert a foreign error to a storage I/O error
    fn map_storage_err(self) -> Result<T, StorageError>;

    /// Convert a foreign error to a storage I/O error with additional context
    fn map_storage_err_with_context(self, context: &str) -> Result<T, StorageError>;
}

impl<T, E: std::fmt::Display> StorageResultExt<T> for Result<T, E> {
    fn map_storage_err(self) -> Result<T, StorageError> {
        self.map_err(|e| StorageError::Io(e.to_string()))
    }

    fn map_storage_err_with_context(self, context: &str) -> Result<T, StorageError> {
        self.map_err(|e| StorageError::Io(format!("{context}: {e}")))
    }
}

/// Macro to convert any error to a storage I/O error
///
/// # Example
///
/// ```rust
/// use agenda_core::map_storage_err;
///
/// let result: Result<(), &str> = Err("read failed");
/// let mapped = map_storage_err!(result);
/// assert!(mapped.is_err());
/// ```
#[macro_export]
macro_rules! map_storage_err {
    ($result:expr) => {
        $result.map_err(|e| $crate::error::StorageError::Io(e.to_string()))
    };
}

/// Macro to convert any error to a storage I/O error with context
///
/// # Example
///
/// ```rust
/// use agenda_core::map_storage_err_with_context;
///
/// let result: Result<(), &str> = Err("permission denied");
/// let mapped = map_storage_err_with_context!(result, "Creating store directory");
/// assert!(mapped.is_err());
/// ```
#[macro_export]
macro_rules! map_storage_err_with_context {
    ($result:expr, $context:expr) => {
        $result.map_err(|e| $crate::error::StorageError::Io(format!("{}: {}", $context, e)))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_result_ext() {
        let error_result: Result<i32, &str> = Err("device not ready");
        match error_result.map_storage_err().unwrap_err() {
            StorageError::Io(msg) => assert_eq!(msg, "device not ready"),
            _ => panic!("Expected storage I/O error"),
        }
    }

    #[test]
    fn test_storage_result_ext_with_context() {
        let error_result: Result<i32, &str> = Err("timeout");
        match error_result
            .map_storage_err_with_context("Reading login-attempts")
            .unwrap_err()
        {
            StorageError::Io(msg) => assert_eq!(msg, "Reading login-attempts: timeout"),
            _ => panic!("Expected storage I/O error"),
        }
    }

    #[test]
    fn test_map_storage_err_macros() {
        let error_result: Result<i32, &str> = Err("rename failed");
        match map_storage_err!(error_result).unwrap_err() {
            StorageError::Io(msg) => assert_eq!(msg, "rename failed"),
            _ => panic!("Expected storage I/O error"),
        }

        let error_result: Result<i32, &str> = Err("no space left");
        match map_storage_err_with_context!(error_result, "Writing value").unwrap_err() {
            StorageError::Io(msg) => assert_eq!(msg, "Writing value: no space left"),
            _ => panic!("Expected storage I/O error"),
        }
    }
}
