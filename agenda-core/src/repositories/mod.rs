//! Repository layer between the throttle service and raw key-value storage.

pub mod attempt_log;

pub use attempt_log::{
    AttemptLogRead, AttemptLogRepository, DEFAULT_STORAGE_KEY, validate_storage_key,
};
