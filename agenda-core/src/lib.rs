//! Core functionality for the agenda client.
//!
//! This crate contains the login attempt model, the key-value storage seam the
//! throttle persists through, and the [`LoginThrottleService`] itself.
//!
//! Storage backends implement [`KeyValueStore`]; the in-memory [`MemoryStore`]
//! lives here, durable stores live in their own crates.
//!
//! See [`LoginAttempt`] for the persisted record, [`LockoutState`] and
//! [`SecurityInfo`] for the derived views, and [`policy`] for the fixed limits.
pub mod attempt;
pub mod clock;
pub mod error;
pub mod policy;
pub mod repositories;
pub mod services;
pub mod storage;

pub use attempt::{LockoutState, LoginAttempt, SecurityInfo};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::Error;
pub use repositories::{AttemptLogRead, AttemptLogRepository, DEFAULT_STORAGE_KEY};
pub use services::{LoginThrottleService, format_lockout_time};
pub use storage::{KeyValueStore, MemoryStore};
