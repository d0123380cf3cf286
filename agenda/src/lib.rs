//! # Agenda login throttle
//!
//! Client-side protection against repeated login failures for the agenda school
//! planner. Before a parent's credentials are sent to the authentication
//! service, the login form asks the throttle whether the account is locked or
//! should wait; afterwards it reports the outcome back.
//!
//! The throttle is advisory. It slows down casual retry scripts and gives the
//! user clear feedback ("locked for 12:45", "3 attempts remaining"), but the
//! authoritative check lives on the server.
//!
//! - 5 failures inside 30 minutes lock an identifier for 15 minutes
//! - each failure adds a decaying delay of 0, 2, 5, 10 then 20 seconds
//! - a successful login wipes the identifier's history
//! - storage faults never block a login; the throttle fails open
//!
//! ## Storage Support
//!
//! - In-memory ([`MemoryStore`])
//! - JSON files on disk ([`FileStore`], `file` feature, enabled by default)
//! - Anything implementing [`KeyValueStore`]
//!
//! ## Example
//!
//! ```rust,no_run
//! use agenda::LoginThrottleBuilder;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let throttle = LoginThrottleBuilder::new()
//!     .with_file_store("./.agenda")?
//!     .build()?;
//!
//! let info = throttle.security_info("parent@example.com");
//! if info.is_locked {
//!     println!("Too many attempts, try again in {}", info.lockout_time_formatted);
//! } else if info.should_wait {
//!     println!("Please wait {} ms", info.attempt_delay);
//! } else {
//!     let succeeded = false; // ask the authentication service
//!     throttle.record_attempt("parent@example.com", succeeded);
//! }
//! # Ok(())
//! # }
//! ```
pub mod builder;
pub mod config;

pub use builder::{LoginThrottleBuilder, LoginThrottleBuilderError, NoStore, WithStore};
pub use config::{DynLoginThrottle, StoreConfig, ThrottleConfig};

/// Re-export core types from agenda_core
pub use agenda_core::{
    AttemptLogRead, AttemptLogRepository, Clock, DEFAULT_STORAGE_KEY, Error, KeyValueStore,
    LockoutState, LoginAttempt, LoginThrottleService, ManualClock, MemoryStore, SecurityInfo,
    SystemClock, format_lockout_time, policy,
};

/// Re-export storage backends
#[cfg(feature = "file")]
pub use agenda_storage_file::FileStore;
