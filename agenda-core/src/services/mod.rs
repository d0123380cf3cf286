//! Services built on top of the repository layer.

pub mod login_throttle;

pub use login_throttle::{LoginThrottleService, format_lockout_time};
