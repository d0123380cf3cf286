//! Fixed throttling policy.
//!
//! These values are not configurable at runtime.

use chrono::Duration;

/// Failed attempts inside the attempt window that trigger a lockout.
pub const MAX_ATTEMPTS: u32 = 5;

/// Length of a hard lockout, in seconds.
pub const LOCKOUT_DURATION_SECS: i64 = 15 * 60;

/// Sliding window within which failed attempts are counted, in seconds.
pub const ATTEMPT_WINDOW_SECS: i64 = 30 * 60;

/// Advisory delay in milliseconds, indexed by `min(failed_count - 1, 4)`.
pub const DELAY_SCHEDULE_MS: [i64; 5] = [0, 2_000, 5_000, 10_000, 20_000];

pub fn lockout_duration() -> Duration {
    Duration::seconds(LOCKOUT_DURATION_SECS)
}

pub fn attempt_window() -> Duration {
    Duration::seconds(ATTEMPT_WINDOW_SECS)
}

/// Base delay for the given number of failed attempts. Zero failures means no delay.
pub fn base_delay_ms(failed_count: usize) -> i64 {
    match failed_count {
        0 => 0,
        n => DELAY_SCHEDULE_MS[(n - 1).min(DELAY_SCHEDULE_MS.len() - 1)],
    }
}
