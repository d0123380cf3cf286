//! Client-side login attempt throttling.
//!
//! This module tracks failed login attempts per identifier inside a sliding
//! window and derives three things from them:
//!
//! - a hard lockout once [`MAX_ATTEMPTS`] failures accumulate, lasting
//!   [`LOCKOUT_DURATION_SECS`] from the most recent failure
//! - the number of attempts left before that lockout
//! - an advisory delay that grows with each failure and decays as time passes
//!
//! It is a speed bump in front of the real authentication service, not a
//! security boundary. Every operation fails open: if the store cannot be read
//! the log is treated as empty, and write failures are logged and dropped.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use agenda_core::{
//!     clock::SystemClock,
//!     repositories::{AttemptLogRepository, DEFAULT_STORAGE_KEY},
//!     services::LoginThrottleService,
//!     storage::MemoryStore,
//! };
//!
//! let repository = AttemptLogRepository::new(Arc::new(MemoryStore::new()), DEFAULT_STORAGE_KEY);
//! let throttle = LoginThrottleService::new(repository, Arc::new(SystemClock));
//!
//! // Before submitting credentials
//! if let Some(lockout) = throttle.is_locked_out("parent@example.com") {
//!     println!("locked until {}", lockout.locked_until);
//! }
//!
//! // After the authentication service answers
//! throttle.record_attempt("parent@example.com", false);
//! assert_eq!(throttle.remaining_attempts("parent@example.com"), 4);
//! ```
//!
//! [`MAX_ATTEMPTS`]: crate::policy::MAX_ATTEMPTS
//! [`LOCKOUT_DURATION_SECS`]: crate::policy::LOCKOUT_DURATION_SECS

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::{
    LockoutState, LoginAttempt, SecurityInfo,
    attempt::normalize_identifier,
    clock::Clock,
    policy::{self, MAX_ATTEMPTS},
    repositories::AttemptLogRepository,
    storage::KeyValueStore,
};

/// Failed attempts for one identifier inside the attempt window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FailureStats {
    count: usize,
    latest_at: Option<DateTime<Utc>>,
}

/// Service deciding whether a login attempt should be blocked or delayed.
///
/// The service holds no state of its own; every call reads the attempt log from
/// the store, so several instances over the same store agree with each other.
pub struct LoginThrottleService<S: KeyValueStore> {
    repository: AttemptLogRepository<S>,
    clock: Arc<dyn Clock>,
}

impl<S: KeyValueStore> LoginThrottleService<S> {
    pub fn new(repository: AttemptLogRepository<S>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    pub fn repository(&self) -> &AttemptLogRepository<S> {
        &self.repository
    }

    /// Get the active lockout for an identifier, if any.
    ///
    /// Returns `Some` while at least [`MAX_ATTEMPTS`] failures exist inside the
    /// attempt window and the most recent one is less than the lockout duration
    /// old.
    ///
    /// # Side effects
    ///
    /// When the failure count is at the threshold but the lockout has already
    /// run out, this call purges every failed attempt for the identifier and
    /// writes the window-pruned log back to the store. The identifier then
    /// starts over with a full set of attempts.
    pub fn is_locked_out(&self, identifier: &str) -> Option<LockoutState> {
        self.lockout_at(identifier, self.clock.now())
    }

    /// Record the outcome of an authentication attempt.
    ///
    /// Attempts older than the window are pruned from the stored log. A
    /// successful attempt also wipes the identifier's entire history before
    /// being appended.
    pub fn record_attempt(&self, identifier: &str, succeeded: bool) {
        let now = self.clock.now();
        let normalized = normalize_identifier(identifier);
        let mut attempts = self.window_attempts(now);

        if succeeded {
            attempts.retain(|a| !a.matches(&normalized));
        }

        attempts.push(LoginAttempt::new(identifier, now, succeeded));
        self.repository.save(&attempts);

        tracing::debug!(
            identifier = %identifier,
            succeeded = succeeded,
            log_len = attempts.len(),
            "Recorded login attempt"
        );

        if !succeeded {
            let stats = failure_stats(&attempts, &normalized);
            if stats.count as u32 == MAX_ATTEMPTS {
                tracing::info!(
                    identifier = %identifier,
                    failed_attempts = stats.count,
                    "Identifier locked out after repeated failed logins"
                );
            }
        }
    }

    /// Attempts left before a lockout, between 0 and [`MAX_ATTEMPTS`].
    pub fn remaining_attempts(&self, identifier: &str) -> u32 {
        self.remaining_attempts_at(identifier, self.clock.now())
    }

    /// Advisory wait before the next attempt, in milliseconds.
    ///
    /// The base delay is picked from the schedule by failure count and shrinks
    /// linearly with the time elapsed since the most recent failure.
    pub fn attempt_delay(&self, identifier: &str) -> u64 {
        self.attempt_delay_at(identifier, self.clock.now())
    }

    pub fn should_wait_before_attempt(&self, identifier: &str) -> bool {
        self.attempt_delay(identifier) > 0
    }

    /// Seconds until the lockout ends, or 0 when not locked.
    ///
    /// Goes through [`Self::is_locked_out`] and shares its purge side effect.
    pub fn remaining_lockout_time(&self, identifier: &str) -> u64 {
        self.remaining_lockout_time_at(identifier, self.clock.now())
    }

    /// Everything a login form needs to render its throttle state.
    ///
    /// All fields are computed against a single reading of the clock.
    pub fn security_info(&self, identifier: &str) -> SecurityInfo {
        let now = self.clock.now();
        let lockout_time_remaining = self.remaining_lockout_time_at(identifier, now);
        let attempt_delay = self.attempt_delay_at(identifier, now);

        SecurityInfo {
            is_locked: lockout_time_remaining > 0,
            lockout_time_remaining,
            lockout_time_formatted: format_lockout_time(lockout_time_remaining),
            remaining_attempts: self.remaining_attempts_at(identifier, now),
            attempt_delay,
            should_wait: attempt_delay > 0,
        }
    }

    /// Erase the stored log for every identifier.
    pub fn clear_all_attempts(&self) {
        self.repository.clear();
        tracing::debug!(key = %self.repository.key(), "Cleared all login attempts");
    }

    fn lockout_at(&self, identifier: &str, now: DateTime<Utc>) -> Option<LockoutState> {
        let normalized = normalize_identifier(identifier);
        let mut attempts = self.window_attempts(now);
        let stats = failure_stats(&attempts, &normalized);

        if (stats.count as u32) < MAX_ATTEMPTS {
            return None;
        }

        let locked_until = stats
            .latest_at?
            .checked_add_signed(policy::lockout_duration())?;

        if now < locked_until {
            return Some(LockoutState {
                identifier: identifier.to_string(),
                locked_until,
                failed_count: stats.count as u32,
            });
        }

        attempts.retain(|a| !(a.is_failure() && a.matches(&normalized)));
        self.repository.save(&attempts);

        tracing::info!(
            identifier = %identifier,
            purged = stats.count,
            "Lockout expired, cleared failed login attempts"
        );

        None
    }

    fn remaining_attempts_at(&self, identifier: &str, now: DateTime<Utc>) -> u32 {
        let stats = self.failure_stats(identifier, now);
        MAX_ATTEMPTS.saturating_sub(stats.count as u32)
    }

    fn attempt_delay_at(&self, identifier: &str, now: DateTime<Utc>) -> u64 {
        let stats = self.failure_stats(identifier, now);

        let Some(latest_at) = stats.latest_at else {
            return 0;
        };

        let base = policy::base_delay_ms(stats.count);
        // A failure stamped in the future counts as just now
        let elapsed = (now - latest_at).num_milliseconds().max(0);
        (base - elapsed).max(0) as u64
    }

    fn remaining_lockout_time_at(&self, identifier: &str, now: DateTime<Utc>) -> u64 {
        self.lockout_at(identifier, now)
            .map(|lockout| lockout.retry_after_seconds(now))
            .unwrap_or(0)
    }

    fn window_attempts(&self, now: DateTime<Utc>) -> Vec<LoginAttempt> {
        let cutoff = now - policy::attempt_window();
        let mut attempts = self.repository.load().into_attempts();
        attempts.retain(|a| a.timestamp >= cutoff);
        attempts
    }

    fn failure_stats(&self, identifier: &str, now: DateTime<Utc>) -> FailureStats {
        failure_stats(&self.window_attempts(now), &normalize_identifier(identifier))
    }
}

fn failure_stats(attempts: &[LoginAttempt], normalized: &str) -> FailureStats {
    let failures = attempts
        .iter()
        .filter(|a| a.is_failure() && a.matches(normalized));

    failures.fold(
        FailureStats {
            count: 0,
            latest_at: None,
        },
        |stats, a| FailureStats {
            count: stats.count + 1,
            latest_at: stats.latest_at.max(Some(a.timestamp)),
        },
    )
}

/// Render a number of seconds as `M:SS`.
///
/// ```rust
/// use agenda_core::services::format_lockout_time;
///
/// assert_eq!(format_lockout_time(65), "1:05");
/// assert_eq!(format_lockout_time(900), "15:00");
/// ```
pub fn format_lockout_time(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
