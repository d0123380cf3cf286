//! Login attempt records and the states derived from them.
//!
//! [`LoginAttempt`] is the only type that is ever persisted. Its serialized form is
//! a JSON object `{ "email": string, "timestamp": number, "success": boolean }`
//! with the timestamp in milliseconds since the Unix epoch; the attempt log is a
//! JSON array of these objects in insertion order.
//!
//! [`LockoutState`] and [`SecurityInfo`] are computed on demand and never stored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Normalize an identifier for comparison.
///
/// Identifiers (typically email addresses) are matched by lowercased equality.
pub fn normalize_identifier(identifier: &str) -> String {
    identifier.to_lowercase()
}

/// A single recorded authentication attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginAttempt {
    /// The identifier exactly as the caller supplied it.
    #[serde(rename = "email")]
    pub identifier: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "success")]
    pub succeeded: bool,
}

impl LoginAttempt {
    pub fn new(identifier: impl Into<String>, timestamp: DateTime<Utc>, succeeded: bool) -> Self {
        Self {
            identifier: identifier.into(),
            timestamp,
            succeeded,
        }
    }

    /// Whether this attempt belongs to `identifier`, ignoring case.
    ///
    /// `normalized` must already be lowercased via [`normalize_identifier`].
    pub fn matches(&self, normalized: &str) -> bool {
        self.identifier.to_lowercase() == normalized
    }

    pub fn is_failure(&self) -> bool {
        !self.succeeded
    }
}

/// An active hard lockout for an identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LockoutState {
    pub identifier: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub locked_until: DateTime<Utc>,
    pub failed_count: u32,
}

impl LockoutState {
    /// Whole seconds until the lockout expires, rounded up and floored at zero.
    pub fn retry_after_seconds(&self, now: DateTime<Utc>) -> u64 {
        let remaining_ms = (self.locked_until - now).num_milliseconds();
        if remaining_ms <= 0 {
            return 0;
        }
        (remaining_ms as u64).div_ceil(1000)
    }
}

/// Aggregate throttle state for a login form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityInfo {
    pub is_locked: bool,
    /// Seconds until the lockout ends, 0 when not locked.
    pub lockout_time_remaining: u64,
    /// `lockout_time_remaining` rendered as `M:SS`.
    pub lockout_time_formatted: String,
    pub remaining_attempts: u32,
    /// Advisory wait before the next attempt, in milliseconds.
    pub attempt_delay: u64,
    pub should_wait: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at_ms(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).unwrap()
    }

    #[test]
    fn test_attempt_wire_format() {
        let attempt = LoginAttempt::new("Parent@School.org", at_ms(1_700_000_000_123), false);
        let json = serde_json::to_value(&attempt).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "email": "Parent@School.org",
                "timestamp": 1_700_000_000_123_i64,
                "success": false,
            })
        );
    }

    #[test]
    fn test_attempt_parses_stored_array() {
        let raw = r#"[{"email":"a@b.com","timestamp":1000,"success":false},
                      {"email":"c@d.com","timestamp":2000,"success":true}]"#;
        let attempts: Vec<LoginAttempt> = serde_json::from_str(raw).unwrap();
        assert_eq!(attempts.len(), 2);
        assert_eq!(attempts[0].timestamp, at_ms(1000));
        assert!(attempts[0].is_failure());
        assert!(attempts[1].succeeded);
    }

    #[test]
    fn test_matches_ignores_case() {
        let attempt = LoginAttempt::new("A@B.com", at_ms(0), false);
        assert!(attempt.matches(&normalize_identifier("a@b.COM")));
        assert!(!attempt.matches(&normalize_identifier("a@b.org")));
    }

    #[test]
    fn test_retry_after_seconds_rounds_up() {
        let state = LockoutState {
            identifier: "x@y.com".to_string(),
            locked_until: at_ms(0) + Duration::minutes(15),
            failed_count: 5,
        };
        assert_eq!(state.retry_after_seconds(at_ms(1_000)), 899);
        assert_eq!(state.retry_after_seconds(at_ms(1_500)), 899);
        assert_eq!(state.retry_after_seconds(at_ms(1_001)), 899);
        assert_eq!(state.retry_after_seconds(at_ms(999)), 900);
        assert_eq!(state.retry_after_seconds(at_ms(900_000)), 0);
        assert_eq!(state.retry_after_seconds(at_ms(1_000_000)), 0);
    }

    #[test]
    fn test_security_info_serializes_camel_case() {
        let info = SecurityInfo {
            is_locked: true,
            lockout_time_remaining: 65,
            lockout_time_formatted: "1:05".to_string(),
            remaining_attempts: 0,
            attempt_delay: 0,
            should_wait: false,
        };
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["isLocked"], true);
        assert_eq!(json["lockoutTimeFormatted"], "1:05");
        assert_eq!(json["remainingAttempts"], 0);
    }
}
