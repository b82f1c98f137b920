//! Lockout configuration and per-username attempt state.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Longest lockout period a configuration may set.
pub const MAX_LOCKOUT_DAYS: i64 = 365;

/// Configuration for brute force lockout.
///
/// # Example
///
/// ```rust
/// use chrono::Duration;
/// use medgate_core::LockoutConfig;
///
/// let config = LockoutConfig {
///     max_failed_attempts: 3,
///     lockout_period: Duration::minutes(10),
///     ..Default::default()
/// };
/// assert!(config.enabled);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockoutConfig {
    /// When false, attempts are neither recorded nor enforced.
    pub enabled: bool,
    /// Number of failed attempts that locks the username.
    pub max_failed_attempts: u32,
    /// How long a lock lasts once set.
    pub lockout_period: Duration,
}

impl Default for LockoutConfig {
    /// Five attempts, five minute lock.
    fn default() -> Self {
        Self {
            enabled: true,
            max_failed_attempts: 5,
            lockout_period: Duration::minutes(5),
        }
    }
}

impl LockoutConfig {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    /// Whether `period` is usable as a lockout period: positive and at most
    /// [`MAX_LOCKOUT_DAYS`] long.
    pub fn is_valid_period(period: Duration) -> bool {
        period > Duration::zero() && period <= Duration::days(MAX_LOCKOUT_DAYS)
    }

    /// Check that an enabled policy can actually lock and unlock.
    ///
    /// A disabled policy is always valid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.enabled {
            return Ok(());
        }
        if self.max_failed_attempts == 0 {
            return Err(ValidationError::InvalidField(
                "max_failed_attempts must be at least 1".to_string(),
            ));
        }
        if !Self::is_valid_period(self.lockout_period) {
            return Err(ValidationError::InvalidField(format!(
                "lockout_period must be positive and at most {MAX_LOCKOUT_DAYS} days"
            )));
        }
        Ok(())
    }
}

/// Tracked state for one username.
///
/// `locked_at` is `Some` exactly when the record is locked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginAttemptRecord {
    pub failed_count: u32,
    pub locked_at: Option<DateTime<Utc>>,
}

impl LoginAttemptRecord {
    pub fn is_locked(&self) -> bool {
        self.locked_at.is_some()
    }

    /// Count one failure, (re)stamping the lock at `now` once `threshold` is reached.
    ///
    /// Returns true if this call moved the record from unlocked to locked.
    pub(crate) fn register_failure(&mut self, threshold: u32, now: DateTime<Utc>) -> bool {
        self.failed_count = self.failed_count.saturating_add(1);
        if self.failed_count < threshold {
            return false;
        }
        let newly_locked = !self.is_locked();
        self.locked_at = Some(now);
        newly_locked
    }

    /// Whether the lock set on this record has run its course at `now`.
    pub(crate) fn lock_expired(&self, period: Duration, now: DateTime<Utc>) -> bool {
        self.locked_at.is_some_and(|at| now - at > period)
    }

    pub(crate) fn unlock(&mut self) {
        self.failed_count = 0;
        self.locked_at = None;
    }
}

/// Point-in-time view of a username's lockout state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockoutStatus {
    pub username: String,
    pub failed_attempts: u32,
    pub is_locked: bool,
    pub locked_until: Option<DateTime<Utc>>,
}

impl LockoutStatus {
    pub(crate) fn unlocked(username: &str, failed_attempts: u32) -> Self {
        Self {
            username: username.to_string(),
            failed_attempts,
            is_locked: false,
            locked_until: None,
        }
    }

    /// Seconds from `now` until the lock lifts.
    ///
    /// `None` when not locked. Pass the same clock reading the tracker uses,
    /// see [`LockoutTracker::retry_after_seconds`](crate::LockoutTracker::retry_after_seconds).
    pub fn retry_after_seconds(&self, now: DateTime<Utc>) -> Option<i64> {
        self.locked_until
            .filter(|_| self.is_locked)
            .map(|until| (until - now).num_seconds().max(0))
    }
}
