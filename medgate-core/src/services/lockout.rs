//! In-memory lockout tracking for repeated failed logins.
//!
//! Each username moves through three states:
//!
//! - **Unknown**: no record; never locked.
//! - **Tracking(n)**: `n` failures recorded, below the threshold.
//! - **Locked(at)**: threshold reached at `at`.
//!
//! A lock is lifted lazily: the first [`LockoutTracker::is_locked`] or
//! [`LockoutTracker::status`] call made after the lockout period has elapsed
//! moves the record back to `Tracking(0)`. There is no background sweep, so
//! records for usernames that never log in successfully stay in memory.
//!
//! # Example
//!
//! ```rust
//! use medgate_core::{LockoutConfig, services::LockoutTracker};
//!
//! let tracker = LockoutTracker::new(LockoutConfig::default());
//!
//! for _ in 0..5 {
//!     tracker.record_failed_attempt("alice");
//! }
//! assert!(tracker.is_locked("alice"));
//!
//! tracker.reset_attempts("alice");
//! assert!(!tracker.is_locked("alice"));
//! ```

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use chrono::{DateTime, Utc};

use crate::{
    clock::{Clock, SystemClock},
    lockout::{LockoutConfig, LockoutStatus, LoginAttemptRecord},
};

/// Tracks failed login attempts per username and decides lock state.
///
/// # Thread Safety
///
/// Every operation holds a single mutex over the whole map for its full
/// read-modify-write, so concurrent failures for the same username are never
/// lost. Share one instance behind an `Arc`.
pub struct LockoutTracker {
    config: LockoutConfig,
    clock: Arc<dyn Clock>,
    records: Mutex<HashMap<String, LoginAttemptRecord>>,
}

impl LockoutTracker {
    /// Create a tracker that reads the system clock.
    pub fn new(config: LockoutConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a tracker with an explicit time source.
    pub fn with_clock(config: LockoutConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            records: Mutex::new(HashMap::new()),
        }
    }

    /// Get the current configuration.
    pub fn config(&self) -> &LockoutConfig {
        &self.config
    }

    /// Check if lockout tracking is enabled.
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Check whether `username` is currently locked.
    ///
    /// If the lock has expired, the record is reset to zero failures as a side
    /// effect and `false` is returned.
    pub fn is_locked(&self, username: &str) -> bool {
        if !self.config.enabled {
            return false;
        }

        let now = self.clock.now();
        let mut records = self.records();
        match records.get_mut(username) {
            Some(record) => self.check_lock(username, record, now),
            None => false,
        }
    }

    /// Get the lockout status for `username`.
    ///
    /// Applies the same lazy expiry as [`is_locked`](Self::is_locked).
    pub fn status(&self, username: &str) -> LockoutStatus {
        if !self.config.enabled {
            return LockoutStatus::unlocked(username, 0);
        }

        let now = self.clock.now();
        let mut records = self.records();
        match records.get_mut(username) {
            Some(record) => {
                self.check_lock(username, record, now);
                self.snapshot(username, record)
            }
            None => LockoutStatus::unlocked(username, 0),
        }
    }

    /// Record one failed login attempt for `username`.
    ///
    /// Reaching the threshold locks the username and stamps the lock time.
    /// Every call counts; repeated calls are not deduplicated.
    ///
    /// # Returns
    ///
    /// The status after the attempt was counted.
    pub fn record_failed_attempt(&self, username: &str) -> LockoutStatus {
        if !self.config.enabled {
            return LockoutStatus::unlocked(username, 0);
        }

        let now = self.clock.now();
        let mut records = self.records();
        let record = records.entry(username.to_string()).or_default();

        if record.register_failure(self.config.max_failed_attempts, now) {
            tracing::info!(
                username = %username,
                failed_attempts = record.failed_count,
                "Account locked after repeated failed logins"
            );
        } else {
            tracing::debug!(
                username = %username,
                failed_attempts = record.failed_count,
                "Recorded failed login attempt"
            );
        }

        self.snapshot(username, record)
    }

    /// Seconds until `username` may try again, by this tracker's clock.
    ///
    /// `None` when the username is not locked.
    pub fn retry_after_seconds(&self, username: &str) -> Option<i64> {
        let status = self.status(username);
        status.retry_after_seconds(self.clock.now())
    }

    /// Forget everything recorded for `username`.
    ///
    /// Called after a successful login. Any lock and partial count are gone;
    /// a fresh run of failures is needed to lock again.
    pub fn reset_attempts(&self, username: &str) {
        if self.records().remove(username).is_some() {
            tracing::debug!(username = %username, "Cleared failed login attempts");
        }
    }

    /// Administratively unlock `username`.
    ///
    /// # Returns
    ///
    /// `true` if the username was locked when the call was made.
    pub fn unlock_account(&self, username: &str) -> bool {
        let was_locked = self.is_locked(username);
        self.reset_attempts(username);
        if was_locked {
            tracing::info!(username = %username, "Account unlocked by administrator");
        }
        was_locked
    }

    /// Number of usernames with a live record.
    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A copy of the record held for `username`, if any.
    pub fn record(&self, username: &str) -> Option<LoginAttemptRecord> {
        self.records().get(username).cloned()
    }

    fn records(&self) -> MutexGuard<'_, HashMap<String, LoginAttemptRecord>> {
        // A panic while holding the lock cannot leave a record half-updated,
        // so a poisoned map is still usable.
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_lock(
        &self,
        username: &str,
        record: &mut LoginAttemptRecord,
        now: DateTime<Utc>,
    ) -> bool {
        if !record.is_locked() {
            return false;
        }

        if record.lock_expired(self.config.lockout_period, now) {
            record.unlock();
            tracing::info!(username = %username, "Lockout period expired");
            return false;
        }

        true
    }

    fn snapshot(&self, username: &str, record: &LoginAttemptRecord) -> LockoutStatus {
        match record.locked_at {
            Some(at) => LockoutStatus {
                username: username.to_string(),
                failed_attempts: record.failed_count,
                is_locked: true,
                // Saturates for periods that run past the calendar's end.
                locked_until: Some(
                    at.checked_add_signed(self.config.lockout_period)
                        .unwrap_or(DateTime::<Utc>::MAX_UTC),
                ),
            },
            None => LockoutStatus::unlocked(username, record.failed_count),
        }
    }
}

impl Default for LockoutTracker {
    fn default() -> Self {
        Self::new(LockoutConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::lockout::MAX_LOCKOUT_DAYS;
    use chrono::Duration;

    fn tracker_with_clock() -> (LockoutTracker, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        let tracker = LockoutTracker::with_clock(LockoutConfig::default(), clock.clone());
        (tracker, clock)
    }

    fn fail(tracker: &LockoutTracker, username: &str, times: usize) {
        for _ in 0..times {
            tracker.record_failed_attempt(username);
        }
    }

    #[test]
    fn test_unknown_username_is_not_locked() {
        let tracker = LockoutTracker::default();
        assert!(!tracker.is_locked("nobody"));
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_four_failures_do_not_lock() {
        let tracker = LockoutTracker::default();
        fail(&tracker, "alice", 4);

        assert!(!tracker.is_locked("alice"));
        assert_eq!(tracker.status("alice").failed_attempts, 4);
    }

    #[test]
    fn test_fifth_failure_locks() {
        let tracker = LockoutTracker::default();
        fail(&tracker, "alice", 4);

        let status = tracker.record_failed_attempt("alice");
        assert!(status.is_locked);
        assert_eq!(status.failed_attempts, 5);
        assert!(status.locked_until.is_some());
        assert!(tracker.is_locked("alice"));
    }

    #[test]
    fn test_record_created_lazily_with_count_one() {
        let tracker = LockoutTracker::default();
        let status = tracker.record_failed_attempt("alice");

        assert!(!status.is_locked);
        assert_eq!(status.failed_attempts, 1);
        assert_eq!(
            tracker.record("alice"),
            Some(LoginAttemptRecord {
                failed_count: 1,
                locked_at: None
            })
        );
    }

    #[test]
    fn test_reset_removes_record_and_requires_full_run_to_relock() {
        let tracker = LockoutTracker::default();
        fail(&tracker, "alice", 5);
        assert!(tracker.is_locked("alice"));

        tracker.reset_attempts("alice");
        assert!(!tracker.is_locked("alice"));
        assert!(tracker.record("alice").is_none());

        fail(&tracker, "alice", 4);
        assert!(!tracker.is_locked("alice"));
        fail(&tracker, "alice", 1);
        assert!(tracker.is_locked("alice"));
    }

    #[test]
    fn test_reset_partial_count_does_not_carry_over() {
        let tracker = LockoutTracker::default();
        fail(&tracker, "alice", 3);
        tracker.reset_attempts("alice");

        fail(&tracker, "alice", 3);
        assert!(!tracker.is_locked("alice"));
        assert_eq!(tracker.status("alice").failed_attempts, 3);
    }

    #[test]
    fn test_lock_holds_until_period_elapses() {
        let (tracker, clock) = tracker_with_clock();
        fail(&tracker, "alice", 5);

        clock.advance(Duration::minutes(4));
        assert!(tracker.is_locked("alice"));

        clock.advance(Duration::minutes(1));
        assert!(tracker.is_locked("alice"), "boundary itself is still locked");
    }

    #[test]
    fn test_expired_lock_resets_count_on_read() {
        let (tracker, clock) = tracker_with_clock();
        fail(&tracker, "alice", 5);

        clock.advance(Duration::minutes(5) + Duration::seconds(1));
        assert!(!tracker.is_locked("alice"));
        assert_eq!(
            tracker.record("alice"),
            Some(LoginAttemptRecord {
                failed_count: 0,
                locked_at: None
            })
        );

        // Exactly five more failures are needed to lock again.
        fail(&tracker, "alice", 4);
        assert!(!tracker.is_locked("alice"));
        fail(&tracker, "alice", 1);
        assert!(tracker.is_locked("alice"));
    }

    #[test]
    fn test_expiry_not_observed_without_read() {
        let (tracker, clock) = tracker_with_clock();
        fail(&tracker, "alice", 5);
        clock.advance(Duration::minutes(10));

        // No read has happened, so the record still carries the lock.
        let record = tracker.record("alice").unwrap();
        assert!(record.is_locked());
        assert_eq!(record.failed_count, 5);
    }

    #[test]
    fn test_status_applies_lazy_expiry() {
        let (tracker, clock) = tracker_with_clock();
        fail(&tracker, "alice", 5);
        clock.advance(Duration::minutes(6));

        let status = tracker.status("alice");
        assert!(!status.is_locked);
        assert_eq!(status.failed_attempts, 0);
        assert!(status.locked_until.is_none());
    }

    #[test]
    fn test_failure_while_locked_extends_lock() {
        let (tracker, clock) = tracker_with_clock();
        fail(&tracker, "alice", 5);

        clock.advance(Duration::minutes(4));
        tracker.record_failed_attempt("alice");

        clock.advance(Duration::minutes(4));
        assert!(tracker.is_locked("alice"));
    }

    #[test]
    fn test_locked_until_is_lock_time_plus_period() {
        let (tracker, clock) = tracker_with_clock();
        fail(&tracker, "alice", 4);
        let locked_at = clock.now();

        let status = tracker.record_failed_attempt("alice");
        assert_eq!(status.locked_until, Some(locked_at + Duration::minutes(5)));
    }

    #[test]
    fn test_retry_after_follows_tracker_clock() {
        let (tracker, clock) = tracker_with_clock();
        assert_eq!(tracker.retry_after_seconds("alice"), None);

        fail(&tracker, "alice", 5);
        assert_eq!(tracker.retry_after_seconds("alice"), Some(300));

        clock.advance(Duration::minutes(3));
        assert_eq!(tracker.retry_after_seconds("alice"), Some(120));

        clock.advance(Duration::minutes(2) + Duration::seconds(1));
        assert_eq!(tracker.retry_after_seconds("alice"), None);
    }

    #[test]
    fn test_oversized_period_saturates_locked_until() {
        let clock = Arc::new(ManualClock::default());
        let tracker = LockoutTracker::with_clock(
            LockoutConfig {
                lockout_period: Duration::days(100_000_000),
                ..Default::default()
            },
            clock.clone(),
        );

        fail(&tracker, "alice", 4);
        let status = tracker.record_failed_attempt("alice");
        assert!(status.is_locked);
        assert_eq!(status.locked_until, Some(DateTime::<Utc>::MAX_UTC));

        clock.advance(Duration::days(MAX_LOCKOUT_DAYS * 10));
        assert!(tracker.is_locked("alice"));
        assert!(tracker.status("alice").is_locked);
        assert!(tracker.retry_after_seconds("alice").unwrap() > 0);
    }

    #[test]
    fn test_different_usernames_tracked_separately() {
        let tracker = LockoutTracker::default();
        fail(&tracker, "alice", 5);

        assert!(tracker.is_locked("alice"));
        assert!(!tracker.is_locked("bob"));
        assert_eq!(tracker.status("bob").failed_attempts, 0);
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_unlock_account_returns_was_locked() {
        let tracker = LockoutTracker::default();
        fail(&tracker, "alice", 5);

        assert!(tracker.unlock_account("alice"));
        assert!(!tracker.is_locked("alice"));
        assert!(!tracker.unlock_account("alice"));
    }

    #[test]
    fn test_custom_threshold() {
        let tracker = LockoutTracker::new(LockoutConfig {
            max_failed_attempts: 2,
            ..Default::default()
        });
        fail(&tracker, "alice", 2);
        assert!(tracker.is_locked("alice"));
    }

    #[test]
    fn test_disabled_tracker_never_locks_or_records() {
        let tracker = LockoutTracker::new(LockoutConfig::disabled());
        assert!(!tracker.is_enabled());

        let status = tracker.record_failed_attempt("alice");
        assert!(!status.is_locked);
        assert_eq!(status.failed_attempts, 0);

        fail(&tracker, "alice", 10);
        assert!(!tracker.is_locked("alice"));
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_concurrent_failures_are_not_lost() {
        let tracker = Arc::new(LockoutTracker::new(LockoutConfig {
            max_failed_attempts: 1_000,
            ..Default::default()
        }));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let tracker = Arc::clone(&tracker);
                std::thread::spawn(move || fail(&tracker, "alice", 50))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(tracker.status("alice").failed_attempts, 400);
    }
}
