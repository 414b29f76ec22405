use chrono::{DateTime, Duration, Utc};

use super::{Account, AccountField};

/// Consecutive failures that lock the account.
pub const MAX_LOGIN_ATTEMPTS: i32 = 5;
pub const LOCKOUT_MINUTES: i64 = 30;

impl Account {
    /// Locked while `account_locked_until` lies strictly in the future. A past
    /// deadline is left in place but no longer blocks.
    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        matches!(self.account_locked_until, Some(until) if until > now)
    }

    pub fn can_login(&self, now: DateTime<Utc>) -> bool {
        !self.is_locked(now) && self.is_active
    }

    /// Counts a failed credential check, locking the account once the
    /// threshold is reached. Returns the fields that changed.
    pub fn record_failed_login(&mut self, now: DateTime<Utc>) -> &'static [AccountField] {
        self.login_attempts = self.login_attempts.saturating_add(1);
        self.last_failed_login = Some(now);

        if self.login_attempts >= MAX_LOGIN_ATTEMPTS {
            self.account_locked_until = Some(now + Duration::minutes(LOCKOUT_MINUTES));
            AccountField::FAILED_LOGIN_LOCKED
        } else {
            AccountField::FAILED_LOGIN
        }
    }

    /// Clears the failure counter after a successful login. The lock deadline
    /// is not touched.
    pub fn reset_login_attempts(&mut self) -> &'static [AccountField] {
        self.login_attempts = 0;
        self.last_failed_login = None;
        AccountField::FAILED_LOGIN
    }
}
