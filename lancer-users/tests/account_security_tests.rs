use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use uuid::Uuid;

use lancer_shared::types::auth::UserType;
use lancer_shared::{AppError, AppResult, ErrorCode};
use lancer_users::account::{
    Account, AccountField, AccountSecurity, AccountStore, Clock, Notifier, VerificationState,
    LOCKOUT_MINUTES, MAX_LOGIN_ATTEMPTS,
};
use lancer_users::services::auth_service::hash_password;

const PASSWORD: &str = "correct-horse-1";

#[derive(Default)]
struct MemoryStore {
    accounts: Mutex<HashMap<Uuid, Account>>,
}

impl MemoryStore {
    fn insert(&self, account: Account) {
        self.accounts.lock().unwrap().insert(account.id, account);
    }

    fn snapshot(&self, id: Uuid) -> Account {
        self.accounts.lock().unwrap().get(&id).cloned().unwrap()
    }
}

impl AccountStore for MemoryStore {
    fn get(&self, id: Uuid) -> AppResult<Account> {
        self.accounts
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::new(ErrorCode::UserNotFound, "user not found"))
    }

    fn find_by_email(&self, email: &str) -> AppResult<Option<Account>> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .values()
            .find(|a| a.email == email)
            .cloned())
    }

    fn save(&self, account: &Account, fields: &[AccountField]) -> AppResult<()> {
        let mut accounts = self.accounts.lock().unwrap();
        let stored = accounts
            .get_mut(&account.id)
            .ok_or_else(|| AppError::new(ErrorCode::UserNotFound, "user not found"))?;
        for field in fields {
            match field {
                AccountField::LoginAttempts => stored.login_attempts = account.login_attempts,
                AccountField::LastFailedLogin => stored.last_failed_login = account.last_failed_login,
                AccountField::AccountLockedUntil => stored.account_locked_until = account.account_locked_until,
                AccountField::IsVerified => stored.is_verified = account.is_verified,
                AccountField::EmailVerificationToken => {
                    stored.email_verification_token = account.email_verification_token.clone()
                }
                AccountField::EmailVerificationExpires => {
                    stored.email_verification_expires = account.email_verification_expires
                }
                AccountField::ProfileCompletionPercentage => {
                    stored.profile_completion_percentage = account.profile_completion_percentage
                }
            }
        }
        Ok(())
    }
}

#[derive(Clone)]
struct ManualClock(Arc<Mutex<DateTime<Utc>>>);

impl ManualClock {
    fn start() -> Self {
        Self(Arc::new(Mutex::new(Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap())))
    }

    fn advance(&self, by: Duration) {
        *self.0.lock().unwrap() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<(String, String, String)>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<(), String> {
        self.sent
            .lock()
            .unwrap()
            .push((recipient.to_string(), subject.to_string(), body.to_string()));
        Ok(())
    }
}

struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn send(&self, _recipient: &str, _subject: &str, _body: &str) -> Result<(), String> {
        Err("smtp unavailable".into())
    }
}

struct Harness {
    security: AccountSecurity<MemoryStore, ManualClock>,
    clock: ManualClock,
    id: Uuid,
}

impl Harness {
    fn new(user_type: UserType) -> Self {
        let clock = ManualClock::start();
        let store = MemoryStore::default();
        let account = Account::new("dev@example.com", hash_password(PASSWORD).unwrap(), user_type);
        let id = account.id;
        store.insert(account);
        Self { security: AccountSecurity::new(store, clock.clone()), clock, id }
    }

    fn account(&self) -> Account {
        self.security.store().snapshot(self.id)
    }

    fn fail_login(&self) -> ErrorCode {
        self.security
            .authenticate("dev@example.com", "wrong-password-9")
            .unwrap_err()
            .code()
            .unwrap()
    }
}

#[test]
fn fifth_failure_locks_for_thirty_minutes() {
    let h = Harness::new(UserType::Freelancer);

    for attempt in 1..MAX_LOGIN_ATTEMPTS {
        assert_eq!(h.fail_login(), ErrorCode::InvalidCredentials);
        let acct = h.account();
        assert_eq!(acct.login_attempts, attempt);
        assert!(acct.account_locked_until.is_none());
    }

    assert_eq!(h.fail_login(), ErrorCode::InvalidCredentials);
    let acct = h.account();
    assert_eq!(acct.login_attempts, MAX_LOGIN_ATTEMPTS);
    assert_eq!(
        acct.account_locked_until,
        Some(h.clock.now() + Duration::minutes(LOCKOUT_MINUTES))
    );
}

#[test]
fn locked_account_rejects_correct_password_without_counting() {
    let h = Harness::new(UserType::Client);
    for _ in 0..MAX_LOGIN_ATTEMPTS {
        h.fail_login();
    }

    let err = h.security.authenticate("dev@example.com", PASSWORD).unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::AccountLocked));
    assert_eq!(h.fail_login(), ErrorCode::AccountLocked);
    assert_eq!(h.account().login_attempts, MAX_LOGIN_ATTEMPTS);
}

#[test]
fn lock_expires_and_success_resets_counter() {
    let h = Harness::new(UserType::Client);
    for _ in 0..MAX_LOGIN_ATTEMPTS {
        h.fail_login();
    }
    let locked_until = h.account().account_locked_until;

    h.clock.advance(Duration::minutes(LOCKOUT_MINUTES) + Duration::seconds(1));
    let account = h.security.authenticate("  DEV@example.com ", PASSWORD).unwrap();
    assert_eq!(account.login_attempts, 0);

    let stored = h.account();
    assert_eq!(stored.login_attempts, 0);
    assert!(stored.last_failed_login.is_none());
    assert_eq!(stored.account_locked_until, locked_until);
}

#[test]
fn failure_after_expired_lock_relocks() {
    let h = Harness::new(UserType::Client);
    for _ in 0..MAX_LOGIN_ATTEMPTS {
        h.fail_login();
    }
    h.clock.advance(Duration::minutes(LOCKOUT_MINUTES + 1));

    assert_eq!(h.fail_login(), ErrorCode::InvalidCredentials);
    let acct = h.account();
    assert_eq!(acct.login_attempts, MAX_LOGIN_ATTEMPTS + 1);
    assert!(acct.is_locked(h.clock.now()));
}

#[test]
fn success_before_threshold_resets_counter() {
    let h = Harness::new(UserType::Freelancer);
    for _ in 0..3 {
        h.fail_login();
    }
    h.security.authenticate("dev@example.com", PASSWORD).unwrap();
    assert_eq!(h.account().login_attempts, 0);

    for _ in 0..MAX_LOGIN_ATTEMPTS - 1 {
        h.fail_login();
    }
    assert!(!h.account().is_locked(h.clock.now()));
}

#[test]
fn unknown_email_and_disabled_account() {
    let h = Harness::new(UserType::Client);
    let err = h.security.authenticate("nobody@example.com", PASSWORD).unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::InvalidCredentials));

    let mut acct = h.account();
    acct.is_active = false;
    h.security.store().insert(acct);

    let err = h.security.authenticate("dev@example.com", PASSWORD).unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::AccountDisabled));
    assert_eq!(h.account().login_attempts, 0);
}

#[tokio::test]
async fn issued_code_is_sent_and_verifies_once() {
    let h = Harness::new(UserType::Freelancer);
    let notifier = RecordingNotifier::default();

    let first = h.security.issue_verification(h.id, &notifier).await.unwrap();
    let second = h.security.issue_verification(h.id, &notifier).await.unwrap();

    let acct = h.account();
    assert_eq!(acct.email_verification_token.as_deref(), Some(second.as_str()));
    assert_eq!(acct.verification_state(h.clock.now()), VerificationState::Pending);

    {
        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1].0, "dev@example.com");
        assert!(sent[1].2.contains(&second));
    }

    if first != second {
        let err = h.security.verify_code(h.id, &first).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::VerificationCodeInvalid));
    }

    h.security.verify_code(h.id, &second).unwrap();
    let acct = h.account();
    assert!(acct.is_verified);
    assert!(acct.email_verification_token.is_none());
    assert!(acct.email_verification_expires.is_none());

    let err = h.security.verify_code(h.id, &second).unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::AlreadyVerified));

    let err = h.security.issue_verification(h.id, &notifier).await.unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::AlreadyVerified));
}

#[test]
fn malformed_codes_rejected_before_lookup() {
    let h = Harness::new(UserType::Client);
    for code in ["12a456", "12345", "", "1234567"] {
        let err = h.security.verify_code(h.id, code).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::VerificationCodeFormat), "code {code:?}");
    }
    let err = h.security.verify_code(h.id, "123456").unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::VerificationCodeMissing));
}

#[tokio::test]
async fn expired_code_is_cleared() {
    let h = Harness::new(UserType::Client);
    let notifier = RecordingNotifier::default();
    let code = h.security.issue_verification(h.id, &notifier).await.unwrap();

    h.clock.advance(Duration::minutes(16));
    let err = h.security.verify_code(h.id, &code).unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::VerificationCodeExpired));

    let acct = h.account();
    assert!(acct.email_verification_token.is_none());
    assert!(!acct.is_verified);

    let err = h.security.verify_code(h.id, &code).unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::VerificationCodeMissing));
}

#[tokio::test]
async fn failed_delivery_keeps_stored_code() {
    let h = Harness::new(UserType::Client);
    let err = h.security.issue_verification(h.id, &FailingNotifier).await.unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::NotificationFailed));

    let acct = h.account();
    assert_eq!(acct.verification_state(h.clock.now()), VerificationState::Pending);

    let code = acct.email_verification_token.unwrap();
    h.security.verify_code(h.id, &code).unwrap();
    assert!(h.account().is_verified);
}

#[tokio::test]
async fn clear_verification_drops_outstanding_code() {
    let h = Harness::new(UserType::Client);
    h.security
        .issue_verification(h.id, &RecordingNotifier::default())
        .await
        .unwrap();

    h.security.clear_verification(h.id).unwrap();
    assert_eq!(h.account().verification_state(h.clock.now()), VerificationState::NoToken);
}

#[test]
fn completion_is_cached_and_idempotent() {
    let h = Harness::new(UserType::Freelancer);
    let mut acct = h.account();
    acct.first_name = Some("Ada".into());
    acct.last_name = Some("Lovelace".into());
    h.security.store().insert(acct);

    assert_eq!(h.security.refresh_completion(h.id).unwrap(), 18);
    assert_eq!(h.account().profile_completion_percentage, 18);
    assert_eq!(h.security.refresh_completion(h.id).unwrap(), 18);
}

#[test]
fn missing_account_is_not_found() {
    let h = Harness::new(UserType::Client);
    let err = h.security.refresh_completion(Uuid::new_v4()).unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::UserNotFound));
}

/// Serves a fixed, outdated record from `find_by_email` while reads inside
/// `update` see the live row. Models a lock landing between lookup and update.
struct LaggingStore {
    live: MemoryStore,
    lookup: Account,
}

impl AccountStore for LaggingStore {
    fn get(&self, id: Uuid) -> AppResult<Account> {
        self.live.get(id)
    }

    fn find_by_email(&self, _email: &str) -> AppResult<Option<Account>> {
        Ok(Some(self.lookup.clone()))
    }

    fn save(&self, account: &Account, fields: &[AccountField]) -> AppResult<()> {
        self.live.save(account, fields)
    }
}

fn lock_lands_after_lookup() -> (AccountSecurity<LaggingStore, ManualClock>, Account) {
    let clock = ManualClock::start();
    let mut lookup = Account::new("dev@example.com", hash_password(PASSWORD).unwrap(), UserType::Client);
    for _ in 1..MAX_LOGIN_ATTEMPTS {
        lookup.record_failed_login(clock.now() - Duration::seconds(1));
    }
    let mut live = lookup.clone();
    live.record_failed_login(clock.now() - Duration::seconds(1));
    assert!(live.is_locked(clock.now()));
    assert!(!lookup.is_locked(clock.now()));

    let store = MemoryStore::default();
    store.insert(live.clone());
    (AccountSecurity::new(LaggingStore { live: store, lookup }, clock), live)
}

#[test]
fn concurrent_lock_rejects_wrong_password_without_counting() {
    let (security, before) = lock_lands_after_lookup();

    let err = security.authenticate("dev@example.com", "wrong-password-9").unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::AccountLocked));

    let after = security.store().live.snapshot(before.id);
    assert_eq!(after.login_attempts, MAX_LOGIN_ATTEMPTS);
    assert_eq!(after.account_locked_until, before.account_locked_until);
    assert_eq!(after.last_failed_login, before.last_failed_login);
}

#[test]
fn concurrent_lock_rejects_correct_password() {
    let (security, before) = lock_lands_after_lookup();

    let err = security.authenticate("dev@example.com", PASSWORD).unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::AccountLocked));

    let after = security.store().live.snapshot(before.id);
    assert_eq!(after.login_attempts, MAX_LOGIN_ATTEMPTS);
    assert_eq!(after.account_locked_until, before.account_locked_until);
}
