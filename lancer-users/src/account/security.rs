use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use lancer_shared::clients::email::{verification_email_html, EmailClient};
use lancer_shared::{AppError, AppResult, ErrorCode};

use super::store::{AccountStore, Clock};
use super::verification::{check_code_format, VerificationError, TOKEN_TTL_MINUTES};
use super::{Account, AccountField};
use crate::services::auth_service::verify_password;

const VERIFICATION_SUBJECT: &str = "Verify your Lancer email address";

/// Outbound delivery of verification codes.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<(), String>;
}

#[async_trait]
impl Notifier for EmailClient {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<(), String> {
        self.send_email(recipient, subject, body).await
    }
}

fn invalid_credentials() -> AppError {
    AppError::new(ErrorCode::InvalidCredentials, "invalid email or password")
}

fn login_gate(account: &Account, now: DateTime<Utc>) -> AppResult<()> {
    if account.is_locked(now) {
        metrics::counter!("login_rejected_locked_total").increment(1);
        tracing::warn!(user_id = %account.id, "login attempt on locked account");
        return Err(AppError::new(
            ErrorCode::AccountLocked,
            "account is temporarily locked due to too many failed login attempts",
        ));
    }
    if !account.is_active {
        return Err(AppError::new(ErrorCode::AccountDisabled, "account is disabled"));
    }
    Ok(())
}

/// Applies lockout, verification and completion rules to stored accounts.
pub struct AccountSecurity<S, C> {
    store: S,
    clock: C,
}

impl<S: AccountStore, C: Clock> AccountSecurity<S, C> {
    pub fn new(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Password login with lockout. Unknown email and wrong password are
    /// indistinguishable to the caller; a locked account is rejected before
    /// the password is checked and the attempt is not counted.
    ///
    /// The lock and active checks are repeated on the record returned by
    /// `update`, so a lock applied by a concurrent failure after the lookup
    /// still wins.
    pub fn authenticate(&self, email: &str, password: &str) -> AppResult<Account> {
        let now = self.clock.now();
        let email = email.trim().to_lowercase();

        let Some(account) = self.store.find_by_email(&email)? else {
            tracing::info!("login attempt for unknown email");
            return Err(invalid_credentials());
        };

        login_gate(&account, now)?;

        if !verify_password(password, &account.password_hash)? {
            let (attempts, locked) = self
                .store
                .update(account.id, |acct| {
                    if let Err(e) = login_gate(acct, now) {
                        return (AccountField::NONE, Err(e));
                    }
                    let fields = acct.record_failed_login(now);
                    (fields, Ok((acct.login_attempts, acct.is_locked(now))))
                })??;

            metrics::counter!("login_failures_total").increment(1);
            if locked {
                metrics::counter!("account_lockouts_total").increment(1);
                tracing::warn!(user_id = %account.id, attempts, "account locked after repeated login failures");
            } else {
                tracing::info!(user_id = %account.id, attempts, "failed login attempt");
            }
            return Err(invalid_credentials());
        }

        let account = self.store.update(account.id, |acct| {
            if let Err(e) = login_gate(acct, now) {
                return (AccountField::NONE, Err(e));
            }
            let fields = if acct.login_attempts == 0 && acct.last_failed_login.is_none() {
                AccountField::NONE
            } else {
                acct.reset_login_attempts()
            };
            (fields, Ok(acct.clone()))
        })??;

        tracing::info!(user_id = %account.id, "login succeeded");
        Ok(account)
    }

    /// Issues a fresh code, persists it and sends it. Returns the code.
    ///
    /// The code stays stored when delivery fails; the caller gets
    /// `NotificationFailed` and may ask for a resend.
    pub async fn issue_verification<N>(&self, account_id: Uuid, notifier: &N) -> AppResult<String>
    where
        N: Notifier + ?Sized,
    {
        let now = self.clock.now();
        let (email, code) = self.store.update(account_id, |acct| {
            let mut rng = rand::thread_rng();
            match acct.issue_verification_token(now, &mut rng) {
                Ok(code) => (AccountField::VERIFICATION_TOKEN, Ok((acct.email.clone(), code))),
                Err(e) => (AccountField::NONE, Err(e)),
            }
        })??;

        let body = verification_email_html(&code, TOKEN_TTL_MINUTES);
        if let Err(e) = notifier.send(&email, VERIFICATION_SUBJECT, &body).await {
            tracing::error!(user_id = %account_id, error = %e, "failed to send verification email");
            return Err(AppError::new(
                ErrorCode::NotificationFailed,
                "failed to send verification email, please try again later",
            ));
        }

        metrics::counter!("verification_codes_issued_total").increment(1);
        tracing::info!(user_id = %account_id, "verification code issued");
        Ok(code)
    }

    pub fn verify_code(&self, account_id: Uuid, code: &str) -> AppResult<()> {
        check_code_format(code)?;
        let now = self.clock.now();

        let result = self.store.update(account_id, |acct| match acct.verify_email_code(code, now) {
            Ok(()) => (AccountField::VERIFIED, Ok(())),
            Err(VerificationError::Expired) => {
                (AccountField::VERIFICATION_TOKEN, Err(VerificationError::Expired))
            }
            Err(e) => (AccountField::NONE, Err(e)),
        })?;

        match result {
            Ok(()) => {
                metrics::counter!("email_verifications_total").increment(1);
                tracing::info!(user_id = %account_id, "email verified");
                Ok(())
            }
            Err(e) => {
                tracing::info!(user_id = %account_id, reason = %e, "email verification rejected");
                Err(e.into())
            }
        }
    }

    pub fn clear_verification(&self, account_id: Uuid) -> AppResult<()> {
        self.store.update(account_id, |acct| {
            if acct.email_verification_token.is_none() && acct.email_verification_expires.is_none() {
                return (AccountField::NONE, ());
            }
            acct.clear_verification_token();
            (AccountField::VERIFICATION_TOKEN, ())
        })
    }

    /// Recomputes the cached completion score and returns it.
    pub fn refresh_completion(&self, account_id: Uuid) -> AppResult<i32> {
        self.store.update(account_id, |acct| {
            let (pct, fields) = acct.refresh_completion();
            (fields, pct)
        })
    }
}
