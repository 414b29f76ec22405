//! Account security core.
//!
//! Owns the per-user state machines that every entry point (login, email
//! verification, profile editing) mutates: consecutive failed-login tracking
//! and lockout, the email verification code lifecycle, and the cached profile
//! completion score. The rules themselves are pure methods on [`Account`];
//! [`AccountSecurity`] applies them through an [`AccountStore`] so that each
//! read-modify-write lands as one atomic update of the user row.

mod completion;
mod lockout;
mod rating;
mod security;
mod store;
mod verification;

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use lancer_shared::types::auth::UserType;

use crate::schema::users;

pub use completion::{completion_percentage, missing_fields, ChecklistItem, Role};
pub use lockout::{LOCKOUT_MINUTES, MAX_LOGIN_ATTEMPTS};
pub use rating::{fold_rating, RatingError, MAX_RATING};
pub use security::{AccountSecurity, Notifier};
pub use store::{AccountStore, Clock, PgAccountStore, SystemClock};
pub use verification::{
    check_code_format, generate_code, VerificationError, VerificationState, CODE_LENGTH,
    TOKEN_TTL_MINUTES,
};

/// The slice of a `users` row the security core reads and writes.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub user_type: String,
    pub is_active: bool,

    pub login_attempts: i32,
    pub last_failed_login: Option<DateTime<Utc>>,
    pub account_locked_until: Option<DateTime<Utc>>,

    pub is_verified: bool,
    pub email_verification_token: Option<String>,
    pub email_verification_expires: Option<DateTime<Utc>>,

    pub profile_completion_percentage: i32,

    // completion inputs
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub phone_number: Option<String>,
    pub profile_picture: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub title: Option<String>,
    pub skills: Vec<String>,
    pub experience_level: Option<String>,
    pub hourly_rate_cents: Option<i64>,
    pub portfolio_url: Option<String>,
    pub company_name: Option<String>,
    pub company_size: Option<String>,
    pub industry: Option<String>,
}

impl Account {
    /// A freshly registered account: no failed attempts, no lock, unverified, no token.
    pub fn new(email: impl Into<String>, password_hash: impl Into<String>, user_type: UserType) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.into(),
            password_hash: password_hash.into(),
            user_type: user_type.as_str().to_string(),
            is_active: true,
            login_attempts: 0,
            last_failed_login: None,
            account_locked_until: None,
            is_verified: false,
            email_verification_token: None,
            email_verification_expires: None,
            profile_completion_percentage: 0,
            first_name: None,
            last_name: None,
            bio: None,
            phone_number: None,
            profile_picture: None,
            country: None,
            city: None,
            title: None,
            skills: Vec::new(),
            experience_level: None,
            hourly_rate_cents: None,
            portfolio_url: None,
            company_name: None,
            company_size: None,
            industry: None,
        }
    }

    /// Parsed `user_type`. An unrecognised stored value is logged and scored
    /// as a client.
    pub fn kind(&self) -> UserType {
        match self.user_type.parse() {
            Ok(kind) => kind,
            Err(e) => {
                tracing::warn!(user_id = %self.id, user_type = %self.user_type, error = %e, "unrecognised user type");
                UserType::Client
            }
        }
    }
}

/// Persisted security fields. A save names exactly the fields it changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountField {
    LoginAttempts,
    LastFailedLogin,
    AccountLockedUntil,
    IsVerified,
    EmailVerificationToken,
    EmailVerificationExpires,
    ProfileCompletionPercentage,
}

impl AccountField {
    pub const NONE: &'static [AccountField] = &[];
    pub const FAILED_LOGIN: &'static [AccountField] =
        &[AccountField::LoginAttempts, AccountField::LastFailedLogin];
    pub const FAILED_LOGIN_LOCKED: &'static [AccountField] = &[
        AccountField::LoginAttempts,
        AccountField::LastFailedLogin,
        AccountField::AccountLockedUntil,
    ];
    pub const VERIFICATION_TOKEN: &'static [AccountField] = &[
        AccountField::EmailVerificationToken,
        AccountField::EmailVerificationExpires,
    ];
    pub const VERIFIED: &'static [AccountField] = &[
        AccountField::IsVerified,
        AccountField::EmailVerificationToken,
        AccountField::EmailVerificationExpires,
    ];
    pub const COMPLETION: &'static [AccountField] = &[AccountField::ProfileCompletionPercentage];
}
