use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use lancer_shared::clients::db::{checkout, DbPool};
use lancer_shared::{AppError, AppResult, ErrorCode};

use super::{Account, AccountField};
use crate::schema::users;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Persistence for [`Account`] records.
///
/// `save` writes only the listed fields. `update` is the read-modify-write
/// primitive the security rules go through; implementations backed by a
/// shared database must run it atomically per account.
pub trait AccountStore: Send + Sync {
    fn get(&self, id: Uuid) -> AppResult<Account>;

    fn find_by_email(&self, email: &str) -> AppResult<Option<Account>>;

    fn save(&self, account: &Account, fields: &[AccountField]) -> AppResult<()>;

    fn update<T, F>(&self, id: Uuid, f: F) -> AppResult<T>
    where
        F: FnOnce(&mut Account) -> (&'static [AccountField], T),
    {
        let mut account = self.get(id)?;
        let (fields, out) = f(&mut account);
        if !fields.is_empty() {
            self.save(&account, fields)?;
        }
        Ok(out)
    }
}

fn account_not_found() -> AppError {
    AppError::new(ErrorCode::UserNotFound, "user not found")
}

#[derive(Debug, Default, AsChangeset)]
#[diesel(table_name = users)]
struct AccountChangeset {
    login_attempts: Option<i32>,
    last_failed_login: Option<Option<DateTime<Utc>>>,
    account_locked_until: Option<Option<DateTime<Utc>>>,
    is_verified: Option<bool>,
    email_verification_token: Option<Option<String>>,
    email_verification_expires: Option<Option<DateTime<Utc>>>,
    profile_completion_percentage: Option<i32>,
}

impl AccountChangeset {
    fn new(account: &Account, fields: &[AccountField]) -> Self {
        let mut changes = Self::default();
        for field in fields {
            match field {
                AccountField::LoginAttempts => changes.login_attempts = Some(account.login_attempts),
                AccountField::LastFailedLogin => changes.last_failed_login = Some(account.last_failed_login),
                AccountField::AccountLockedUntil => {
                    changes.account_locked_until = Some(account.account_locked_until)
                }
                AccountField::IsVerified => changes.is_verified = Some(account.is_verified),
                AccountField::EmailVerificationToken => {
                    changes.email_verification_token = Some(account.email_verification_token.clone())
                }
                AccountField::EmailVerificationExpires => {
                    changes.email_verification_expires = Some(account.email_verification_expires)
                }
                AccountField::ProfileCompletionPercentage => {
                    changes.profile_completion_percentage = Some(account.profile_completion_percentage)
                }
            }
        }
        changes
    }
}

/// Postgres-backed store. `update` locks the row with `SELECT ... FOR UPDATE`
/// inside a transaction.
#[derive(Clone)]
pub struct PgAccountStore {
    pool: DbPool,
}

impl PgAccountStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn write(conn: &mut PgConnection, account: &Account, fields: &[AccountField]) -> AppResult<()> {
        let changes = AccountChangeset::new(account, fields);
        let updated = diesel::update(users::table.find(account.id))
            .set((&changes, users::updated_at.eq(Utc::now())))
            .execute(conn)?;
        if updated == 0 {
            return Err(account_not_found());
        }
        Ok(())
    }
}

impl AccountStore for PgAccountStore {
    fn get(&self, id: Uuid) -> AppResult<Account> {
        let mut conn = checkout(&self.pool)?;
        users::table
            .find(id)
            .select(Account::as_select())
            .first(&mut conn)
            .optional()?
            .ok_or_else(account_not_found)
    }

    fn find_by_email(&self, email: &str) -> AppResult<Option<Account>> {
        let mut conn = checkout(&self.pool)?;
        let account = users::table
            .filter(users::email.eq(email))
            .select(Account::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(account)
    }

    fn save(&self, account: &Account, fields: &[AccountField]) -> AppResult<()> {
        if fields.is_empty() {
            return Ok(());
        }
        let mut conn = checkout(&self.pool)?;
        Self::write(&mut conn, account, fields)
    }

    fn update<T, F>(&self, id: Uuid, f: F) -> AppResult<T>
    where
        F: FnOnce(&mut Account) -> (&'static [AccountField], T),
    {
        let mut conn = checkout(&self.pool)?;
        conn.transaction::<T, AppError, _>(|conn| {
            let mut account = users::table
                .find(id)
                .select(Account::as_select())
                .for_update()
                .first(conn)
                .optional()?
                .ok_or_else(account_not_found)?;

            let (fields, out) = f(&mut account);
            if !fields.is_empty() {
                Self::write(conn, &account, fields)?;
            }
            Ok(out)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lancer_shared::types::auth::UserType;

    #[test]
    fn changeset_carries_only_listed_fields() {
        let mut acct = Account::new("x@example.com", "hash", UserType::Client);
        acct.login_attempts = 3;
        acct.is_verified = true;

        let changes = AccountChangeset::new(&acct, AccountField::FAILED_LOGIN);
        assert_eq!(changes.login_attempts, Some(3));
        assert_eq!(changes.last_failed_login, Some(None));
        assert!(changes.is_verified.is_none());
        assert!(changes.account_locked_until.is_none());
    }

    #[test]
    fn cleared_token_is_written_as_null() {
        let acct = Account::new("x@example.com", "hash", UserType::Client);
        let changes = AccountChangeset::new(&acct, AccountField::VERIFICATION_TOKEN);
        assert_eq!(changes.email_verification_token, Some(None));
        assert_eq!(changes.email_verification_expires, Some(None));
    }
}
