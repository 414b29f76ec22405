use chrono::{DateTime, Duration, Utc};
use rand::Rng;

use lancer_shared::{AppError, ErrorCode};

use super::Account;

pub const CODE_LENGTH: usize = 6;
pub const TOKEN_TTL_MINUTES: i64 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum VerificationError {
    #[error("verification code must be exactly 6 digits")]
    Format,
    #[error("email is already verified")]
    AlreadyVerified,
    #[error("no verification code found, please request a new one")]
    Missing,
    #[error("verification code has expired, please request a new one")]
    Expired,
    #[error("invalid verification code")]
    Mismatch,
}

impl From<VerificationError> for AppError {
    fn from(err: VerificationError) -> Self {
        let code = match err {
            VerificationError::Format => ErrorCode::VerificationCodeFormat,
            VerificationError::AlreadyVerified => ErrorCode::AlreadyVerified,
            VerificationError::Missing => ErrorCode::VerificationCodeMissing,
            VerificationError::Expired => ErrorCode::VerificationCodeExpired,
            VerificationError::Mismatch => ErrorCode::VerificationCodeInvalid,
        };
        AppError::new(code, err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationState {
    /// Unverified, no usable code outstanding.
    NoToken,
    /// Unverified, a code is outstanding and unexpired.
    Pending,
    Verified,
}

/// Uniform draw from 000000..=999999, zero-padded.
pub fn generate_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!("{:06}", rng.gen_range(0..1_000_000))
}

pub fn check_code_format(code: &str) -> Result<(), VerificationError> {
    if code.len() == CODE_LENGTH && code.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(VerificationError::Format)
    }
}

impl Account {
    pub fn verification_state(&self, now: DateTime<Utc>) -> VerificationState {
        if self.is_verified {
            return VerificationState::Verified;
        }
        match (self.pending_code(), self.email_verification_expires) {
            (Some(_), Some(expires)) if expires > now => VerificationState::Pending,
            _ => VerificationState::NoToken,
        }
    }

    /// Replaces any outstanding code with a fresh one valid for
    /// [`TOKEN_TTL_MINUTES`]. Returns the new code.
    pub fn issue_verification_token<R: Rng + ?Sized>(
        &mut self,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Result<String, VerificationError> {
        if self.is_verified {
            return Err(VerificationError::AlreadyVerified);
        }

        let code = generate_code(rng);
        self.email_verification_token = Some(code.clone());
        self.email_verification_expires = Some(now + Duration::minutes(TOKEN_TTL_MINUTES));
        Ok(code)
    }

    /// Checks `code` against the outstanding one. An expired code is cleared
    /// as a side effect, so the caller must persist the token fields on
    /// `Expired` as well as on success.
    pub fn verify_email_code(&mut self, code: &str, now: DateTime<Utc>) -> Result<(), VerificationError> {
        check_code_format(code)?;

        if self.is_verified {
            return Err(VerificationError::AlreadyVerified);
        }

        let matches = match self.pending_code() {
            Some(stored) => stored == code,
            None => return Err(VerificationError::Missing),
        };

        match self.email_verification_expires {
            Some(expires) if expires > now => {}
            _ => {
                self.clear_verification_token();
                return Err(VerificationError::Expired);
            }
        }

        if !matches {
            return Err(VerificationError::Mismatch);
        }

        self.is_verified = true;
        self.clear_verification_token();
        Ok(())
    }

    pub fn clear_verification_token(&mut self) {
        self.email_verification_token = None;
        self.email_verification_expires = None;
    }

    fn pending_code(&self) -> Option<&str> {
        self.email_verification_token.as_deref().filter(|t| !t.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use lancer_shared::types::auth::UserType;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap()
    }

    fn pending(code: &str, expires: DateTime<Utc>) -> Account {
        let mut acct = Account::new("client@example.com", "hash", UserType::Client);
        acct.email_verification_token = Some(code.to_string());
        acct.email_verification_expires = Some(expires);
        acct
    }

    #[test]
    fn generated_codes_are_six_digits() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let code = generate_code(&mut rng);
            assert_eq!(code.len(), CODE_LENGTH);
            assert!(check_code_format(&code).is_ok(), "{code}");
        }
    }

    #[test]
    fn format_rejects_non_digits_and_wrong_length() {
        for bad in ["", "12345", "1234567", "12a456", " 12345", "１２３４５６"] {
            assert_eq!(check_code_format(bad), Err(VerificationError::Format), "{bad:?}");
        }
        assert!(check_code_format("000000").is_ok());
    }

    #[test]
    fn issue_sets_fifteen_minute_expiry_and_overwrites() {
        let mut acct = Account::new("a@example.com", "hash", UserType::Freelancer);
        let mut rng = StdRng::seed_from_u64(1);

        acct.issue_verification_token(t0(), &mut rng).unwrap();
        assert_eq!(acct.email_verification_expires, Some(t0() + Duration::minutes(15)));

        let later = t0() + Duration::minutes(3);
        let second = acct.issue_verification_token(later, &mut rng).unwrap();
        assert_eq!(acct.email_verification_token.as_deref(), Some(second.as_str()));
        assert_eq!(acct.email_verification_expires, Some(later + Duration::minutes(15)));
    }

    #[test]
    fn issue_refused_once_verified() {
        let mut acct = Account::new("a@example.com", "hash", UserType::Client);
        acct.is_verified = true;
        let mut rng = StdRng::seed_from_u64(2);

        assert_eq!(
            acct.issue_verification_token(t0(), &mut rng),
            Err(VerificationError::AlreadyVerified)
        );
        assert!(acct.email_verification_token.is_none());
    }

    #[test]
    fn correct_code_verifies_and_clears() {
        let mut acct = pending("482913", t0() + Duration::minutes(10));
        acct.verify_email_code("482913", t0()).unwrap();

        assert!(acct.is_verified);
        assert!(acct.email_verification_token.is_none());
        assert!(acct.email_verification_expires.is_none());
        assert_eq!(acct.verification_state(t0()), VerificationState::Verified);

        assert_eq!(
            acct.verify_email_code("482913", t0()),
            Err(VerificationError::AlreadyVerified)
        );
    }

    #[test]
    fn format_checked_before_anything_else() {
        let mut acct = Account::new("a@example.com", "hash", UserType::Client);
        acct.is_verified = true;
        assert_eq!(acct.verify_email_code("12a456", t0()), Err(VerificationError::Format));
    }

    #[test]
    fn missing_token() {
        let mut acct = Account::new("a@example.com", "hash", UserType::Client);
        assert_eq!(acct.verify_email_code("123456", t0()), Err(VerificationError::Missing));

        acct.email_verification_token = Some(String::new());
        assert_eq!(acct.verify_email_code("123456", t0()), Err(VerificationError::Missing));
    }

    #[test]
    fn expired_token_is_cleared_then_missing() {
        let expires = t0();
        let mut acct = pending("111111", expires);

        assert_eq!(acct.verify_email_code("111111", expires), Err(VerificationError::Expired));
        assert!(acct.email_verification_token.is_none());
        assert!(acct.email_verification_expires.is_none());
        assert!(!acct.is_verified);

        assert_eq!(acct.verify_email_code("111111", expires), Err(VerificationError::Missing));
    }

    #[test]
    fn token_without_expiry_counts_as_expired() {
        let mut acct = Account::new("a@example.com", "hash", UserType::Client);
        acct.email_verification_token = Some("222222".into());

        assert_eq!(acct.verify_email_code("222222", t0()), Err(VerificationError::Expired));
        assert!(acct.email_verification_token.is_none());
    }

    #[test]
    fn wrong_code_leaves_token_in_place() {
        let expires = t0() + Duration::minutes(1);
        let mut acct = pending("654321", expires);

        assert_eq!(acct.verify_email_code("654320", t0()), Err(VerificationError::Mismatch));
        assert_eq!(acct.email_verification_token.as_deref(), Some("654321"));
        assert_eq!(acct.verification_state(t0()), VerificationState::Pending);
    }

    #[test]
    fn state_reports_lapsed_code_as_no_token() {
        let acct = pending("654321", t0());
        assert_eq!(acct.verification_state(t0()), VerificationState::NoToken);
    }

    #[test]
    fn errors_map_to_distinct_codes() {
        let err: AppError = VerificationError::Expired.into();
        assert_eq!(err.code(), Some(ErrorCode::VerificationCodeExpired));
        let err: AppError = VerificationError::Mismatch.into();
        assert_eq!(err.code(), Some(ErrorCode::VerificationCodeInvalid));
    }
}
