use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::distributions::Alphanumeric;
use rand::Rng;

use lancer_shared::types::auth::UserType;
use lancer_shared::{AppError, ErrorCode};

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::internal(format!("password hashing failed: {e}")))
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AppError::internal(format!("invalid password hash: {e}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

pub fn validate_password(password: &str) -> Result<(), AppError> {
    if password.chars().count() < 8 {
        return Err(AppError::new(ErrorCode::PasswordTooWeak, "password must be at least 8 characters"));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(AppError::new(ErrorCode::PasswordTooWeak, "password must contain at least one number"));
    }
    if !password.chars().any(|c| c.is_alphabetic()) {
        return Err(AppError::new(ErrorCode::PasswordTooWeak, "password must contain at least one letter"));
    }
    Ok(())
}

/// Unusable-by-humans password for accounts created through Google sign-in.
pub fn random_password() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

/// Username derived from the local part of an email, with a random suffix
/// when `taken` reports a clash.
pub fn username_from_email<F>(email: &str, mut taken: F) -> Result<String, AppError>
where
    F: FnMut(&str) -> Result<bool, AppError>,
{
    let base: String = email
        .split('@')
        .next()
        .unwrap_or_default()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .take(140)
        .collect();
    let base = if base.is_empty() { "user".to_string() } else { base };

    if !taken(&base)? {
        return Ok(base);
    }
    let mut rng = rand::thread_rng();
    for _ in 0..5 {
        let candidate = format!("{base}{:04}", rng.gen_range(0..10_000));
        if !taken(&candidate)? {
            return Ok(candidate);
        }
    }
    Err(AppError::new(ErrorCode::UsernameTaken, "could not allocate a unique username"))
}

/// Account types open to self-registration.
pub fn signup_user_type(value: &str) -> Result<UserType, AppError> {
    match value.parse::<UserType>() {
        Ok(t @ (UserType::Client | UserType::Freelancer)) => Ok(t),
        _ => Err(AppError::new(
            ErrorCode::InvalidUserType,
            "user_type must be 'client' or 'freelancer'",
        )),
    }
}
