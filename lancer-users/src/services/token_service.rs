use chrono::{Duration, Utc};
use diesel::prelude::*;
use jsonwebtoken::{encode, EncodingKey, Header};
use rand::Rng;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use lancer_shared::types::auth::{Claims, TokenPair, UserType};
use lancer_shared::{AppError, AppResult, ErrorCode};

use crate::config::AppConfig;
use crate::models::{NewRefreshToken, RefreshToken};
use crate::schema::refresh_tokens;

pub fn create_access_token(
    user_id: Uuid,
    user_type: UserType,
    secret: &str,
    ttl_secs: i64,
) -> Result<String, AppError> {
    let claims = Claims::new(user_id, user_type, ttl_secs);
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::internal(format!("JWT encoding failed: {e}")))
}

pub fn create_refresh_token() -> String {
    let bytes: [u8; 32] = rand::thread_rng().gen();
    hex::encode(bytes)
}

pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

pub fn create_token_pair(
    user_id: Uuid,
    user_type: UserType,
    secret: &str,
    access_ttl: i64,
) -> Result<(TokenPair, String), AppError> {
    let access_token = create_access_token(user_id, user_type, secret, access_ttl)?;
    let refresh_token = create_refresh_token();
    let refresh_hash = hash_token(&refresh_token);
    let pair = TokenPair::new(access_token, refresh_token, access_ttl);
    Ok((pair, refresh_hash))
}

/// Issues an access/refresh pair and stores the refresh token hash.
pub fn issue_session(
    conn: &mut PgConnection,
    config: &AppConfig,
    user_id: Uuid,
    user_type: UserType,
) -> AppResult<TokenPair> {
    let (pair, refresh_hash) =
        create_token_pair(user_id, user_type, &config.jwt_secret, config.jwt_access_ttl)?;

    diesel::insert_into(refresh_tokens::table)
        .values(&NewRefreshToken {
            user_id,
            token_hash: refresh_hash,
            expires_at: Utc::now() + Duration::seconds(config.jwt_refresh_ttl),
        })
        .execute(conn)?;

    Ok(pair)
}

/// Revokes a presented refresh token and returns the owning user id.
pub fn consume_refresh_token(conn: &mut PgConnection, token: &str) -> AppResult<Uuid> {
    let token_hash = hash_token(token);
    conn.transaction(|conn| {
        let stored: RefreshToken = refresh_tokens::table
            .filter(refresh_tokens::token_hash.eq(&token_hash))
            .filter(refresh_tokens::revoked_at.is_null())
            .select(RefreshToken::as_select())
            .for_update()
            .first(conn)
            .optional()?
            .ok_or_else(|| AppError::new(ErrorCode::TokenInvalid, "invalid refresh token"))?;

        if stored.expires_at < Utc::now() {
            return Err(AppError::new(ErrorCode::TokenExpired, "refresh token expired"));
        }

        diesel::update(refresh_tokens::table.find(stored.id))
            .set(refresh_tokens::revoked_at.eq(Some(Utc::now())))
            .execute(conn)?;

        Ok(stored.user_id)
    })
}

pub fn revoke_all_for_user(conn: &mut PgConnection, user_id: Uuid) -> AppResult<usize> {
    let revoked = diesel::update(
        refresh_tokens::table
            .filter(refresh_tokens::user_id.eq(user_id))
            .filter(refresh_tokens::revoked_at.is_null()),
    )
    .set(refresh_tokens::revoked_at.eq(Some(Utc::now())))
    .execute(conn)?;
    Ok(revoked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lancer_shared::middleware::validate_jwt;

    #[test]
    fn access_token_round_trips_through_validation() {
        let user_id = Uuid::new_v4();
        let token = create_access_token(user_id, UserType::Freelancer, "test-secret", 60).unwrap();
        let claims = validate_jwt(&token, "test-secret").unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.user_type, UserType::Freelancer);

        assert!(validate_jwt(&token, "other-secret").is_err());
    }

    #[test]
    fn refresh_hash_matches_pair() {
        let (pair, hash) = create_token_pair(Uuid::new_v4(), UserType::Client, "s", 900).unwrap();
        assert_eq!(hash_token(&pair.refresh_token), hash);
        assert_eq!(pair.refresh_token.len(), 64);
        assert_eq!(pair.expires_in, 900);
    }
}
