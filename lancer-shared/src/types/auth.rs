use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Marketplace account type, stored as `users.user_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Client,
    Freelancer,
    Admin,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Client => "client",
            UserType::Freelancer => "freelancer",
            UserType::Admin => "admin",
        }
    }

    /// Group a newly registered account joins.
    pub fn default_group(&self) -> &'static str {
        match self {
            UserType::Client => "Client",
            UserType::Freelancer => "Freelancer",
            UserType::Admin => "Admin",
        }
    }
}

impl std::fmt::Display for UserType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for UserType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "client" => Ok(UserType::Client),
            "freelancer" => Ok(UserType::Freelancer),
            "admin" => Ok(UserType::Admin),
            _ => Err(format!("unknown user type: {s}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub user_type: UserType,
    pub iat: i64,
    pub exp: i64,
    pub jti: Uuid,
}

impl Claims {
    pub fn new(user_id: Uuid, user_type: UserType, duration_secs: i64) -> Self {
        let now = Utc::now().timestamp();
        Self {
            sub: user_id,
            user_type,
            iat: now,
            exp: now + duration_secs,
            jti: Uuid::now_v7(),
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }
}

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub user_type: UserType,
    pub token_id: Uuid,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            user_type: claims.user_type,
            token_id: claims.jti,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

impl TokenPair {
    pub fn new(access_token: String, refresh_token: String, expires_in: i64) -> Self {
        Self {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_type_parses_case_insensitively() {
        assert_eq!("Freelancer".parse::<UserType>(), Ok(UserType::Freelancer));
        assert_eq!("client".parse::<UserType>(), Ok(UserType::Client));
        assert!("moderator".parse::<UserType>().is_err());
    }

    #[test]
    fn claims_expire_after_duration() {
        let claims = Claims::new(Uuid::new_v4(), UserType::Client, -10);
        assert!(claims.is_expired());
        let claims = Claims::new(Uuid::new_v4(), UserType::Client, 3600);
        assert!(!claims.is_expired());
    }
}
