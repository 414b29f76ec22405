use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use chrono::Utc;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use lancer_shared::clients::db::checkout;
use lancer_shared::types::auth::TokenPair;
use lancer_shared::types::ApiResponse;
use lancer_shared::AppResult;

use crate::models::User;
use crate::schema::users;
use crate::services::{profile_service, token_service};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// A signed-in user and their fresh tokens.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: User,
    pub tokens: TokenPair,
}

const MAX_IP_LEN: usize = 45;

/// First `X-Forwarded-For` hop, else `X-Real-IP`.
pub fn client_ip(headers: &HeaderMap) -> Option<String> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    let real = || {
        headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };
    forwarded
        .or_else(real)
        .map(|ip| ip.chars().take(MAX_IP_LEN).collect())
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<ApiResponse<SessionResponse>>> {
    let account = state.security.authenticate(&req.email, &req.password)?;

    let mut conn = checkout(&state.db)?;
    diesel::update(users::table.find(account.id))
        .set((
            users::last_login_ip.eq(client_ip(&headers)),
            users::last_activity.eq(Utc::now()),
        ))
        .execute(&mut conn)?;

    let user = profile_service::load_user(&mut conn, account.id)?;
    let tokens = token_service::issue_session(&mut conn, &state.config, user.id, user.kind())?;

    tracing::info!(user_id = %user.id, "user logged in");

    Ok(Json(ApiResponse::ok(SessionResponse { user, tokens })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn forwarded_for_wins_over_real_ip() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.9"));
        headers.insert("x-forwarded-for", HeaderValue::from_static(" 203.0.113.7 , 10.0.0.1"));
        assert_eq!(client_ip(&headers).as_deref(), Some("203.0.113.7"));
    }

    #[test]
    fn falls_back_to_real_ip() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.2"));
        assert_eq!(client_ip(&headers).as_deref(), Some("198.51.100.2"));
        assert_eq!(client_ip(&HeaderMap::new()), None);
    }
}
