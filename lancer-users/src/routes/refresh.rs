use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;

use lancer_shared::clients::db::checkout;
use lancer_shared::types::auth::TokenPair;
use lancer_shared::types::ApiResponse;
use lancer_shared::{AppError, AppResult, ErrorCode};

use crate::services::{profile_service, token_service};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

pub async fn refresh_token(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RefreshRequest>,
) -> AppResult<Json<ApiResponse<TokenPair>>> {
    let mut conn = checkout(&state.db)?;

    let user_id = token_service::consume_refresh_token(&mut conn, &req.refresh_token)?;
    let user = profile_service::load_user(&mut conn, user_id)?;
    if !user.is_active {
        return Err(AppError::new(ErrorCode::AccountDisabled, "account is disabled"));
    }

    let tokens = token_service::issue_session(&mut conn, &state.config, user.id, user.kind())?;

    tracing::debug!(user_id = %user.id, "refresh token rotated");

    Ok(Json(ApiResponse::ok(tokens)))
}
