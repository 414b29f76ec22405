use axum::extract::State;
use axum::Json;
use chrono::Utc;
use diesel::prelude::*;
use serde::Deserialize;
use std::sync::Arc;

use lancer_shared::clients::db::checkout;
use lancer_shared::types::auth::AuthUser;
use lancer_shared::types::ApiResponse;
use lancer_shared::{AppError, AppResult, ErrorCode};

use crate::schema::users;
use crate::services::{auth_service, profile_service, token_service};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

pub async fn change_password(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChangePasswordRequest>,
) -> AppResult<Json<ApiResponse<()>>> {
    let mut conn = checkout(&state.db)?;
    let current = profile_service::load_active_user(&mut conn, user.id)?;

    if !auth_service::verify_password(&req.old_password, &current.password_hash)? {
        return Err(AppError::new(ErrorCode::InvalidCredentials, "old password is incorrect"));
    }
    if req.new_password != req.confirm_password {
        return Err(AppError::new(ErrorCode::PasswordMismatch, "new passwords do not match"));
    }
    auth_service::validate_password(&req.new_password)?;

    let password_hash = auth_service::hash_password(&req.new_password)?;
    conn.transaction::<_, AppError, _>(|conn| {
        diesel::update(users::table.find(user.id))
            .set((users::password_hash.eq(password_hash), users::updated_at.eq(Utc::now())))
            .execute(conn)?;
        token_service::revoke_all_for_user(conn, user.id)
    })?;

    tracing::info!(user_id = %user.id, "password changed");

    Ok(Json(ApiResponse::message("password changed successfully")))
}
