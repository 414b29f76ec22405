use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;

use lancer_shared::types::auth::AuthUser;
use lancer_shared::types::ApiResponse;
use lancer_shared::{AppError, AppResult, ErrorCode};

use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct VerifyEmailRequest {
    #[serde(default)]
    pub code: String,
}

/// Sends a fresh verification code, at most once per resend window.
pub async fn send_code(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<()>>> {
    let key = format!("verify:rate:{}", user.id);
    let window = state.config.verification_resend_window_secs;

    match state.redis.rate_limit_check(&key, 1, window).await {
        Ok(true) => {}
        Ok(false) => {
            return Err(AppError::new(
                ErrorCode::EmailRateLimited,
                format!("a code was sent recently, try again in {window} seconds"),
            ));
        }
        Err(e) => {
            tracing::warn!(error = %e, "redis unavailable, verification resend not rate limited");
        }
    }

    state.security.issue_verification(user.id, &state.email).await?;

    Ok(Json(ApiResponse::message("verification code sent")))
}

pub async fn verify_email(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<VerifyEmailRequest>,
) -> AppResult<Json<ApiResponse<()>>> {
    if req.code.is_empty() {
        return Err(AppError::new(ErrorCode::VerificationCodeFormat, "verification code is required"));
    }

    state.security.verify_code(user.id, &req.code)?;

    Ok(Json(ApiResponse::message("email verified successfully")))
}
