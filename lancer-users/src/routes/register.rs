use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use lancer_shared::clients::db::checkout;
use lancer_shared::types::ApiResponse;
use lancer_shared::{AppError, AppResult, ErrorCode};

use crate::models::{validate_phone, NewUser, User};
use crate::routes::login::SessionResponse;
use crate::schema::users;
use crate::services::{auth_service, group_service, profile_service, token_service};
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "invalid email format"))]
    pub email: String,
    #[validate(length(min = 1, max = 150))]
    pub username: String,
    pub password: String,
    #[validate(length(max = 150))]
    pub first_name: Option<String>,
    #[validate(length(max = 150))]
    pub last_name: Option<String>,
    pub user_type: String,
    #[validate(custom = "validate_phone")]
    pub phone_number: Option<String>,
    #[validate(length(max = 100))]
    pub country: Option<String>,
    #[validate(length(max = 100))]
    pub city: Option<String>,
}

pub(crate) fn unique_violation(err: DieselError) -> AppError {
    match err {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            AppError::new(ErrorCode::EmailAlreadyExists, "email or username already registered")
        }
        other => other.into(),
    }
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<SessionResponse>>)> {
    req.validate()?;
    let user_type = auth_service::signup_user_type(&req.user_type)?;
    auth_service::validate_password(&req.password)?;

    let email = req.email.trim().to_lowercase();
    let username = req.username.trim().to_string();

    let user_id = {
        let mut conn = checkout(&state.db)?;

        if profile_service::email_exists(&mut conn, &email)? {
            return Err(AppError::new(ErrorCode::EmailAlreadyExists, "email already registered"));
        }
        if profile_service::username_exists(&mut conn, &username)? {
            return Err(AppError::new(ErrorCode::UsernameTaken, "username already taken"));
        }

        let password_hash = auth_service::hash_password(&req.password)?;
        let user = group_service::create_with_default_group(&mut conn, user_type, |conn| {
            diesel::insert_into(users::table)
                .values((
                    &NewUser {
                        email,
                        username,
                        password_hash,
                        first_name: req.first_name,
                        last_name: req.last_name,
                        user_type: user_type.as_str().to_string(),
                        phone_number: req.phone_number,
                        profile_picture: None,
                        is_verified: false,
                    },
                    users::country.eq(req.country),
                    users::city.eq(req.city),
                ))
                .returning(User::as_returning())
                .get_result(conn)
                .map_err(unique_violation)
        })?;
        user.id
    };

    state.security.refresh_completion(user_id)?;

    if let Err(e) = state.security.issue_verification(user_id, &state.email).await {
        tracing::warn!(user_id = %user_id, error = %e, "verification code not sent at registration");
    }

    let mut conn = checkout(&state.db)?;
    let user = profile_service::load_user(&mut conn, user_id)?;
    let tokens = token_service::issue_session(&mut conn, &state.config, user.id, user_type)?;

    metrics::counter!("registrations_total", "user_type" => user_type.as_str()).increment(1);
    tracing::info!(user_id = %user.id, user_type = %user_type, "user registered");

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(SessionResponse { user, tokens }))))
}
