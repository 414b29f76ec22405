use axum::extract::State;
use axum::Json;
use chrono::Utc;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use lancer_shared::clients::db::checkout;
use lancer_shared::types::auth::{TokenPair, UserType};
use lancer_shared::types::ApiResponse;
use lancer_shared::{AppError, AppResult, ErrorCode};

use crate::models::{NewUser, User};
use crate::routes::register::unique_violation;
use crate::schema::users;
use crate::services::google_service::{self, GoogleIdentity};
use crate::services::{auth_service, group_service, profile_service, token_service};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct GoogleLoginRequest {
    pub credential: String,
    pub user_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GoogleLoginResponse {
    pub user: User,
    pub tokens: TokenPair,
    pub created: bool,
}

fn create_google_user(
    conn: &mut PgConnection,
    identity: &GoogleIdentity,
    user_type: UserType,
) -> AppResult<User> {
    let username = auth_service::username_from_email(&identity.email, |candidate| {
        profile_service::username_exists(conn, candidate)
    })?;
    let (first_name, last_name) = google_service::split_name(identity.name.as_deref());
    let password_hash = auth_service::hash_password(&auth_service::random_password())?;

    group_service::create_with_default_group(conn, user_type, |conn| {
        diesel::insert_into(users::table)
            .values(&NewUser {
                email: identity.email.clone(),
                username,
                password_hash,
                first_name,
                last_name,
                user_type: user_type.as_str().to_string(),
                phone_number: None,
                profile_picture: None,
                is_verified: identity.email_verified,
            })
            .returning(User::as_returning())
            .get_result(conn)
            .map_err(unique_violation)
    })
}

async fn import_google_picture(state: &AppState, user_id: Uuid, url: &str) -> AppResult<()> {
    match google_service::import_picture(&state.http, &state.minio, user_id, url).await {
        Ok(picture) => {
            let mut conn = checkout(&state.db)?;
            diesel::update(users::table.find(user_id))
                .set((users::profile_picture.eq(picture), users::updated_at.eq(Utc::now())))
                .execute(&mut conn)?;
        }
        Err(e) => {
            tracing::warn!(user_id = %user_id, error = %e, "google profile picture not imported");
        }
    }
    Ok(())
}

/// Sign in, or sign up on first use, with a Google ID token.
pub async fn google_login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GoogleLoginRequest>,
) -> AppResult<Json<ApiResponse<GoogleLoginResponse>>> {
    let identity = google_service::verify_id_token(
        &state.http,
        &req.credential,
        &state.config.google_client_id,
    )
    .await?;

    let (user, created) = {
        let mut conn = checkout(&state.db)?;
        let existing = users::table
            .filter(users::email.eq(&identity.email))
            .select(User::as_select())
            .first(&mut conn)
            .optional()?;

        match existing {
            Some(user) if !user.is_active => {
                return Err(AppError::new(ErrorCode::AccountDisabled, "account is disabled"));
            }
            Some(user) => (user, false),
            None => {
                let user_type = req
                    .user_type
                    .as_deref()
                    .ok_or_else(|| {
                        AppError::new(ErrorCode::InvalidUserType, "user_type is required for new accounts")
                    })
                    .and_then(auth_service::signup_user_type)?;
                (create_google_user(&mut conn, &identity, user_type)?, true)
            }
        }
    };

    if created || user.profile_picture.is_none() {
        if let Some(url) = identity.picture.as_deref() {
            import_google_picture(&state, user.id, url).await?;
        }
    }
    state.security.refresh_completion(user.id)?;

    let mut conn = checkout(&state.db)?;
    diesel::update(users::table.find(user.id))
        .set(users::last_activity.eq(Utc::now()))
        .execute(&mut conn)?;
    let user = profile_service::load_user(&mut conn, user.id)?;
    let tokens = token_service::issue_session(&mut conn, &state.config, user.id, user.kind())?;

    tracing::info!(user_id = %user.id, created, "google sign-in");

    Ok(Json(ApiResponse::ok(GoogleLoginResponse { user, tokens, created })))
}
