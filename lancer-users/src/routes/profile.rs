use axum::extract::{Multipart, Path, State};
use axum::Json;
use chrono::Utc;
use diesel::prelude::*;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use lancer_shared::clients::db::checkout;
use lancer_shared::types::auth::AuthUser;
use lancer_shared::types::ApiResponse;
use lancer_shared::{AppError, AppResult, ErrorCode};

use crate::models::UpdateUser;
use crate::schema::users;
use crate::services::profile_service::{self, ProfileView};
use crate::AppState;

pub async fn current_profile(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<ProfileView>>> {
    let mut conn = checkout(&state.db)?;
    let current = profile_service::load_user(&mut conn, user.id)?;
    let profile = profile_service::load_profile(&mut conn, current)?;
    Ok(Json(ApiResponse::ok(profile)))
}

/// Partial update for both PUT and PATCH. Fields left out are unchanged.
pub async fn update_profile(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<UpdateUser>,
) -> AppResult<Json<ApiResponse<ProfileView>>> {
    req.validate()?;
    if req.is_empty() {
        return Err(AppError::bad_request("no profile fields to update"));
    }

    {
        let mut conn = checkout(&state.db)?;
        let updated = diesel::update(users::table.find(user.id))
            .set((&req, users::updated_at.eq(Utc::now())))
            .execute(&mut conn)?;
        if updated == 0 {
            return Err(profile_service::user_not_found());
        }
    }

    let completion = state.security.refresh_completion(user.id)?;
    tracing::info!(user_id = %user.id, completion, "profile updated");

    let mut conn = checkout(&state.db)?;
    let current = profile_service::load_user(&mut conn, user.id)?;
    let profile = profile_service::load_profile(&mut conn, current)?;
    Ok(Json(ApiResponse::ok_with_message(profile, "profile updated successfully")))
}

/// Public view of an active user's profile.
pub async fn public_profile(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let mut conn = checkout(&state.db)?;
    let target = profile_service::load_active_user(&mut conn, user_id)?;
    let profile = profile_service::load_profile(&mut conn, target)?.into_public()?;
    Ok(Json(ApiResponse::ok(profile)))
}

#[derive(Debug, Serialize)]
pub struct CompletionResponse {
    pub profile_completion_percentage: i32,
}

pub async fn update_completion(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<CompletionResponse>>> {
    let pct = state.security.refresh_completion(user.id)?;
    Ok(Json(ApiResponse::ok_with_message(
        CompletionResponse { profile_completion_percentage: pct },
        "profile completion updated",
    )))
}

#[derive(Debug, Serialize)]
pub struct PhotoUploadResponse {
    pub profile_picture: String,
    pub profile_completion_percentage: i32,
}

fn photo_extension(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        _ => None,
    }
}

pub async fn upload_photo(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> AppResult<Json<ApiResponse<PhotoUploadResponse>>> {
    let field = multipart
        .next_field()
        .await
        .map_err(|e| AppError::new(ErrorCode::PhotoUploadFailed, format!("failed to read multipart: {e}")))?
        .ok_or_else(|| AppError::new(ErrorCode::PhotoUploadFailed, "no file provided"))?;

    let content_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();

    let ext = photo_extension(&content_type).ok_or_else(|| {
        AppError::new(
            ErrorCode::PhotoUploadFailed,
            "unsupported image format, accepted: jpeg, png, webp, gif",
        )
    })?;

    let data = field
        .bytes()
        .await
        .map_err(|e| AppError::new(ErrorCode::PhotoUploadFailed, format!("failed to read file data: {e}")))?;

    if data.is_empty() {
        return Err(AppError::new(ErrorCode::PhotoUploadFailed, "uploaded file is empty"));
    }
    if data.len() > state.config.max_photo_bytes {
        return Err(AppError::new(
            ErrorCode::PayloadTooLarge,
            format!("photo exceeds {} bytes", state.config.max_photo_bytes),
        ));
    }

    let key = format!("profiles/{}/{}.{}", user.id, Uuid::now_v7(), ext);
    let profile_picture = state
        .minio
        .upload(&key, data.to_vec(), &content_type)
        .await
        .map_err(|e| AppError::new(ErrorCode::PhotoUploadFailed, e))?;

    let previous: Option<String> = {
        let mut conn = checkout(&state.db)?;
        let previous = users::table
            .find(user.id)
            .select(users::profile_picture)
            .first::<Option<String>>(&mut conn)
            .optional()?
            .ok_or_else(profile_service::user_not_found)?;
        diesel::update(users::table.find(user.id))
            .set((
                users::profile_picture.eq(&profile_picture),
                users::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)?;
        previous
    };

    if let Some(old_key) = previous.as_deref().and_then(|url| state.minio.key_for_url(url)) {
        if let Err(e) = state.minio.delete(old_key).await {
            tracing::warn!(user_id = %user.id, key = %old_key, error = %e, "previous profile photo not removed");
        }
    }

    let pct = state.security.refresh_completion(user.id)?;

    tracing::info!(user_id = %user.id, photo_url = %profile_picture, "profile photo uploaded");

    Ok(Json(ApiResponse::ok(PhotoUploadResponse {
        profile_picture,
        profile_completion_percentage: pct,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepted_photo_types() {
        assert_eq!(photo_extension("image/jpeg"), Some("jpg"));
        assert_eq!(photo_extension("image/jpg"), Some("jpg"));
        assert_eq!(photo_extension("image/webp"), Some("webp"));
        assert_eq!(photo_extension("image/svg+xml"), None);
        assert_eq!(photo_extension("application/octet-stream"), None);
    }
}
