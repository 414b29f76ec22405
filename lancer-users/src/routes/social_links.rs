use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use lancer_shared::clients::db::checkout;
use lancer_shared::types::auth::AuthUser;
use lancer_shared::types::ApiResponse;
use lancer_shared::{AppError, AppResult, ErrorCode};

use crate::models::{SocialLink, SocialLinkChanges, SocialLinkInput};
use crate::schema::user_social_links;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:id", get(fetch).put(update).patch(update).delete(remove))
}

fn not_found() -> AppError {
    AppError::new(ErrorCode::RecordNotFound, "social link not found")
}

// One link per platform per user, enforced by a unique index.
fn duplicate_platform(err: DieselError) -> AppError {
    match err {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            AppError::new(ErrorCode::SocialLinkExists, "a link for this platform already exists")
        }
        other => other.into(),
    }
}

fn owned(conn: &mut PgConnection, user_id: Uuid, id: Uuid) -> AppResult<SocialLink> {
    user_social_links::table
        .find(id)
        .filter(user_social_links::user_id.eq(user_id))
        .select(SocialLink::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(not_found)
}

pub async fn list(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Vec<SocialLink>>>> {
    let mut conn = checkout(&state.db)?;
    let links = user_social_links::table
        .filter(user_social_links::user_id.eq(user.id))
        .order(user_social_links::platform.asc())
        .select(SocialLink::as_select())
        .load(&mut conn)?;
    Ok(Json(ApiResponse::ok(links)))
}

pub async fn create(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(input): Json<SocialLinkInput>,
) -> AppResult<(StatusCode, Json<ApiResponse<SocialLink>>)> {
    input.validate()?;
    let mut conn = checkout(&state.db)?;
    let link = diesel::insert_into(user_social_links::table)
        .values((&input, user_social_links::user_id.eq(user.id)))
        .returning(SocialLink::as_returning())
        .get_result(&mut conn)
        .map_err(duplicate_platform)?;

    tracing::info!(user_id = %user.id, platform = %link.platform, "social link added");
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(link))))
}

pub async fn fetch(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<SocialLink>>> {
    let mut conn = checkout(&state.db)?;
    Ok(Json(ApiResponse::ok(owned(&mut conn, user.id, id)?)))
}

pub async fn update(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(changes): Json<SocialLinkChanges>,
) -> AppResult<Json<ApiResponse<SocialLink>>> {
    changes.validate()?;
    let mut conn = checkout(&state.db)?;
    if changes == SocialLinkChanges::default() {
        return Ok(Json(ApiResponse::ok(owned(&mut conn, user.id, id)?)));
    }

    let link = diesel::update(
        user_social_links::table
            .find(id)
            .filter(user_social_links::user_id.eq(user.id)),
    )
    .set(&changes)
    .returning(SocialLink::as_returning())
    .get_result(&mut conn)
    .optional()
    .map_err(duplicate_platform)?
    .ok_or_else(not_found)?;

    Ok(Json(ApiResponse::ok(link)))
}

pub async fn remove(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<()>>> {
    let mut conn = checkout(&state.db)?;
    let deleted = diesel::delete(
        user_social_links::table
            .find(id)
            .filter(user_social_links::user_id.eq(user.id)),
    )
    .execute(&mut conn)?;
    if deleted == 0 {
        return Err(not_found());
    }
    Ok(Json(ApiResponse::message("social link deleted")))
}
