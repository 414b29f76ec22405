use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use diesel::prelude::*;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use lancer_shared::clients::db::checkout;
use lancer_shared::types::auth::AuthUser;
use lancer_shared::types::ApiResponse;
use lancer_shared::{AppError, AppResult, ErrorCode};

use crate::models::{Education, EducationChanges, EducationInput};
use crate::schema::user_education;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:id", get(fetch).put(update).patch(update).delete(remove))
}

fn not_found() -> AppError {
    AppError::new(ErrorCode::RecordNotFound, "education entry not found")
}

fn owned(conn: &mut PgConnection, user_id: Uuid, id: Uuid) -> AppResult<Education> {
    user_education::table
        .find(id)
        .filter(user_education::user_id.eq(user_id))
        .select(Education::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(not_found)
}

pub async fn list(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Vec<Education>>>> {
    let mut conn = checkout(&state.db)?;
    let items = user_education::table
        .filter(user_education::user_id.eq(user.id))
        .order(user_education::start_date.desc())
        .select(Education::as_select())
        .load(&mut conn)?;
    Ok(Json(ApiResponse::ok(items)))
}

pub async fn create(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(input): Json<EducationInput>,
) -> AppResult<(StatusCode, Json<ApiResponse<Education>>)> {
    input.validate()?;
    let mut conn = checkout(&state.db)?;
    let item = diesel::insert_into(user_education::table)
        .values((&input, user_education::user_id.eq(user.id)))
        .returning(Education::as_returning())
        .get_result(&mut conn)?;

    tracing::info!(user_id = %user.id, education_id = %item.id, "education entry added");
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(item))))
}

pub async fn fetch(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Education>>> {
    let mut conn = checkout(&state.db)?;
    Ok(Json(ApiResponse::ok(owned(&mut conn, user.id, id)?)))
}

pub async fn update(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(changes): Json<EducationChanges>,
) -> AppResult<Json<ApiResponse<Education>>> {
    changes.validate()?;
    let mut conn = checkout(&state.db)?;
    if changes == EducationChanges::default() {
        return Ok(Json(ApiResponse::ok(owned(&mut conn, user.id, id)?)));
    }

    let item = diesel::update(
        user_education::table
            .find(id)
            .filter(user_education::user_id.eq(user.id)),
    )
    .set(&changes)
    .returning(Education::as_returning())
    .get_result(&mut conn)
    .optional()?
    .ok_or_else(not_found)?;

    Ok(Json(ApiResponse::ok(item)))
}

pub async fn remove(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<()>>> {
    let mut conn = checkout(&state.db)?;
    let deleted = diesel::delete(
        user_education::table
            .find(id)
            .filter(user_education::user_id.eq(user.id)),
    )
    .execute(&mut conn)?;
    if deleted == 0 {
        return Err(not_found());
    }
    Ok(Json(ApiResponse::message("education entry deleted")))
}
