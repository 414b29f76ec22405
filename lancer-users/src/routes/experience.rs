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

use crate::models::{Experience, ExperienceChanges, ExperienceInput};
use crate::schema::user_experience;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:id", get(fetch).put(update).patch(update).delete(remove))
}

fn not_found() -> AppError {
    AppError::new(ErrorCode::RecordNotFound, "experience entry not found")
}

fn owned(conn: &mut PgConnection, user_id: Uuid, id: Uuid) -> AppResult<Experience> {
    user_experience::table
        .find(id)
        .filter(user_experience::user_id.eq(user_id))
        .select(Experience::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(not_found)
}

/// A user holds at most one current position.
fn unmark_current(conn: &mut PgConnection, user_id: Uuid, except: Option<Uuid>) -> AppResult<usize> {
    let others = user_experience::table
        .filter(user_experience::user_id.eq(user_id))
        .filter(user_experience::is_current.eq(true))
        .filter(user_experience::id.ne(except.unwrap_or_else(Uuid::nil)));
    Ok(diesel::update(others)
        .set(user_experience::is_current.eq(false))
        .execute(conn)?)
}

pub async fn list(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Vec<Experience>>>> {
    let mut conn = checkout(&state.db)?;
    let items = user_experience::table
        .filter(user_experience::user_id.eq(user.id))
        .order((user_experience::is_current.desc(), user_experience::start_date.desc()))
        .select(Experience::as_select())
        .load(&mut conn)?;
    Ok(Json(ApiResponse::ok(items)))
}

pub async fn create(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(input): Json<ExperienceInput>,
) -> AppResult<(StatusCode, Json<ApiResponse<Experience>>)> {
    input.validate()?;
    let mut conn = checkout(&state.db)?;

    let item = conn.transaction::<_, AppError, _>(|conn| {
        if input.is_current {
            unmark_current(conn, user.id, None)?;
        }
        let item = diesel::insert_into(user_experience::table)
            .values((&input, user_experience::user_id.eq(user.id)))
            .returning(Experience::as_returning())
            .get_result(conn)?;
        Ok(item)
    })?;

    tracing::info!(user_id = %user.id, experience_id = %item.id, is_current = item.is_current, "experience entry added");
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(item))))
}

pub async fn fetch(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Experience>>> {
    let mut conn = checkout(&state.db)?;
    Ok(Json(ApiResponse::ok(owned(&mut conn, user.id, id)?)))
}

pub async fn update(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(changes): Json<ExperienceChanges>,
) -> AppResult<Json<ApiResponse<Experience>>> {
    changes.validate()?;
    let mut conn = checkout(&state.db)?;
    if changes == ExperienceChanges::default() {
        return Ok(Json(ApiResponse::ok(owned(&mut conn, user.id, id)?)));
    }

    let item = conn.transaction::<_, AppError, _>(|conn| {
        owned(conn, user.id, id)?;
        if changes.is_current == Some(true) {
            unmark_current(conn, user.id, Some(id))?;
        }
        let item = diesel::update(user_experience::table.find(id))
            .set(&changes)
            .returning(Experience::as_returning())
            .get_result(conn)?;
        Ok(item)
    })?;

    Ok(Json(ApiResponse::ok(item)))
}

pub async fn remove(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<()>>> {
    let mut conn = checkout(&state.db)?;
    let deleted = diesel::delete(
        user_experience::table
            .find(id)
            .filter(user_experience::user_id.eq(user.id)),
    )
    .execute(&mut conn)?;
    if deleted == 0 {
        return Err(not_found());
    }
    Ok(Json(ApiResponse::message("experience entry deleted")))
}
