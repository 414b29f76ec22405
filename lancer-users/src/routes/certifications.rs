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

use crate::models::{Certification, CertificationChanges, CertificationInput};
use crate::schema::user_certifications;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:id", get(fetch).put(update).patch(update).delete(remove))
}

fn not_found() -> AppError {
    AppError::new(ErrorCode::RecordNotFound, "certification not found")
}

fn owned(conn: &mut PgConnection, user_id: Uuid, id: Uuid) -> AppResult<Certification> {
    user_certifications::table
        .find(id)
        .filter(user_certifications::user_id.eq(user_id))
        .select(Certification::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(not_found)
}

pub async fn list(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Vec<Certification>>>> {
    let mut conn = checkout(&state.db)?;
    let items = user_certifications::table
        .filter(user_certifications::user_id.eq(user.id))
        .order(user_certifications::issue_date.desc())
        .select(Certification::as_select())
        .load(&mut conn)?;
    Ok(Json(ApiResponse::ok(items)))
}

pub async fn create(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(input): Json<CertificationInput>,
) -> AppResult<(StatusCode, Json<ApiResponse<Certification>>)> {
    input.validate()?;
    let mut conn = checkout(&state.db)?;
    let item = diesel::insert_into(user_certifications::table)
        .values((&input, user_certifications::user_id.eq(user.id)))
        .returning(Certification::as_returning())
        .get_result(&mut conn)?;

    tracing::info!(user_id = %user.id, certification_id = %item.id, "certification added");
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(item))))
}

pub async fn fetch(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Certification>>> {
    let mut conn = checkout(&state.db)?;
    Ok(Json(ApiResponse::ok(owned(&mut conn, user.id, id)?)))
}

pub async fn update(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(changes): Json<CertificationChanges>,
) -> AppResult<Json<ApiResponse<Certification>>> {
    changes.validate()?;
    let mut conn = checkout(&state.db)?;
    if changes == CertificationChanges::default() {
        return Ok(Json(ApiResponse::ok(owned(&mut conn, user.id, id)?)));
    }

    let item = diesel::update(
        user_certifications::table
            .find(id)
            .filter(user_certifications::user_id.eq(user.id)),
    )
    .set(&changes)
    .returning(Certification::as_returning())
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
        user_certifications::table
            .find(id)
            .filter(user_certifications::user_id.eq(user.id)),
    )
    .execute(&mut conn)?;
    if deleted == 0 {
        return Err(not_found());
    }
    Ok(Json(ApiResponse::message("certification deleted")))
}
