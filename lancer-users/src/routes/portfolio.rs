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

use crate::models::{PortfolioItem, PortfolioChanges, PortfolioInput};
use crate::schema::user_portfolio;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:id", get(fetch).put(update).patch(update).delete(remove))
}

fn not_found() -> AppError {
    AppError::new(ErrorCode::RecordNotFound, "portfolio item not found")
}

fn owned(conn: &mut PgConnection, user_id: Uuid, id: Uuid) -> AppResult<PortfolioItem> {
    user_portfolio::table
        .find(id)
        .filter(user_portfolio::user_id.eq(user_id))
        .select(PortfolioItem::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(not_found)
}

pub async fn list(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Vec<PortfolioItem>>>> {
    let mut conn = checkout(&state.db)?;
    let items = user_portfolio::table
        .filter(user_portfolio::user_id.eq(user.id))
        .order((user_portfolio::is_featured.desc(), user_portfolio::created_at.desc()))
        .select(PortfolioItem::as_select())
        .load(&mut conn)?;
    Ok(Json(ApiResponse::ok(items)))
}

pub async fn create(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(input): Json<PortfolioInput>,
) -> AppResult<(StatusCode, Json<ApiResponse<PortfolioItem>>)> {
    input.validate()?;
    let mut conn = checkout(&state.db)?;
    let item = diesel::insert_into(user_portfolio::table)
        .values((&input, user_portfolio::user_id.eq(user.id)))
        .returning(PortfolioItem::as_returning())
        .get_result(&mut conn)?;

    tracing::info!(user_id = %user.id, portfolio_id = %item.id, "portfolio item added");
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(item))))
}

pub async fn fetch(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<PortfolioItem>>> {
    let mut conn = checkout(&state.db)?;
    Ok(Json(ApiResponse::ok(owned(&mut conn, user.id, id)?)))
}

pub async fn update(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(changes): Json<PortfolioChanges>,
) -> AppResult<Json<ApiResponse<PortfolioItem>>> {
    changes.validate()?;
    let mut conn = checkout(&state.db)?;
    if changes == PortfolioChanges::default() {
        return Ok(Json(ApiResponse::ok(owned(&mut conn, user.id, id)?)));
    }

    let item = diesel::update(
        user_portfolio::table
            .find(id)
            .filter(user_portfolio::user_id.eq(user.id)),
    )
    .set(&changes)
    .returning(PortfolioItem::as_returning())
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
        user_portfolio::table
            .find(id)
            .filter(user_portfolio::user_id.eq(user.id)),
    )
    .execute(&mut conn)?;
    if deleted == 0 {
        return Err(not_found());
    }
    Ok(Json(ApiResponse::message("portfolio item deleted")))
}
