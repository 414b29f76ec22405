use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use lancer_shared::clients::db::checkout;
use lancer_shared::types::ApiResponse;
use lancer_shared::{AppError, AppResult, ErrorCode};

use crate::account::fold_rating;
use crate::schema::users;
use crate::services::profile_service;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub rating: f64,
}

#[derive(Debug, Serialize)]
pub struct RatingResponse {
    pub average_rating: f64,
    pub total_reviews: i32,
}

/// Folds a new review into the user's running average. Called by other services, unauthenticated.
pub async fn record_review(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
    Json(req): Json<ReviewRequest>,
) -> AppResult<Json<ApiResponse<RatingResponse>>> {
    let mut conn = checkout(&state.db)?;

    let (average_rating, total_reviews) = conn.transaction::<_, AppError, _>(|conn| {
        let (average, count): (f64, i32) = users::table
            .find(user_id)
            .select((users::average_rating, users::total_reviews))
            .for_update()
            .first(conn)
            .optional()?
            .ok_or_else(profile_service::user_not_found)?;

        let (average, count) = fold_rating(average, count, req.rating)
            .map_err(|e| AppError::new(ErrorCode::InvalidRating, e.to_string()))?;

        diesel::update(users::table.find(user_id))
            .set((
                users::average_rating.eq(average),
                users::total_reviews.eq(count),
                users::updated_at.eq(Utc::now()),
            ))
            .execute(conn)?;
        Ok((average, count))
    })?;

    tracing::info!(user_id = %user_id, rating = req.rating, average_rating, total_reviews, "review recorded");

    Ok(Json(ApiResponse::ok(RatingResponse { average_rating, total_reviews })))
}
