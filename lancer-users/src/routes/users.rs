use axum::extract::{Path, Query, State};
use axum::Json;
use diesel::prelude::*;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use lancer_shared::clients::db::checkout;
use lancer_shared::types::auth::UserType;
use lancer_shared::types::pagination::{Paginated, PaginationParams};
use lancer_shared::types::ApiResponse;
use lancer_shared::{AppError, AppResult, ErrorCode};

use crate::models::{PortfolioItem, User};
use crate::schema::{user_portfolio, users};
use crate::services::profile_service::{self, UserFilter, UserSummary};
use crate::AppState;

/// Directory of active users with filters, search and ordering.
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<UserFilter>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<ApiResponse<Paginated<UserSummary>>>> {
    let mut conn = checkout(&state.db)?;
    let page = profile_service::list_users(&mut conn, &filter, &params)?;
    Ok(Json(ApiResponse::ok(page)))
}

#[derive(Debug, Serialize)]
pub struct FreelancerCard {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub title: Option<String>,
    pub profile_picture: Option<String>,
    pub bio: Option<String>,
    pub skills: Vec<String>,
    pub average_rating: f64,
    pub total_reviews: i32,
}

impl From<User> for FreelancerCard {
    fn from(user: User) -> Self {
        let full_name = user.full_name();
        Self {
            id: user.id,
            username: user.username,
            full_name,
            title: user.title,
            profile_picture: user.profile_picture,
            bio: user.bio,
            skills: user.skills,
            average_rating: user.average_rating,
            total_reviews: user.total_reviews,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PublicPortfolio {
    pub user: FreelancerCard,
    pub portfolio: Vec<PortfolioItem>,
}

pub async fn public_portfolio(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<PublicPortfolio>>> {
    let mut conn = checkout(&state.db)?;

    let freelancer: User = users::table
        .find(user_id)
        .filter(users::is_active.eq(true))
        .filter(users::user_type.eq(UserType::Freelancer.as_str()))
        .select(User::as_select())
        .first(&mut conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound, "freelancer not found"))?;

    let portfolio = user_portfolio::table
        .filter(user_portfolio::user_id.eq(freelancer.id))
        .order((user_portfolio::is_featured.desc(), user_portfolio::created_at.desc()))
        .select(PortfolioItem::as_select())
        .load(&mut conn)?;

    Ok(Json(ApiResponse::ok(PublicPortfolio {
        user: freelancer.into(),
        portfolio,
    })))
}
