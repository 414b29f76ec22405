use axum::extract::State;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use lancer_shared::clients::db::checkout;
use lancer_shared::types::auth::AuthUser;
use lancer_shared::types::ApiResponse;
use lancer_shared::AppResult;

use crate::services::{group_service, profile_service};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub groups: Vec<String>,
    pub permissions: Vec<String>,
}

pub async fn me(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<MeResponse>>> {
    let mut conn = checkout(&state.db)?;

    let current = profile_service::load_user(&mut conn, user.id)?;
    let groups = group_service::group_names(&mut conn, user.id)?;
    let permissions = group_service::permission_names(&mut conn, user.id)?;

    Ok(Json(ApiResponse::ok(MeResponse {
        id: current.id,
        username: current.username,
        email: current.email,
        groups,
        permissions,
    })))
}
