use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use diesel::dsl::count_star;
use diesel::pg::Pg;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use lancer_shared::clients::db::checkout;
use lancer_shared::types::auth::{AuthUser, UserType};
use lancer_shared::types::pagination::{Paginated, PaginationParams};
use lancer_shared::types::ApiResponse;
use lancer_shared::AppResult;

use crate::schema::{groups, user_groups, users};
use crate::services::group_service;
use crate::services::profile_service;
use crate::AppState;

const TOP_COUNTRIES: usize = 10;

#[derive(Debug, Default, Deserialize)]
pub struct AdminUserFilter {
    pub user_type: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
struct AdminUserRow {
    id: Uuid,
    username: String,
    email: String,
    first_name: Option<String>,
    last_name: Option<String>,
    user_type: String,
    is_active: bool,
    is_verified: bool,
    profile_completion_percentage: i32,
    created_at: DateTime<Utc>,
    last_activity: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct AdminUserEntry {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub user_type: String,
    pub groups: Vec<String>,
    pub is_active: bool,
    pub is_verified: bool,
    pub profile_completion_percentage: i32,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

fn admin_filtered<'a>(filter: &'a AdminUserFilter) -> users::BoxedQuery<'a, Pg> {
    let mut query = users::table.into_boxed();
    if let Some(user_type) = filter.user_type.as_deref().filter(|t| !t.is_empty()) {
        query = query.filter(users::user_type.eq(user_type));
    }
    if let Some(term) = filter.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        let pattern = profile_service::like_pattern(term);
        query = query.filter(
            users::email
                .ilike(pattern.clone())
                .or(users::first_name.ilike(pattern.clone()))
                .or(users::last_name.ilike(pattern.clone()))
                .or(users::username.ilike(pattern)),
        );
    }
    query
}

fn groups_by_user(conn: &mut PgConnection, ids: &[Uuid]) -> AppResult<HashMap<Uuid, Vec<String>>> {
    let pairs: Vec<(Uuid, String)> = user_groups::table
        .inner_join(groups::table)
        .filter(user_groups::user_id.eq_any(ids))
        .select((user_groups::user_id, groups::name))
        .order(groups::name.asc())
        .load(conn)?;

    let mut map: HashMap<Uuid, Vec<String>> = HashMap::new();
    for (user_id, name) in pairs {
        map.entry(user_id).or_default().push(name);
    }
    Ok(map)
}

pub async fn list_users(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Query(filter): Query<AdminUserFilter>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<ApiResponse<Paginated<AdminUserEntry>>>> {
    let mut conn = checkout(&state.db)?;
    group_service::require_admin(&mut conn, user.id)?;

    let total: i64 = admin_filtered(&filter).count().get_result(&mut conn)?;
    let rows: Vec<AdminUserRow> = admin_filtered(&filter)
        .order((users::created_at.desc(), users::id.asc()))
        .select(AdminUserRow::as_select())
        .limit(params.limit() as i64)
        .offset(params.offset() as i64)
        .load(&mut conn)?;

    let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
    let mut memberships = groups_by_user(&mut conn, &ids)?;

    let items = rows
        .into_iter()
        .map(|row| {
            let full_name = format!(
                "{} {}",
                row.first_name.as_deref().unwrap_or_default(),
                row.last_name.as_deref().unwrap_or_default()
            )
            .trim()
            .to_string();
            AdminUserEntry {
                groups: memberships.remove(&row.id).unwrap_or_default(),
                id: row.id,
                username: row.username,
                email: row.email,
                full_name,
                user_type: row.user_type,
                is_active: row.is_active,
                is_verified: row.is_verified,
                profile_completion_percentage: row.profile_completion_percentage,
                created_at: row.created_at,
                last_activity: row.last_activity,
            }
        })
        .collect();

    Ok(Json(ApiResponse::ok(Paginated::new(items, total as u64, &params))))
}

#[derive(Debug, Deserialize)]
pub struct AssignGroupRequest {
    pub user_id: Uuid,
    pub group_name: String,
    #[serde(default)]
    pub clear_groups: bool,
}

#[derive(Debug, Serialize)]
pub struct AssignGroupResponse {
    pub user_groups: Vec<String>,
}

pub async fn assign_group(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<AssignGroupRequest>,
) -> AppResult<Json<ApiResponse<AssignGroupResponse>>> {
    let mut conn = checkout(&state.db)?;
    group_service::require_admin(&mut conn, user.id)?;

    let target = profile_service::load_user(&mut conn, req.user_id)?;
    let user_groups = group_service::assign_group(&mut conn, target.id, &req.group_name, req.clear_groups)?;

    tracing::info!(
        admin_id = %user.id,
        user_id = %target.id,
        group = %req.group_name,
        clear_groups = req.clear_groups,
        "group assigned"
    );

    Ok(Json(ApiResponse::ok_with_message(
        AssignGroupResponse { user_groups },
        format!("user {} assigned to {} group", target.username, req.group_name),
    )))
}

#[derive(Debug, Serialize)]
pub struct ToggleStatusResponse {
    pub is_active: bool,
}

pub async fn toggle_status(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ToggleStatusResponse>>> {
    let mut conn = checkout(&state.db)?;
    group_service::require_admin(&mut conn, user.id)?;

    let (username, is_active): (String, bool) = diesel::update(users::table.find(user_id))
        .set((users::is_active.eq(diesel::dsl::not(users::is_active)), users::updated_at.eq(Utc::now())))
        .returning((users::username, users::is_active))
        .get_result(&mut conn)
        .optional()?
        .ok_or_else(profile_service::user_not_found)?;

    tracing::info!(admin_id = %user.id, user_id = %user_id, is_active, "user status toggled");

    let verb = if is_active { "activated" } else { "deactivated" };
    Ok(Json(ApiResponse::ok_with_message(
        ToggleStatusResponse { is_active },
        format!("user {username} {verb}"),
    )))
}

#[derive(Debug, Serialize, PartialEq)]
pub struct CountryCount {
    pub country: String,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct UserStats {
    pub total_users: i64,
    pub total_freelancers: i64,
    pub total_clients: i64,
    pub verified_users: i64,
    pub premium_users: i64,
    pub verification_rate: f64,
    pub users_by_country: Vec<CountryCount>,
}

fn verification_rate(verified: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    verified as f64 / total as f64 * 100.0
}

fn top_countries(mut counts: Vec<(String, i64)>) -> Vec<CountryCount> {
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    counts
        .into_iter()
        .take(TOP_COUNTRIES)
        .map(|(country, count)| CountryCount { country, count })
        .collect()
}

pub async fn stats(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<UserStats>>> {
    let mut conn = checkout(&state.db)?;
    group_service::require_admin(&mut conn, user.id)?;

    let total_users: i64 = users::table.count().get_result(&mut conn)?;
    let total_freelancers: i64 = users::table
        .filter(users::user_type.eq(UserType::Freelancer.as_str()))
        .count()
        .get_result(&mut conn)?;
    let total_clients: i64 = users::table
        .filter(users::user_type.eq(UserType::Client.as_str()))
        .count()
        .get_result(&mut conn)?;
    let verified_users: i64 = users::table
        .filter(users::is_verified.eq(true))
        .count()
        .get_result(&mut conn)?;
    let premium_users: i64 = users::table
        .filter(users::is_premium.eq(true))
        .count()
        .get_result(&mut conn)?;

    let by_country: Vec<(Option<String>, i64)> = users::table
        .filter(users::country.is_not_null())
        .filter(users::country.ne(""))
        .group_by(users::country)
        .select((users::country, count_star()))
        .load(&mut conn)?;
    let by_country = by_country
        .into_iter()
        .filter_map(|(country, count)| country.map(|c| (c, count)))
        .collect();

    Ok(Json(ApiResponse::ok(UserStats {
        total_users,
        total_freelancers,
        total_clients,
        verified_users,
        premium_users,
        verification_rate: verification_rate(verified_users, total_users),
        users_by_country: top_countries(by_country),
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verification_rate_handles_empty_platform() {
        assert_eq!(verification_rate(0, 0), 0.0);
        assert_eq!(verification_rate(3, 4), 75.0);
    }

    #[test]
    fn top_countries_sorted_and_capped() {
        let mut counts: Vec<(String, i64)> = (0..12).map(|i| (format!("C{i:02}"), i)).collect();
        counts.push(("AA".into(), 11));

        let top = top_countries(counts);
        assert_eq!(top.len(), TOP_COUNTRIES);
        assert_eq!(top[0], CountryCount { country: "AA".into(), count: 11 });
        assert_eq!(top[1], CountryCount { country: "C11".into(), count: 11 });
        assert_eq!(top[9].count, 3);
    }
}
