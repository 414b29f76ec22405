use std::str::FromStr;

use chrono::{DateTime, Utc};
use diesel::pg::Pg;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use lancer_shared::types::{Paginated, PaginationParams};
use lancer_shared::{AppError, AppResult, ErrorCode};

use crate::models::{Certification, Education, Experience, PortfolioItem, SocialLink, User};
use crate::schema::{
    user_certifications, user_education, user_experience, user_portfolio, user_social_links, users,
};
use crate::services::group_service;

/// Keys removed from a profile before it is shown to other users.
pub const PRIVATE_FIELDS: &[&str] = &[
    "email",
    "phone_number",
    "last_login_ip",
    "notification_preferences",
    "privacy_settings",
    "is_verified",
    "phone_verified",
    "identity_verified",
];

pub fn user_not_found() -> AppError {
    AppError::new(ErrorCode::UserNotFound, "user not found")
}

pub fn load_user(conn: &mut PgConnection, user_id: Uuid) -> AppResult<User> {
    users::table
        .find(user_id)
        .select(User::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(user_not_found)
}

pub fn load_active_user(conn: &mut PgConnection, user_id: Uuid) -> AppResult<User> {
    users::table
        .find(user_id)
        .filter(users::is_active.eq(true))
        .select(User::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(user_not_found)
}

pub fn email_exists(conn: &mut PgConnection, email: &str) -> AppResult<bool> {
    let found = diesel::select(diesel::dsl::exists(users::table.filter(users::email.eq(email))))
        .get_result(conn)?;
    Ok(found)
}

pub fn username_exists(conn: &mut PgConnection, username: &str) -> AppResult<bool> {
    let found = diesel::select(diesel::dsl::exists(users::table.filter(users::username.eq(username))))
        .get_result(conn)?;
    Ok(found)
}

/// A user row with its resume sections and group names.
#[derive(Debug, Serialize)]
pub struct ProfileView {
    #[serde(flatten)]
    pub user: User,
    pub full_name: String,
    pub education: Vec<Education>,
    pub experience: Vec<Experience>,
    pub certifications: Vec<Certification>,
    pub portfolio: Vec<PortfolioItem>,
    pub social_links: Vec<SocialLink>,
    pub groups: Vec<String>,
}

impl ProfileView {
    /// The profile as JSON with [`PRIVATE_FIELDS`] removed.
    pub fn into_public(self) -> AppResult<serde_json::Value> {
        let mut value = serde_json::to_value(&self)
            .map_err(|e| AppError::internal(format!("profile serialization failed: {e}")))?;
        if let Some(map) = value.as_object_mut() {
            for field in PRIVATE_FIELDS {
                map.remove(*field);
            }
        }
        Ok(value)
    }
}

pub fn load_profile(conn: &mut PgConnection, user: User) -> AppResult<ProfileView> {
    let education = Education::belonging_to(&user)
        .select(Education::as_select())
        .order(user_education::start_date.desc())
        .load(conn)?;
    let experience = Experience::belonging_to(&user)
        .select(Experience::as_select())
        .order(user_experience::start_date.desc())
        .load(conn)?;
    let certifications = Certification::belonging_to(&user)
        .select(Certification::as_select())
        .order(user_certifications::issue_date.desc())
        .load(conn)?;
    let portfolio = PortfolioItem::belonging_to(&user)
        .select(PortfolioItem::as_select())
        .order(user_portfolio::created_at.desc())
        .load(conn)?;
    let social_links = SocialLink::belonging_to(&user)
        .select(SocialLink::as_select())
        .order(user_social_links::platform.asc())
        .load(conn)?;
    let groups = group_service::group_names(conn, user.id)?;

    Ok(ProfileView {
        full_name: user.full_name(),
        user,
        education,
        experience,
        certifications,
        portfolio,
        social_links,
        groups,
    })
}

/// Row shape for user listings.
#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserSummaryRow {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub user_type: String,
    pub profile_picture: Option<String>,
    pub title: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub average_rating: f64,
    pub total_reviews: i32,
    pub hourly_rate_cents: Option<i64>,
    pub currency: String,
    pub availability_status: String,
    pub skills: Vec<String>,
    pub is_verified: bool,
    pub last_activity: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub user_type: String,
    pub profile_picture: Option<String>,
    pub title: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub average_rating: f64,
    pub total_reviews: i32,
    pub hourly_rate_cents: Option<i64>,
    pub currency: String,
    pub availability_status: String,
    pub skills: Vec<String>,
    pub is_verified: bool,
    pub last_activity: DateTime<Utc>,
}

impl From<UserSummaryRow> for UserSummary {
    fn from(row: UserSummaryRow) -> Self {
        let full_name = format!(
            "{} {}",
            row.first_name.as_deref().unwrap_or_default(),
            row.last_name.as_deref().unwrap_or_default()
        )
        .trim()
        .to_string();
        Self {
            id: row.id,
            username: row.username,
            email: row.email,
            full_name,
            user_type: row.user_type,
            profile_picture: row.profile_picture,
            title: row.title,
            country: row.country,
            city: row.city,
            average_rating: row.average_rating,
            total_reviews: row.total_reviews,
            hourly_rate_cents: row.hourly_rate_cents,
            currency: row.currency,
            availability_status: row.availability_status,
            skills: row.skills,
            is_verified: row.is_verified,
            last_activity: row.last_activity,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    AverageRating,
    HourlyRate,
    TotalReviews,
    CreatedAt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ordering {
    pub field: SortField,
    pub descending: bool,
}

impl Default for Ordering {
    fn default() -> Self {
        Self { field: SortField::AverageRating, descending: true }
    }
}

impl FromStr for Ordering {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (descending, name) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let field = match name {
            "average_rating" => SortField::AverageRating,
            "hourly_rate" | "hourly_rate_cents" => SortField::HourlyRate,
            "total_reviews" => SortField::TotalReviews,
            "created_at" => SortField::CreatedAt,
            other => return Err(AppError::bad_request(format!("cannot order by '{other}'"))),
        };
        Ok(Self { field, descending })
    }
}

/// Query-string filters for the public user directory. Rates are in whole
/// currency units.
#[derive(Debug, Default, Deserialize)]
pub struct UserFilter {
    pub user_type: Option<String>,
    pub country: Option<String>,
    pub availability_status: Option<String>,
    pub experience_level: Option<String>,
    pub skills: Option<String>,
    pub min_rate: Option<f64>,
    pub max_rate: Option<f64>,
    pub min_rating: Option<f64>,
    pub search: Option<String>,
    pub ordering: Option<String>,
}

impl UserFilter {
    pub fn skill_list(&self) -> Vec<String> {
        self.skills
            .as_deref()
            .map(|s| {
                s.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn ordering(&self) -> AppResult<Ordering> {
        match self.ordering.as_deref().map(str::trim) {
            None | Some("") => Ok(Ordering::default()),
            Some(s) => s.parse(),
        }
    }
}

fn to_cents(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

pub(crate) fn like_pattern(term: &str) -> String {
    let escaped = term.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
    format!("%{escaped}%")
}

fn filtered_users<'a>(filter: &'a UserFilter) -> users::BoxedQuery<'a, Pg> {
    let mut query = users::table.filter(users::is_active.eq(true)).into_boxed();

    if let Some(user_type) = filter.user_type.as_deref() {
        query = query.filter(users::user_type.eq(user_type));
    }
    if let Some(country) = filter.country.as_deref() {
        query = query.filter(users::country.eq(country));
    }
    if let Some(status) = filter.availability_status.as_deref() {
        query = query.filter(users::availability_status.eq(status));
    }
    if let Some(level) = filter.experience_level.as_deref() {
        query = query.filter(users::experience_level.eq(level));
    }
    let skills = filter.skill_list();
    if !skills.is_empty() {
        query = query.filter(users::skills.overlaps_with(skills));
    }
    if let Some(min) = filter.min_rate {
        query = query.filter(users::hourly_rate_cents.ge(to_cents(min)));
    }
    if let Some(max) = filter.max_rate {
        query = query.filter(users::hourly_rate_cents.le(to_cents(max)));
    }
    if let Some(min) = filter.min_rating {
        query = query.filter(users::average_rating.ge(min));
    }
    if let Some(term) = filter.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        let pattern = like_pattern(term);
        query = query.filter(
            users::first_name
                .ilike(pattern.clone())
                .or(users::last_name.ilike(pattern.clone()))
                .or(users::title.ilike(pattern.clone()))
                .or(users::bio.ilike(pattern)),
        );
    }
    query
}

pub fn list_users(
    conn: &mut PgConnection,
    filter: &UserFilter,
    params: &PaginationParams,
) -> AppResult<Paginated<UserSummary>> {
    let ordering = filter.ordering()?;
    let total: i64 = filtered_users(filter).count().get_result(conn)?;

    let mut query = filtered_users(filter);
    query = match (ordering.field, ordering.descending) {
        (SortField::AverageRating, true) => query.order(users::average_rating.desc()),
        (SortField::AverageRating, false) => query.order(users::average_rating.asc()),
        (SortField::HourlyRate, true) => query.order(users::hourly_rate_cents.desc().nulls_last()),
        (SortField::HourlyRate, false) => query.order(users::hourly_rate_cents.asc().nulls_last()),
        (SortField::TotalReviews, true) => query.order(users::total_reviews.desc()),
        (SortField::TotalReviews, false) => query.order(users::total_reviews.asc()),
        (SortField::CreatedAt, true) => query.order(users::created_at.desc()),
        (SortField::CreatedAt, false) => query.order(users::created_at.asc()),
    };

    let rows: Vec<UserSummaryRow> = query
        .then_order_by(users::id.asc())
        .select(UserSummaryRow::as_select())
        .limit(params.limit() as i64)
        .offset(params.offset() as i64)
        .load(conn)?;

    Ok(Paginated::new(rows.into_iter().map(UserSummary::from).collect(), total as u64, params))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_parses_direction_prefix() {
        assert_eq!(
            "-total_reviews".parse::<Ordering>().unwrap(),
            Ordering { field: SortField::TotalReviews, descending: true }
        );
        assert_eq!(
            "hourly_rate".parse::<Ordering>().unwrap(),
            Ordering { field: SortField::HourlyRate, descending: false }
        );
        assert!("password_hash".parse::<Ordering>().is_err());
    }

    #[test]
    fn default_ordering_is_best_rated_first() {
        let filter = UserFilter::default();
        assert_eq!(filter.ordering().unwrap(), Ordering::default());
        assert!(Ordering::default().descending);
    }

    #[test]
    fn skill_list_trims_and_drops_blanks() {
        let filter = UserFilter { skills: Some(" rust, ,Go ,".into()), ..Default::default() };
        assert_eq!(filter.skill_list(), vec!["rust".to_string(), "Go".to_string()]);
    }

    #[test]
    fn rates_convert_to_cents() {
        assert_eq!(to_cents(75.0), 7500);
        assert_eq!(to_cents(19.99), 1999);
    }

    #[test]
    fn search_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }
}
