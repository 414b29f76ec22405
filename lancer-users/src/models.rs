use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use lancer_shared::types::auth::UserType;

use crate::schema::{
    groups, refresh_tokens, user_certifications, user_education, user_experience, user_portfolio,
    user_social_links, users,
};

pub const EXPERIENCE_LEVELS: &[&str] = &["entry", "intermediate", "expert", "senior"];
pub const AVAILABILITY_STATUSES: &[&str] = &["available", "busy", "unavailable"];
pub const COMPANY_SIZES: &[&str] = &["startup", "small", "medium", "large"];
pub const SOCIAL_PLATFORMS: &[&str] = &[
    "linkedin", "github", "twitter", "instagram", "dribbble", "behance", "facebook", "youtube",
    "website", "other",
];
pub const TIMEZONES: &[&str] = &[
    "UTC",
    "America/New_York",
    "America/Chicago",
    "America/Denver",
    "America/Los_Angeles",
    "Europe/London",
    "Europe/Berlin",
    "Asia/Tokyo",
    "Asia/Shanghai",
    "Asia/Kolkata",
];

fn one_of(value: &str, allowed: &[&str], code: &'static str) -> Result<(), ValidationError> {
    if allowed.contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::new(code))
    }
}

fn validate_experience_level(value: &str) -> Result<(), ValidationError> {
    one_of(value, EXPERIENCE_LEVELS, "invalid_experience_level")
}

fn validate_availability(value: &str) -> Result<(), ValidationError> {
    one_of(value, AVAILABILITY_STATUSES, "invalid_availability_status")
}

fn validate_company_size(value: &str) -> Result<(), ValidationError> {
    one_of(value, COMPANY_SIZES, "invalid_company_size")
}

fn validate_timezone(value: &str) -> Result<(), ValidationError> {
    one_of(value, TIMEZONES, "invalid_timezone")
}

fn validate_platform(value: &str) -> Result<(), ValidationError> {
    one_of(value, SOCIAL_PLATFORMS, "invalid_platform")
}

/// Distinguishes an explicit `null` (clear the column) from an absent key.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Digits once `+`, `-` and spaces are removed; at most 15 characters as stored.
pub fn validate_phone(value: &str) -> Result<(), ValidationError> {
    let mut digits = value.chars().filter(|c| !matches!(c, '+' | '-' | ' ')).peekable();
    let valid = value.len() <= 15 && digits.peek().is_some() && digits.all(|c| c.is_ascii_digit());
    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_phone_number"))
    }
}

// --- Users ---

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub user_type: String,
    pub phone_number: Option<String>,
    pub profile_picture: Option<String>,
    pub bio: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub timezone: String,
    pub title: Option<String>,
    pub company_name: Option<String>,
    pub website: Option<String>,
    pub linkedin_url: Option<String>,
    pub github_url: Option<String>,
    pub portfolio_url: Option<String>,
    pub skills: Vec<String>,
    pub experience_level: Option<String>,
    pub years_of_experience: Option<i32>,
    pub languages_spoken: Vec<String>,
    pub hourly_rate_cents: Option<i64>,
    pub currency: String,
    pub availability_status: String,
    pub availability_hours_per_week: Option<i32>,
    pub average_rating: f64,
    pub total_reviews: i32,
    pub total_projects_completed: i32,
    pub company_size: Option<String>,
    pub industry: Option<String>,
    pub total_projects_posted: i32,
    pub total_spent_cents: i64,
    pub is_verified: bool,
    #[serde(skip_serializing)]
    pub email_verification_token: Option<String>,
    #[serde(skip_serializing)]
    pub email_verification_expires: Option<DateTime<Utc>>,
    pub phone_verified: bool,
    pub identity_verified: bool,
    #[serde(skip_serializing)]
    pub last_login_ip: Option<String>,
    #[serde(skip_serializing)]
    pub mfa_enabled: bool,
    #[serde(skip_serializing)]
    pub login_attempts: i32,
    #[serde(skip_serializing)]
    pub last_failed_login: Option<DateTime<Utc>>,
    #[serde(skip_serializing)]
    pub account_locked_until: Option<DateTime<Utc>>,
    pub profile_completion_percentage: i32,
    pub last_activity: DateTime<Utc>,
    pub is_featured: bool,
    pub is_premium: bool,
    pub premium_expires: Option<DateTime<Utc>>,
    pub notification_preferences: serde_json::Value,
    pub privacy_settings: serde_json::Value,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn kind(&self) -> UserType {
        self.user_type.parse().unwrap_or_else(|e| {
            tracing::warn!(user_id = %self.id, error = %e, "unrecognised user type, treating as client");
            UserType::Client
        })
    }

    pub fn full_name(&self) -> String {
        let first = self.first_name.as_deref().unwrap_or_default();
        let last = self.last_name.as_deref().unwrap_or_default();
        format!("{first} {last}").trim().to_string()
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub user_type: String,
    pub phone_number: Option<String>,
    pub profile_picture: Option<String>,
    pub is_verified: bool,
}

/// Self-service profile edit. Every field is optional; only supplied fields change.
#[derive(Debug, Default, Deserialize, Validate, AsChangeset)]
#[diesel(table_name = users)]
pub struct UpdateUser {
    #[validate(length(max = 150))]
    pub first_name: Option<String>,
    #[validate(length(max = 150))]
    pub last_name: Option<String>,
    #[validate(custom = "validate_phone")]
    pub phone_number: Option<String>,
    #[validate(length(max = 1000))]
    pub bio: Option<String>,
    #[validate(length(max = 100))]
    pub country: Option<String>,
    #[validate(length(max = 100))]
    pub city: Option<String>,
    #[validate(custom = "validate_timezone")]
    pub timezone: Option<String>,
    #[validate(length(max = 100))]
    pub title: Option<String>,
    #[validate(length(max = 100))]
    pub company_name: Option<String>,
    #[validate(url)]
    pub website: Option<String>,
    #[validate(url)]
    pub linkedin_url: Option<String>,
    #[validate(url)]
    pub github_url: Option<String>,
    #[validate(url)]
    pub portfolio_url: Option<String>,
    pub skills: Option<Vec<String>>,
    #[validate(custom = "validate_experience_level")]
    pub experience_level: Option<String>,
    #[validate(range(min = 0, max = 80))]
    pub years_of_experience: Option<i32>,
    pub languages_spoken: Option<Vec<String>>,
    #[validate(range(min = 0))]
    pub hourly_rate_cents: Option<i64>,
    #[validate(length(equal = 3))]
    pub currency: Option<String>,
    #[validate(custom = "validate_availability")]
    pub availability_status: Option<String>,
    #[validate(range(min = 0, max = 168))]
    pub availability_hours_per_week: Option<i32>,
    #[validate(custom = "validate_company_size")]
    pub company_size: Option<String>,
    #[validate(length(max = 100))]
    pub industry: Option<String>,
    pub notification_preferences: Option<serde_json::Value>,
    pub privacy_settings: Option<serde_json::Value>,
}

impl UpdateUser {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.phone_number.is_none()
            && self.bio.is_none()
            && self.country.is_none()
            && self.city.is_none()
            && self.timezone.is_none()
            && self.title.is_none()
            && self.company_name.is_none()
            && self.website.is_none()
            && self.linkedin_url.is_none()
            && self.github_url.is_none()
            && self.portfolio_url.is_none()
            && self.skills.is_none()
            && self.experience_level.is_none()
            && self.years_of_experience.is_none()
            && self.languages_spoken.is_none()
            && self.hourly_rate_cents.is_none()
            && self.currency.is_none()
            && self.availability_status.is_none()
            && self.availability_hours_per_week.is_none()
            && self.company_size.is_none()
            && self.industry.is_none()
            && self.notification_preferences.is_none()
            && self.privacy_settings.is_none()
    }
}

// --- Resume sections ---

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations, Serialize)]
#[diesel(belongs_to(User))]
#[diesel(table_name = user_education)]
pub struct Education {
    pub id: Uuid,
    pub user_id: Uuid,
    pub degree: String,
    pub field_of_study: String,
    pub institution: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, Insertable)]
#[diesel(table_name = user_education)]
pub struct EducationInput {
    #[validate(length(min = 1, max = 100))]
    pub degree: String,
    #[validate(length(min = 1, max = 100))]
    pub field_of_study: String,
    #[validate(length(min = 1, max = 200))]
    pub institution: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub description: Option<String>,
}

#[derive(Debug, Default, PartialEq, Deserialize, Validate, AsChangeset)]
#[diesel(table_name = user_education)]
pub struct EducationChanges {
    #[validate(length(min = 1, max = 100))]
    pub degree: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub field_of_study: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub institution: Option<String>,
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "double_option")]
    pub end_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations, Serialize)]
#[diesel(belongs_to(User))]
#[diesel(table_name = user_experience)]
pub struct Experience {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub company: String,
    pub location: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub description: Option<String>,
    pub is_current: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, Insertable)]
#[diesel(table_name = user_experience)]
pub struct ExperienceInput {
    #[validate(length(min = 1, max = 100))]
    pub title: String,
    #[validate(length(min = 1, max = 200))]
    pub company: String,
    #[validate(length(max = 100))]
    pub location: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub description: Option<String>,
    #[serde(default)]
    pub is_current: bool,
}

#[derive(Debug, Default, PartialEq, Deserialize, Validate, AsChangeset)]
#[diesel(table_name = user_experience)]
pub struct ExperienceChanges {
    #[validate(length(min = 1, max = 100))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub company: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub location: Option<Option<String>>,
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "double_option")]
    pub end_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub is_current: Option<bool>,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations, Serialize)]
#[diesel(belongs_to(User))]
#[diesel(table_name = user_certifications)]
pub struct Certification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub issuing_organization: String,
    pub issue_date: NaiveDate,
    pub expiry_date: Option<NaiveDate>,
    pub credential_id: Option<String>,
    pub credential_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, Insertable)]
#[diesel(table_name = user_certifications)]
pub struct CertificationInput {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(min = 1, max = 200))]
    pub issuing_organization: String,
    pub issue_date: NaiveDate,
    pub expiry_date: Option<NaiveDate>,
    #[validate(length(max = 100))]
    pub credential_id: Option<String>,
    #[validate(url)]
    pub credential_url: Option<String>,
}

#[derive(Debug, Default, PartialEq, Deserialize, Validate, AsChangeset)]
#[diesel(table_name = user_certifications)]
pub struct CertificationChanges {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub issuing_organization: Option<String>,
    pub issue_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "double_option")]
    pub expiry_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "double_option")]
    pub credential_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub credential_url: Option<Option<String>>,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations, Serialize)]
#[diesel(belongs_to(User))]
#[diesel(table_name = user_portfolio)]
pub struct PortfolioItem {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub image: Option<String>,
    pub url: Option<String>,
    pub technologies_used: Vec<String>,
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, Insertable)]
#[diesel(table_name = user_portfolio)]
pub struct PortfolioInput {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1))]
    pub description: String,
    #[validate(url)]
    pub image: Option<String>,
    #[validate(url)]
    pub url: Option<String>,
    #[serde(default)]
    pub technologies_used: Vec<String>,
    #[serde(default)]
    pub is_featured: bool,
}

#[derive(Debug, Default, PartialEq, Deserialize, Validate, AsChangeset)]
#[diesel(table_name = user_portfolio)]
pub struct PortfolioChanges {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(min = 1))]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub image: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub url: Option<Option<String>>,
    pub technologies_used: Option<Vec<String>>,
    pub is_featured: Option<bool>,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations, Serialize)]
#[diesel(belongs_to(User))]
#[diesel(table_name = user_social_links)]
pub struct SocialLink {
    pub id: Uuid,
    pub user_id: Uuid,
    pub platform: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, Insertable)]
#[diesel(table_name = user_social_links)]
pub struct SocialLinkInput {
    #[validate(custom = "validate_platform")]
    pub platform: String,
    #[validate(url)]
    pub url: String,
}

#[derive(Debug, Default, PartialEq, Deserialize, Validate, AsChangeset)]
#[diesel(table_name = user_social_links)]
pub struct SocialLinkChanges {
    #[validate(custom = "validate_platform")]
    pub platform: Option<String>,
    #[validate(url)]
    pub url: Option<String>,
}

// --- Groups ---

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = groups)]
pub struct Group {
    pub id: i32,
    pub name: String,
}

// --- Refresh Tokens ---

#[derive(Debug, Queryable, Selectable, Identifiable)]
#[diesel(table_name = refresh_tokens)]
pub struct RefreshToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = refresh_tokens)]
pub struct NewRefreshToken {
    pub user_id: Uuid,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_numbers() {
        assert!(validate_phone("+14155550123").is_ok());
        assert!(validate_phone("+1 415-555-012").is_ok());
        assert!(validate_phone("415.555.0123").is_err());
        assert!(validate_phone("+-").is_err());
        assert!(validate_phone("+1234567890123456").is_err());
    }

    #[test]
    fn profile_update_rejects_unknown_choices() {
        let update = UpdateUser {
            experience_level: Some("guru".into()),
            ..Default::default()
        };
        let errors = update.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("experience_level"));

        let update = UpdateUser {
            experience_level: Some("expert".into()),
            company_size: Some("medium".into()),
            timezone: Some("Europe/Berlin".into()),
            ..Default::default()
        };
        assert!(update.validate().is_ok());
    }

    #[test]
    fn profile_update_bounds() {
        let update = UpdateUser {
            hourly_rate_cents: Some(-1),
            availability_hours_per_week: Some(200),
            ..Default::default()
        };
        let errors = update.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("hourly_rate_cents"));
        assert!(fields.contains_key("availability_hours_per_week"));
    }

    #[test]
    fn empty_update_detected() {
        assert!(UpdateUser::default().is_empty());
        let update = UpdateUser { bio: Some(String::new()), ..Default::default() };
        assert!(!update.is_empty());
    }

    #[test]
    fn explicit_null_clears_optional_column() {
        let changes: EducationChanges = serde_json::from_str(r#"{"end_date": null}"#).unwrap();
        assert_eq!(changes.end_date, Some(None));
        assert_eq!(changes.description, None);
        assert_ne!(changes, EducationChanges::default());
    }

    #[test]
    fn social_platform_choices() {
        let link = SocialLinkInput { platform: "myspace".into(), url: "https://myspace.com/x".into() };
        assert!(link.validate().is_err());
        let link = SocialLinkInput { platform: "github".into(), url: "https://github.com/x".into() };
        assert!(link.validate().is_ok());
    }
}
