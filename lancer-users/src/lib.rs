use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::{middleware, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod account;
pub mod config;
pub mod models;
pub mod routes;
pub mod schema;
pub mod services;

use account::{AccountSecurity, PgAccountStore, SystemClock};
use config::AppConfig;
use lancer_shared::clients::db::DbPool;
use lancer_shared::clients::email::EmailClient;
use lancer_shared::clients::minio::MinioClient;
use lancer_shared::clients::redis::RedisClient;
use lancer_shared::middleware::metrics_middleware;

pub type Security = AccountSecurity<PgAccountStore, SystemClock>;

pub struct AppState {
    pub db: DbPool,
    pub config: AppConfig,
    pub redis: RedisClient,
    pub email: EmailClient,
    pub minio: MinioClient,
    pub http: reqwest::Client,
    pub security: Security,
    pub metrics_handle: PrometheusHandle,
}

pub fn router(state: Arc<AppState>) -> Router {
    use routes::*;

    let photo_limit = state.config.max_photo_bytes + 64 * 1024;

    Router::new()
        .route("/health", get(health::health_check))
        .route("/metrics", get(health::metrics))
        // Authentication
        .route("/register", post(register::register))
        .route("/login", post(login::login))
        .route("/google", post(google::google_login))
        .route("/token/refresh", post(refresh::refresh_token))
        .route("/change-password", post(change_password::change_password))
        .route("/user", get(me::me))
        // Email verification
        .route("/verify-email", post(verify_email::verify_email))
        .route("/verify-email/send", post(verify_email::send_code))
        // Profile
        .route("/users/profile", get(profile::current_profile))
        .route(
            "/profile/update",
            axum::routing::put(profile::update_profile).patch(profile::update_profile),
        )
        .route("/profile/completion/update", post(profile::update_completion))
        .route(
            "/profile/photo",
            post(profile::upload_photo).layer(DefaultBodyLimit::max(photo_limit)),
        )
        .route("/profile/:user_id", get(profile::public_profile))
        // Directory
        .route("/users", get(users::list_users))
        .route("/users/:user_id/portfolio", get(users::public_portfolio))
        // Resume sections
        .nest("/profile/education", education::routes())
        .nest("/profile/experience", experience::routes())
        .nest("/profile/certifications", certifications::routes())
        .nest("/profile/portfolio", portfolio::routes())
        .nest("/profile/social-links", social_links::routes())
        // Administration
        .route("/admin/users", get(admin::list_users))
        .route("/admin/users/assign-group", post(admin::assign_group))
        .route("/admin/users/:user_id/toggle-status", post(admin::toggle_status))
        .route("/admin/stats", get(admin::stats))
        // Service-to-service
        .route("/internal/users/:user_id/reviews", post(internal::record_review))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
