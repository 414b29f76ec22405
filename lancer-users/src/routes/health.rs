use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use diesel::prelude::*;
use std::sync::Arc;

use lancer_shared::clients::db::checkout;
use lancer_shared::{HealthCheck, HealthResponse, HealthStatus};

use crate::AppState;

/// Probes Postgres and Redis.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Response {
    let postgres = checkout(&state.db).and_then(|mut conn| {
        diesel::sql_query("SELECT 1").execute(&mut conn)?;
        Ok(())
    });
    let redis = state.redis.ping().await;

    let response = HealthResponse::new(
        "lancer-users",
        env!("CARGO_PKG_VERSION"),
        vec![
            HealthCheck::from_result("postgres", postgres),
            HealthCheck::from_result("redis", redis),
        ],
    );

    let status = match response.status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status, Json(response)).into_response()
}

/// Returns Prometheus metrics.
pub async fn metrics(State(state): State<Arc<AppState>>) -> String {
    state.metrics_handle.render()
}
