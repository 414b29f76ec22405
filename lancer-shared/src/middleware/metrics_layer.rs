use std::time::Instant;

use axum::body::Body;
use axum::extract::MatchedPath;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};

const REQUEST_DURATION: &str = "http_request_duration_seconds";

const LATENCY_BUCKETS: &[f64] = &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0];

/// Counts and times each request under its route template, so `/profile/:user_id`
/// is one series rather than one per user.
pub async fn metrics_middleware(
    matched_path: Option<MatchedPath>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let started = Instant::now();
    let method = req.method().as_str().to_owned();
    let route = matched_path.map_or_else(|| "unmatched".to_owned(), |p| p.as_str().to_owned());

    let response = next.run(req).await;

    let labels = [
        ("method", method),
        ("route", route),
        ("status", response.status().as_u16().to_string()),
    ];
    counter!("http_requests_total", &labels).increment(1);
    histogram!(REQUEST_DURATION, &labels).record(started.elapsed().as_secs_f64());

    response
}

/// Installs the Prometheus recorder and registers descriptions for the
/// account counters emitted by the service.
pub fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(Matcher::Full(REQUEST_DURATION.to_owned()), LATENCY_BUCKETS)?
        .install_recorder()?;

    describe_histogram!(REQUEST_DURATION, Unit::Seconds, "HTTP request latency by route");
    describe_counter!("http_requests_total", "HTTP requests by route and status");
    describe_counter!("registrations_total", "Accounts created through signup");
    describe_counter!("login_failures_total", "Password logins rejected for bad credentials");
    describe_counter!("login_rejected_locked_total", "Logins refused while the account was locked");
    describe_counter!("account_lockouts_total", "Accounts locked after repeated failures");
    describe_counter!("verification_codes_issued_total", "Email verification codes sent");
    describe_counter!("email_verifications_total", "Email addresses verified");

    Ok(handle)
}
