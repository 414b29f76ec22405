use std::sync::Arc;

use lancer_shared::clients::db::{checkout, create_pool};
use lancer_shared::clients::email::EmailClient;
use lancer_shared::clients::minio::MinioClient;
use lancer_shared::clients::redis::RedisClient;
use lancer_shared::middleware::{init_metrics, init_tracing};

use lancer_users::account::{AccountSecurity, PgAccountStore, SystemClock};
use lancer_users::config::AppConfig;
use lancer_users::services::group_service;
use lancer_users::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing("lancer-users");

    let config = AppConfig::load()?;
    let port = config.port;
    let metrics_handle = init_metrics()?;

    let db = create_pool(&config.database_url, config.db_pool_size)?;
    {
        let mut conn = checkout(&db)?;
        group_service::ensure_default_groups(&mut conn)?;
    }

    let redis = RedisClient::connect(&config.redis_url).await?;
    let email = EmailClient::new(&config.resend_api_key, &config.from_email, &config.from_name);
    let minio = MinioClient::new(
        &config.minio_endpoint,
        &config.minio_access_key,
        &config.minio_secret_key,
        &config.minio_bucket,
        &config.minio_public_url,
    )
    .await;
    let http = reqwest::Client::new();
    let security = AccountSecurity::new(PgAccountStore::new(db.clone()), SystemClock);

    let state = Arc::new(AppState {
        db,
        config,
        redis,
        email,
        minio,
        http,
        security,
        metrics_handle,
    });

    let app = router(state);

    let addr = format!("0.0.0.0:{port}");
    tracing::info!(addr = %addr, "lancer-users starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
