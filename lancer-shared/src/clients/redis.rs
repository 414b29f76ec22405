use redis::aio::ConnectionManager;
use redis::RedisError;

/// Shared Redis handle. Cloning is cheap; each call clones the managed connection.
#[derive(Clone)]
pub struct RedisClient {
    manager: ConnectionManager,
}

impl RedisClient {
    pub async fn connect(url: &str) -> Result<Self, RedisError> {
        let manager = redis::Client::open(url)?.get_connection_manager().await?;
        tracing::info!("redis connection manager ready");
        Ok(Self { manager })
    }

    pub async fn ping(&self) -> Result<(), RedisError> {
        let mut conn = self.manager.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }

    /// Fixed-window counter. Returns true while `key` has been hit at most
    /// `limit` times in the current window of `window_secs`.
    ///
    /// The window key is created with its TTL before the increment, in one
    /// MULTI block, so a counter never outlives its window.
    pub async fn rate_limit_check(&self, key: &str, limit: u64, window_secs: u64) -> Result<bool, RedisError> {
        let mut conn = self.manager.clone();
        let (hits,): (u64,) = redis::pipe()
            .atomic()
            .cmd("SET")
            .arg(key)
            .arg(0)
            .arg("NX")
            .arg("EX")
            .arg(window_secs.max(1))
            .ignore()
            .cmd("INCR")
            .arg(key)
            .query_async(&mut conn)
            .await?;
        tracing::debug!(key, hits, limit, "rate limit window hit");
        Ok(hits <= limit)
    }
}
