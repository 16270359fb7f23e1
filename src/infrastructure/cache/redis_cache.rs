//! Redis-backed cache implementation.

use super::service::{CacheError, CacheResult, CacheService, cache_key};
use async_trait::async_trait;
use redis::{AsyncCommands, Client, RedisResult, aio::ConnectionManager};
use tracing::{debug, info, warn};

/// Link cache shared by every instance pointing at the same Redis.
///
/// Entries are plain `SET key url EX ttl` strings. Backend errors never leave
/// this type: a failed read is a miss, a failed write or delete is a no-op.
pub struct RedisCache {
    manager: ConnectionManager,
    default_ttl_seconds: u64,
}

impl RedisCache {
    /// Opens a managed connection and checks it with `PING`.
    ///
    /// `default_ttl_seconds` applies when [`CacheService::set_url`] is called
    /// without a TTL.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::ConnectionError`] if the URL is malformed or the
    /// server does not answer.
    pub async fn connect(redis_url: &str, default_ttl_seconds: u64) -> CacheResult<Self> {
        let client = Client::open(redis_url)
            .map_err(|e| CacheError::ConnectionError(format!("invalid Redis URL: {}", e)))?;

        let mut manager = ConnectionManager::new(client)
            .await
            .map_err(|e| CacheError::ConnectionError(e.to_string()))?;

        manager
            .ping::<()>()
            .await
            .map_err(|e| CacheError::ConnectionError(format!("PING failed: {}", e)))?;

        info!("Connected to Redis (default TTL {}s)", default_ttl_seconds);

        Ok(Self {
            manager,
            default_ttl_seconds,
        })
    }

    /// Clone of the managed connection; clones share one multiplexed socket.
    fn conn(&self) -> ConnectionManager {
        self.manager.clone()
    }
}

/// Logs a failed command and turns it into `None`.
fn absorb<T>(op: &str, short_code: &str, result: RedisResult<T>) -> Option<T> {
    result
        .inspect_err(|e| {
            warn!("Redis {} failed for {}: {}", op, short_code, e);
            metrics::counter!("cache_errors_total", "op" => op.to_string()).increment(1);
        })
        .ok()
}

#[async_trait]
impl CacheService for RedisCache {
    async fn get_url(&self, short_code: &str) -> CacheResult<Option<String>> {
        let result = self
            .conn()
            .get::<_, Option<String>>(cache_key(short_code))
            .await;

        Ok(absorb("GET", short_code, result).flatten())
    }

    async fn set_url(
        &self,
        short_code: &str,
        original_url: &str,
        ttl_seconds: Option<u64>,
    ) -> CacheResult<()> {
        let ttl = ttl_seconds.unwrap_or(self.default_ttl_seconds);
        let result = self
            .conn()
            .set_ex::<_, _, ()>(cache_key(short_code), original_url, ttl)
            .await;

        if absorb("SET", short_code, result).is_some() {
            debug!("Cached {} for {}s", short_code, ttl);
        }

        Ok(())
    }

    async fn invalidate(&self, short_code: &str) -> CacheResult<()> {
        let result = self.conn().del::<_, u32>(cache_key(short_code)).await;

        if let Some(removed) = absorb("DEL", short_code, result)
            && removed > 0
        {
            debug!("Invalidated {}", short_code);
        }

        Ok(())
    }

    async fn health_check(&self) -> bool {
        self.conn().ping::<()>().await.is_ok()
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}
