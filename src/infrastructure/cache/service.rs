//! Cache service trait and error types.

use async_trait::async_trait;
use thiserror::Error;

/// Default time-to-live for cached URL mappings, in seconds.
pub const DEFAULT_TTL_SECONDS: u64 = 3600;

/// Namespace prefix for cache keys (`link:{short_code}`).
pub const KEY_PREFIX: &str = "link:";

/// Builds the cache key for a short code.
pub fn cache_key(short_code: &str) -> String {
    format!("{}{}", KEY_PREFIX, short_code)
}

/// Errors that can occur inside a cache backend.
///
/// Never surfaced past the cache layer: callers see a miss or a no-op.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache connection error: {0}")]
    ConnectionError(String),
    #[error("Cache unavailable: {0}")]
    Unavailable(String),
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Trait for caching short code → URL mappings.
///
/// The cache is the read-acceleration path only; it is never written when a
/// link changes, only invalidated. Implementations must be thread-safe and
/// must degrade gracefully: a failing backend behaves like an empty cache.
///
/// # Implementations
///
/// - [`crate::infrastructure::cache::RedisCache`] - Redis-backed cache with TTL support
/// - [`crate::infrastructure::cache::MemoryCache`] - In-process cache with TTL support
/// - [`crate::infrastructure::cache::NullCache`] - No-op implementation for disabled caching
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CacheService: Send + Sync {
    /// Retrieves the original URL for a short code from cache.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(url))` on cache hit
    /// - `Ok(None)` on cache miss or backend failure (fail-open behavior)
    async fn get_url(&self, short_code: &str) -> CacheResult<Option<String>>;

    /// Stores a URL mapping with a TTL.
    ///
    /// `ttl_seconds = None` applies the implementation's default TTL.
    /// Failures are logged and reported as `Ok(())`.
    async fn set_url(
        &self,
        short_code: &str,
        original_url: &str,
        ttl_seconds: Option<u64>,
    ) -> CacheResult<()>;

    /// Removes a cached URL mapping.
    ///
    /// Must be called whenever a link's URL or expiry changes, or the link is
    /// deleted.
    async fn invalidate(&self, short_code: &str) -> CacheResult<()>;

    /// Checks if the cache backend is healthy.
    async fn health_check(&self) -> bool;

    /// Short backend name for logs and health output.
    fn backend_name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_format() {
        assert_eq!(cache_key("abc123"), "link:abc123");
        assert_eq!(cache_key("ABC123"), "link:ABC123");
    }
}
