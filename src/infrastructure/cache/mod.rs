//! Caching layer for fast redirect lookups.
//!
//! Provides a [`CacheService`] trait with three implementations:
//! - [`RedisCache`] - Production Redis-backed cache
//! - [`MemoryCache`] - In-process cache for single-instance deployments
//! - [`NullCache`] - No-op implementation for disabled caching
//!
//! Keys follow the `link:{short_code}` format; values are the destination URL.

mod memory_cache;
mod null_cache;
mod redis_cache;
mod service;

pub use memory_cache::MemoryCache;
pub use null_cache::NullCache;
pub use redis_cache::RedisCache;
pub use service::{
    CacheError, CacheResult, CacheService, DEFAULT_TTL_SECONDS, KEY_PREFIX, cache_key,
};

#[cfg(test)]
pub use service::MockCacheService;
