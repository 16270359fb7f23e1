//! Cache backend used when caching is off.

use super::service::{CacheResult, CacheService};
use async_trait::async_trait;

/// Never stores anything, so every redirect reads the store.
///
/// Selected by `CACHE_BACKEND=none`, and as the fallback when Redis cannot be
/// reached at startup. Always reports healthy.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullCache;

impl NullCache {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CacheService for NullCache {
    async fn get_url(&self, _: &str) -> CacheResult<Option<String>> {
        Ok(None)
    }

    async fn set_url(&self, _: &str, _: &str, _: Option<u64>) -> CacheResult<()> {
        Ok(())
    }

    async fn invalidate(&self, _: &str) -> CacheResult<()> {
        Ok(())
    }

    async fn health_check(&self) -> bool {
        true
    }

    fn backend_name(&self) -> &'static str {
        "none"
    }
}
