//! In-process cache implementation with per-entry TTL.

use super::service::{CacheResult, CacheService, cache_key};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;

/// Every this many writes, expired entries are swept from the whole map.
const SWEEP_EVERY: usize = 256;

struct Entry {
    url: String,
    expires_at: Instant,
}

/// Cache backed by a concurrent map inside the process.
///
/// Intended for single-instance deployments and tests. Expired entries are
/// evicted on read, and swept periodically on write so codes that are never
/// requested again do not pile up.
pub struct MemoryCache {
    entries: DashMap<String, Entry>,
    default_ttl: Duration,
    writes: AtomicUsize,
}

impl MemoryCache {
    pub fn new(default_ttl_seconds: u64) -> Self {
        Self {
            entries: DashMap::new(),
            default_ttl: Duration::from_secs(default_ttl_seconds),
            writes: AtomicUsize::new(0),
        }
    }

    fn sweep_expired(&self) {
        let before = self.entries.len();
        let now = Instant::now();
        self.entries.retain(|_, entry| now < entry.expires_at);

        let swept = before.saturating_sub(self.entries.len());
        if swept > 0 {
            debug!("Cache SWEEP: dropped {} expired entries", swept);
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.len()
    }
}

#[async_trait]
impl CacheService for MemoryCache {
    async fn get_url(&self, short_code: &str) -> CacheResult<Option<String>> {
        let key = cache_key(short_code);

        let hit = self
            .entries
            .get(&key)
            .map(|entry| (entry.url.clone(), entry.expires_at));

        match hit {
            Some((url, expires_at)) if Instant::now() < expires_at => {
                debug!("Cache HIT: {} -> {}", short_code, url);
                Ok(Some(url))
            }
            Some(_) => {
                self.entries
                    .remove_if(&key, |_, entry| Instant::now() >= entry.expires_at);
                debug!("Cache EXPIRED: {}", short_code);
                Ok(None)
            }
            None => {
                debug!("Cache MISS: {}", short_code);
                Ok(None)
            }
        }
    }

    async fn set_url(
        &self,
        short_code: &str,
        original_url: &str,
        ttl_seconds: Option<u64>,
    ) -> CacheResult<()> {
        let ttl = ttl_seconds
            .map(Duration::from_secs)
            .unwrap_or(self.default_ttl);

        if self.writes.fetch_add(1, Ordering::Relaxed) % SWEEP_EVERY == 0 {
            self.sweep_expired();
        }

        self.entries.insert(
            cache_key(short_code),
            Entry {
                url: original_url.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );

        debug!(
            "Cache SET: {} -> {} (TTL: {}s)",
            short_code,
            original_url,
            ttl.as_secs()
        );
        Ok(())
    }

    async fn invalidate(&self, short_code: &str) -> CacheResult<()> {
        if self.entries.remove(&cache_key(short_code)).is_some() {
            debug!("Cache INVALIDATE: {}", short_code);
        }
        Ok(())
    }

    async fn health_check(&self) -> bool {
        true
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
