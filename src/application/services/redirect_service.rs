//! Cache-aside resolution of short codes for the public redirect path.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::json;
use tracing::{debug, warn};

use crate::domain::entities::Link;
use crate::domain::repositories::LinkRepository;
use crate::domain::stats_worker::StatsQueue;
use crate::error::AppError;
use crate::infrastructure::cache::{CacheService, DEFAULT_TTL_SECONDS};

/// Time bounds and TTL used by [`RedirectService`].
#[derive(Debug, Clone, Copy)]
pub struct RedirectSettings {
    pub cache_ttl_seconds: u64,
    pub cache_timeout: Duration,
    pub store_timeout: Duration,
}

impl Default for RedirectSettings {
    fn default() -> Self {
        Self {
            cache_ttl_seconds: DEFAULT_TTL_SECONDS,
            cache_timeout: Duration::from_millis(50),
            store_timeout: Duration::from_secs(2),
        }
    }
}

/// Where a resolved URL came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionSource {
    Cache,
    Store,
}

impl ResolutionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cache => "cache",
            Self::Store => "store",
        }
    }
}

/// A short code resolved to its destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub url: String,
    pub source: ResolutionSource,
}

/// Resolves short codes to destination URLs.
///
/// # Flow
///
/// 1. Check the cache. A hit is returned as-is: no store read and no expiry
///    check, so an entry may outlive its link by up to one TTL.
/// 2. On a miss, read the store. Unknown codes are [`AppError::NotFound`].
/// 3. Links whose `expires_at` is strictly in the past are
///    [`AppError::Gone`] and are never cached.
/// 4. Populate the cache with the configured TTL.
/// 5. Enqueue an access event for the stats worker without waiting.
///
/// Every cache call is bounded by `cache_timeout`; a timeout or backend error
/// is a miss (or a skipped write). Store calls are bounded by
/// `store_timeout`; a timeout or error is [`AppError::StoreUnavailable`].
pub struct RedirectService {
    repository: Arc<dyn LinkRepository>,
    cache: Arc<dyn CacheService>,
    stats: StatsQueue,
    settings: RedirectSettings,
}

impl RedirectService {
    pub fn new(
        repository: Arc<dyn LinkRepository>,
        cache: Arc<dyn CacheService>,
        stats: StatsQueue,
        settings: RedirectSettings,
    ) -> Self {
        Self {
            repository,
            cache,
            stats,
            settings,
        }
    }

    pub fn settings(&self) -> &RedirectSettings {
        &self.settings
    }

    /// Resolves `code` and schedules its access update.
    ///
    /// # Errors
    ///
    /// - [`AppError::NotFound`] if no link uses `code`
    /// - [`AppError::Gone`] if the link has expired
    /// - [`AppError::StoreUnavailable`] if the store fails or times out
    pub async fn resolve(&self, code: &str) -> Result<Resolution, AppError> {
        if let Some(url) = self.cached_url(code).await {
            metrics::counter!("cache_hits_total").increment(1);
            debug!("Cache HIT for {}", code);
            return Ok(self.finish(code, url, ResolutionSource::Cache));
        }

        metrics::counter!("cache_misses_total").increment(1);
        debug!("Cache MISS for {}", code);

        let link = self.lookup(code).await?.ok_or_else(|| {
            metrics::counter!("redirects_total", "outcome" => "not_found").increment(1);
            AppError::not_found("Short link not found", json!({ "code": code }))
        })?;

        if link.is_expired_at(Utc::now()) {
            metrics::counter!("redirects_total", "outcome" => "gone").increment(1);
            return Err(AppError::gone(
                "Short link has expired",
                json!({ "code": code, "expired_at": link.expires_at }),
            ));
        }

        self.populate_cache(&link).await;

        Ok(self.finish(code, link.original_url, ResolutionSource::Store))
    }

    fn finish(&self, code: &str, url: String, source: ResolutionSource) -> Resolution {
        metrics::counter!("redirects_total", "outcome" => "found", "source" => source.as_str())
            .increment(1);
        self.stats.schedule(code);
        Resolution { url, source }
    }

    async fn cached_url(&self, code: &str) -> Option<String> {
        match bounded(self.settings.cache_timeout, self.cache.get_url(code)).await {
            Some(Ok(hit)) => hit,
            Some(Err(e)) => {
                warn!("Cache read failed for {}: {}", code, e);
                None
            }
            None => {
                warn!(
                    "Cache read for {} timed out after {:?}",
                    code, self.settings.cache_timeout
                );
                None
            }
        }
    }

    async fn populate_cache(&self, link: &Link) {
        let write = self.cache.set_url(
            &link.short_code,
            &link.original_url,
            Some(self.settings.cache_ttl_seconds),
        );

        match bounded(self.settings.cache_timeout, write).await {
            Some(Ok(())) => {}
            Some(Err(e)) => warn!("Cache write failed for {}: {}", link.short_code, e),
            None => warn!("Cache write for {} timed out", link.short_code),
        }
    }

    async fn lookup(&self, code: &str) -> Result<Option<Link>, AppError> {
        match bounded(self.settings.store_timeout, self.repository.find_by_code(code)).await {
            Some(Ok(link)) => Ok(link),
            Some(Err(e)) => {
                metrics::counter!("redirects_total", "outcome" => "store_error").increment(1);
                Err(match e {
                    AppError::StoreUnavailable { .. } => e,
                    other => AppError::store_unavailable(
                        "Link store unavailable",
                        json!({ "reason": other.to_string() }),
                    ),
                })
            }
            None => {
                metrics::counter!("redirects_total", "outcome" => "store_timeout").increment(1);
                warn!(
                    "Store lookup for {} timed out after {:?}",
                    code, self.settings.store_timeout
                );
                Err(AppError::store_unavailable(
                    "Link store timed out",
                    json!({ "timeout_ms": self.settings.store_timeout.as_millis() as u64 }),
                ))
            }
        }
    }
}

/// Runs `future` with a deadline; `None` means it did not finish in time.
async fn bounded<F: Future>(limit: Duration, future: F) -> Option<F::Output> {
    tokio::time::timeout(limit, future).await.ok()
}
