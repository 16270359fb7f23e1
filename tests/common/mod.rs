#![allow(dead_code)]

use async_trait::async_trait;
use axum_test::TestServer;
use chrono::{DateTime, Utc};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::time::Duration;

use linkhop::application::services::RedirectSettings;
use linkhop::domain::entities::{ApiToken, Link, LinkPatch, NewLink};
use linkhop::domain::repositories::{LinkRepository, TokenRepository};
use linkhop::domain::stats_worker::StatsWorker;
use linkhop::error::AppError;
use linkhop::infrastructure::cache::{CacheError, CacheResult, CacheService, MemoryCache};
use linkhop::state::AppState;
use linkhop::utils::token::hash_token;

pub const SIGNING_SECRET: &str = "test-signing-secret";
pub const ALICE_TOKEN: &str = "alice-secret-token";
pub const BOB_TOKEN: &str = "bob-secret-token";

/// Link store kept in a map, with knobs for slow or failing lookups.
#[derive(Default)]
pub struct InMemoryLinks {
    links: Mutex<BTreeMap<String, Link>>,
    next_id: AtomicI64,
    lookup_delay: Mutex<Option<Duration>>,
    fail_lookups: AtomicBool,
}

impl InMemoryLinks {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn insert(
        &self,
        code: &str,
        url: &str,
        owner: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> Link {
        let link = Link {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            original_url: url.to_string(),
            short_code: code.to_string(),
            owner: owner.to_string(),
            created_at: Utc::now(),
            expires_at,
            last_accessed: None,
            access_count: 0,
        };
        self.links
            .lock()
            .unwrap()
            .insert(code.to_string(), link.clone());
        link
    }

    pub fn get(&self, code: &str) -> Option<Link> {
        self.links.lock().unwrap().get(code).cloned()
    }

    /// Deletes a row behind the service layer's back, leaving any cache entry.
    pub fn remove(&self, code: &str) {
        self.links.lock().unwrap().remove(code);
    }

    pub fn len(&self) -> usize {
        self.links.lock().unwrap().len()
    }

    pub fn delay_lookups(&self, delay: Duration) {
        *self.lookup_delay.lock().unwrap() = Some(delay);
    }

    pub fn fail_lookups(&self) {
        self.fail_lookups.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl LinkRepository for InMemoryLinks {
    async fn create(&self, new_link: NewLink) -> Result<Link, AppError> {
        let mut links = self.links.lock().unwrap();
        if links.contains_key(&new_link.short_code) {
            return Err(AppError::duplicate_alias(&new_link.short_code));
        }

        let link = Link {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            original_url: new_link.original_url,
            short_code: new_link.short_code.clone(),
            owner: new_link.owner,
            created_at: Utc::now(),
            expires_at: new_link.expires_at,
            last_accessed: None,
            access_count: 0,
        };
        links.insert(new_link.short_code, link.clone());
        Ok(link)
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Link>, AppError> {
        let delay = *self.lookup_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(AppError::store_unavailable(
                "Database error",
                json!({ "reason": "connection refused" }),
            ));
        }
        Ok(self.get(code))
    }

    async fn code_exists(&self, code: &str) -> Result<bool, AppError> {
        Ok(self.links.lock().unwrap().contains_key(code))
    }

    async fn find_by_original_url(&self, original_url: &str) -> Result<Option<Link>, AppError> {
        Ok(self
            .links
            .lock()
            .unwrap()
            .values()
            .filter(|l| l.original_url == original_url)
            .min_by_key(|l| (l.created_at, l.id))
            .cloned())
    }

    async fn list_by_owner(&self, owner: &str) -> Result<Vec<Link>, AppError> {
        let mut links: Vec<Link> = self
            .links
            .lock()
            .unwrap()
            .values()
            .filter(|l| l.owner == owner)
            .cloned()
            .collect();
        links.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(links)
    }

    async fn update(&self, code: &str, patch: LinkPatch) -> Result<Option<Link>, AppError> {
        let mut links = self.links.lock().unwrap();
        let Some(link) = links.get_mut(code) else {
            return Ok(None);
        };
        if let Some(url) = patch.original_url {
            link.original_url = url;
        }
        if let Some(expires_at) = patch.expires_at {
            link.expires_at = expires_at;
        }
        Ok(Some(link.clone()))
    }

    async fn delete(&self, code: &str) -> Result<bool, AppError> {
        Ok(self.links.lock().unwrap().remove(code).is_some())
    }

    async fn increment_access(&self, code: &str, at: DateTime<Utc>) -> Result<bool, AppError> {
        let mut links = self.links.lock().unwrap();
        let Some(link) = links.get_mut(code) else {
            return Ok(false);
        };
        link.access_count += 1;
        link.last_accessed = Some(link.last_accessed.map_or(at, |prev| prev.max(at)));
        Ok(true)
    }

    async fn ping(&self) -> Result<(), AppError> {
        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(AppError::store_unavailable("Database error", json!({})));
        }
        Ok(())
    }
}

/// Token store that hashes raw tokens the same way the server does.
#[derive(Default)]
pub struct InMemoryTokens {
    tokens: Mutex<Vec<ApiToken>>,
}

impl InMemoryTokens {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn issue(&self, name: &str, raw_token: &str) {
        let mut tokens = self.tokens.lock().unwrap();
        let id = tokens.len() as i64 + 1;
        tokens.push(ApiToken {
            id,
            name: name.to_string(),
            token_hash: hash_token(SIGNING_SECRET, raw_token),
            created_at: Utc::now(),
            last_used_at: None,
            revoked_at: None,
        });
    }

    pub fn revoke(&self, name: &str) {
        let mut tokens = self.tokens.lock().unwrap();
        if let Some(token) = tokens.iter_mut().find(|t| t.name == name) {
            token.revoked_at = Some(Utc::now());
        }
    }
}

#[async_trait]
impl TokenRepository for InMemoryTokens {
    async fn find_active_by_hash(&self, token_hash: &str) -> Result<Option<ApiToken>, AppError> {
        Ok(self
            .tokens
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.token_hash == token_hash && !t.is_revoked())
            .cloned())
    }

    async fn update_last_used(&self, token_hash: &str) -> Result<(), AppError> {
        let mut tokens = self.tokens.lock().unwrap();
        if let Some(token) = tokens.iter_mut().find(|t| t.token_hash == token_hash) {
            token.last_used_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn create_token(&self, name: &str, token_hash: &str) -> Result<ApiToken, AppError> {
        let mut tokens = self.tokens.lock().unwrap();
        let token = ApiToken {
            id: tokens.len() as i64 + 1,
            name: name.to_string(),
            token_hash: token_hash.to_string(),
            created_at: Utc::now(),
            last_used_at: None,
            revoked_at: None,
        };
        tokens.push(token.clone());
        Ok(token)
    }

    async fn list_tokens(&self) -> Result<Vec<ApiToken>, AppError> {
        Ok(self.tokens.lock().unwrap().clone())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<ApiToken>, AppError> {
        Ok(self
            .tokens
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.id == id)
            .cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<ApiToken>, AppError> {
        Ok(self
            .tokens
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.name == name)
            .cloned())
    }

    async fn revoke_token(&self, id: i64) -> Result<(), AppError> {
        let mut tokens = self.tokens.lock().unwrap();
        match tokens.iter_mut().find(|t| t.id == id) {
            Some(token) => {
                token.revoked_at.get_or_insert_with(Utc::now);
                Ok(())
            }
            None => Err(AppError::not_found("Token not found", json!({ "id": id }))),
        }
    }
}

/// Cache whose every operation fails.
pub struct FailingCache;

#[async_trait]
impl CacheService for FailingCache {
    async fn get_url(&self, _short_code: &str) -> CacheResult<Option<String>> {
        Err(CacheError::Unavailable("connection reset".to_string()))
    }

    async fn set_url(&self, _: &str, _: &str, _: Option<u64>) -> CacheResult<()> {
        Err(CacheError::Unavailable("connection reset".to_string()))
    }

    async fn invalidate(&self, _short_code: &str) -> CacheResult<()> {
        Err(CacheError::Unavailable("connection reset".to_string()))
    }

    async fn health_check(&self) -> bool {
        false
    }

    fn backend_name(&self) -> &'static str {
        "failing"
    }
}

/// Cache that answers reads with `stale_url`, but only after `delay`.
pub struct SlowCache {
    pub delay: Duration,
    pub stale_url: String,
}

#[async_trait]
impl CacheService for SlowCache {
    async fn get_url(&self, _short_code: &str) -> CacheResult<Option<String>> {
        tokio::time::sleep(self.delay).await;
        Ok(Some(self.stale_url.clone()))
    }

    async fn set_url(&self, _: &str, _: &str, _: Option<u64>) -> CacheResult<()> {
        tokio::time::sleep(self.delay).await;
        Ok(())
    }

    async fn invalidate(&self, _short_code: &str) -> CacheResult<()> {
        Ok(())
    }

    async fn health_check(&self) -> bool {
        tokio::time::sleep(self.delay).await;
        true
    }

    fn backend_name(&self) -> &'static str {
        "slow"
    }
}

pub fn test_settings() -> RedirectSettings {
    RedirectSettings {
        cache_ttl_seconds: 3600,
        cache_timeout: Duration::from_millis(50),
        store_timeout: Duration::from_millis(200),
    }
}

/// A running router plus handles to everything behind it.
pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
    pub links: Arc<InMemoryLinks>,
    pub tokens: Arc<InMemoryTokens>,
    pub cache: Arc<dyn CacheService>,
    worker: Option<StatsWorker>,
}

impl TestApp {
    /// In-memory store and cache, with tokens issued to `alice` and `bob`.
    pub fn new() -> Self {
        Self::with(InMemoryLinks::new(), Arc::new(MemoryCache::new(3600)))
    }

    pub fn with(links: Arc<InMemoryLinks>, cache: Arc<dyn CacheService>) -> Self {
        Self::with_queue_capacity(links, cache, 1024)
    }

    pub fn with_queue_capacity(
        links: Arc<InMemoryLinks>,
        cache: Arc<dyn CacheService>,
        capacity: usize,
    ) -> Self {
        let tokens = InMemoryTokens::new();
        tokens.issue("alice", ALICE_TOKEN);
        tokens.issue("bob", BOB_TOKEN);

        let (stats_queue, worker) = StatsWorker::spawn(links.clone(), capacity, 4);

        let state = AppState::new(
            links.clone(),
            tokens.clone(),
            cache.clone(),
            stats_queue,
            test_settings(),
            SIGNING_SECRET.to_string(),
        );

        let server = TestServer::new(linkhop::routes::router(state.clone())).unwrap();

        Self {
            server,
            state,
            links,
            tokens,
            cache,
            worker: Some(worker),
        }
    }

    /// Stops the stats worker, applying everything still queued.
    pub async fn flush_stats(&mut self) {
        if let Some(worker) = self.worker.take() {
            assert!(worker.shutdown(Duration::from_secs(5)).await);
        }
    }
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}
