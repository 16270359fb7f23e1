//! Shared application state injected into every handler.

use std::sync::Arc;

use crate::application::services::{AuthService, LinkService, RedirectService, RedirectSettings};
use crate::domain::repositories::{LinkRepository, TokenRepository};
use crate::domain::stats_worker::StatsQueue;
use crate::infrastructure::cache::CacheService;

/// Handles to every long-lived resource, created once at startup.
///
/// Cloning is cheap: every field is reference counted.
#[derive(Clone)]
pub struct AppState {
    pub redirect_service: Arc<RedirectService>,
    pub link_service: Arc<LinkService>,
    pub auth_service: Arc<AuthService>,
    pub link_repository: Arc<dyn LinkRepository>,
    pub cache: Arc<dyn CacheService>,
    pub stats_queue: StatsQueue,
}

impl AppState {
    /// Wires services on top of the given store, cache and stats queue.
    pub fn new(
        link_repository: Arc<dyn LinkRepository>,
        token_repository: Arc<dyn TokenRepository>,
        cache: Arc<dyn CacheService>,
        stats_queue: StatsQueue,
        redirect_settings: RedirectSettings,
        token_signing_secret: String,
    ) -> Self {
        let redirect_service = RedirectService::new(
            link_repository.clone(),
            cache.clone(),
            stats_queue.clone(),
            redirect_settings,
        );
        let link_service = LinkService::new(link_repository.clone(), cache.clone());
        let auth_service = AuthService::new(token_repository, token_signing_secret);

        Self {
            redirect_service: Arc::new(redirect_service),
            link_service: Arc::new(link_service),
            auth_service: Arc::new(auth_service),
            link_repository,
            cache,
            stats_queue,
        }
    }
}
