//! Link management: creation, lookup, update and deletion.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::{info, warn};

use crate::domain::entities::{Link, LinkPatch, NewLink, Principal};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;
use crate::infrastructure::cache::CacheService;
use crate::utils::code_generator::{CodeGenerator, MAX_ATTEMPTS};
use crate::utils::url_validator::validate_url;

/// Input for [`LinkService::create_link`].
#[derive(Debug, Clone)]
pub struct CreateLink {
    pub original_url: String,
    pub custom_alias: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Service for managing short links on behalf of an authenticated owner.
///
/// Every change to a link's URL or expiry, and every deletion, invalidates
/// its cache entry so the next redirect goes through the store.
pub struct LinkService {
    repository: Arc<dyn LinkRepository>,
    cache: Arc<dyn CacheService>,
    generator: CodeGenerator,
}

impl LinkService {
    pub fn new(repository: Arc<dyn LinkRepository>, cache: Arc<dyn CacheService>) -> Self {
        Self {
            generator: CodeGenerator::new(repository.clone()),
            repository,
            cache,
        }
    }

    /// Creates a short link owned by `principal`.
    ///
    /// # Code Selection
    ///
    /// - `custom_alias` is validated and must be free, otherwise
    ///   [`AppError::DuplicateAlias`]
    /// - Otherwise a random code is generated; if a concurrent insert takes
    ///   it first the generation is retried, up to [`MAX_ATTEMPTS`] inserts
    ///
    /// # Errors
    ///
    /// - [`AppError::Validation`] for an invalid URL or alias
    /// - [`AppError::DuplicateAlias`] if the alias is taken
    /// - [`AppError::GenerationExhausted`] if no free code was found
    pub async fn create_link(
        &self,
        principal: &Principal,
        input: CreateLink,
    ) -> Result<Link, AppError> {
        let original_url = validate_url(&input.original_url)?;

        if let Some(alias) = input.custom_alias {
            let short_code = self.generator.claim_alias(&alias).await?;

            let link = self
                .repository
                .create(NewLink {
                    original_url,
                    short_code,
                    owner: principal.name.clone(),
                    expires_at: input.expires_at,
                })
                .await?;

            info!("Link {} created by {} (alias)", link.short_code, link.owner);
            return Ok(link);
        }

        for _ in 0..MAX_ATTEMPTS {
            let short_code = self.generator.generate_unique().await?;

            let result = self
                .repository
                .create(NewLink {
                    original_url: original_url.clone(),
                    short_code,
                    owner: principal.name.clone(),
                    expires_at: input.expires_at,
                })
                .await;

            match result {
                Ok(link) => {
                    info!("Link {} created by {}", link.short_code, link.owner);
                    return Ok(link);
                }
                Err(AppError::DuplicateAlias { .. }) => {
                    warn!("Generated code was taken concurrently, retrying");
                }
                Err(e) => return Err(e),
            }
        }

        Err(AppError::generation_exhausted(MAX_ATTEMPTS))
    }

    /// Lists the caller's links, newest first.
    pub async fn list_links(&self, principal: &Principal) -> Result<Vec<Link>, AppError> {
        self.repository.list_by_owner(&principal.name).await
    }

    /// Finds a link by destination URL.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no link points at `original_url`.
    pub async fn search_by_original_url(&self, original_url: &str) -> Result<Link, AppError> {
        self.repository
            .find_by_original_url(original_url.trim())
            .await?
            .ok_or_else(|| {
                AppError::not_found(
                    "No link for this URL",
                    json!({ "original_url": original_url }),
                )
            })
    }

    /// Retrieves a link owned by `principal`.
    ///
    /// # Errors
    ///
    /// - [`AppError::NotFound`] if the code does not exist
    /// - [`AppError::Forbidden`] if it belongs to another owner
    pub async fn get_link(&self, principal: &Principal, code: &str) -> Result<Link, AppError> {
        let link = self.repository.find_by_code(code).await?.ok_or_else(|| {
            AppError::not_found("Short link not found", json!({ "code": code }))
        })?;

        ensure_owner(principal, &link)?;

        Ok(link)
    }

    /// Applies a partial update and invalidates the cache entry.
    ///
    /// # Errors
    ///
    /// See [`Self::get_link`]; additionally [`AppError::Validation`] for an
    /// invalid replacement URL.
    pub async fn update_link(
        &self,
        principal: &Principal,
        code: &str,
        mut patch: LinkPatch,
    ) -> Result<Link, AppError> {
        let current = self.get_link(principal, code).await?;

        if let Some(url) = patch.original_url.take() {
            patch.original_url = Some(validate_url(&url)?);
        }

        if patch.is_empty() {
            return Ok(current);
        }

        let updated = self.repository.update(code, patch).await?.ok_or_else(|| {
            AppError::not_found("Short link not found", json!({ "code": code }))
        })?;

        self.invalidate(code).await;
        info!("Link {} updated by {}", code, principal.name);

        Ok(updated)
    }

    /// Deletes a link and invalidates its cache entry.
    ///
    /// # Errors
    ///
    /// See [`Self::get_link`].
    pub async fn delete_link(&self, principal: &Principal, code: &str) -> Result<(), AppError> {
        self.get_link(principal, code).await?;

        if !self.repository.delete(code).await? {
            return Err(AppError::not_found(
                "Short link not found",
                json!({ "code": code }),
            ));
        }

        self.invalidate(code).await;
        info!("Link {} deleted by {}", code, principal.name);

        Ok(())
    }

    async fn invalidate(&self, code: &str) {
        if let Err(e) = self.cache.invalidate(code).await {
            warn!("Failed to invalidate cache for {}: {}", code, e);
        }
    }
}

fn ensure_owner(principal: &Principal, link: &Link) -> Result<(), AppError> {
    if link.owner != principal.name {
        return Err(AppError::forbidden(
            "Access to this link is forbidden",
            json!({ "code": link.short_code }),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::MockLinkRepository;
    use crate::infrastructure::cache::MockCacheService;

    fn owner() -> Principal {
        Principal::new("alice")
    }

    fn stored(code: &str, owner: &str) -> Link {
        Link {
            id: 1,
            original_url: "https://example.com".to_string(),
            short_code: code.to_string(),
            owner: owner.to_string(),
            created_at: Utc::now(),
            expires_at: None,
            last_accessed: None,
            access_count: 0,
        }
    }

    fn from_new(new_link: NewLink) -> Link {
        Link {
            id: 7,
            original_url: new_link.original_url,
            short_code: new_link.short_code,
            owner: new_link.owner,
            created_at: Utc::now(),
            expires_at: new_link.expires_at,
            last_accessed: None,
            access_count: 0,
        }
    }

    fn input(url: &str, alias: Option<&str>) -> CreateLink {
        CreateLink {
            original_url: url.to_string(),
            custom_alias: alias.map(str::to_string),
            expires_at: None,
        }
    }

    #[tokio::test]
    async fn test_create_with_generated_code() {
        let mut repo = MockLinkRepository::new();
        repo.expect_code_exists().times(1).returning(|_| Ok(false));
        repo.expect_create()
            .withf(|l| l.owner == "alice" && l.short_code.len() == 7)
            .times(1)
            .returning(|l| Ok(from_new(l)));

        let service = LinkService::new(Arc::new(repo), Arc::new(MockCacheService::new()));
        let link = service
            .create_link(&owner(), input("https://example.com", None))
            .await
            .unwrap();

        assert_eq!(link.original_url, "https://example.com");
        assert_eq!(link.owner, "alice");
    }

    #[tokio::test]
    async fn test_create_with_alias() {
        let mut repo = MockLinkRepository::new();
        repo.expect_code_exists()
            .withf(|code| code == "custom123")
            .times(1)
            .returning(|_| Ok(false));
        repo.expect_create()
            .withf(|l| l.short_code == "custom123")
            .times(1)
            .returning(|l| Ok(from_new(l)));

        let service = LinkService::new(Arc::new(repo), Arc::new(MockCacheService::new()));
        let link = service
            .create_link(&owner(), input("https://example.com", Some("custom123")))
            .await
            .unwrap();

        assert_eq!(link.short_code, "custom123");
    }

    #[tokio::test]
    async fn test_create_with_taken_alias() {
        let mut repo = MockLinkRepository::new();
        repo.expect_code_exists().returning(|_| Ok(true));
        repo.expect_create().never();

        let service = LinkService::new(Arc::new(repo), Arc::new(MockCacheService::new()));
        let err = service
            .create_link(&owner(), input("https://example.com", Some("custom123")))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::DuplicateAlias { .. }));
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_url() {
        let mut repo = MockLinkRepository::new();
        repo.expect_create().never();

        let service = LinkService::new(Arc::new(repo), Arc::new(MockCacheService::new()));
        let err = service
            .create_link(&owner(), input("javascript:alert(1)", None))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_create_retries_on_insert_race() {
        let mut repo = MockLinkRepository::new();
        repo.expect_code_exists().returning(|_| Ok(false));

        let mut seq = mockall::Sequence::new();
        repo.expect_create()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|l| Err(AppError::duplicate_alias(&l.short_code)));
        repo.expect_create()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|l| Ok(from_new(l)));

        let service = LinkService::new(Arc::new(repo), Arc::new(MockCacheService::new()));

        assert!(
            service
                .create_link(&owner(), input("https://example.com", None))
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_get_link_forbidden_for_other_owner() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_code()
            .returning(|code| Ok(Some(stored(code, "bob"))));

        let service = LinkService::new(Arc::new(repo), Arc::new(MockCacheService::new()));
        let err = service.get_link(&owner(), "abc123").await.unwrap_err();

        assert!(matches!(err, AppError::Forbidden { .. }));
    }

    #[tokio::test]
    async fn test_get_link_not_found() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_code().returning(|_| Ok(None));

        let service = LinkService::new(Arc::new(repo), Arc::new(MockCacheService::new()));
        let err = service.get_link(&owner(), "nope").await.unwrap_err();

        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_update_invalidates_cache() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_code()
            .returning(|code| Ok(Some(stored(code, "alice"))));
        repo.expect_update().times(1).returning(|code, patch| {
            let mut link = stored(code, "alice");
            link.original_url = patch.original_url.unwrap_or(link.original_url);
            Ok(Some(link))
        });

        let mut cache = MockCacheService::new();
        cache
            .expect_invalidate()
            .withf(|code| code == "abc123")
            .times(1)
            .returning(|_| Ok(()));

        let service = LinkService::new(Arc::new(repo), Arc::new(cache));
        let patch = LinkPatch {
            original_url: Some("https://updated.com".to_string()),
            expires_at: None,
        };
        let link = service.update_link(&owner(), "abc123", patch).await.unwrap();

        assert_eq!(link.original_url, "https://updated.com");
    }

    #[tokio::test]
    async fn test_empty_update_is_noop() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_code()
            .returning(|code| Ok(Some(stored(code, "alice"))));
        repo.expect_update().never();

        let mut cache = MockCacheService::new();
        cache.expect_invalidate().never();

        let service = LinkService::new(Arc::new(repo), Arc::new(cache));

        assert!(
            service
                .update_link(&owner(), "abc123", LinkPatch::default())
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_delete_invalidates_cache() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_code()
            .returning(|code| Ok(Some(stored(code, "alice"))));
        repo.expect_delete()
            .withf(|code| code == "abc123")
            .times(1)
            .returning(|_| Ok(true));

        let mut cache = MockCacheService::new();
        cache.expect_invalidate().times(1).returning(|_| Ok(()));

        let service = LinkService::new(Arc::new(repo), Arc::new(cache));

        assert!(service.delete_link(&owner(), "abc123").await.is_ok());
    }

    #[tokio::test]
    async fn test_delete_other_owner_keeps_link() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_code()
            .returning(|code| Ok(Some(stored(code, "bob"))));
        repo.expect_delete().never();

        let mut cache = MockCacheService::new();
        cache.expect_invalidate().never();

        let service = LinkService::new(Arc::new(repo), Arc::new(cache));
        let err = service.delete_link(&owner(), "abc123").await.unwrap_err();

        assert!(matches!(err, AppError::Forbidden { .. }));
    }

    #[tokio::test]
    async fn test_search_not_found() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_original_url().returning(|_| Ok(None));

        let service = LinkService::new(Arc::new(repo), Arc::new(MockCacheService::new()));
        let err = service
            .search_by_original_url("https://nonexistent.com")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound { .. }));
    }
}
