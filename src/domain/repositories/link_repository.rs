//! Repository trait for the durable link store.

use crate::domain::entities::{Link, LinkPatch, NewLink};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Repository interface for the authoritative short-code store.
///
/// The store is ground truth: the cache only ever holds copies of what this
/// repository returns, and uniqueness of `short_code` is enforced here.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgLinkRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
///
/// # Errors
///
/// Store failures surface as [`AppError::StoreUnavailable`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkRepository: Send + Sync {
    /// Inserts a new link.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::DuplicateAlias`] if `short_code` is already taken.
    async fn create(&self, new_link: NewLink) -> Result<Link, AppError>;

    /// Finds a link by its short code (case-sensitive).
    async fn find_by_code(&self, code: &str) -> Result<Option<Link>, AppError>;

    /// Returns true if a live link already uses `code`.
    async fn code_exists(&self, code: &str) -> Result<bool, AppError>;

    /// Finds the first link pointing at `original_url`.
    async fn find_by_original_url(&self, original_url: &str) -> Result<Option<Link>, AppError>;

    /// Lists links created by `owner`, newest first.
    async fn list_by_owner(&self, owner: &str) -> Result<Vec<Link>, AppError>;

    /// Applies a partial update.
    ///
    /// Returns `Ok(None)` if no link matches `code`.
    async fn update(&self, code: &str, patch: LinkPatch) -> Result<Option<Link>, AppError>;

    /// Deletes a link. Returns `Ok(false)` if it did not exist.
    async fn delete(&self, code: &str) -> Result<bool, AppError>;

    /// Atomically increments `access_count` by one and sets `last_accessed`.
    ///
    /// Returns `Ok(false)` when no link matches `code`; callers treat that as
    /// a no-op.
    async fn increment_access(&self, code: &str, at: DateTime<Utc>) -> Result<bool, AppError>;

    /// Round-trips to the store for health checks.
    async fn ping(&self) -> Result<(), AppError>;
}
