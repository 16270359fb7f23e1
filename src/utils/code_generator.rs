//! Short code generation and alias validation.
//!
//! Generated codes are 7 characters drawn from the 62-character alphanumeric
//! alphabet using the thread-local CSPRNG. Uniqueness is always checked
//! against the durable store, never the cache.

use std::sync::Arc;

use rand::Rng;
use rand::distr::Alphanumeric;
use serde_json::json;
use tracing::debug;

use crate::domain::repositories::LinkRepository;
use crate::error::AppError;

/// Length of a generated short code.
pub const CODE_LENGTH: usize = 7;

/// Maximum number of candidates tried before giving up.
pub const MAX_ATTEMPTS: usize = 10;

/// Maximum length of a caller-supplied alias.
pub const MAX_ALIAS_LENGTH: usize = 20;

/// Aliases that would shadow service routes.
const RESERVED_ALIASES: &[&str] = &["api", "health", "admin", "static", "metrics"];

/// Generates a random alphanumeric short code.
///
/// ```ignore
/// let code = generate_code();
/// assert_eq!(code.len(), 7);
/// assert!(code.chars().all(|c| c.is_ascii_alphanumeric()));
/// ```
pub fn generate_code() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(CODE_LENGTH)
        .map(char::from)
        .collect()
}

/// Validates a user-provided alias.
///
/// # Rules
///
/// - Length: 1-20 characters
/// - Allowed characters: ASCII letters, digits, `_` and `-`
/// - Cannot be a reserved route segment (compared case-insensitively)
///
/// # Errors
///
/// Returns [`AppError::Validation`] if any rule is violated.
pub fn validate_alias(alias: &str) -> Result<(), AppError> {
    if alias.is_empty() || alias.len() > MAX_ALIAS_LENGTH {
        return Err(AppError::bad_request(
            format!("Alias must be 1-{} characters", MAX_ALIAS_LENGTH),
            json!({ "provided_length": alias.len() }),
        ));
    }

    if !alias
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(AppError::bad_request(
            "Alias can only contain letters, digits, underscores and hyphens",
            json!({ "alias": alias }),
        ));
    }

    if RESERVED_ALIASES
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(alias))
    {
        return Err(AppError::bad_request(
            "This alias is reserved",
            json!({ "alias": alias }),
        ));
    }

    Ok(())
}

/// Produces short codes that are free in the store.
pub struct CodeGenerator {
    repository: Arc<dyn LinkRepository>,
}

impl CodeGenerator {
    pub fn new(repository: Arc<dyn LinkRepository>) -> Self {
        Self { repository }
    }

    /// Generates a code not currently used by any link.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::GenerationExhausted`] after [`MAX_ATTEMPTS`]
    /// collisions, or the store error if the uniqueness check fails.
    pub async fn generate_unique(&self) -> Result<String, AppError> {
        for attempt in 1..=MAX_ATTEMPTS {
            let candidate = generate_code();

            if !self.repository.code_exists(&candidate).await? {
                return Ok(candidate);
            }

            debug!("Code collision on attempt {}: {}", attempt, candidate);
        }

        metrics::counter!("code_generation_exhausted_total").increment(1);
        Err(AppError::generation_exhausted(MAX_ATTEMPTS))
    }

    /// Validates `alias` and checks that it is still free.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for a malformed alias and
    /// [`AppError::DuplicateAlias`] if a link already uses it.
    pub async fn claim_alias(&self, alias: &str) -> Result<String, AppError> {
        validate_alias(alias)?;

        if self.repository.code_exists(alias).await? {
            return Err(AppError::duplicate_alias(alias));
        }

        Ok(alias.to_string())
    }
}
