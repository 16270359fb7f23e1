//! Authentication service for API token validation.

use std::sync::Arc;

use serde_json::json;
use tracing::warn;

use crate::domain::entities::Principal;
use crate::domain::repositories::TokenRepository;
use crate::error::AppError;
use crate::utils::token::hash_token;

/// Service for authenticating API requests via Bearer tokens.
///
/// Tokens are hashed with HMAC-SHA256 (keyed by `signing_secret`) before
/// comparison. An attacker with read-only access to the database cannot
/// verify or forge tokens without the server-side secret.
pub struct AuthService {
    repository: Arc<dyn TokenRepository>,
    signing_secret: String,
}

impl AuthService {
    /// Creates a new authentication service.
    ///
    /// `signing_secret` must match the value used when tokens were created.
    pub fn new(repository: Arc<dyn TokenRepository>, signing_secret: String) -> Self {
        Self {
            repository,
            signing_secret,
        }
    }

    /// Authenticates a raw token and returns the principal it belongs to.
    ///
    /// The token's name is the principal; links created with it are owned by
    /// that name. On success `last_used_at` is refreshed on a best-effort
    /// basis.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unauthorized`] if the token is unknown or revoked.
    pub async fn authenticate(&self, token: &str) -> Result<Principal, AppError> {
        let token_hash = hash_token(&self.signing_secret, token);

        let Some(record) = self.repository.find_active_by_hash(&token_hash).await? else {
            return Err(AppError::unauthorized(
                "Unauthorized",
                json!({"reason": "Invalid or revoked token"}),
            ));
        };

        if let Err(e) = self.repository.update_last_used(&token_hash).await {
            warn!("Failed to update last_used_at for token {}: {}", record.name, e);
        }

        Ok(Principal::from(record))
    }
}
