//! API token entity and the authenticated principal derived from it.

use chrono::{DateTime, Utc};

/// API token record.
///
/// Only the HMAC-SHA256 hash of the raw token is ever stored.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ApiToken {
    pub id: i64,
    pub name: String,
    pub token_hash: String,
    pub created_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl ApiToken {
    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }
}

/// The caller of an authenticated request.
///
/// Inserted into request extensions by the auth middleware; its name is
/// recorded as the `owner` of links it creates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub name: String,
}

impl Principal {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl From<ApiToken> for Principal {
    fn from(token: ApiToken) -> Self {
        Self { name: token.name }
    }
}
