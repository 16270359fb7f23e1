//! Link entity representing a short code mapping.

use chrono::{DateTime, Utc};

/// A short code mapped to its destination URL, with visit statistics.
///
/// `access_count` and `last_accessed` are written only by the stats worker
/// ([`crate::domain::stats_worker`]); everything else is owned by the link
/// management layer.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Link {
    pub id: i64,
    pub original_url: String,
    pub short_code: String,
    pub owner: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub last_accessed: Option<DateTime<Utc>>,
    pub access_count: i64,
}

impl Link {
    /// Returns true if `expires_at` is strictly before `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|e| e < now)
    }
}

/// Input data for creating a new link.
#[derive(Debug, Clone)]
pub struct NewLink {
    pub original_url: String,
    pub short_code: String,
    pub owner: String,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Partial update for an existing link.
///
/// `None` fields are left unchanged.
/// `expires_at: Some(None)` clears the expiry; `Some(Some(t))` sets it.
#[derive(Debug, Clone, Default)]
pub struct LinkPatch {
    pub original_url: Option<String>,
    pub expires_at: Option<Option<DateTime<Utc>>>,
}

impl LinkPatch {
    /// Returns true if the patch would not modify anything.
    pub fn is_empty(&self) -> bool {
        self.original_url.is_none() && self.expires_at.is_none()
    }
}
