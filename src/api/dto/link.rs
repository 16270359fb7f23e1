//! DTOs for link management endpoints.

use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use validator::Validate;

use crate::application::services::CreateLink;
use crate::domain::entities::{Link, LinkPatch};

/// Compiled regex for custom alias validation.
static ALIAS_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").unwrap());

/// Request body for `POST /api/links`.
///
/// `expires_at` wins over `expires_in_days` when both are given.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateLinkRequest {
    /// Destination URL (must be valid HTTP/HTTPS).
    #[validate(url(message = "Invalid URL format"))]
    pub original_url: String,

    /// Optional caller-chosen short code.
    #[validate(length(min = 1, max = 20))]
    #[validate(regex(path = "*ALIAS_REGEX"))]
    pub custom_alias: Option<String>,

    /// Relative expiry in whole days from now.
    #[validate(range(min = 1, max = 3650))]
    pub expires_in_days: Option<i64>,

    /// Absolute expiry. After this instant the link returns 410 Gone.
    pub expires_at: Option<DateTime<Utc>>,
}

impl CreateLinkRequest {
    pub fn into_input(self, now: DateTime<Utc>) -> CreateLink {
        let expires_at = self
            .expires_at
            .or_else(|| self.expires_in_days.map(|days| now + Duration::days(days)));

        CreateLink {
            original_url: self.original_url,
            custom_alias: self.custom_alias,
            expires_at,
        }
    }
}

/// Request body for `PUT /api/links/{code}`.
///
/// All fields are optional; only provided fields are changed.
///
/// # `expires_at` semantics
///
/// - **Absent** → leave the existing value unchanged (unless `expires_in_days` is set)
/// - **`null`** → clear expiry (link never expires)
/// - **Timestamp** → set new expiry
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateLinkRequest {
    /// New destination URL for this link.
    #[validate(url(message = "Invalid URL format"))]
    pub original_url: Option<String>,

    /// Expiry timestamp. Absent = no change, null = clear, value = set.
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub expires_at: Option<Option<DateTime<Utc>>>,

    /// Relative expiry in whole days from now.
    #[validate(range(min = 1, max = 3650))]
    pub expires_in_days: Option<i64>,
}

impl UpdateLinkRequest {
    pub fn into_patch(self, now: DateTime<Utc>) -> LinkPatch {
        let expires_at = match (self.expires_at, self.expires_in_days) {
            (Some(explicit), _) => Some(explicit),
            (None, Some(days)) => Some(Some(now + Duration::days(days))),
            (None, None) => None,
        };

        LinkPatch {
            original_url: self.original_url,
            expires_at,
        }
    }
}

/// Query string for `GET /api/links/search`.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub original_url: String,
}

/// Result of a search by destination URL.
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub short_code: String,
    pub original_url: String,
}

/// JSON representation of a link.
#[derive(Debug, Serialize)]
pub struct LinkResponse {
    pub id: i64,
    pub short_code: String,
    pub original_url: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub last_accessed: Option<DateTime<Utc>>,
    pub access_count: i64,
}

impl From<Link> for LinkResponse {
    fn from(link: Link) -> Self {
        Self {
            id: link.id,
            short_code: link.short_code,
            original_url: link.original_url,
            created_at: link.created_at,
            expires_at: link.expires_at,
            last_accessed: link.last_accessed,
            access_count: link.access_count,
        }
    }
}

/// Visit statistics for a single link.
#[derive(Debug, Serialize)]
pub struct LinkStatsResponse {
    pub original_url: String,
    pub created_at: DateTime<Utc>,
    pub access_count: i64,
    pub last_accessed: Option<DateTime<Utc>>,
}

impl From<Link> for LinkStatsResponse {
    fn from(link: Link) -> Self {
        Self {
            original_url: link.original_url,
            created_at: link.created_at,
            access_count: link.access_count,
            last_accessed: link.last_accessed,
        }
    }
}
