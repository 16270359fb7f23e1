//! Destination URL validation.

use serde_json::json;
use url::Url;

use crate::error::AppError;

/// Maximum accepted length of a destination URL.
pub const MAX_URL_LENGTH: usize = 2048;

/// Validates a destination URL and returns it trimmed.
///
/// The URL must be absolute, use `http` or `https` and carry a host. The
/// stored value is the caller's string, not a re-serialized form, so a
/// redirect sends exactly what was submitted.
///
/// # Errors
///
/// Returns [`AppError::Validation`] when any rule is violated.
///
/// ```ignore
/// assert!(validate_url("https://example.com/a").is_ok());
/// assert!(validate_url("javascript:alert(1)").is_err());
/// assert!(validate_url("/relative/path").is_err());
/// ```
pub fn validate_url(raw: &str) -> Result<String, AppError> {
    let trimmed = raw.trim();

    if trimmed.is_empty() {
        return Err(AppError::bad_request(
            "URL must not be empty",
            json!({ "field": "original_url" }),
        ));
    }

    if trimmed.len() > MAX_URL_LENGTH {
        return Err(AppError::bad_request(
            format!("URL must be at most {} characters", MAX_URL_LENGTH),
            json!({ "provided_length": trimmed.len() }),
        ));
    }

    let parsed = Url::parse(trimmed).map_err(|e| {
        AppError::bad_request("Invalid URL format", json!({ "reason": e.to_string() }))
    })?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(AppError::bad_request(
            "Only HTTP and HTTPS URLs are allowed",
            json!({ "scheme": parsed.scheme() }),
        ));
    }

    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(AppError::bad_request(
            "URL must include a host",
            json!({ "url": trimmed }),
        ));
    }

    Ok(trimmed.to_string())
}
