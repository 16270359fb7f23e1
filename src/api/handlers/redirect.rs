//! Handler for short URL redirect.

use axum::{
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
};

use crate::error::AppError;
use crate::state::AppState;

/// Redirects a short code to its original URL.
///
/// # Endpoint
///
/// `GET /{code}`
///
/// # Request Flow
///
/// 1. Check cache for URL (cache key: `link:{code}`)
/// 2. On cache miss, query the store and reject expired links
/// 3. Populate the cache
/// 4. Enqueue an access event for the stats worker
/// 5. Return 302 Found
///
/// See [`crate::application::services::RedirectService`] for the cache and
/// timeout semantics.
///
/// # Errors
///
/// - 404 Not Found if the short code doesn't exist
/// - 410 Gone if the link has expired
/// - 503 Service Unavailable if the store failed or timed out
pub async fn redirect_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let resolution = state.redirect_service.resolve(&code).await?;

    Ok((StatusCode::FOUND, [(header::LOCATION, resolution.url)]))
}
