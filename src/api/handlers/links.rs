//! Handlers for link management endpoints.
//!
//! All handlers run behind [`crate::api::middleware::auth`], which places the
//! caller's [`Principal`] in the request extensions.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use validator::Validate;

use crate::api::dto::link::{
    CreateLinkRequest, LinkResponse, LinkStatsResponse, SearchQuery, SearchResponse,
    UpdateLinkRequest,
};
use crate::domain::entities::Principal;
use crate::error::AppError;
use crate::state::AppState;

/// Creates a short link.
///
/// # Endpoint
///
/// `POST /api/links`
///
/// # Request Body
///
/// ```json
/// {
///   "original_url": "https://example.com",
///   "custom_alias": "promo",        // optional
///   "expires_in_days": 7,           // optional
///   "expires_at": "2026-12-31T23:59:59Z"  // optional, wins over expires_in_days
/// }
/// ```
///
/// # Errors
///
/// - 400 Bad Request if validation fails
/// - 409 Conflict if `custom_alias` is already taken
pub async fn create_link_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<CreateLinkRequest>,
) -> Result<(StatusCode, Json<LinkResponse>), AppError> {
    payload.validate()?;

    let link = state
        .link_service
        .create_link(&principal, payload.into_input(Utc::now()))
        .await?;

    Ok((StatusCode::CREATED, Json(link.into())))
}

/// Lists the caller's links, newest first.
///
/// `GET /api/links`
pub async fn list_links_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Vec<LinkResponse>>, AppError> {
    let links = state.link_service.list_links(&principal).await?;

    Ok(Json(links.into_iter().map(LinkResponse::from).collect()))
}

/// Finds the short code for a destination URL.
///
/// `GET /api/links/search?original_url=...`
///
/// Returns 404 Not Found if no link points at the URL.
pub async fn search_link_handler(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, AppError> {
    let link = state
        .link_service
        .search_by_original_url(&query.original_url)
        .await?;

    Ok(Json(SearchResponse {
        short_code: link.short_code,
        original_url: link.original_url,
    }))
}

/// Returns a single link.
///
/// `GET /api/links/{code}`
///
/// Returns 404 if the code doesn't exist and 403 if it belongs to someone else.
pub async fn get_link_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(code): Path<String>,
) -> Result<Json<LinkResponse>, AppError> {
    let link = state.link_service.get_link(&principal, &code).await?;

    Ok(Json(link.into()))
}

/// Partially updates a link.
///
/// # Endpoint
///
/// `PUT /api/links/{code}`
///
/// # Request Body
///
/// ```json
/// {
///   "original_url": "https://new-destination.com",
///   "expires_at": "2026-12-31T23:59:59Z",  // null to clear
///   "expires_in_days": 30
/// }
/// ```
///
/// # Cache
///
/// The cache entry for this link is invalidated so the next redirect uses the
/// updated destination and expiry.
pub async fn update_link_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(code): Path<String>,
    Json(payload): Json<UpdateLinkRequest>,
) -> Result<Json<LinkResponse>, AppError> {
    payload.validate()?;

    let link = state
        .link_service
        .update_link(&principal, &code, payload.into_patch(Utc::now()))
        .await?;

    Ok(Json(link.into()))
}

/// Deletes a link and invalidates its cache entry.
///
/// `DELETE /api/links/{code}` returns 204 No Content. The code becomes free
/// for reuse.
pub async fn delete_link_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(code): Path<String>,
) -> Result<StatusCode, AppError> {
    state.link_service.delete_link(&principal, &code).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Returns visit statistics for a link.
///
/// `GET /api/links/{code}/stats`
///
/// Counts are eventually consistent: accesses still in the stats queue are
/// not yet reflected.
pub async fn link_stats_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(code): Path<String>,
) -> Result<Json<LinkStatsResponse>, AppError> {
    let link = state.link_service.get_link(&principal, &code).await?;

    Ok(Json(link.into()))
}
