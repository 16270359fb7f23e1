//! API route configuration.
//!
//! All API endpoints require Bearer token authentication via
//! [`crate::api::middleware::auth`].

use crate::api::handlers::{
    create_link_handler, delete_link_handler, get_link_handler, link_stats_handler,
    list_links_handler, search_link_handler, update_link_handler,
};
use crate::state::AppState;
use axum::{Router, routing::get};

/// All API routes, protected by Bearer token authentication.
///
/// # Endpoints
///
/// - `POST   /links`              - Create a short link
/// - `GET    /links`              - List the caller's links
/// - `GET    /links/search`       - Find a link by `original_url`
/// - `GET    /links/{code}`       - Read one link
/// - `PUT    /links/{code}`       - Update destination and/or expiry
/// - `DELETE /links/{code}`       - Delete a link
/// - `GET    /links/{code}/stats` - Visit statistics
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/links", get(list_links_handler).post(create_link_handler))
        .route("/links/search", get(search_link_handler))
        .route(
            "/links/{code}",
            get(get_link_handler)
                .put(update_link_handler)
                .delete(delete_link_handler),
        )
        .route("/links/{code}/stats", get(link_stats_handler))
}
