//! Bearer token authentication for the link management API.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_auth::AuthBearer;
use serde_json::json;
use tracing::debug;

use crate::{error::AppError, state::AppState};

/// Resolves `Authorization: Bearer <token>` to a [`Principal`] and stores it
/// in the request extensions for handlers to pick up with
/// `Extension<Principal>`.
///
/// Missing, malformed, unknown and revoked tokens all produce `401` with
/// `WWW-Authenticate: Bearer`.
///
/// ```rust,ignore
/// let protected = api::routes::protected_routes()
///     .route_layer(middleware::from_fn_with_state(state.clone(), auth::layer));
/// ```
///
/// [`Principal`]: crate::domain::entities::Principal
pub async fn layer(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (mut parts, body) = req.into_parts();

    let token = bearer_token(&mut parts).await?;
    let principal = state.auth_service.authenticate(&token).await?;

    debug!("Authenticated {} {} as {}", parts.method, parts.uri, principal.name);
    parts.extensions.insert(principal);

    Ok(next.run(Request::from_parts(parts, body)).await)
}

async fn bearer_token(parts: &mut Parts) -> Result<String, AppError> {
    AuthBearer::from_request_parts(parts, &())
        .await
        .map(|AuthBearer(token)| token)
        .map_err(|_| {
            AppError::unauthorized(
                "Unauthorized",
                json!({ "reason": "Authorization header is missing or not a Bearer token" }),
            )
        })
}
