//! Handler for health check endpoint.

use axum::{Json, extract::State, http::StatusCode};

use crate::api::dto::health::{CheckStatus, HealthChecks, HealthResponse};
use crate::state::AppState;

/// Returns service health status with component checks.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response Codes
///
/// - **200 OK**: Store and stats queue healthy (cache may be degraded)
/// - **503 Service Unavailable**: Store or stats queue failed
///
/// # Components Checked
///
/// 1. **Database**: `SELECT 1` round-trip
/// 2. **Stats Queue**: Checks the channel is open and reports free slots
/// 3. **Cache**: Backend ping bounded by the cache timeout. Redirects fall
///    back to the store without it, so a failure only marks it `degraded`
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "checks": {
///     "database": { "status": "ok", "message": "Connected" },
///     "stats_queue": { "status": "ok", "message": "Free slots: 10000/10000" },
///     "cache": { "status": "ok", "message": "redis connected" }
///   }
/// }
/// ```
pub async fn health_handler(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let db_check = check_database(&state).await;

    let queue_check = check_stats_queue(&state);

    let cache_check = check_cache(&state).await;

    let serving = db_check.is_ok() && queue_check.is_ok();

    let response = HealthResponse {
        status: match (serving, cache_check.is_ok()) {
            (true, true) => "healthy",
            (true, false) => "degraded",
            (false, _) => "unhealthy",
        },
        version: env!("CARGO_PKG_VERSION"),
        checks: HealthChecks {
            database: db_check,
            stats_queue: queue_check,
            cache: cache_check,
        },
    };

    if serving {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}

async fn check_database(state: &AppState) -> CheckStatus {
    match state.link_repository.ping().await {
        Ok(()) => CheckStatus::ok("Connected"),
        Err(e) => CheckStatus::error(format!("Database error: {}", e)),
    }
}

fn check_stats_queue(state: &AppState) -> CheckStatus {
    if state.stats_queue.is_closed() {
        CheckStatus::error("Stats queue is closed")
    } else {
        CheckStatus::ok(format!(
            "Free slots: {}/{}",
            state.stats_queue.capacity(),
            state.stats_queue.max_capacity()
        ))
    }
}

async fn check_cache(state: &AppState) -> CheckStatus {
    let backend = state.cache.backend_name();
    let limit = state.redirect_service.settings().cache_timeout;

    match tokio::time::timeout(limit, state.cache.health_check()).await {
        Ok(true) => CheckStatus::ok(format!("{} connected", backend)),
        Ok(false) => CheckStatus::degraded(format!("{} connection failed", backend)),
        Err(_) => CheckStatus::degraded(format!(
            "{} did not answer within {}ms",
            backend,
            limit.as_millis()
        )),
    }
}
