//! Body of `GET /health`.

use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `healthy` when every check passed, `degraded` when only the cache
    /// failed, `unhealthy` when the store or the stats queue failed.
    pub status: &'static str,
    pub version: &'static str,
    pub checks: HealthChecks,
}

#[derive(Debug, Serialize)]
pub struct HealthChecks {
    pub database: CheckStatus,
    pub stats_queue: CheckStatus,
    pub cache: CheckStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckState {
    Ok,
    Degraded,
    Error,
}

/// Outcome of one component check.
#[derive(Debug, Serialize)]
pub struct CheckStatus {
    pub status: CheckState,
    pub message: String,
}

impl CheckStatus {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            status: CheckState::Ok,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: CheckState::Error,
            message: message.into(),
        }
    }

    pub fn degraded(message: impl Into<String>) -> Self {
        Self {
            status: CheckState::Degraded,
            message: message.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == CheckState::Ok
    }
}
