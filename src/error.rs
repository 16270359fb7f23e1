//! Application error type and its HTTP representation.
//!
//! Every fallible operation outside the cache layer returns [`AppError`].
//! Cache failures never reach this type: they are absorbed inside
//! [`crate::infrastructure::cache`] and degrade to a miss.
//!
//! # Response Format
//!
//! ```json
//! {
//!   "error": {
//!     "code": "gone",
//!     "message": "Short link has expired",
//!     "details": { "code": "old1" }
//!   }
//! }
//! ```

use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorInfo,
}

/// Machine-readable error payload.
#[derive(Debug, Serialize)]
pub struct ErrorInfo {
    pub code: &'static str,
    pub message: String,
    pub details: Value,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{message}")]
    Validation { message: String, details: Value },

    #[error("{message}")]
    Unauthorized { message: String, details: Value },

    #[error("{message}")]
    Forbidden { message: String, details: Value },

    #[error("{message}")]
    NotFound { message: String, details: Value },

    /// The link exists but its `expires_at` is in the past.
    #[error("{message}")]
    Gone { message: String, details: Value },

    /// A caller-supplied alias collides with an existing live code.
    #[error("{message}")]
    DuplicateAlias { message: String, details: Value },

    /// The bounded code generation loop ran out of attempts.
    #[error("{message}")]
    GenerationExhausted { message: String, details: Value },

    /// The durable store failed or did not answer in time.
    #[error("{message}")]
    StoreUnavailable { message: String, details: Value },

    #[error("{message}")]
    Internal { message: String, details: Value },
}

impl AppError {
    pub fn bad_request(message: impl Into<String>, details: Value) -> Self {
        Self::Validation {
            message: message.into(),
            details,
        }
    }

    pub fn unauthorized(message: impl Into<String>, details: Value) -> Self {
        Self::Unauthorized {
            message: message.into(),
            details,
        }
    }

    pub fn forbidden(message: impl Into<String>, details: Value) -> Self {
        Self::Forbidden {
            message: message.into(),
            details,
        }
    }

    pub fn not_found(message: impl Into<String>, details: Value) -> Self {
        Self::NotFound {
            message: message.into(),
            details,
        }
    }

    pub fn gone(message: impl Into<String>, details: Value) -> Self {
        Self::Gone {
            message: message.into(),
            details,
        }
    }

    pub fn duplicate_alias(alias: &str) -> Self {
        Self::DuplicateAlias {
            message: "Alias is already in use".to_string(),
            details: json!({ "alias": alias }),
        }
    }

    pub fn generation_exhausted(attempts: usize) -> Self {
        Self::GenerationExhausted {
            message: "Failed to generate a unique short code".to_string(),
            details: json!({ "attempts": attempts }),
        }
    }

    pub fn store_unavailable(message: impl Into<String>, details: Value) -> Self {
        Self::StoreUnavailable {
            message: message.into(),
            details,
        }
    }

    pub fn internal(message: impl Into<String>, details: Value) -> Self {
        Self::Internal {
            message: message.into(),
            details,
        }
    }

    /// HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            AppError::Forbidden { .. } => StatusCode::FORBIDDEN,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Gone { .. } => StatusCode::GONE,
            AppError::DuplicateAlias { .. } => StatusCode::CONFLICT,
            AppError::GenerationExhausted { .. } | AppError::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::StoreUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Converts the error into its serializable payload.
    pub fn to_error_info(&self) -> ErrorInfo {
        let (code, message, details) = match self {
            AppError::Validation { message, details } => ("validation_error", message, details),
            AppError::Unauthorized { message, details } => ("unauthorized", message, details),
            AppError::Forbidden { message, details } => ("forbidden", message, details),
            AppError::NotFound { message, details } => ("not_found", message, details),
            AppError::Gone { message, details } => ("gone", message, details),
            AppError::DuplicateAlias { message, details } => ("duplicate_alias", message, details),
            AppError::GenerationExhausted { message, details } => {
                ("generation_exhausted", message, details)
            }
            AppError::StoreUnavailable { message, details } => {
                ("store_unavailable", message, details)
            }
            AppError::Internal { message, details } => ("internal_error", message, details),
        };

        ErrorInfo {
            code,
            message: message.clone(),
            details: details.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorBody {
            error: self.to_error_info(),
        };

        if status == StatusCode::UNAUTHORIZED {
            return (status, [(header::WWW_AUTHENTICATE, "Bearer")], Json(body)).into_response();
        }

        (status, Json(body)).into_response()
    }
}

/// Maps driver errors onto the store taxonomy.
///
/// A unique violation on `links_short_code_key` is a code collision; everything
/// else means the store could not serve the request.
impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        if let Some(db) = e.as_database_error()
            && db.is_unique_violation()
        {
            if db.constraint() == Some("links_short_code_key") {
                return AppError::DuplicateAlias {
                    message: "Alias is already in use".to_string(),
                    details: json!({ "constraint": db.constraint() }),
                };
            }

            return AppError::bad_request(
                "Unique constraint violation",
                json!({ "constraint": db.constraint() }),
            );
        }

        tracing::error!("Database error: {}", e);
        AppError::store_unavailable("Database error", json!({}))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(e: validator::ValidationErrors) -> Self {
        AppError::bad_request("Validation failed", json!({ "fields": e.field_errors() }))
    }
}
