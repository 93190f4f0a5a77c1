use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Redirect, Response};
use tracing::error;

use crate::auth::guard::Denied;
use crate::auth::provider::AuthFailure;
use crate::storage::StorageError;

/// Route-level error taxonomy. Everything a handler can refuse with maps to
/// exactly one variant, so status codes and redirects stay uniform.
#[derive(Debug)]
pub enum ApiError {
    /// No authenticated session: sent back to the home page to log in.
    Unauthenticated,
    /// Authenticated, but not the owner of the resource.
    Forbidden,
    /// The OAuth connect attempt failed; the session stays unauthenticated.
    AuthFailed(AuthFailure),
    /// Missing row on a page-flow route: redirect to a safe default view.
    NotFound,
    /// Missing row on a JSON route: plain 404.
    JsonNotFound,
    /// Unique-constraint violation, with a user-visible message.
    Duplicate(String),
    /// Malformed or incomplete request input.
    BadRequest(String),
    /// A poster upload was refused.
    Upload(StorageError),
    /// Anything unexpected: logged in full, reported generically.
    Internal,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Unauthenticated => {
                Redirect::to("/").into_response()
            }
            ApiError::Forbidden => (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({ "error": "You do not own this resource" })),
            )
                .into_response(),
            ApiError::AuthFailed(failure) => {
                let status = match &failure {
                    AuthFailure::Rejected(_) => StatusCode::UNAUTHORIZED,
                    AuthFailure::Provider(_) | AuthFailure::Timeout => StatusCode::BAD_GATEWAY,
                };
                (
                    status,
                    Json(serde_json::json!({ "error": failure.to_string() })),
                )
                    .into_response()
            }
            ApiError::NotFound => Redirect::to("/").into_response(),
            ApiError::JsonNotFound => (
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({ "error": "Not found" })),
            )
                .into_response(),
            ApiError::Duplicate(message) => (
                StatusCode::CONFLICT,
                Json(serde_json::json!({ "error": message })),
            )
                .into_response(),
            ApiError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": message })),
            )
                .into_response(),
            ApiError::Upload(err) => {
                let status = match err {
                    StorageError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
                    StorageError::UnsupportedType(_) => StatusCode::BAD_REQUEST,
                    StorageError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (
                    status,
                    Json(serde_json::json!({ "error": err.to_string() })),
                )
                    .into_response()
            }
            ApiError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": "Internal server error" })),
            )
                .into_response(),
        }
    }
}

impl From<Denied> for ApiError {
    fn from(denied: Denied) -> Self {
        match denied {
            Denied::Unauthenticated => ApiError::Unauthenticated,
            Denied::Forbidden => ApiError::Forbidden,
        }
    }
}

impl From<AuthFailure> for ApiError {
    fn from(failure: AuthFailure) -> Self {
        ApiError::AuthFailed(failure)
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        if let StorageError::Io(ref e) = err {
            error!(error = %e, "poster storage I/O failure");
        }
        ApiError::Upload(err)
    }
}

/// Database errors are never surfaced verbatim: unique-constraint violations
/// become a user-visible duplicate message, everything else a generic 500
/// with the detail kept in the log.
impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::RowNotFound => ApiError::NotFound,
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                ApiError::Duplicate("Duplicate entry tried.".to_string())
            }
            _ => {
                error!(error = %e, "database error");
                ApiError::Internal
            }
        }
    }
}
