//! Central translation from failure kinds to HTTP responses.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::{debug, error};

use bloglist_db::UniqueViolation;
use bloglist_types::api::ErrorResponse;

use crate::tokens::TokenError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Missing or malformed input.
    #[error("{0}")]
    BadRequest(String),

    /// A path id that does not parse.
    #[error("malformatted id")]
    MalformedId,

    /// Missing, expired or forged token, or wrong credentials.
    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    /// Unique-constraint violation.
    #[error("{0}")]
    Conflict(String),

    #[error("internal error: {0}")]
    Internal(anyhow::Error),
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        if let Some(violation) = err.downcast_ref::<UniqueViolation>() {
            return match violation.column.as_str() {
                "users.username" => Self::Conflict("Username must be unique".to_string()),
                column => Self::Conflict(format!("{} must be unique", column)),
            };
        }
        Self::Internal(err)
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        Self::Unauthorized(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::MalformedId => (StatusCode::BAD_REQUEST, "malformatted id".to_string()),
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            // Reported as a plain validation failure
            Self::Conflict(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Internal(err) => {
                error!(error = ?err, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        if status.is_client_error() {
            debug!(status = %status, error = %message, "request rejected");
        }

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_username_maps_to_conflict() {
        let err: ApiError = anyhow::Error::new(UniqueViolation {
            column: "users.username".to_string(),
        })
        .into();
        assert!(matches!(err, ApiError::Conflict(ref msg) if msg == "Username must be unique"));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn other_errors_are_internal() {
        let err: ApiError = anyhow::anyhow!("disk on fire").into();
        assert!(matches!(err, ApiError::Internal(_)));
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn token_errors_are_unauthorized() {
        let err: ApiError = TokenError::Expired.into();
        assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);
    }
}
