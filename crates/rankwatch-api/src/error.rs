use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Error taxonomy for the HTTP API. Every variant carries a
/// machine-readable code and a human-readable message; internal details
/// never reach callers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("Not authenticated")]
    Unauthenticated,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Email already in use")]
    EmailInUse,

    /// A valid session pointing at an account that no longer exists.
    #[error("User not found")]
    UserNotFound,

    /// Deliberately conflates "does not exist" with "not yours" so callers
    /// cannot probe for other users' rows.
    #[error("URL not found or unauthorized")]
    NotFoundOrUnauthorized,

    #[error("Something went wrong")]
    Internal(#[source] anyhow::Error),
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput(_) | ApiError::EmailInUse => StatusCode::BAD_REQUEST,
            ApiError::Unauthenticated | ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::UserNotFound | ApiError::NotFoundOrUnauthorized => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidInput(_) => "invalid_input",
            ApiError::Unauthenticated => "unauthenticated",
            ApiError::InvalidCredentials => "invalid_credentials",
            ApiError::EmailInUse => "email_in_use",
            ApiError::UserNotFound => "user_not_found",
            ApiError::NotFoundOrUnauthorized => "not_found",
            ApiError::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(err) = &self {
            error!("internal error: {:?}", err);
        }

        let body = Json(json!({
            "code": self.code(),
            "error": self.to_string(),
        }));

        (self.status(), body).into_response()
    }
}
