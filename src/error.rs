//! API error responses
//!
//! Every failure leaving a handler is serialized as `{error, code?}` with the
//! matching HTTP status. Store failures are logged with full detail and
//! surfaced as a generic 500; internals never reach the client.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use crate::auth::AuthError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub code: Option<String>,
}

#[derive(Serialize)]
struct ApiErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<String>,
}

impl ApiError {
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            error: message.into(),
            code: None,
        }
    }

    pub fn token_expired() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            error: "Token expired".to_string(),
            code: Some("TOKEN_EXPIRED".to_string()),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::FORBIDDEN,
            error: message.into(),
            code: None,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            error: message.into(),
            code: None,
        }
    }

    pub fn bad_request(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error: message.into(),
            code: Some(code.into()),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error: message.into(),
            code: None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody {
            error: self.error,
            code: self.code,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        error!("Database error: {}", e);
        ApiError::internal("Internal server error")
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidCredentials => ApiError::unauthorized("Invalid email or password"),
            AuthError::EmailTaken => ApiError::bad_request("Email already registered", "EMAIL_TAKEN"),
            AuthError::UserNotFound => ApiError::unauthorized("Invalid or expired token"),
            AuthError::InvalidToken => ApiError::unauthorized("Invalid or expired token"),
            AuthError::TokenExpired => ApiError::token_expired(),
            AuthError::SessionExpired => ApiError::unauthorized("Session expired"),
            other => {
                error!("Internal auth error: {}", other);
                ApiError::internal("Internal server error")
            }
        }
    }
}
