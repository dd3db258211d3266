// src/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// Global Application Error Enum.
/// Centralizes error handling and mapping to HTTP responses.
///
/// Every variant is surfaced once to the caller of the triggering action.
/// Nothing in the crate retries automatically.
#[derive(Debug)]
pub enum AppError {
    // 500 Internal Server Error: store unreachable or write rejected
    Persistence(String),

    // 500 Internal Server Error
    Internal(String),

    // 400 Bad Request: malformed parameters (negative amount, bad option, ...)
    Validation(String),

    // 401 Unauthorized
    Auth(String),

    // 403 Forbidden (e.g., non-host selecting winners)
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict (e.g., rank slot already filled)
    Conflict(String),

    // 502 Bad Gateway: the token reward rail call failed
    ExternalRail(String),

    // 502 Bad Gateway: the remote code-execution service failed
    Upstream(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Persistence(msg)
            | AppError::Internal(msg)
            | AppError::Validation(msg)
            | AppError::Auth(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg)
            | AppError::ExternalRail(msg)
            | AppError::Upstream(msg) => f.write_str(msg),
        }
    }
}

impl std::error::Error for AppError {}

impl AppError {
    /// Message safe to show to the user; internal details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Persistence(_) | AppError::Internal(_) => "Internal Server Error".to_string(),
            AppError::Validation(msg)
            | AppError::Auth(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg)
            | AppError::ExternalRail(msg)
            | AppError::Upstream(msg) => msg.clone(),
        }
    }
}

/// Implements `IntoResponse` for `AppError`.
/// Converts the error into a JSON response with appropriate HTTP status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Persistence(msg) => {
                tracing::error!("Persistence error: {}", msg);
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ExternalRail(msg) => {
                tracing::warn!("Reward rail error: {}", msg);
                StatusCode::BAD_GATEWAY
            }
            AppError::Upstream(msg) => {
                tracing::warn!("Upstream error: {}", msg);
                StatusCode::BAD_GATEWAY
            }
        };
        let body = Json(json!({
            "error": self.public_message(),
        }));

        (status, body).into_response()
    }
}

/// Converts `sqlx::Error` into `AppError`.
/// Allows using `?` operator on database queries.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".to_string()),
            other => AppError::Persistence(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Upstream(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_details_are_hidden() {
        let err = AppError::Persistence("connection refused on 10.0.0.3".to_string());
        assert_eq!(err.public_message(), "Internal Server Error");
    }

    #[test]
    fn status_codes_follow_kind() {
        let cases = [
            (AppError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (AppError::Conflict("x".into()), StatusCode::CONFLICT),
            (AppError::ExternalRail("x".into()), StatusCode::BAD_GATEWAY),
            (AppError::Forbidden("x".into()), StatusCode::FORBIDDEN),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn display_prints_the_message_only() {
        let err = AppError::NotFound("User 'u1' not found".to_string());
        assert_eq!(err.to_string(), "User 'u1' not found");
        let err = AppError::Persistence("connection refused".to_string());
        assert_eq!(err.to_string(), "connection refused");
    }

    #[test]
    fn row_not_found_maps_to_not_found() {
        assert!(matches!(
            AppError::from(sqlx::Error::RowNotFound),
            AppError::NotFound(_)
        ));
    }
}
