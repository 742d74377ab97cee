// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
///
/// Every core operation fails with exactly one of these kinds; the
/// `IntoResponse` impl is the only place that maps kinds to status codes
/// and user-facing messages.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Missing or malformed request fields (client-correctable).
    #[error("{0}")]
    Validation(String),

    /// Wrong email or wrong password. Deliberately one kind so the response
    /// never reveals whether the email exists.
    #[error("Incorrect email or password")]
    InvalidCredentials,

    #[error("Email already exists.")]
    DuplicateEmail,

    /// Access token past its expiry. Distinguished from `InvalidToken` so
    /// clients know to attempt a refresh instead of re-authenticating.
    #[error("Token expired")]
    TokenExpired,

    /// Access token failed signature verification (malformed, tampered,
    /// or signed under a different secret).
    #[error("Invalid token")]
    InvalidToken,

    /// Refresh token missing from the request body.
    #[error("Refresh token is required.")]
    MissingRefreshToken,

    /// Refresh token rejected: bad signature, expired, or not a member of
    /// the user's current refresh-token set.
    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    /// Refresh token verified but its subject no longer exists.
    #[error("User not found")]
    UserNotFound,

    /// Google credential failed verification or carried no usable email.
    #[error("Invalid Google token")]
    InvalidGoogleToken,

    /// Authenticated identity is not permitted (missing bearer token or
    /// ownership mismatch).
    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0} not found")]
    NotFound(String),

    /// Required server configuration (e.g. the token signing secret) is
    /// absent. Never conflated with client-caused failures.
    #[error("{0} is not defined")]
    ServerMisconfigured(&'static str),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Validation(_)
            | AppError::InvalidCredentials
            | AppError::DuplicateEmail
            | AppError::MissingRefreshToken
            | AppError::InvalidRefreshToken
            | AppError::UserNotFound
            | AppError::InvalidGoogleToken => StatusCode::BAD_REQUEST,
            AppError::TokenExpired | AppError::InvalidToken | AppError::Unauthorized => {
                StatusCode::UNAUTHORIZED
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ServerMisconfigured(name) => {
                tracing::error!(setting = name, "Server misconfigured");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        // Internal detail stays in the logs; the client gets a safe message.
        let message = match &self {
            AppError::Database(_) | AppError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        };

        (status, Json(ErrorResponse { message })).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
