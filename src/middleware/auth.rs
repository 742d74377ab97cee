// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JWT authentication middleware (the auth gateway).

use crate::error::AppError;
use crate::services::auth::verify_token;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Authenticated principal extracted from a verified access token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
}

/// Middleware that requires a valid bearer access token.
///
/// Terminal at the first matching check: missing bearer token, missing
/// signing secret, expired token, invalid token, then success. Never
/// consults the refresh-token set; access tokens are stateless by design.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header.and_then(|h| h.strip_prefix("Bearer ")) {
        Some(token) if !token.is_empty() => token,
        _ => {
            tracing::debug!("Request without bearer token");
            return Err(AppError::Unauthorized);
        }
    };

    if state.config.token_secret.is_empty() {
        return Err(AppError::ServerMisconfigured("TOKEN_SECRET"));
    }

    // verify_token distinguishes TokenExpired from InvalidToken; both map
    // to 401 with different messages so clients know whether to refresh.
    let claims = verify_token(token, &state.config.token_secret)?;

    request.extensions_mut().insert(AuthUser {
        user_id: claims.sub,
    });

    Ok(next.run(request).await)
}
