// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Authentication routes: register, login, logout, refresh, Google sign-in.

use crate::error::{AppError, Result};
use crate::models::PublicUser;
use crate::services::auth::RegisterParams;
use crate::AppState;
use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/refresh", post(refresh))
        .route("/auth/google-signin", post(google_signin))
}

// ─── Request / Response Bodies ───────────────────────────────────

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct RegisterRequest {
    name: Option<String>,
    #[validate(email(message = "Invalid email address."))]
    email: Option<String>,
    #[validate(length(min = 6, message = "Password must be at least 6 characters."))]
    password: Option<String>,
    city: Option<String>,
    profile_image: Option<String>,
}

#[derive(Deserialize)]
struct LoginRequest {
    email: Option<String>,
    password: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshTokenRequest {
    refresh_token: Option<String>,
}

#[derive(Deserialize)]
struct GoogleSigninRequest {
    credential: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AuthResponse {
    message: String,
    user: PublicUser,
    access_token: String,
    refresh_token: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    message: String,
    access_token: String,
    refresh_token: String,
}

#[derive(Serialize)]
struct MessageResponse {
    message: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GoogleSigninResponse {
    message: String,
    user: PublicUser,
    access_token: String,
    refresh_token: String,
    first_time_login: bool,
}

// ─── Handlers ────────────────────────────────────────────────────

/// Register a new user.
async fn register(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>> {
    let missing = |v: &Option<String>| v.as_deref().is_none_or(str::is_empty);
    if missing(&body.name) || missing(&body.email) || missing(&body.password) {
        return Err(AppError::Validation(
            "Name, email, and password are required.".to_string(),
        ));
    }
    body.validate()
        .map_err(|e| AppError::Validation(flatten_validation_message(&e)))?;

    let (user, tokens) = state
        .auth
        .register(RegisterParams {
            name: body.name.unwrap_or_default(),
            email: body.email.unwrap_or_default(),
            password: body.password.unwrap_or_default(),
            city: body.city,
            profile_image: body.profile_image,
        })
        .await?;

    Ok(Json(AuthResponse {
        message: "User registered successfully".to_string(),
        user: user.to_public(),
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
    }))
}

/// Log in with email and password.
async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    let (Some(email), Some(password)) = (body.email, body.password) else {
        return Err(AppError::Validation(
            "Email and password are required.".to_string(),
        ));
    };

    let (user, tokens) = state.auth.login(&email, &password).await?;

    Ok(Json(AuthResponse {
        message: "User logged in successfully".to_string(),
        user: user.to_public(),
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
    }))
}

/// Invalidate one refresh token.
async fn logout(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RefreshTokenRequest>,
) -> Result<Json<MessageResponse>> {
    let token = body.refresh_token.unwrap_or_default();
    state.auth.logout(&token).await?;

    Ok(Json(MessageResponse {
        message: "User logged out successfully".to_string(),
    }))
}

/// Exchange a refresh token for a new pair.
async fn refresh(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RefreshTokenRequest>,
) -> Result<Json<TokenResponse>> {
    let token = body.refresh_token.unwrap_or_default();
    let tokens = state.auth.refresh(&token).await?;

    Ok(Json(TokenResponse {
        message: "Token refreshed successfully".to_string(),
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
    }))
}

/// Sign in with a Google ID token.
async fn google_signin(
    State(state): State<Arc<AppState>>,
    Json(body): Json<GoogleSigninRequest>,
) -> Result<Json<GoogleSigninResponse>> {
    let Some(credential) = body.credential.filter(|c| !c.is_empty()) else {
        return Err(AppError::Validation("Credential is required.".to_string()));
    };

    let result = state
        .auth
        .google_signin(&state.google_verifier, &credential)
        .await?;

    Ok(Json(GoogleSigninResponse {
        message: "User logged in with Google successfully".to_string(),
        user: result.user.to_public(),
        access_token: result.tokens.access_token,
        refresh_token: result.tokens.refresh_token,
        first_time_login: result.first_time_login,
    }))
}

fn flatten_validation_message(errors: &validator::ValidationErrors) -> String {
    errors
        .field_errors()
        .values()
        .flat_map(|errs| errs.iter())
        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
        .next()
        .unwrap_or_else(|| "Invalid request body.".to_string())
}
