// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use jsonwebtoken::{Algorithm, DecodingKey};
use pawpal::config::Config;
use pawpal::db::DocumentDb;
use pawpal::routes::create_router;
use pawpal::services::{AuthService, GoogleIdentityVerifier};
use pawpal::AppState;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

/// HS256 key the test Google verifier trusts.
#[allow(dead_code)]
pub const GOOGLE_TEST_KEY: &[u8] = b"google_test_signing_key";

/// Audience the test Google verifier expects (matches `Config::test_default`).
#[allow(dead_code)]
pub const GOOGLE_TEST_CLIENT_ID: &str = "test-google-client-id";

/// Create a test app with an in-memory store and a static-key Google
/// verifier. Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    create_test_app_with_config(Config::test_default())
}

/// Create a test app with a custom config (e.g. an empty signing secret).
#[allow(dead_code)]
pub fn create_test_app_with_config(config: Config) -> (axum::Router, Arc<AppState>) {
    let db = DocumentDb::in_memory();

    let auth = AuthService::new(
        db.clone(),
        config.token_secret.clone(),
        config.access_token_ttl_secs,
        config.refresh_token_ttl_secs,
    );

    let google_verifier = Arc::new(GoogleIdentityVerifier::new_with_static_key(
        GOOGLE_TEST_CLIENT_ID,
        Algorithm::HS256,
        DecodingKey::from_secret(GOOGLE_TEST_KEY),
    ));

    let state = Arc::new(AppState {
        config,
        db,
        auth,
        google_verifier,
    });

    (create_router(state.clone()), state)
}

/// Send a JSON request and decode the JSON response body.
#[allow(dead_code)]
pub async fn request_json(
    app: &axum::Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    (status, json)
}

/// Register a user over HTTP; returns `(user_id, access_token, refresh_token)`.
#[allow(dead_code)]
pub async fn register_user(
    app: &axum::Router,
    name: &str,
    email: &str,
    password: &str,
) -> (String, String, String) {
    let (status, body) = request_json(
        app,
        "POST",
        "/auth/register",
        None,
        Some(serde_json::json!({
            "name": name,
            "email": email,
            "password": password,
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "register failed: {}", body);

    (
        body["user"]["id"].as_str().unwrap().to_string(),
        body["accessToken"].as_str().unwrap().to_string(),
        body["refreshToken"].as_str().unwrap().to_string(),
    )
}
