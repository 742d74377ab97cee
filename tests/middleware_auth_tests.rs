// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Bearer-token gateway behavior on protected routes.

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use common::{create_test_app, create_test_app_with_config, request_json};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use pawpal::config::Config;
use pawpal::services::auth::Claims;
use tower::ServiceExt;

fn sign_claims(claims: &Claims, secret: &[u8]) -> String {
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret),
    )
    .unwrap()
}

#[tokio::test]
async fn missing_bearer_token_is_unauthorized() {
    let (app, _) = create_test_app();

    let (status, body) = request_json(&app, "GET", "/api/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Unauthorized");
}

#[tokio::test]
async fn non_bearer_authorization_header_is_unauthorized() {
    let (app, _) = create_test_app();

    let request = Request::builder()
        .method("GET")
        .uri("/api/me")
        .header(header::AUTHORIZATION, "Basic cmV4Ondvb2Z3b29m")
        .body(Body::empty())
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn garbage_token_is_invalid() {
    let (app, _) = create_test_app();

    let (status, body) = request_json(&app, "GET", "/api/me", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid token");
}

#[tokio::test]
async fn foreign_secret_token_is_invalid() {
    let (app, state) = create_test_app();

    let now = chrono::Utc::now().timestamp() as usize;
    let claims = Claims {
        sub: "u1".to_string(),
        jti: "nonce".to_string(),
        iat: now,
        exp: now + 900,
    };
    let token = sign_claims(&claims, b"a_completely_different_secret!!!");
    assert!(!state.config.token_secret.is_empty());

    let (status, body) = request_json(&app, "GET", "/api/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid token");
}

#[tokio::test]
async fn expired_token_is_distinguished_from_invalid() {
    let (app, state) = create_test_app();

    // Well past expiry so default verification leeway cannot save it.
    let now = chrono::Utc::now().timestamp() as usize;
    let claims = Claims {
        sub: "u1".to_string(),
        jti: "nonce".to_string(),
        iat: now - 7200,
        exp: now - 3600,
    };
    let token = sign_claims(&claims, &state.config.token_secret);

    let (status, body) = request_json(&app, "GET", "/api/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Token expired");
}

#[tokio::test]
async fn valid_token_reaches_the_handler() {
    let (app, _) = create_test_app();
    let (user_id, access, _) =
        common::register_user(&app, "Rex", "rex@example.com", "woofwoof").await;

    let (status, body) = request_json(&app, "GET", "/api/me", Some(&access), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], user_id.as_str());
    assert_eq!(body["email"], "rex@example.com");
}

#[tokio::test]
async fn missing_signing_secret_is_a_server_error_not_unauthorized() {
    let mut config = Config::test_default();
    config.token_secret = Vec::new();
    let (app, _) = create_test_app_with_config(config);

    let (status, body) = request_json(&app, "GET", "/api/me", Some("any-token"), None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "TOKEN_SECRET is not defined");
}

#[tokio::test]
async fn security_headers_are_applied() {
    let (app, _) = create_test_app();

    let request = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();

    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );
    assert_eq!(response.headers().get("x-frame-options").unwrap(), "DENY");
}
