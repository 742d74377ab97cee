// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google sign-in over HTTP, using the static-key verifier mode.

mod common;

use axum::http::StatusCode;
use common::{create_test_app, request_json, GOOGLE_TEST_CLIENT_ID, GOOGLE_TEST_KEY};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::Serialize;
use serde_json::json;

#[derive(Serialize)]
struct GoogleClaims {
    iss: String,
    aud: String,
    sub: String,
    exp: usize,
    email: Option<String>,
    email_verified: Option<bool>,
    name: Option<String>,
    picture: Option<String>,
}

fn google_credential(email: Option<&str>) -> String {
    let claims = GoogleClaims {
        iss: "https://accounts.google.com".to_string(),
        aud: GOOGLE_TEST_CLIENT_ID.to_string(),
        sub: "google-sub-1".to_string(),
        exp: chrono::Utc::now().timestamp() as usize + 3600,
        email: email.map(str::to_string),
        email_verified: Some(true),
        name: Some("Dog Mom".to_string()),
        picture: Some("https://example.com/p.jpg".to_string()),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(GOOGLE_TEST_KEY),
    )
    .unwrap()
}

#[tokio::test]
async fn first_signin_provisions_an_account() {
    let (app, _) = create_test_app();
    let credential = google_credential(Some("dogmom@example.com"));

    let (status, body) = request_json(
        &app,
        "POST",
        "/auth/google-signin",
        None,
        Some(json!({ "credential": credential })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["firstTimeLogin"], true);
    assert_eq!(body["user"]["email"], "dogmom@example.com");
    assert_eq!(body["user"]["name"], "Dog Mom");

    // The issued access token is a normal session token.
    let access = body["accessToken"].as_str().unwrap();
    let (status, me) = request_json(&app, "GET", "/api/me", Some(access), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], "dogmom@example.com");
}

#[tokio::test]
async fn repeat_signin_reuses_the_account() {
    let (app, _) = create_test_app();
    let credential = google_credential(Some("dogmom@example.com"));

    let (_, first) = request_json(
        &app,
        "POST",
        "/auth/google-signin",
        None,
        Some(json!({ "credential": credential })),
    )
    .await;

    let credential = google_credential(Some("dogmom@example.com"));
    let (status, second) = request_json(
        &app,
        "POST",
        "/auth/google-signin",
        None,
        Some(json!({ "credential": credential })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["firstTimeLogin"], false);
    assert_eq!(second["user"]["id"], first["user"]["id"]);
}

#[tokio::test]
async fn repeat_signin_replaces_prior_sessions() {
    let (app, state) = create_test_app();
    let credential = google_credential(Some("dogmom@example.com"));

    let (_, first) = request_json(
        &app,
        "POST",
        "/auth/google-signin",
        None,
        Some(json!({ "credential": credential })),
    )
    .await;
    let first_refresh = first["refreshToken"].as_str().unwrap().to_string();

    let credential = google_credential(Some("dogmom@example.com"));
    let (_, second) = request_json(
        &app,
        "POST",
        "/auth/google-signin",
        None,
        Some(json!({ "credential": credential })),
    )
    .await;
    let second_refresh = second["refreshToken"].as_str().unwrap();

    // Sign-in follows login semantics: set replacement.
    assert!(state.auth.refresh(&first_refresh).await.is_err());
    state.auth.refresh(second_refresh).await.unwrap();
}

#[tokio::test]
async fn google_account_cannot_password_login() {
    let (app, _) = create_test_app();
    let credential = google_credential(Some("dogmom@example.com"));

    request_json(
        &app,
        "POST",
        "/auth/google-signin",
        None,
        Some(json!({ "credential": credential })),
    )
    .await;

    let (status, body) = request_json(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "dogmom@example.com", "password": "anything" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Incorrect email or password");
}

#[tokio::test]
async fn assertion_without_email_is_rejected() {
    let (app, _) = create_test_app();
    let credential = google_credential(None);

    let (status, body) = request_json(
        &app,
        "POST",
        "/auth/google-signin",
        None,
        Some(json!({ "credential": credential })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid Google token");
}

#[tokio::test]
async fn forged_assertion_is_rejected() {
    let (app, _) = create_test_app();

    let (status, body) = request_json(
        &app,
        "POST",
        "/auth/google-signin",
        None,
        Some(json!({ "credential": "not.a.real.assertion" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid Google token");
}

#[tokio::test]
async fn missing_credential_is_a_validation_error() {
    let (app, _) = create_test_app();

    let (status, body) =
        request_json(&app, "POST", "/auth/google-signin", None, Some(json!({}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Credential is required.");
}
