// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! PawPal API Server

use pawpal::{
    config::Config,
    db::DocumentDb,
    services::{AuthService, GoogleIdentityVerifier},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env();
    tracing::info!(port = config.port, "Starting PawPal API");

    if config.token_secret.is_empty() {
        // Startup continues; signing paths report the misconfiguration
        // explicitly per request.
        tracing::warn!("TOKEN_SECRET not set, token issuance will fail");
    }

    // Connect the document store (Firestore or in-memory)
    let db = DocumentDb::connect(&config.gcp_project_id)
        .await
        .expect("Failed to connect to document store");

    let auth = AuthService::new(
        db.clone(),
        config.token_secret.clone(),
        config.access_token_ttl_secs,
        config.refresh_token_ttl_secs,
    );

    let google_verifier =
        Arc::new(GoogleIdentityVerifier::new(&config).expect("Failed to initialize Google verifier"));

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        auth,
        google_verifier,
    });

    // Build router
    let app = pawpal::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("pawpal=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
