// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! PawPal: social networking backend for dog owners.
//!
//! This crate provides the REST API: credential registration and login,
//! access/refresh token lifecycle, Google sign-in, and ownership-guarded
//! resource mutation.

pub mod authz;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use db::DocumentDb;
use services::{AuthService, GoogleIdentityVerifier};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: DocumentDb,
    pub auth: AuthService,
    pub google_verifier: Arc<GoogleIdentityVerifier>,
}
