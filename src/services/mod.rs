// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod auth;
pub mod google_identity;

pub use auth::{AuthService, Claims, TokenPair};
pub use google_identity::{GoogleIdentityVerifier, VerifiedGoogleIdentity};
