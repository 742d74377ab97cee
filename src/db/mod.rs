// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer (Firestore or in-memory).

pub mod store;

pub use store::DocumentDb;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    /// Email uniqueness index (document ID = email, created insert-only)
    pub const USER_EMAILS: &str = "user_emails";
    pub const POSTS: &str = "posts";
}
