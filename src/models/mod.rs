// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod post;
pub mod user;

pub use post::Post;
pub use user::{Dog, Gender, PublicUser, User};
