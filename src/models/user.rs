// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User model for storage and API.

use crate::authz::Owned;
use serde::{Deserialize, Serialize};

pub const DEFAULT_USER_IMAGE: &str = "/public/users/user_default.png";
pub const DEFAULT_DOG_IMAGE: &str = "/public/dogs/dog_default.jpg";

/// A dog sub-record owned by a user. Each dog gets its own generated
/// identifier when appended to the user's list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dog {
    pub id: String,
    pub name: String,
    pub birth_year: i32,
    pub birth_month: u32,
    pub breed: Option<String>,
    pub image: Option<String>,
}

/// User gender (optional profile attribute, no bearing on auth logic).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Other,
}

/// Credential record stored in the users collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Opaque unique identifier (also the document ID), immutable
    pub id: String,
    /// Display name
    pub name: String,
    /// Unique across all records, stored as given (no normalization)
    pub email: String,
    /// Argon2 hash of the password; None for Google-only accounts, which
    /// can therefore never log in with a password
    pub password_hash: Option<String>,
    pub profile_image: String,
    pub city: Option<String>,
    pub gender: Option<Gender>,
    /// Owned dog sub-records
    pub dogs: Vec<Dog>,
    /// Set of currently valid refresh tokens. A refresh is accepted only if
    /// the presented token is a member; login replaces the whole set.
    pub refresh_tokens: Vec<String>,
    /// Whether the account was provisioned by Google sign-in
    pub is_google_user: bool,
    /// When the account was created (RFC 3339)
    pub created_at: String,
}

impl User {
    /// Echo a user in API responses without credential material.
    pub fn to_public(&self) -> PublicUser {
        PublicUser {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            profile_image: self.profile_image.clone(),
            city: self.city.clone(),
            gender: self.gender,
            dogs: self.dogs.clone(),
        }
    }
}

impl Owned for User {
    // A credential record owns itself: only the matching identity may
    // mutate it.
    fn owner_id(&self) -> &str {
        &self.id
    }
}

/// User shape returned by the API. The password hash and refresh-token set
/// never leave the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub profile_image: String,
    pub city: Option<String>,
    pub gender: Option<Gender>,
    pub dogs: Vec<Dog>,
}
