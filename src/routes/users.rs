// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User profile routes (authenticated).

use crate::authz::authorize_owner;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::user::{Dog, Gender, DEFAULT_DOG_IMAGE};
use crate::models::PublicUser;
use crate::services::auth::random_hex;
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::{get, put},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me))
        .route("/api/users/{id}", put(update_user).delete(delete_user))
}

/// Get the authenticated user's profile.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<PublicUser>> {
    let profile = state
        .db
        .get_user(&user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User".to_string()))?;

    Ok(Json(profile.to_public()))
}

/// Dog sub-record in an update request. Omitting `id` appends a new dog,
/// which gets a generated identifier.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DogInput {
    id: Option<String>,
    name: String,
    birth_year: i32,
    birth_month: u32,
    breed: Option<String>,
    image: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateUserRequest {
    name: Option<String>,
    city: Option<String>,
    gender: Option<Gender>,
    profile_image: Option<String>,
    dogs: Option<Vec<DogInput>>,
}

/// Update a user's profile and dogs. Ownership-gated: a credential record
/// may only be mutated by the matching identity.
///
/// The mutation runs through `update_user_atomic` and never touches
/// `refresh_tokens`: writing back a full pre-loaded document would revert
/// a token rotation that landed in between, resurrecting a consumed
/// refresh token.
async fn update_user(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(body): Json<UpdateUserRequest>,
) -> Result<Json<PublicUser>> {
    let user = authorize_owner(state.db.get_user(&id).await?, &auth.user_id, "User")?;

    // Dog IDs are generated up front; the closure itself stays infallible.
    let dogs = match body.dogs {
        Some(dogs) => {
            let mut replacement = Vec::with_capacity(dogs.len());
            for dog in dogs {
                let id = match dog.id {
                    Some(id) => id,
                    None => random_hex(16)?,
                };
                replacement.push(Dog {
                    id,
                    name: dog.name,
                    birth_year: dog.birth_year,
                    birth_month: dog.birth_month,
                    breed: dog.breed,
                    image: Some(dog.image.unwrap_or_else(|| DEFAULT_DOG_IMAGE.to_string())),
                });
            }
            Some(replacement)
        }
        None => None,
    };

    let updated = state
        .db
        .update_user_atomic(&user.id, move |u| {
            if let Some(name) = body.name {
                u.name = name;
            }
            if let Some(city) = body.city {
                u.city = Some(city);
            }
            if let Some(gender) = body.gender {
                u.gender = Some(gender);
            }
            if let Some(profile_image) = body.profile_image {
                u.profile_image = profile_image;
            }
            if let Some(dogs) = dogs {
                u.dogs = dogs;
            }
            u.clone()
        })
        .await?
        .ok_or_else(|| AppError::NotFound("User".to_string()))?;

    Ok(Json(updated.to_public()))
}

#[derive(Serialize)]
struct DeleteUserResponse {
    message: String,
}

/// Permanently delete a user and everything they own. No soft delete:
/// refresh tokens for the identity fail lookup afterwards.
async fn delete_user(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<DeleteUserResponse>> {
    let user = authorize_owner(state.db.get_user(&id).await?, &auth.user_id, "User")?;

    let deleted = state.db.delete_user_data(&user).await?;
    tracing::info!(user_id = %user.id, deleted, "Account deleted");

    Ok(Json(DeleteUserResponse {
        message: "User deleted successfully".to_string(),
    }))
}
