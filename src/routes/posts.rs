// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Post routes (authenticated), the exercised instance of the ownership
//! guard: reads are unrestricted, mutations require the recorded owner.

use crate::authz::authorize_owner;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::Post;
use crate::services::auth::random_hex;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/posts", get(list_posts).post(create_post))
        .route(
            "/api/posts/{id}",
            get(get_post).put(update_post).delete(delete_post),
        )
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PostResponse {
    id: String,
    owner: String,
    title: String,
    content: String,
    image: Option<String>,
    created_at: String,
}

impl From<Post> for PostResponse {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            owner: post.owner,
            title: post.title,
            content: post.content,
            image: post.image,
            created_at: post.created_at,
        }
    }
}

#[derive(Deserialize)]
struct CreatePostRequest {
    title: Option<String>,
    content: Option<String>,
    image: Option<String>,
}

/// Create a post owned by the authenticated user.
async fn create_post(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<PostResponse>)> {
    let (Some(title), Some(content)) = (body.title, body.content) else {
        return Err(AppError::Validation(
            "Title and content are required.".to_string(),
        ));
    };

    let post = Post {
        id: random_hex(16)?,
        owner: auth.user_id,
        title,
        content,
        image: body.image,
        created_at: chrono::Utc::now().to_rfc3339(),
    };

    state.db.upsert_post(&post).await?;

    Ok((StatusCode::CREATED, Json(post.into())))
}

#[derive(Deserialize)]
struct ListPostsQuery {
    /// Filter by owner (user ID)
    owner: Option<String>,
}

/// List posts, newest first.
async fn list_posts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListPostsQuery>,
) -> Result<Json<Vec<PostResponse>>> {
    let posts = state.db.list_posts(query.owner.as_deref()).await?;
    Ok(Json(posts.into_iter().map(PostResponse::from).collect()))
}

/// Get a post by ID (reads are unrestricted).
async fn get_post(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<PostResponse>> {
    let post = state
        .db
        .get_post(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("Post".to_string()))?;

    Ok(Json(post.into()))
}

#[derive(Deserialize)]
struct UpdatePostRequest {
    title: Option<String>,
    content: Option<String>,
    image: Option<String>,
}

/// Update a post. Only the recorded owner may mutate it.
async fn update_post(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(body): Json<UpdatePostRequest>,
) -> Result<Json<PostResponse>> {
    let mut post = authorize_owner(state.db.get_post(&id).await?, &auth.user_id, "Post")?;

    if let Some(title) = body.title {
        post.title = title;
    }
    if let Some(content) = body.content {
        post.content = content;
    }
    if let Some(image) = body.image {
        post.image = Some(image);
    }

    state.db.upsert_post(&post).await?;

    Ok(Json(post.into()))
}

#[derive(Serialize)]
struct DeletePostResponse {
    message: String,
}

/// Delete a post. Only the recorded owner may delete it.
async fn delete_post(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<DeletePostResponse>> {
    let post = authorize_owner(state.db.get_post(&id).await?, &auth.user_id, "Post")?;

    state.db.delete_post(&post.id).await?;

    Ok(Json(DeletePostResponse {
        message: "Post deleted successfully".to_string(),
    }))
}
