// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Document store with typed operations.
//!
//! Provides high-level operations for:
//! - Users (credential records, including the refresh-token set)
//! - The email uniqueness index
//! - Posts (ownable resources)
//!
//! Two backends: Firestore for deployment, and an in-memory store for local
//! development and tests. Both expose the same atomicity guarantee for user
//! mutations: `update_user_atomic` runs its closure as a single
//! read-modify-write against the user document, so concurrent refresh-token
//! rotations on the same user cannot interleave.

use crate::db::collections;
use crate::error::AppError;
use crate::models::{Post, User};
use dashmap::DashMap;
use futures_util::{stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const MAX_CONCURRENT_DB_OPS: usize = 50;

/// Email index document: maps an email address to the owning user ID.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct EmailIndex {
    user_id: String,
}

/// Document database client.
#[derive(Clone)]
pub struct DocumentDb {
    backend: Backend,
}

#[derive(Clone)]
enum Backend {
    Firestore(firestore::FirestoreDb),
    Memory(MemoryStore),
}

#[derive(Clone, Default)]
struct MemoryStore {
    users: Arc<DashMap<String, User>>,
    emails: Arc<DashMap<String, String>>,
    posts: Arc<DashMap<String, Post>>,
}

impl DocumentDb {
    /// Connect to the configured backend.
    ///
    /// An empty project ID selects the in-memory store (local development).
    /// With FIRESTORE_EMULATOR_HOST set, connects to the emulator without
    /// real credentials.
    pub async fn connect(project_id: &str) -> Result<Self, AppError> {
        if project_id.is_empty() {
            tracing::warn!("GCP_PROJECT_ID not set, using in-memory store");
            return Ok(Self::in_memory());
        }

        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            backend: Backend::Firestore(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(project = project_id, "Connected to Firestore (Emulator)");

        Ok(Self {
            backend: Backend::Firestore(client),
        })
    }

    /// Create an in-memory store (offline mode / tests).
    pub fn in_memory() -> Self {
        Self {
            backend: Backend::Memory(MemoryStore::default()),
        }
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Get a user by ID.
    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        match &self.backend {
            Backend::Memory(m) => Ok(m.users.get(user_id).map(|u| u.clone())),
            Backend::Firestore(db) => db
                .fluent()
                .select()
                .by_id_in(collections::USERS)
                .obj()
                .one(user_id)
                .await
                .map_err(|e| AppError::Database(e.to_string())),
        }
    }

    /// Look up a user by email via the email index.
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        match &self.backend {
            Backend::Memory(m) => {
                let Some(user_id) = m.emails.get(email).map(|id| id.clone()) else {
                    return Ok(None);
                };
                Ok(m.users.get(&user_id).map(|u| u.clone()))
            }
            Backend::Firestore(db) => {
                let index: Option<EmailIndex> = db
                    .fluent()
                    .select()
                    .by_id_in(collections::USER_EMAILS)
                    .obj()
                    .one(email)
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;

                match index {
                    Some(index) => self.get_user(&index.user_id).await,
                    None => Ok(None),
                }
            }
        }
    }

    /// Create a new user, claiming the email atomically.
    ///
    /// The email index document is written with a create-only insert; the
    /// store's conflict signal becomes `DuplicateEmail`. There is no
    /// check-then-act window.
    pub async fn create_user(&self, user: &User) -> Result<(), AppError> {
        match &self.backend {
            Backend::Memory(m) => {
                use dashmap::mapref::entry::Entry;
                match m.emails.entry(user.email.clone()) {
                    Entry::Occupied(_) => return Err(AppError::DuplicateEmail),
                    Entry::Vacant(slot) => {
                        slot.insert(user.id.clone());
                    }
                }
                m.users.insert(user.id.clone(), user.clone());
                Ok(())
            }
            Backend::Firestore(db) => {
                let index = EmailIndex {
                    user_id: user.id.clone(),
                };

                let insert_result: Result<(), firestore::errors::FirestoreError> = db
                    .fluent()
                    .insert()
                    .into(collections::USER_EMAILS)
                    .document_id(&user.email)
                    .object(&index)
                    .execute()
                    .await;

                if let Err(e) = insert_result {
                    return Err(match e {
                        firestore::errors::FirestoreError::DataConflictError(_) => {
                            AppError::DuplicateEmail
                        }
                        other => AppError::Database(other.to_string()),
                    });
                }

                let _: () = db
                    .fluent()
                    .update()
                    .in_col(collections::USERS)
                    .document_id(&user.id)
                    .object(user)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                Ok(())
            }
        }
    }

    /// Run a closure as an atomic read-modify-write on a user document.
    ///
    /// Returns `None` if the user does not exist. Refresh-token set
    /// mutations go through here so that of two concurrent rotations with
    /// the same token, at most one can observe the token still present.
    pub async fn update_user_atomic<R, F>(
        &self,
        user_id: &str,
        f: F,
    ) -> Result<Option<R>, AppError>
    where
        F: FnOnce(&mut User) -> R + Send,
        R: Send,
    {
        match &self.backend {
            Backend::Memory(m) => {
                // The dashmap entry lock serializes mutations per user.
                Ok(m.users.get_mut(user_id).map(|mut user| f(&mut user)))
            }
            Backend::Firestore(db) => {
                let mut transaction = db.begin_transaction().await.map_err(|e| {
                    AppError::Database(format!("Failed to begin transaction: {}", e))
                })?;

                let user: Option<User> = db
                    .fluent()
                    .select()
                    .by_id_in(collections::USERS)
                    .obj()
                    .one(user_id)
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;

                let Some(mut user) = user else {
                    let _ = transaction.rollback().await;
                    return Ok(None);
                };

                let result = f(&mut user);

                db.fluent()
                    .update()
                    .in_col(collections::USERS)
                    .document_id(user_id)
                    .object(&user)
                    .add_to_transaction(&mut transaction)
                    .map_err(|e| {
                        AppError::Database(format!("Failed to add user to transaction: {}", e))
                    })?;

                transaction
                    .commit()
                    .await
                    .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

                Ok(Some(result))
            }
        }
    }

    /// Permanently delete a user and everything they own.
    ///
    /// Removes the user's posts (bounded-concurrency deletes), the email
    /// index entry, and the user document. Returns the number of documents
    /// deleted. Any refresh token referencing the identity fails lookup
    /// afterwards.
    pub async fn delete_user_data(&self, user: &User) -> Result<usize, AppError> {
        match &self.backend {
            Backend::Memory(m) => {
                let before = m.posts.len();
                m.posts.retain(|_, post| post.owner != user.id);
                let mut deleted = before - m.posts.len();

                m.emails.remove(&user.email);
                m.users.remove(&user.id);
                deleted += 2;

                tracing::info!(user_id = %user.id, deleted, "User data deletion complete");
                Ok(deleted)
            }
            Backend::Firestore(db) => {
                let posts = self.list_posts(Some(&user.id)).await?;
                let count = posts.len();

                stream::iter(posts)
                    .map(|post| async move {
                        db.fluent()
                            .delete()
                            .from(collections::POSTS)
                            .document_id(&post.id)
                            .execute()
                            .await
                            .map_err(|e| AppError::Database(e.to_string()))
                    })
                    .buffer_unordered(MAX_CONCURRENT_DB_OPS)
                    .collect::<Vec<Result<(), AppError>>>()
                    .await
                    .into_iter()
                    .collect::<Result<Vec<()>, AppError>>()?;

                db.fluent()
                    .delete()
                    .from(collections::USER_EMAILS)
                    .document_id(&user.email)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;

                db.fluent()
                    .delete()
                    .from(collections::USERS)
                    .document_id(&user.id)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;

                tracing::info!(user_id = %user.id, deleted = count + 2, "User data deletion complete");
                Ok(count + 2)
            }
        }
    }

    // ─── Post Operations ─────────────────────────────────────────

    /// Get a post by ID.
    pub async fn get_post(&self, post_id: &str) -> Result<Option<Post>, AppError> {
        match &self.backend {
            Backend::Memory(m) => Ok(m.posts.get(post_id).map(|p| p.clone())),
            Backend::Firestore(db) => db
                .fluent()
                .select()
                .by_id_in(collections::POSTS)
                .obj()
                .one(post_id)
                .await
                .map_err(|e| AppError::Database(e.to_string())),
        }
    }

    /// List posts, newest first, optionally filtered by owner.
    pub async fn list_posts(&self, owner: Option<&str>) -> Result<Vec<Post>, AppError> {
        match &self.backend {
            Backend::Memory(m) => {
                let mut posts: Vec<Post> = m
                    .posts
                    .iter()
                    .filter(|entry| owner.is_none_or(|o| entry.owner == o))
                    .map(|entry| entry.clone())
                    .collect();
                posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
                Ok(posts)
            }
            Backend::Firestore(db) => {
                let query = db.fluent().select().from(collections::POSTS);

                let query = if let Some(owner) = owner {
                    let owner = owner.to_string();
                    query.filter(move |q| q.field("owner").eq(owner.clone()))
                } else {
                    query
                };

                query
                    .order_by([("created_at", firestore::FirestoreQueryDirection::Descending)])
                    .obj()
                    .query()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))
            }
        }
    }

    /// Create or overwrite a post.
    pub async fn upsert_post(&self, post: &Post) -> Result<(), AppError> {
        match &self.backend {
            Backend::Memory(m) => {
                m.posts.insert(post.id.clone(), post.clone());
                Ok(())
            }
            Backend::Firestore(db) => {
                let _: () = db
                    .fluent()
                    .update()
                    .in_col(collections::POSTS)
                    .document_id(&post.id)
                    .object(post)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                Ok(())
            }
        }
    }

    /// Delete a post by ID.
    pub async fn delete_post(&self, post_id: &str) -> Result<(), AppError> {
        match &self.backend {
            Backend::Memory(m) => {
                m.posts.remove(post_id);
                Ok(())
            }
            Backend::Firestore(db) => {
                db.fluent()
                    .delete()
                    .from(collections::POSTS)
                    .document_id(post_id)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::DEFAULT_USER_IMAGE;

    fn user(id: &str, email: &str) -> User {
        User {
            id: id.to_string(),
            name: "Test".to_string(),
            email: email.to_string(),
            password_hash: None,
            profile_image: DEFAULT_USER_IMAGE.to_string(),
            city: None,
            gender: None,
            dogs: vec![],
            refresh_tokens: vec![],
            is_google_user: false,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let db = DocumentDb::in_memory();
        db.create_user(&user("u1", "a@x.com")).await.unwrap();

        let err = db.create_user(&user("u2", "a@x.com")).await.unwrap_err();
        assert!(matches!(err, AppError::DuplicateEmail));

        // The losing record must not shadow the winner.
        let found = db.find_user_by_email("a@x.com").await.unwrap().unwrap();
        assert_eq!(found.id, "u1");
    }

    #[tokio::test]
    async fn atomic_update_missing_user_is_none() {
        let db = DocumentDb::in_memory();
        let result = db
            .update_user_atomic("ghost", |u| u.refresh_tokens.clear())
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn delete_user_data_removes_posts_and_email() {
        let db = DocumentDb::in_memory();
        let u = user("u1", "a@x.com");
        db.create_user(&u).await.unwrap();
        db.upsert_post(&Post {
            id: "p1".to_string(),
            owner: "u1".to_string(),
            title: "t".to_string(),
            content: "c".to_string(),
            image: None,
            created_at: chrono::Utc::now().to_rfc3339(),
        })
        .await
        .unwrap();

        db.delete_user_data(&u).await.unwrap();

        assert!(db.get_user("u1").await.unwrap().is_none());
        assert!(db.find_user_by_email("a@x.com").await.unwrap().is_none());
        assert!(db.get_post("p1").await.unwrap().is_none());
    }
}
