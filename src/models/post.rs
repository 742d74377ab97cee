// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Post model: the representative ownable resource.

use crate::authz::Owned;
use serde::{Deserialize, Serialize};

/// A post stored in the posts collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    /// Document ID
    pub id: String,
    /// Credential record ID of the author. Only this identity may mutate
    /// or delete the post; reads are unrestricted.
    pub owner: String,
    pub title: String,
    pub content: String,
    pub image: Option<String>,
    /// When the post was created (RFC 3339)
    pub created_at: String,
}

impl Owned for Post {
    fn owner_id(&self) -> &str {
        &self.owner
    }
}
