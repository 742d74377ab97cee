// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Ownership authorization guard.
//!
//! One generic check applied inside every mutating operation on an ownable
//! resource, instead of a copy per resource type.

use crate::error::{AppError, Result};

/// A persisted record carrying an owner reference.
pub trait Owned {
    /// The credential record ID of the resource's owner.
    fn owner_id(&self) -> &str;
}

/// Authorize a mutation of `resource` by `user_id`.
///
/// Existence is checked before ownership: a nonexistent resource yields
/// `NotFound` regardless of who asks, so error kinds never leak whether
/// someone else owns an ID.
pub fn authorize_owner<T: Owned>(resource: Option<T>, user_id: &str, kind: &str) -> Result<T> {
    let resource = resource.ok_or_else(|| AppError::NotFound(kind.to_string()))?;
    if resource.owner_id() != user_id {
        return Err(AppError::Unauthorized);
    }
    Ok(resource)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Item {
        owner: String,
    }

    impl Owned for Item {
        fn owner_id(&self) -> &str {
            &self.owner
        }
    }

    #[test]
    fn owner_is_authorized() {
        let item = Item {
            owner: "alice".into(),
        };
        assert!(authorize_owner(Some(item), "alice", "Item").is_ok());
    }

    #[test]
    fn non_owner_is_rejected() {
        let item = Item {
            owner: "alice".into(),
        };
        assert!(matches!(
            authorize_owner(Some(item), "bob", "Item"),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn missing_resource_is_not_found_before_ownership() {
        // Same answer for owner and stranger alike.
        for caller in ["alice", "bob"] {
            assert!(matches!(
                authorize_owner::<Item>(None, caller, "Item"),
                Err(AppError::NotFound(_))
            ));
        }
    }
}
