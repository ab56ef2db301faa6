//! Common type definitions shared by the auth core, storage and handlers.
//!
//! # ID Types
//!
//! Users and posts are identified by unsigned 64-bit integers. PostgreSQL has no
//! unsigned integer type, so the repositories convert at the storage boundary
//! (see [`crate::db::handlers`]).
//!
//! # Ownership vocabulary
//!
//! - [`ResourceKind`]: which kind of record an ownership check is about
//! - [`Operation`]: what the caller is trying to do, used in denial messages

use serde::{Deserialize, Serialize};
use std::fmt;

// Type aliases for IDs
pub type UserId = u64;
pub type PostId = u64;

/// Kinds of records that carry an owner reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Owned by its author
    Post,
    /// Owned by itself
    User,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Post => write!(f, "post"),
            ResourceKind::User => write!(f, "user"),
        }
    }
}

// Mutations gated by the ownership policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Update,
    Delete,
    ChangePassword,
    Follow,
    Unfollow,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Update => write!(f, "update"),
            Operation::Delete => write!(f, "delete"),
            Operation::ChangePassword => write!(f, "change the password of"),
            Operation::Follow => write!(f, "follow"),
            Operation::Unfollow => write!(f, "unfollow"),
        }
    }
}
