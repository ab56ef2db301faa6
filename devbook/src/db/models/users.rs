//! Database models for users.

use crate::api::models::users::{UserCreate, UserUpdate};
use crate::types::UserId;
use chrono::{DateTime, Utc};

/// Database request for creating a new user
#[derive(Debug, Clone)]
pub struct UserCreateDBRequest {
    pub name: String,
    pub nick: String,
    pub email: String,
    pub password_hash: String,
}

impl UserCreateDBRequest {
    /// Builds the insert request from an already-validated API payload.
    pub fn new(create: UserCreate, password_hash: String) -> Self {
        Self {
            name: create.name,
            nick: create.nick,
            email: create.email,
            password_hash,
        }
    }
}

/// Database request for updating a user
#[derive(Debug, Clone)]
pub struct UserUpdateDBRequest {
    pub name: String,
    pub nick: String,
    pub email: String,
}

impl From<UserUpdate> for UserUpdateDBRequest {
    fn from(update: UserUpdate) -> Self {
        Self {
            name: update.name,
            nick: update.nick,
            email: update.email,
        }
    }
}

/// Database response for a user. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDBResponse {
    pub id: UserId,
    pub name: String,
    pub nick: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// The pieces of a user record needed to check a login attempt
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub id: UserId,
    pub password_hash: String,
}
