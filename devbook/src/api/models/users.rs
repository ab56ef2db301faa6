//! API request/response models for users.

use crate::db::models::users::UserDBResponse;
use crate::errors::Error;
use crate::types::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The authenticated caller of a request, set by the authentication gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: UserId,
}

// User request models
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserCreate {
    pub name: String,
    pub nick: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserUpdate {
    pub name: String,
    pub nick: String,
    pub email: String,
}

// User response models
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: UserId,
    pub name: String,
    pub nick: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<UserDBResponse> for UserResponse {
    fn from(db: UserDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            nick: db.nick,
            email: db.email,
            created_at: db.created_at,
        }
    }
}

/// Query parameters for listing users
#[derive(Debug, Default, Deserialize)]
pub struct ListUsersQuery {
    /// Matched against name and nick
    pub user: Option<String>,
}

/// Profile fields shared by registration and updates, trimmed and checked.
fn normalize_profile(name: &str, nick: &str, email: &str) -> Result<(String, String, String), Error> {
    let (name, nick, email) = (name.trim(), nick.trim(), email.trim());

    for (field, value) in [("name", name), ("nick", nick), ("email", email)] {
        if value.is_empty() {
            return Err(Error::BadRequest {
                message: format!("The {field} field is required"),
            });
        }
    }

    if !is_valid_email(email) {
        return Err(Error::BadRequest {
            message: "The email address is not valid".to_string(),
        });
    }

    Ok((name.to_string(), nick.to_string(), email.to_string()))
}

/// Accepts `local@domain.tld` with no whitespace and no empty domain labels.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') || email.chars().any(char::is_whitespace) {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2 && labels.iter().all(|label| !label.is_empty())
}

impl UserCreate {
    /// Trims the profile fields and checks they are present and well formed.
    /// The password is checked separately against the configured bounds.
    pub fn normalize(self) -> Result<Self, Error> {
        let (name, nick, email) = normalize_profile(&self.name, &self.nick, &self.email)?;
        Ok(Self {
            name,
            nick,
            email,
            password: self.password,
        })
    }
}

impl UserUpdate {
    pub fn normalize(self) -> Result<Self, Error> {
        let (name, nick, email) = normalize_profile(&self.name, &self.nick, &self.email)?;
        Ok(Self { name, nick, email })
    }
}
