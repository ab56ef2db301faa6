//! API request/response models for posts.

use crate::db::models::posts::PostDBResponse;
use crate::errors::Error;
use crate::types::{PostId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostCreate {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostUpdate {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostResponse {
    pub id: PostId,
    pub title: String,
    pub content: String,
    pub author_id: UserId,
    pub author_nick: String,
    pub likes: u64,
    pub created_at: DateTime<Utc>,
}

impl From<PostDBResponse> for PostResponse {
    fn from(db: PostDBResponse) -> Self {
        Self {
            id: db.id,
            title: db.title,
            content: db.content,
            author_id: db.author_id,
            author_nick: db.author_nick,
            likes: db.likes,
            created_at: db.created_at,
        }
    }
}

fn normalize_body(title: &str, content: &str) -> Result<(String, String), Error> {
    let (title, content) = (title.trim(), content.trim());
    if title.is_empty() {
        return Err(Error::BadRequest {
            message: "The title field is required".to_string(),
        });
    }
    if content.is_empty() {
        return Err(Error::BadRequest {
            message: "The content field is required".to_string(),
        });
    }
    Ok((title.to_string(), content.to_string()))
}

impl PostCreate {
    pub fn normalize(self) -> Result<Self, Error> {
        let (title, content) = normalize_body(&self.title, &self.content)?;
        Ok(Self { title, content })
    }
}

impl PostUpdate {
    pub fn normalize(self) -> Result<Self, Error> {
        let (title, content) = normalize_body(&self.title, &self.content)?;
        Ok(Self { title, content })
    }
}
