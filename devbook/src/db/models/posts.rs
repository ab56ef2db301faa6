//! Database models for posts.

use crate::api::models::posts::{PostCreate, PostUpdate};
use crate::types::{PostId, UserId};
use chrono::{DateTime, Utc};

/// Database request for creating a new post
#[derive(Debug, Clone)]
pub struct PostCreateDBRequest {
    pub title: String,
    pub content: String,
    pub author_id: UserId,
}

impl PostCreateDBRequest {
    pub fn new(author_id: UserId, create: PostCreate) -> Self {
        Self {
            title: create.title,
            content: create.content,
            author_id,
        }
    }
}

/// Database request for updating a post
#[derive(Debug, Clone)]
pub struct PostUpdateDBRequest {
    pub title: String,
    pub content: String,
}

impl From<PostUpdate> for PostUpdateDBRequest {
    fn from(update: PostUpdate) -> Self {
        Self {
            title: update.title,
            content: update.content,
        }
    }
}

/// Database response for a post, joined with its author's nick
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostDBResponse {
    pub id: PostId,
    pub title: String,
    pub content: String,
    pub author_id: UserId,
    pub author_nick: String,
    pub likes: u64,
    pub created_at: DateTime<Utc>,
}
