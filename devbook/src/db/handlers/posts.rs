//! Database repository for posts.

use crate::db::{
    errors::{DbError, Result},
    handlers::{from_db_id, repository::Repository, to_db_id},
    models::posts::{PostCreateDBRequest, PostDBResponse, PostUpdateDBRequest},
};
use crate::types::{PostId, UserId};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection};
use tracing::instrument;

/// Filter for listing posts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostFilter {
    /// The user's own posts plus those of everyone they follow
    Feed(UserId),
    /// Posts written by one author
    Author(UserId),
}

// Database entity model, joined with the author's nick
#[derive(Debug, Clone, FromRow)]
struct Post {
    id: i64,
    title: String,
    content: String,
    author_id: i64,
    author_nick: String,
    likes: i64,
    created_at: DateTime<Utc>,
}

impl TryFrom<Post> for PostDBResponse {
    type Error = DbError;

    fn try_from(post: Post) -> Result<Self> {
        Ok(Self {
            id: from_db_id(post.id)?,
            title: post.title,
            content: post.content,
            author_id: from_db_id(post.author_id)?,
            author_nick: post.author_nick,
            likes: u64::try_from(post.likes).map_err(|_| DbError::Other(anyhow::anyhow!("negative like count on post {}", post.id)))?,
            created_at: post.created_at,
        })
    }
}

const SELECT_POSTS: &str = r#"
    SELECT p.id, p.title, p.content, p.author_id, u.nick AS author_nick, p.likes, p.created_at
    FROM posts p
    JOIN users u ON u.id = p.author_id
"#;

pub struct Posts<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Posts<'c> {
    type CreateRequest = PostCreateDBRequest;
    type UpdateRequest = PostUpdateDBRequest;
    type Response = PostDBResponse;
    type Id = PostId;
    type Filter = PostFilter;

    #[instrument(skip(self, request), fields(author_id = request.author_id), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            WITH inserted AS (
                INSERT INTO posts (title, content, author_id)
                VALUES ($1, $2, $3)
                RETURNING id, title, content, author_id, likes, created_at
            )
            SELECT i.id, i.title, i.content, i.author_id, u.nick AS author_nick, i.likes, i.created_at
            FROM inserted i
            JOIN users u ON u.id = i.author_id
            "#,
        )
        .bind(&request.title)
        .bind(&request.content)
        .bind(to_db_id(request.author_id)?)
        .fetch_one(&mut *self.db)
        .await?;

        post.try_into()
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let post = sqlx::query_as::<_, Post>(&format!("{SELECT_POSTS} WHERE p.id = $1"))
            .bind(to_db_id(id)?)
            .fetch_optional(&mut *self.db)
            .await?;

        post.map(PostDBResponse::try_from).transpose()
    }

    #[instrument(skip(self), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let (condition, user_id) = match *filter {
            PostFilter::Feed(user_id) => (
                "p.author_id = $1 OR p.author_id IN (SELECT user_id FROM followers WHERE follower_id = $1)",
                user_id,
            ),
            PostFilter::Author(user_id) => ("p.author_id = $1", user_id),
        };

        let posts = sqlx::query_as::<_, Post>(&format!(
            "{SELECT_POSTS} WHERE {condition} ORDER BY p.created_at DESC, p.id DESC"
        ))
        .bind(to_db_id(user_id)?)
        .fetch_all(&mut *self.db)
        .await?;

        posts.into_iter().map(PostDBResponse::try_from).collect()
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(to_db_id(id)?)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            WITH updated AS (
                UPDATE posts SET title = $2, content = $3
                WHERE id = $1
                RETURNING id, title, content, author_id, likes, created_at
            )
            SELECT d.id, d.title, d.content, d.author_id, u.nick AS author_nick, d.likes, d.created_at
            FROM updated d
            JOIN users u ON u.id = d.author_id
            "#,
        )
        .bind(to_db_id(id)?)
        .bind(&request.title)
        .bind(&request.content)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        post.try_into()
    }
}

impl<'c> Posts<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Returns the author of a post, the owner reference for ownership checks.
    #[instrument(skip(self), err)]
    pub async fn get_author(&mut self, id: PostId) -> Result<Option<UserId>> {
        let author = sqlx::query_scalar::<_, i64>("SELECT author_id FROM posts WHERE id = $1")
            .bind(to_db_id(id)?)
            .fetch_optional(&mut *self.db)
            .await?;

        author.map(from_db_id).transpose()
    }

    #[instrument(skip(self), err)]
    pub async fn like(&mut self, id: PostId) -> Result<bool> {
        let result = sqlx::query("UPDATE posts SET likes = likes + 1 WHERE id = $1")
            .bind(to_db_id(id)?)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Decrements the like counter, never below zero.
    #[instrument(skip(self), err)]
    pub async fn unlike(&mut self, id: PostId) -> Result<bool> {
        let result = sqlx::query("UPDATE posts SET likes = GREATEST(likes - 1, 0) WHERE id = $1")
            .bind(to_db_id(id)?)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
