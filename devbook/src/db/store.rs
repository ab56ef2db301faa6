//! The storage contract used by handlers and the auth core.
//!
//! [`Storage`] is the seam between request handling and persistence. The
//! production implementation, [`PgStorage`], acquires a pooled connection per
//! call and delegates to the repositories in [`crate::db::handlers`]. Tests
//! use [`crate::db::memory::MemoryStorage`].

use crate::db::{
    errors::{DbError, Result},
    handlers::{Followers, Posts, Repository, Users, posts::PostFilter, users::UserFilter},
    models::{
        posts::{PostCreateDBRequest, PostDBResponse, PostUpdateDBRequest},
        users::{UserCreateDBRequest, UserCredentials, UserDBResponse, UserUpdateDBRequest},
    },
};
use crate::types::{PostId, ResourceKind, UserId};
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

#[async_trait]
pub trait Storage: Send + Sync {
    async fn create_user(&self, request: &UserCreateDBRequest) -> Result<UserDBResponse>;

    async fn get_user(&self, id: UserId) -> Result<UserDBResponse>;

    async fn search_users(&self, filter: &UserFilter) -> Result<Vec<UserDBResponse>>;

    async fn update_user(&self, id: UserId, request: &UserUpdateDBRequest) -> Result<UserDBResponse>;

    async fn delete_user(&self, id: UserId) -> Result<()>;

    /// Returns `None` for an unknown email.
    async fn find_credentials_by_email(&self, email: &str) -> Result<Option<UserCredentials>>;

    async fn fetch_password_hash(&self, id: UserId) -> Result<String>;

    async fn store_password_hash(&self, id: UserId, password_hash: &str) -> Result<()>;

    /// `follower_id` starts following `user_id`. Idempotent.
    async fn follow(&self, user_id: UserId, follower_id: UserId) -> Result<()>;

    async fn unfollow(&self, user_id: UserId, follower_id: UserId) -> Result<()>;

    async fn followers(&self, user_id: UserId) -> Result<Vec<UserDBResponse>>;

    async fn following(&self, follower_id: UserId) -> Result<Vec<UserDBResponse>>;

    async fn create_post(&self, request: &PostCreateDBRequest) -> Result<PostDBResponse>;

    async fn get_post(&self, id: PostId) -> Result<PostDBResponse>;

    /// Newest first.
    async fn list_posts(&self, filter: &PostFilter) -> Result<Vec<PostDBResponse>>;

    async fn update_post(&self, id: PostId, request: &PostUpdateDBRequest) -> Result<PostDBResponse>;

    async fn delete_post(&self, id: PostId) -> Result<()>;

    async fn like_post(&self, id: PostId) -> Result<()>;

    async fn unlike_post(&self, id: PostId) -> Result<()>;

    /// Loads the owner reference of a record: the author of a post, or the user itself.
    async fn fetch_owner_of(&self, kind: ResourceKind, id: u64) -> Result<UserId>;
}

/// PostgreSQL-backed storage
#[derive(Debug, Clone)]
pub struct PgStorage {
    pool: PgPool,
}

impl PgStorage {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn found(affected: bool) -> Result<()> {
    if affected { Ok(()) } else { Err(DbError::NotFound) }
}

#[async_trait]
impl Storage for PgStorage {
    async fn create_user(&self, request: &UserCreateDBRequest) -> Result<UserDBResponse> {
        let mut conn = self.pool.acquire().await?;
        Users::new(&mut conn).create(request).await
    }

    async fn get_user(&self, id: UserId) -> Result<UserDBResponse> {
        let mut conn = self.pool.acquire().await?;
        Users::new(&mut conn).get_by_id(id).await?.ok_or(DbError::NotFound)
    }

    async fn search_users(&self, filter: &UserFilter) -> Result<Vec<UserDBResponse>> {
        let mut conn = self.pool.acquire().await?;
        Users::new(&mut conn).list(filter).await
    }

    async fn update_user(&self, id: UserId, request: &UserUpdateDBRequest) -> Result<UserDBResponse> {
        let mut conn = self.pool.acquire().await?;
        Users::new(&mut conn).update(id, request).await
    }

    async fn delete_user(&self, id: UserId) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        found(Users::new(&mut conn).delete(id).await?)
    }

    async fn find_credentials_by_email(&self, email: &str) -> Result<Option<UserCredentials>> {
        let mut conn = self.pool.acquire().await?;
        Users::new(&mut conn).get_credentials_by_email(email).await
    }

    async fn fetch_password_hash(&self, id: UserId) -> Result<String> {
        let mut conn = self.pool.acquire().await?;
        Users::new(&mut conn).get_password_hash(id).await?.ok_or(DbError::NotFound)
    }

    #[instrument(skip(self, password_hash), err)]
    async fn store_password_hash(&self, id: UserId, password_hash: &str) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        found(Users::new(&mut conn).set_password_hash(id, password_hash).await?)
    }

    async fn follow(&self, user_id: UserId, follower_id: UserId) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        Followers::new(&mut conn).follow(user_id, follower_id).await
    }

    async fn unfollow(&self, user_id: UserId, follower_id: UserId) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        Followers::new(&mut conn).unfollow(user_id, follower_id).await
    }

    async fn followers(&self, user_id: UserId) -> Result<Vec<UserDBResponse>> {
        let mut conn = self.pool.acquire().await?;
        Followers::new(&mut conn).followers_of(user_id).await
    }

    async fn following(&self, follower_id: UserId) -> Result<Vec<UserDBResponse>> {
        let mut conn = self.pool.acquire().await?;
        Followers::new(&mut conn).followed_by(follower_id).await
    }

    async fn create_post(&self, request: &PostCreateDBRequest) -> Result<PostDBResponse> {
        let mut conn = self.pool.acquire().await?;
        Posts::new(&mut conn).create(request).await
    }

    async fn get_post(&self, id: PostId) -> Result<PostDBResponse> {
        let mut conn = self.pool.acquire().await?;
        Posts::new(&mut conn).get_by_id(id).await?.ok_or(DbError::NotFound)
    }

    async fn list_posts(&self, filter: &PostFilter) -> Result<Vec<PostDBResponse>> {
        let mut conn = self.pool.acquire().await?;
        Posts::new(&mut conn).list(filter).await
    }

    async fn update_post(&self, id: PostId, request: &PostUpdateDBRequest) -> Result<PostDBResponse> {
        let mut conn = self.pool.acquire().await?;
        Posts::new(&mut conn).update(id, request).await
    }

    async fn delete_post(&self, id: PostId) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        found(Posts::new(&mut conn).delete(id).await?)
    }

    async fn like_post(&self, id: PostId) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        found(Posts::new(&mut conn).like(id).await?)
    }

    async fn unlike_post(&self, id: PostId) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        found(Posts::new(&mut conn).unlike(id).await?)
    }

    #[instrument(skip(self), err)]
    async fn fetch_owner_of(&self, kind: ResourceKind, id: u64) -> Result<UserId> {
        let mut conn = self.pool.acquire().await?;
        match kind {
            ResourceKind::Post => Posts::new(&mut conn).get_author(id).await?.ok_or(DbError::NotFound),
            ResourceKind::User => {
                if Users::new(&mut conn).exists(id).await? {
                    Ok(id)
                } else {
                    Err(DbError::NotFound)
                }
            }
        }
    }
}
