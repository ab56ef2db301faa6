//! Database repository for the follow graph.
//!
//! An edge `(user_id, follower_id)` means `follower_id` follows `user_id`.
//! The primary key makes edges unique and a check constraint forbids
//! self-edges.

use crate::db::{
    errors::{DbError, Result},
    handlers::{from_db_id, to_db_id},
    models::users::UserDBResponse,
};
use crate::types::UserId;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection};
use tracing::instrument;

#[derive(Debug, FromRow)]
struct FollowUser {
    id: i64,
    name: String,
    nick: String,
    email: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<FollowUser> for UserDBResponse {
    type Error = DbError;

    fn try_from(user: FollowUser) -> Result<Self> {
        Ok(Self {
            id: from_db_id(user.id)?,
            name: user.name,
            nick: user.nick,
            email: user.email,
            created_at: user.created_at,
        })
    }
}

pub struct Followers<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Followers<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Records that `follower_id` follows `user_id`. Following twice is a no-op.
    #[instrument(skip(self), err)]
    pub async fn follow(&mut self, user_id: UserId, follower_id: UserId) -> Result<()> {
        sqlx::query("INSERT INTO followers (user_id, follower_id) VALUES ($1, $2) ON CONFLICT DO NOTHING")
            .bind(to_db_id(user_id)?)
            .bind(to_db_id(follower_id)?)
            .execute(&mut *self.db)
            .await?;

        Ok(())
    }

    #[instrument(skip(self), err)]
    pub async fn unfollow(&mut self, user_id: UserId, follower_id: UserId) -> Result<()> {
        sqlx::query("DELETE FROM followers WHERE user_id = $1 AND follower_id = $2")
            .bind(to_db_id(user_id)?)
            .bind(to_db_id(follower_id)?)
            .execute(&mut *self.db)
            .await?;

        Ok(())
    }

    /// Users following `user_id`
    #[instrument(skip(self), err)]
    pub async fn followers_of(&mut self, user_id: UserId) -> Result<Vec<UserDBResponse>> {
        let users = sqlx::query_as::<_, FollowUser>(
            r#"
            SELECT u.id, u.name, u.nick, u.email, u.created_at
            FROM users u
            JOIN followers f ON f.follower_id = u.id
            WHERE f.user_id = $1
            ORDER BY u.id
            "#,
        )
        .bind(to_db_id(user_id)?)
        .fetch_all(&mut *self.db)
        .await?;

        users.into_iter().map(UserDBResponse::try_from).collect()
    }

    /// Users that `follower_id` follows
    #[instrument(skip(self), err)]
    pub async fn followed_by(&mut self, follower_id: UserId) -> Result<Vec<UserDBResponse>> {
        let users = sqlx::query_as::<_, FollowUser>(
            r#"
            SELECT u.id, u.name, u.nick, u.email, u.created_at
            FROM users u
            JOIN followers f ON f.user_id = u.id
            WHERE f.follower_id = $1
            ORDER BY u.id
            "#,
        )
        .bind(to_db_id(follower_id)?)
        .fetch_all(&mut *self.db)
        .await?;

        users.into_iter().map(UserDBResponse::try_from).collect()
    }
}
