//! Database repository for users.

use crate::db::{
    errors::{DbError, Result},
    handlers::{from_db_id, repository::Repository, to_db_id},
    models::users::{UserCreateDBRequest, UserCredentials, UserDBResponse, UserUpdateDBRequest},
};
use crate::types::UserId;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection};
use tracing::instrument;

/// Filter for listing users
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    /// Case-insensitive substring matched against name and nick
    pub query: Option<String>,
}

impl UserFilter {
    pub fn new(query: Option<String>) -> Self {
        Self { query }
    }

    /// `LIKE` pattern for the query. `%`, `_` and `\` in the query match literally.
    fn pattern(&self) -> String {
        match self.query.as_deref().map(str::trim) {
            Some(q) if !q.is_empty() => {
                let escaped = q
                    .to_lowercase()
                    .replace('\\', "\\\\")
                    .replace('%', "\\%")
                    .replace('_', "\\_");
                format!("%{escaped}%")
            }
            _ => "%".to_string(),
        }
    }
}

// Database entity model
#[derive(Debug, Clone, FromRow)]
struct User {
    id: i64,
    name: String,
    nick: String,
    email: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<User> for UserDBResponse {
    type Error = DbError;

    fn try_from(user: User) -> Result<Self> {
        Ok(Self {
            id: from_db_id(user.id)?,
            name: user.name,
            nick: user.nick,
            email: user.email,
            created_at: user.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct Credentials {
    id: i64,
    password: String,
}

pub struct Users<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Users<'c> {
    type CreateRequest = UserCreateDBRequest;
    type UpdateRequest = UserUpdateDBRequest;
    type Response = UserDBResponse;
    type Id = UserId;
    type Filter = UserFilter;

    #[instrument(skip(self, request), fields(nick = %request.nick), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, nick, email, password)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, nick, email, created_at
            "#,
        )
        .bind(&request.name)
        .bind(&request.nick)
        .bind(&request.email)
        .bind(&request.password_hash)
        .fetch_one(&mut *self.db)
        .await?;

        user.try_into()
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let user = sqlx::query_as::<_, User>("SELECT id, name, nick, email, created_at FROM users WHERE id = $1")
            .bind(to_db_id(id)?)
            .fetch_optional(&mut *self.db)
            .await?;

        user.map(UserDBResponse::try_from).transpose()
    }

    #[instrument(skip(self, filter), fields(query = ?filter.query), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, nick, email, created_at FROM users
            WHERE LOWER(name) LIKE $1 ESCAPE '\' OR LOWER(nick) LIKE $1 ESCAPE '\'
            ORDER BY id
            "#,
        )
        .bind(filter.pattern())
        .fetch_all(&mut *self.db)
        .await?;

        users.into_iter().map(UserDBResponse::try_from).collect()
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(to_db_id(id)?)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET name = $2, nick = $3, email = $4
            WHERE id = $1
            RETURNING id, name, nick, email, created_at
            "#,
        )
        .bind(to_db_id(id)?)
        .bind(&request.name)
        .bind(&request.nick)
        .bind(&request.email)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        user.try_into()
    }
}

impl<'c> Users<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Looks up the stored credentials for a login attempt.
    #[instrument(skip(self, email), err)]
    pub async fn get_credentials_by_email(&mut self, email: &str) -> Result<Option<UserCredentials>> {
        let credentials = sqlx::query_as::<_, Credentials>("SELECT id, password FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&mut *self.db)
            .await?;

        credentials
            .map(|c| {
                Ok(UserCredentials {
                    id: from_db_id(c.id)?,
                    password_hash: c.password,
                })
            })
            .transpose()
    }

    #[instrument(skip(self), err)]
    pub async fn get_password_hash(&mut self, id: UserId) -> Result<Option<String>> {
        let hash = sqlx::query_scalar::<_, String>("SELECT password FROM users WHERE id = $1")
            .bind(to_db_id(id)?)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(hash)
    }

    /// Replaces the stored hash in a single statement. Returns false if the user is gone.
    #[instrument(skip(self, password_hash), err)]
    pub async fn set_password_hash(&mut self, id: UserId, password_hash: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE users SET password = $2 WHERE id = $1")
            .bind(to_db_id(id)?)
            .bind(password_hash)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), err)]
    pub async fn exists(&mut self, id: UserId) -> Result<bool> {
        let found = sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE id = $1")
            .bind(to_db_id(id)?)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(found.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::PgPool;

    fn user_request(nick: &str) -> UserCreateDBRequest {
        UserCreateDBRequest {
            name: format!("{nick} name"),
            nick: nick.to_string(),
            email: format!("{nick}@example.com"),
            password_hash: "$argon2id$placeholder".to_string(),
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_and_get_user(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Users::new(&mut conn);

        let created = repo.create(&user_request("ada")).await.unwrap();
        assert_eq!(created.nick, "ada");
        assert_eq!(created.email, "ada@example.com");

        let found = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(found.name, "ada name");

        assert!(repo.get_by_id(created.id + 1000).await.unwrap().is_none());
        assert!(repo.exists(created.id).await.unwrap());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_unique_constraint_names(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Users::new(&mut conn);
        repo.create(&user_request("ada")).await.unwrap();

        let same_nick = UserCreateDBRequest {
            email: "other@example.com".to_string(),
            ..user_request("ada")
        };
        match repo.create(&same_nick).await.unwrap_err() {
            DbError::UniqueViolation { constraint, table, .. } => {
                assert_eq!(constraint.as_deref(), Some("users_nick_key"));
                assert_eq!(table.as_deref(), Some("users"));
            }
            other => panic!("expected unique violation, got {other:?}"),
        }

        let same_email = UserCreateDBRequest {
            email: "ada@example.com".to_string(),
            ..user_request("bob")
        };
        let err = repo.create(&same_email).await.unwrap_err();
        assert!(matches!(
            &err,
            DbError::UniqueViolation { constraint: Some(c), .. } if c == "users_email_key"
        ));

        // The constraint names drive the client-facing messages
        let err = crate::errors::Error::from(err);
        assert_eq!(err.status_code(), axum::http::StatusCode::CONFLICT);
        assert_eq!(err.user_message(), "An account with this email address already exists");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_search_matches_wildcards_literally(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Users::new(&mut conn);
        let literal = repo.create(&user_request("a_b")).await.unwrap();
        repo.create(&user_request("axb")).await.unwrap();
        repo.create(&user_request("percent")).await.unwrap();

        let found = repo.list(&UserFilter::new(Some("A_B".to_string()))).await.unwrap();
        assert_eq!(found.iter().map(|u| u.id).collect::<Vec<_>>(), vec![literal.id]);

        assert!(repo.list(&UserFilter::new(Some("%".to_string()))).await.unwrap().is_empty());
        assert_eq!(repo.list(&UserFilter::default()).await.unwrap().len(), 3);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_and_delete(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Users::new(&mut conn);
        let ada = repo.create(&user_request("ada")).await.unwrap();

        let updated = repo
            .update(
                ada.id,
                &UserUpdateDBRequest {
                    name: "Ada Lovelace".to_string(),
                    nick: "countess".to_string(),
                    email: "countess@example.com".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Ada Lovelace");
        assert_eq!(updated.nick, "countess");
        assert_eq!(updated.email, "countess@example.com");

        let missing = UserUpdateDBRequest {
            name: "x".to_string(),
            nick: "x".to_string(),
            email: "x@example.com".to_string(),
        };
        assert!(matches!(repo.update(ada.id + 1000, &missing).await, Err(DbError::NotFound)));

        assert!(repo.delete(ada.id).await.unwrap());
        assert!(!repo.delete(ada.id).await.unwrap());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_password_hash_storage(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Users::new(&mut conn);
        let ada = repo.create(&user_request("ada")).await.unwrap();

        let credentials = repo.get_credentials_by_email("ada@example.com").await.unwrap().unwrap();
        assert_eq!(credentials.id, ada.id);
        assert_eq!(credentials.password_hash, "$argon2id$placeholder");
        assert!(repo.get_credentials_by_email("nobody@example.com").await.unwrap().is_none());

        assert!(repo.set_password_hash(ada.id, "$argon2id$rotated").await.unwrap());
        assert_eq!(repo.get_password_hash(ada.id).await.unwrap().as_deref(), Some("$argon2id$rotated"));

        assert!(!repo.set_password_hash(ada.id + 1000, "$argon2id$rotated").await.unwrap());
        assert!(repo.get_password_hash(ada.id + 1000).await.unwrap().is_none());
    }

    #[test]
    fn test_filter_pattern() {
        assert_eq!(UserFilter::new(None).pattern(), "%");
        assert_eq!(UserFilter::new(Some("   ".to_string())).pattern(), "%");
        assert_eq!(UserFilter::new(Some(" Ada ".to_string())).pattern(), "%ada%");
    }

    #[test]
    fn test_filter_pattern_escapes_wildcards() {
        assert_eq!(UserFilter::new(Some("a_b".to_string())).pattern(), r"%a\_b%");
        assert_eq!(UserFilter::new(Some("100%".to_string())).pattern(), r"%100\%%");
        assert_eq!(UserFilter::new(Some(r"back\slash".to_string())).pattern(), r"%back\\slash%");
    }
}
