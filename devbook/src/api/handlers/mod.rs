//! HTTP request handlers.
//!
//! Handlers for protected routes take a [`CurrentUser`](crate::api::models::users::CurrentUser)
//! argument, which is only available once the authentication gate has run.
//! Mutations check ownership through [`crate::auth::ownership`] after loading
//! the target and before writing.
//!
//! - [`auth`]: login and password change
//! - [`users`]: registration, search and profile management
//! - [`follows`]: following and followers
//! - [`posts`]: posts, the feed and likes

pub mod auth;
pub mod follows;
pub mod posts;
pub mod users;

/// Liveness probe
pub async fn healthz() -> &'static str {
    "OK"
}
