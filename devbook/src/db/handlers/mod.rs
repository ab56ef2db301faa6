//! Repository implementations for database access.
//!
//! Each repository wraps a borrowed `PgConnection` (a pooled connection or a
//! transaction) and issues single-statement queries against one table:
//!
//! - [`Users`]: user accounts, search and stored password hashes
//! - [`Posts`]: posts, the feed query and like counters
//! - [`Followers`]: the follow graph
//!
//! ```ignore
//! let mut conn = pool.acquire().await?;
//! let user = Users::new(&mut conn).get_by_id(42).await?;
//! ```
//!
//! PostgreSQL stores identifiers as `BIGINT`, while the application works in
//! `u64`. [`to_db_id`] and [`from_db_id`] convert at this boundary.

pub mod followers;
pub mod posts;
pub mod repository;
pub mod users;

pub use followers::Followers;
pub use posts::Posts;
pub use repository::Repository;
pub use users::Users;

use crate::db::errors::{DbError, Result};

/// Converts an application id into its column value. A `u64` above `i64::MAX`
/// can never have been allocated by a `BIGSERIAL`, so it is reported as missing.
pub(crate) fn to_db_id(id: u64) -> Result<i64> {
    i64::try_from(id).map_err(|_| DbError::NotFound)
}

pub(crate) fn from_db_id(id: i64) -> Result<u64> {
    u64::try_from(id).map_err(|_| DbError::Other(anyhow::anyhow!("negative identifier {id} read from database")))
}
