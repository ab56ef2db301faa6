//! Database record models matching table schemas.
//!
//! These structs are what repositories accept and return. They are kept apart
//! from the API models in [`crate::api::models`] so the storage and wire
//! representations can evolve independently; in particular the password hash
//! lives only on the storage side.
//!
//! - [`users`]: user accounts and login credentials
//! - [`posts`]: posts joined with their author's nick

pub mod posts;
pub mod users;
