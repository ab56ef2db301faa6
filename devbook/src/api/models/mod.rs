//! Request and response bodies for the HTTP API.
//!
//! These are kept separate from the database models; conversions run from
//! the `db::models` types into the response types here.

pub mod auth;
pub mod posts;
pub mod users;
