//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers
//! - **[`models`]**: Request/response data structures
//! - **[`routes`]**: The route table and router construction
//!
//! # API Structure
//!
//! - **Users** (`/users/*`): registration, search, profiles, follows, password change
//! - **Login** (`/login`): exchanges email and password for a credential
//! - **Posts** (`/posts/*`): posts, the feed and likes
//!
//! Everything except registration and login requires an
//! `Authorization: Bearer <credential>` header.

pub mod handlers;
pub mod models;
pub mod routes;
