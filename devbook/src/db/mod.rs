//! Database layer for data persistence and access.
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  (API request handlers, auth core)
//! └──────┬──────┘
//!        │  dyn Storage
//!        ↓
//! ┌─────────────┐
//! │   Storage   │  (db::store - one pooled connection per call)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │ Repositories│  (db::handlers - queries per table)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │  PostgreSQL │
//! └─────────────┘
//! ```
//!
//! - [`store`]: the [`store::Storage`] trait and its PostgreSQL implementation
//! - [`handlers`]: repository implementations for each table
//! - [`models`]: database record structures
//! - [`errors`]: database-specific error types
//! - `memory`: in-memory storage for tests (`test-utils` feature)
//!
//! Migrations live in `migrations/` and are embedded through [`crate::migrator`].

pub mod errors;
pub mod handlers;
#[cfg(any(test, feature = "test-utils"))]
pub mod memory;
pub mod models;
pub mod store;
