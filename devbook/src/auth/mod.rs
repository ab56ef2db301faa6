//! Authentication and authorization.
//!
//! Requests are authenticated with stateless signed credentials issued at
//! login. Protected routes are wrapped in [`middleware::require_authentication`],
//! which resolves the caller from the `Authorization` header and hands it to
//! handlers as a [`CurrentUser`](crate::api::models::users::CurrentUser).
//! Mutations are then checked against the target's recorded owner.
//!
//! ```text
//! request ─▶ gate ─▶ extract subject ─▶ handler ─▶ load owner ─▶ authorize ─▶ mutate
//!             │ 401                                                  │ 403
//! ```
//!
//! # Modules
//!
//! - [`token`]: issuing and verifying credentials
//! - [`current_user`]: reading the credential from a request, and the `CurrentUser` extractor
//! - [`middleware`]: the authentication gate
//! - [`ownership`]: caller-versus-owner checks
//! - [`password`]: Argon2 hashing and verification
//! - [`rotation`]: changing a password after re-proving the old one
//!
//! # Usage in Handlers
//!
//! ```ignore
//! async fn delete_post(
//!     State(state): State<AppState>,
//!     current_user: CurrentUser,
//!     Path(id): Path<PostId>,
//! ) -> Result<StatusCode> {
//!     authorize_mutation(state.db.as_ref(), current_user.id, ResourceKind::Post, id, Operation::Delete).await?;
//!     state.db.delete_post(id).await?;
//!     Ok(StatusCode::NO_CONTENT)
//! }
//! ```

pub mod current_user;
pub mod middleware;
pub mod ownership;
pub mod password;
pub mod rotation;
pub mod token;
