//! Password rotation.
//!
//! A user may change only their own password, and must prove the current one
//! first. Rotation does not issue a new credential and does not invalidate the
//! ones already handed out; they stay valid until they expire.

use tracing::{info, instrument};

use crate::{
    auth::{
        ownership::require_owner,
        password::{Argon2Params, hash_password_blocking, validate_password_length, verify_password_blocking},
    },
    config::PasswordConfig,
    db::store::Storage,
    errors::{Error, Result},
    types::{Operation, ResourceKind, UserId},
};

#[instrument(skip(storage, config, old_password, new_password), err)]
pub async fn rotate_password(
    storage: &dyn Storage,
    config: &PasswordConfig,
    caller: UserId,
    target: UserId,
    old_password: &str,
    new_password: &str,
) -> Result<()> {
    // Self only, decided before anything is loaded
    require_owner(caller, target, Operation::ChangePassword, ResourceKind::User)?;

    let stored_hash = storage.fetch_password_hash(target).await?;

    if !verify_password_blocking(old_password.to_string(), stored_hash).await? {
        return Err(Error::Unauthenticated {
            message: Some("Current password is incorrect".to_string()),
        });
    }

    validate_password_length(new_password, config)?;
    let new_hash = hash_password_blocking(new_password.to_string(), Argon2Params::from(config)).await?;
    storage.store_password_hash(target, &new_hash).await?;

    info!(user_id = target, "password changed");
    Ok(())
}
