//! Ownership checks for mutations.
//!
//! Every mutating endpoint loads the target's owner reference first (a missing
//! target surfaces as 404) and only then compares it with the caller. Nothing
//! is locked between the check and the write, so two concurrent requests may
//! both pass.

use tracing::debug;

use crate::{
    db::store::Storage,
    errors::{Error, Result},
    types::{Operation, ResourceKind, UserId},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    Denied,
}

/// A caller may mutate a resource iff they own it.
pub fn authorize(caller: UserId, owner: UserId) -> Decision {
    if caller == owner { Decision::Allowed } else { Decision::Denied }
}

pub fn require_owner(caller: UserId, owner: UserId, action: Operation, resource: ResourceKind) -> Result<()> {
    match authorize(caller, owner) {
        Decision::Allowed => Ok(()),
        Decision::Denied => {
            debug!(caller, owner, %action, %resource, "ownership check denied");
            Err(Error::Forbidden { action, resource })
        }
    }
}

/// Rejects a caller acting on their own account, e.g. following themselves.
/// Needs no storage access.
pub fn forbid_self_reference(caller: UserId, target: UserId, action: Operation) -> Result<()> {
    if caller == target {
        debug!(caller, %action, "self reference rejected");
        return Err(Error::Forbidden {
            action,
            resource: ResourceKind::User,
        });
    }
    Ok(())
}

/// Loads the owner of `kind`/`id` and checks that `caller` owns it.
pub async fn authorize_mutation(storage: &dyn Storage, caller: UserId, kind: ResourceKind, id: u64, action: Operation) -> Result<()> {
    let owner = storage.fetch_owner_of(kind, id).await?;
    require_owner(caller, owner, action, kind)
}
