//! Capability gate and channel addressing checks

use crate::config::AccessPolicy;
use crate::error::{AccessError, AccessResult};
use crate::types::{AccessRights, Direction, VarDescriptor};

/// Check a requester's capabilities against a variable's rights
///
/// On writes the ADMIN bits of both sides must be equal. The masked
/// capability bytes are then compared according to `policy`, for both
/// directions.
pub fn check_access(
    rights: AccessRights,
    direction: Direction,
    req: AccessRights,
    policy: AccessPolicy,
) -> AccessResult<()> {
    if direction == Direction::Write && rights.is_admin() != req.is_admin() {
        return Err(AccessError::AccessDenied);
    }

    let granted = rights.capabilities();
    let requested = req.capabilities();
    let allowed = match policy {
        AccessPolicy::Exact => granted == requested,
        AccessPolicy::Subset => granted.contains(requested),
    };

    if allowed {
        Ok(())
    } else {
        Err(AccessError::AccessDenied)
    }
}

/// Validate channel addressing; only called for `chan > 0`
pub fn check_vector(var: &VarDescriptor, chan: u16) -> AccessResult<()> {
    if !var.vector {
        Err(AccessError::NotVector)
    } else if chan >= var.vec_items {
        Err(AccessError::InvalidChannel)
    } else {
        Ok(())
    }
}

/// Run [`check_vector`] when a channel other than 0 is addressed
pub(crate) fn check_channel(var: &VarDescriptor, chan: u16) -> AccessResult<()> {
    if chan > 0 {
        check_vector(var, chan)
    } else {
        Ok(())
    }
}
