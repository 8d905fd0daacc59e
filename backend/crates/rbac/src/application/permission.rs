//! Permission Evaluator
//!
//! Pure check of a resolved identity against a required level.

use crate::domain::entity::identity::Identity;
use crate::domain::value_object::role_level::RoleLevel;
use crate::error::{RbacError, RbacResult};

/// Stateless permission evaluator
#[derive(Debug, Clone, Copy, Default)]
pub struct PermissionEvaluator;

impl PermissionEvaluator {
    /// Succeeds iff some level held by `identity` is `>= required`.
    ///
    /// ## Errors
    /// `InsufficientPermission` otherwise, including for an identity
    /// without roles.
    pub fn ensure_level(identity: &Identity, required: RoleLevel) -> RbacResult<()> {
        if identity.has_level(required) {
            Ok(())
        } else {
            Err(RbacError::InsufficientPermission { required })
        }
    }
}
