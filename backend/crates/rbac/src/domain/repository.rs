//! Repository Traits
//!
//! The store contract the core depends on. Implementations live in the
//! infrastructure layer.

use crate::domain::entity::{
    role::Role,
    user_record::{NewUser, UserRecord},
};
use crate::domain::role_presets::RolePresets;
use crate::domain::value_object::{
    email::Email,
    role_level::RoleLevel,
    user_id::{RoleId, UserId},
};
use crate::error::RbacResult;

/// User repository trait
#[trait_variant::make(UserRepository: Send)]
pub trait LocalUserRepository {
    /// Find user by exact email
    async fn find_by_email(&self, email: &Email) -> RbacResult<Option<UserRecord>>;

    /// Find user by ID
    async fn find_by_id(&self, user_id: UserId) -> RbacResult<Option<UserRecord>>;

    /// All users, ascending by ID
    async fn list(&self) -> RbacResult<Vec<UserRecord>>;

    /// Create a user with its initial roles.
    ///
    /// Fails with `DuplicateEmail` if the email is already present, including
    /// when a concurrent registration wins the race.
    async fn create(&self, user: NewUser) -> RbacResult<UserRecord>;

    /// Associate a role with a user. No-op if the association exists.
    ///
    /// Fails with `UserNotFound` if the user does not exist.
    async fn add_role(&self, user_id: UserId, role_id: RoleId) -> RbacResult<UserRecord>;
}

/// Role repository trait
#[trait_variant::make(RoleRepository: Send)]
pub trait LocalRoleRepository {
    /// Find role by level
    async fn find_by_level(&self, level: RoleLevel) -> RbacResult<Option<Role>>;

    /// Find role by name
    async fn find_by_name(&self, name: &str) -> RbacResult<Option<Role>>;

    /// Roles with the given IDs; unknown IDs are skipped
    async fn find_by_ids(&self, ids: &[RoleId]) -> RbacResult<Vec<Role>>;

    /// All roles, ascending by level
    async fn list(&self) -> RbacResult<Vec<Role>>;

    /// Insert every preset whose level is not yet present. Idempotent.
    async fn ensure_roles(&self, presets: &RolePresets) -> RbacResult<()>;
}
