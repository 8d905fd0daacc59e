//! In-Memory Repository Implementation
//!
//! Process-local store for development and tests. Every mutation takes the
//! single write lock, so check-then-insert sequences are atomic.

use chrono::Utc;
use tokio::sync::RwLock;

use crate::domain::entity::{
    role::Role,
    user_record::{NewUser, UserRecord},
};
use crate::domain::repository::{RoleRepository, UserRepository};
use crate::domain::role_presets::RolePresets;
use crate::domain::value_object::{
    email::Email,
    role_level::RoleLevel,
    user_id::{RoleId, UserId},
};
use crate::error::{RbacError, RbacResult};

#[derive(Debug, Default)]
struct State {
    /// Ascending by ID
    users: Vec<UserRecord>,
    /// Ascending by level
    roles: Vec<Role>,
    last_user_id: i64,
    last_role_id: i64,
}

impl State {
    fn user_mut(&mut self, user_id: UserId) -> Option<&mut UserRecord> {
        self.users.iter_mut().find(|u| u.id == user_id)
    }
}

/// Store keeping users and roles in process memory
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Activate or deactivate an account
    pub async fn set_active(&self, user_id: UserId, is_active: bool) -> RbacResult<()> {
        let mut state = self.state.write().await;
        let user = state.user_mut(user_id).ok_or(RbacError::UserNotFound)?;
        user.is_active = is_active;
        Ok(())
    }
}

// ============================================================================
// User Repository Implementation
// ============================================================================

impl UserRepository for InMemoryStore {
    async fn find_by_email(&self, email: &Email) -> RbacResult<Option<UserRecord>> {
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| &u.email == email).cloned())
    }

    async fn find_by_id(&self, user_id: UserId) -> RbacResult<Option<UserRecord>> {
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.id == user_id).cloned())
    }

    async fn list(&self) -> RbacResult<Vec<UserRecord>> {
        Ok(self.state.read().await.users.clone())
    }

    async fn create(&self, user: NewUser) -> RbacResult<UserRecord> {
        let mut state = self.state.write().await;

        if state.users.iter().any(|u| u.email == user.email) {
            return Err(RbacError::DuplicateEmail);
        }

        let mut role_ids: Vec<RoleId> = user
            .role_ids
            .into_iter()
            .filter(|id| state.roles.iter().any(|r| r.id == Some(*id)))
            .collect();
        role_ids.sort();
        role_ids.dedup();

        state.last_user_id += 1;
        let record = UserRecord {
            id: UserId::from_raw(state.last_user_id),
            email: user.email,
            password_hash: user.password_hash,
            full_name: user.full_name,
            is_active: user.is_active,
            created_at: Utc::now(),
            role_ids,
        };
        state.users.push(record.clone());

        Ok(record)
    }

    async fn add_role(&self, user_id: UserId, role_id: RoleId) -> RbacResult<UserRecord> {
        let mut state = self.state.write().await;

        if !state.roles.iter().any(|r| r.id == Some(role_id)) {
            return Err(RbacError::RoleNotFound);
        }

        let user = state.user_mut(user_id).ok_or(RbacError::UserNotFound)?;
        if let Err(pos) = user.role_ids.binary_search(&role_id) {
            user.role_ids.insert(pos, role_id);
        }

        Ok(user.clone())
    }
}

// ============================================================================
// Role Repository Implementation
// ============================================================================

impl RoleRepository for InMemoryStore {
    async fn find_by_level(&self, level: RoleLevel) -> RbacResult<Option<Role>> {
        let state = self.state.read().await;
        Ok(state.roles.iter().find(|r| r.level == level).cloned())
    }

    async fn find_by_name(&self, name: &str) -> RbacResult<Option<Role>> {
        let state = self.state.read().await;
        Ok(state.roles.iter().find(|r| r.name == name).cloned())
    }

    async fn find_by_ids(&self, ids: &[RoleId]) -> RbacResult<Vec<Role>> {
        let state = self.state.read().await;
        Ok(state
            .roles
            .iter()
            .filter(|r| r.id.is_some_and(|id| ids.contains(&id)))
            .cloned()
            .collect())
    }

    async fn list(&self) -> RbacResult<Vec<Role>> {
        Ok(self.state.read().await.roles.clone())
    }

    async fn ensure_roles(&self, presets: &RolePresets) -> RbacResult<()> {
        let mut state = self.state.write().await;

        for preset in presets.iter() {
            if state.roles.iter().any(|r| r.level == preset.level) {
                continue;
            }
            if state.roles.iter().any(|r| r.name == preset.name) {
                tracing::warn!(
                    role_level = preset.level,
                    name = %preset.name,
                    "Role name already used at another level, skipping preset"
                );
                continue;
            }

            state.last_role_id += 1;
            let role = Role::from_db(
                RoleId::from_raw(state.last_role_id),
                preset.name.clone(),
                preset.level,
            );
            state.roles.push(role);
        }
        state.roles.sort_by_key(|r| r.level);

        Ok(())
    }
}
