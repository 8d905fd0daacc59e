//! Credential Record
//!
//! The persisted account row. Holds the password digest and therefore never
//! leaves the application layer; callers see [`Identity`] instead.
//!
//! [`Identity`]: super::identity::Identity

use chrono::{DateTime, Utc};

use crate::domain::value_object::{
    email::Email,
    user_id::{RoleId, UserId},
};

/// Stored user with its role associations
#[derive(Clone)]
pub struct UserRecord {
    pub id: UserId,
    pub email: Email,
    /// PHC string
    pub password_hash: String,
    pub full_name: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    /// Associated roles, ascending by id, without duplicates
    pub role_ids: Vec<RoleId>,
}

impl std::fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserRecord")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("password_hash", &"[HASH]")
            .field("full_name", &self.full_name)
            .field("is_active", &self.is_active)
            .field("created_at", &self.created_at)
            .field("role_ids", &self.role_ids)
            .finish()
    }
}

/// Input for creating a user record
#[derive(Clone)]
pub struct NewUser {
    pub email: Email,
    pub password_hash: String,
    pub full_name: Option<String>,
    pub is_active: bool,
    pub role_ids: Vec<RoleId>,
}

impl NewUser {
    /// Active account with the given initial roles
    pub fn new(
        email: Email,
        password_hash: impl Into<String>,
        full_name: Option<String>,
        role_ids: Vec<RoleId>,
    ) -> Self {
        Self {
            email,
            password_hash: password_hash.into(),
            full_name,
            is_active: true,
            role_ids,
        }
    }
}

impl std::fmt::Debug for NewUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewUser")
            .field("email", &self.email)
            .field("password_hash", &"[HASH]")
            .field("full_name", &self.full_name)
            .field("is_active", &self.is_active)
            .field("role_ids", &self.role_ids)
            .finish()
    }
}
