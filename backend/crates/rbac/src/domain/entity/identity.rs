//! Identity Entity
//!
//! Resolved, in-memory view of an authenticated principal. Built from a
//! [`UserRecord`] at read time; never persisted.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::entity::{role::Role, user_record::UserRecord};
use crate::domain::value_object::{
    email::Email,
    role_level::{RoleLevel, RoleLevels},
    user_id::UserId,
};

/// Identity entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    /// Absent before persistence
    pub id: Option<UserId>,
    pub email: Email,
    pub full_name: Option<String>,
    pub is_active: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub role_levels: RoleLevels,
}

impl Identity {
    /// Identity for a stored record, without roles attached yet
    pub fn from_record(record: &UserRecord) -> Self {
        Self {
            id: Some(record.id),
            email: record.email.clone(),
            full_name: record.full_name.clone(),
            is_active: record.is_active,
            created_at: Some(record.created_at),
            role_levels: RoleLevels::new(),
        }
    }

    /// Replace the role levels with those of `roles`
    pub fn attach_roles<'a>(mut self, roles: impl IntoIterator<Item = &'a Role>) -> Self {
        self.role_levels = roles.into_iter().map(|role| role.level).collect();
        self
    }

    /// True iff some held level is `>= required`
    pub fn has_level(&self, required: RoleLevel) -> bool {
        self.role_levels.satisfies(required)
    }

    pub fn max_level(&self) -> Option<RoleLevel> {
        self.role_levels.max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_object::user_id::RoleId;

    fn record() -> UserRecord {
        UserRecord {
            id: UserId::from_raw(7),
            email: Email::from_db("alice@example.com"),
            password_hash: "$argon2id$placeholder".to_string(),
            full_name: Some("Alice".to_string()),
            is_active: true,
            created_at: Utc::now(),
            role_ids: vec![RoleId::from_raw(1)],
        }
    }

    #[test]
    fn test_from_record() {
        let identity = Identity::from_record(&record());
        assert_eq!(identity.id, Some(UserId::from_raw(7)));
        assert_eq!(identity.email.as_str(), "alice@example.com");
        assert!(identity.role_levels.is_empty());
        assert!(identity.created_at.is_some());
    }

    #[test]
    fn test_attach_roles_replaces_wholesale() {
        let viewer = Role::from_db(RoleId::from_raw(1), "Viewer", 1);
        let editor = Role::from_db(RoleId::from_raw(3), "Editor", 3);
        let manager = Role::from_db(RoleId::from_raw(4), "Manager", 4);

        let identity = Identity::from_record(&record()).attach_roles([&editor, &viewer, &editor]);
        assert_eq!(identity.role_levels.to_vec(), vec![1, 3]);

        let identity = identity.attach_roles([&manager]);
        assert_eq!(identity.role_levels.to_vec(), vec![4]);
    }

    #[test]
    fn test_has_level() {
        let viewer = Role::from_db(RoleId::from_raw(1), "Viewer", 1);
        let editor = Role::from_db(RoleId::from_raw(3), "Editor", 3);
        let identity = Identity::from_record(&record()).attach_roles([&viewer, &editor]);

        assert_eq!(identity.max_level(), Some(3));
        assert!(identity.has_level(3));
        assert!(!identity.has_level(4));
    }

    #[test]
    fn test_serialized_shape_has_no_password() {
        let json = serde_json::to_value(Identity::from_record(&record())).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["email"], "alice@example.com");
        assert_eq!(json["id"], 7);
    }
}
