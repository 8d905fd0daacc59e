//! Role Entity
//!
//! A named permission level. Provisioned from presets, otherwise immutable.

use serde::Serialize;

use crate::domain::value_object::{role_level::RoleLevel, user_id::RoleId};

/// Role entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Role {
    /// Absent before persistence
    pub id: Option<RoleId>,
    /// Unique, non-empty
    pub name: String,
    /// Unique; ascending means more privilege
    pub level: RoleLevel,
}

impl Role {
    /// Role loaded from the store
    pub fn from_db(id: RoleId, name: impl Into<String>, level: RoleLevel) -> Self {
        Self {
            id: Some(id),
            name: name.into(),
            level,
        }
    }
}
