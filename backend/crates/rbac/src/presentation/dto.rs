//! API DTOs (Data Transfer Objects)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::application::authentication::AccessToken;
use crate::domain::entity::{identity::Identity, role::Role};
use crate::domain::value_object::role_level::RoleLevel;

// ============================================================================
// Auth
// ============================================================================

/// Register request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub full_name: Option<String>,
}

/// Login request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
}

impl From<AccessToken> for TokenResponse {
    fn from(token: AccessToken) -> Self {
        Self {
            access_token: token.access_token,
            token_type: token.token_type.to_string(),
            expires_at: token.expires_at,
        }
    }
}

// ============================================================================
// Users
// ============================================================================

/// Public view of an account
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub full_name: Option<String>,
    pub is_active: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub role_levels: Vec<RoleLevel>,
}

impl From<Identity> for UserResponse {
    fn from(identity: Identity) -> Self {
        Self {
            id: identity.id.map_or(0, |id| id.as_i64()),
            email: identity.email.into_db(),
            full_name: identity.full_name,
            is_active: identity.is_active,
            created_at: identity.created_at,
            role_levels: identity.role_levels.to_vec(),
        }
    }
}

/// Role assignment request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignRoleRequest {
    pub level: RoleLevel,
}

// ============================================================================
// Roles
// ============================================================================

/// Role response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleResponse {
    pub id: Option<i64>,
    pub name: String,
    pub level: RoleLevel,
}

impl From<Role> for RoleResponse {
    fn from(role: Role) -> Self {
        Self {
            id: role.id.map(|id| id.as_i64()),
            name: role.name,
            level: role.level,
        }
    }
}

// ============================================================================
// Health
// ============================================================================

/// Health probe response
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}
