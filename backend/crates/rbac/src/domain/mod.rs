//! Domain Layer
//!
//! Contains entities, value objects, the role preset table and repository
//! traits.

pub mod entity;
pub mod repository;
pub mod role_presets;
pub mod value_object;

// Re-exports
pub use entity::{identity::Identity, role::Role, user_record::{NewUser, UserRecord}};
pub use repository::{RoleRepository, UserRepository};
pub use role_presets::{RolePreset, RolePresets};
