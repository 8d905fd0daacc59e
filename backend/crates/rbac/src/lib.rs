//! RBAC (Role-Based Access Control) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, role presets, repository traits
//! - `application/` - Directory, authentication and permission services
//! - `infra/` - PostgreSQL and in-memory store implementations
//! - `presentation/` - HTTP handlers, DTOs, request guards, router
//!
//! ## Features
//! - Account registration with email + password
//! - Credential verification issuing signed, expiring bearer tokens
//! - Numeric role levels (higher = more privilege) gating endpoints
//! - Preset roles and a superuser provisioned at startup
//!
//! ## Security Model
//! - Passwords hashed with Argon2id on a blocking thread
//! - Unknown email and wrong password are reported identically
//! - Token verification is stateless (signature + expiry); a deactivated
//!   account's token stays valid until it expires

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::{
    AuthConfig, AuthenticationService, PermissionEvaluator, UserDirectoryService, bootstrap,
};
pub use error::{RbacError, RbacResult};
pub use infra::{InMemoryStore, PgRbacRepository};
pub use presentation::{RbacAppState, rbac_router};

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};
