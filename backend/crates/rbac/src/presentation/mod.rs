//! Presentation Layer
//!
//! HTTP handlers, DTOs, router, and request guards.

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod router;

pub use handlers::RbacAppState;
pub use middleware::{CurrentUser, RequireLevel};
pub use router::rbac_router;
