//! RBAC Router

use axum::{
    Router,
    routing::{get, post},
};

use crate::domain::repository::{RoleRepository, UserRepository};
use crate::presentation::handlers::{self, RbacAppState};

/// Create the RBAC router for any store implementation.
///
/// Paths are relative; the binary nests them under `/api/v1`.
pub fn rbac_router<S>(state: RbacAppState<S>) -> Router
where
    S: UserRepository + RoleRepository + Send + Sync + 'static,
{
    Router::new()
        .route("/health", get(handlers::health))
        .route("/auth/register", post(handlers::register::<S>))
        .route("/auth/login", post(handlers::login::<S>))
        .route("/auth/me", get(handlers::me))
        .route("/roles", get(handlers::list_roles::<S>))
        .route("/users", get(handlers::list_users::<S>))
        .route("/users/{user_id}", get(handlers::get_user::<S>))
        .route("/users/{user_id}/roles", post(handlers::assign_role::<S>))
        .with_state(state)
}
