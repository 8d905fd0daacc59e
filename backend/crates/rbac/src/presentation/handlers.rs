//! HTTP Handlers

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

use crate::application::authentication::AuthenticationService;
use crate::application::config::AuthConfig;
use crate::application::user_directory::UserDirectoryService;
use crate::domain::repository::{RoleRepository, UserRepository};
use crate::domain::value_object::{role_level::RoleLevel, user_id::UserId};
use crate::error::{RbacError, RbacResult};
use crate::presentation::dto::{
    AssignRoleRequest, HealthResponse, LoginRequest, RegisterRequest, RoleResponse,
    TokenResponse, UserResponse,
};
use crate::presentation::middleware::{CurrentUser, RequireLevel};

/// Level needed to list roles
pub const LIST_ROLES_LEVEL: RoleLevel = 2;
/// Level needed to read a single user
pub const READ_USER_LEVEL: RoleLevel = 3;
/// Level needed to list all users
pub const LIST_USERS_LEVEL: RoleLevel = 4;
/// Level needed to grant roles
pub const ASSIGN_ROLE_LEVEL: RoleLevel = 5;

/// Shared state for RBAC handlers
pub struct RbacAppState<S>
where
    S: UserRepository + RoleRepository + Send + Sync + 'static,
{
    pub auth: AuthenticationService<S, S>,
    pub config: Arc<AuthConfig>,
}

impl<S> Clone for RbacAppState<S>
where
    S: UserRepository + RoleRepository + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            auth: self.auth.clone(),
            config: Arc::clone(&self.config),
        }
    }
}

impl<S> RbacAppState<S>
where
    S: UserRepository + RoleRepository + Send + Sync + 'static,
{
    /// Wire the services over one store
    pub fn new(store: Arc<S>, config: Arc<AuthConfig>) -> RbacResult<Self> {
        let hasher = Arc::new(config.credential_hasher()?);
        let codec = Arc::new(config.token_codec()?);
        let directory = UserDirectoryService::new(
            Arc::clone(&store),
            store,
            Arc::clone(&hasher),
            Arc::clone(&config),
        );
        Ok(Self {
            auth: AuthenticationService::new(directory, codec, hasher, Arc::clone(&config)),
            config,
        })
    }

    pub fn directory(&self) -> &UserDirectoryService<S, S> {
        self.auth.directory()
    }
}

// ============================================================================
// Auth
// ============================================================================

/// POST /auth/register
pub async fn register<S>(
    State(state): State<RbacAppState<S>>,
    Json(req): Json<RegisterRequest>,
) -> RbacResult<(StatusCode, Json<UserResponse>)>
where
    S: UserRepository + RoleRepository + Send + Sync + 'static,
{
    let identity = state
        .auth
        .register(&req.email, req.password, req.full_name)
        .await?;

    Ok((StatusCode::CREATED, Json(identity.into())))
}

/// POST /auth/login
///
/// Returns the token as JSON and also sets it as an HTTP-only cookie.
pub async fn login<S>(
    State(state): State<RbacAppState<S>>,
    Json(req): Json<LoginRequest>,
) -> RbacResult<Response>
where
    S: UserRepository + RoleRepository + Send + Sync + 'static,
{
    let (_, token) = state.auth.authenticate(&req.email, req.password).await?;

    let cookie = state
        .config
        .token_cookie
        .set_cookie_header(&token.access_token, state.config.access_token_ttl_secs())
        .ok_or_else(|| RbacError::Internal("Token is not a valid cookie value".to_string()))?;

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(TokenResponse::from(token)),
    )
        .into_response())
}

/// GET /auth/me
pub async fn me(CurrentUser(identity): CurrentUser) -> Json<UserResponse> {
    Json(identity.into())
}

// ============================================================================
// Roles
// ============================================================================

/// GET /roles
pub async fn list_roles<S>(
    State(state): State<RbacAppState<S>>,
    _caller: RequireLevel<LIST_ROLES_LEVEL>,
) -> RbacResult<Json<Vec<RoleResponse>>>
where
    S: UserRepository + RoleRepository + Send + Sync + 'static,
{
    let roles = state.directory().list_roles().await?;
    Ok(Json(roles.into_iter().map(RoleResponse::from).collect()))
}

// ============================================================================
// Users
// ============================================================================

/// GET /users
pub async fn list_users<S>(
    State(state): State<RbacAppState<S>>,
    _caller: RequireLevel<LIST_USERS_LEVEL>,
) -> RbacResult<Json<Vec<UserResponse>>>
where
    S: UserRepository + RoleRepository + Send + Sync + 'static,
{
    let users = state.directory().list_users().await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// GET /users/{user_id}
pub async fn get_user<S>(
    State(state): State<RbacAppState<S>>,
    _caller: RequireLevel<READ_USER_LEVEL>,
    Path(user_id): Path<i64>,
) -> RbacResult<Json<UserResponse>>
where
    S: UserRepository + RoleRepository + Send + Sync + 'static,
{
    let identity = state
        .directory()
        .lookup_by_id(UserId::from_raw(user_id))
        .await?
        .ok_or(RbacError::UserNotFound)?;

    Ok(Json(identity.into()))
}

/// POST /users/{user_id}/roles
pub async fn assign_role<S>(
    State(state): State<RbacAppState<S>>,
    RequireLevel(caller): RequireLevel<ASSIGN_ROLE_LEVEL>,
    Path(user_id): Path<i64>,
    Json(req): Json<AssignRoleRequest>,
) -> RbacResult<Json<UserResponse>>
where
    S: UserRepository + RoleRepository + Send + Sync + 'static,
{
    let identity = state
        .directory()
        .assign_role(UserId::from_raw(user_id), req.level)
        .await?;

    tracing::info!(
        granted_by = ?caller.id.map(|id| id.as_i64()),
        user_id,
        role_level = req.level,
        "Role assigned"
    );

    Ok(Json(identity.into()))
}

// ============================================================================
// Health
// ============================================================================

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
