//! Request Guards
//!
//! Extractors that resolve the caller's identity from the access token and
//! enforce a minimum role level before the handler runs. The token is read
//! from `Authorization: Bearer`, falling back to the login cookie.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use platform::bearer::extract_access_token;

use crate::application::permission::PermissionEvaluator;
use crate::domain::entity::identity::Identity;
use crate::domain::repository::{RoleRepository, UserRepository};
use crate::domain::value_object::role_level::RoleLevel;
use crate::error::RbacError;
use crate::presentation::handlers::RbacAppState;

/// Caller resolved from a valid access token
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Identity);

impl<S> FromRequestParts<RbacAppState<S>> for CurrentUser
where
    S: UserRepository + RoleRepository + Send + Sync + 'static,
{
    type Rejection = RbacError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &RbacAppState<S>,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_access_token(&parts.headers, &state.config.token_cookie.name)
            .ok_or(RbacError::InvalidToken)?;

        // A token for a vanished account is as unusable as a forged one
        let identity = state
            .auth
            .resolve_token(&token)
            .await
            .map_err(|e| match e {
                RbacError::UserNotFound => RbacError::InvalidToken,
                other => other,
            })?;
        Ok(Self(identity))
    }
}

/// Caller holding a role of at least `LEVEL`
#[derive(Debug, Clone)]
pub struct RequireLevel<const LEVEL: RoleLevel>(pub Identity);

impl<S, const LEVEL: RoleLevel> FromRequestParts<RbacAppState<S>> for RequireLevel<LEVEL>
where
    S: UserRepository + RoleRepository + Send + Sync + 'static,
{
    type Rejection = RbacError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &RbacAppState<S>,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(identity) = CurrentUser::from_request_parts(parts, state).await?;
        PermissionEvaluator::ensure_level(&identity, LEVEL)?;
        Ok(Self(identity))
    }
}
