//! Startup Provisioning
//!
//! Runs once before traffic is served: provisions the preset roles and
//! seeds the configured superuser. Safe to run on every start.

use crate::application::config::{AuthConfig, SUPERUSER_FULL_NAME};
use crate::application::user_directory::UserDirectoryService;
use crate::domain::repository::{RoleRepository, UserRepository};
use crate::error::RbacResult;

/// What a bootstrap run did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BootstrapReport {
    /// Roles present after provisioning
    pub roles: usize,
    /// Whether the superuser was created by this run
    pub superuser_created: bool,
}

/// Provision preset roles, then create the superuser if it is configured and
/// absent. An existing superuser account is left untouched.
pub async fn bootstrap<U, R>(
    directory: &UserDirectoryService<U, R>,
    role_repo: &R,
    config: &AuthConfig,
) -> RbacResult<BootstrapReport>
where
    U: UserRepository,
    R: RoleRepository,
{
    role_repo.ensure_roles(&config.role_presets).await?;
    let roles = role_repo.list().await?.len();
    tracing::info!(roles, "Role presets provisioned");

    let Some(superuser) = &config.superuser else {
        return Ok(BootstrapReport {
            roles,
            superuser_created: false,
        });
    };

    if directory.lookup_by_email(&superuser.email).await?.is_some() {
        tracing::debug!(email = %superuser.email, "Superuser already present");
        return Ok(BootstrapReport {
            roles,
            superuser_created: false,
        });
    }

    let level = config.role_presets.highest().level;
    let identity = directory
        .create_account_with_level(
            &superuser.email,
            superuser.password.clone(),
            Some(SUPERUSER_FULL_NAME.to_string()),
            level,
        )
        .await?;

    tracing::info!(
        email = %identity.email,
        role_level = level,
        "Superuser created"
    );

    Ok(BootstrapReport {
        roles,
        superuser_created: true,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use platform::password::{CredentialHasher, HashingParams};

    use super::*;
    use crate::application::config::SuperuserConfig;
    use crate::domain::role_presets::RolePresets;
    use crate::error::RbacError;
    use crate::infra::memory::InMemoryStore;

    fn setup(config: AuthConfig) -> (UserDirectoryService<InMemoryStore, InMemoryStore>, Arc<InMemoryStore>, Arc<AuthConfig>) {
        let config = Arc::new(config);
        let store = Arc::new(InMemoryStore::new());
        let hasher = Arc::new(CredentialHasher::new(HashingParams::minimal(), None).unwrap());
        let directory = UserDirectoryService::new(
            Arc::clone(&store),
            Arc::clone(&store),
            hasher,
            Arc::clone(&config),
        );
        (directory, store, config)
    }

    fn with_superuser() -> AuthConfig {
        AuthConfig {
            superuser: Some(SuperuserConfig {
                email: "admin@example.com".to_string(),
                password: "AdminPassword1".to_string(),
            }),
            ..AuthConfig::new("bootstrap-secret")
        }
    }

    #[tokio::test]
    async fn test_bootstrap_is_idempotent() {
        let (directory, store, config) = setup(with_superuser());

        let first = bootstrap(&directory, store.as_ref(), &config).await.unwrap();
        assert_eq!(first, BootstrapReport { roles: 5, superuser_created: true });

        let second = bootstrap(&directory, store.as_ref(), &config).await.unwrap();
        assert_eq!(second, BootstrapReport { roles: 5, superuser_created: false });

        let admin = directory
            .lookup_by_email("admin@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(admin.role_levels.to_vec(), vec![5]);
        assert_eq!(admin.full_name.as_deref(), Some("System Administrator"));
        assert_eq!(directory.list_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_bootstrap_without_superuser() {
        let (directory, store, config) = setup(AuthConfig::new("bootstrap-secret"));
        let report = bootstrap(&directory, store.as_ref(), &config).await.unwrap();
        assert_eq!(report, BootstrapReport { roles: 5, superuser_created: false });
        assert!(directory.list_users().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_bootstrap_custom_presets() {
        let config = AuthConfig {
            role_presets: RolePresets::new([(10, "Member"), (20, "Owner")]).unwrap(),
            ..with_superuser()
        };
        let (directory, store, config) = setup(config);
        bootstrap(&directory, store.as_ref(), &config).await.unwrap();

        let admin = directory
            .lookup_by_email("admin@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(admin.role_levels.to_vec(), vec![20]);
    }

    #[tokio::test]
    async fn test_bootstrap_rejects_weak_superuser_password() {
        let config = AuthConfig {
            superuser: Some(SuperuserConfig {
                email: "admin@example.com".to_string(),
                password: "short".to_string(),
            }),
            ..AuthConfig::new("bootstrap-secret")
        };
        let (directory, store, config) = setup(config);
        assert!(matches!(
            bootstrap(&directory, store.as_ref(), &config).await,
            Err(RbacError::PasswordValidation(_))
        ));
    }
}
