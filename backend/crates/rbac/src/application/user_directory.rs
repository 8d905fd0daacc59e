//! User Directory Service
//!
//! Owns the account record and role association lifecycle: account
//! creation, lookups, and role assignment against the store.

use std::collections::HashMap;
use std::sync::Arc;

use platform::password::CredentialHasher;

use crate::application::config::AuthConfig;
use crate::application::events::{PermissionEventSink, PermissionGranted, TracingEventSink};
use crate::domain::entity::{
    identity::Identity,
    role::Role,
    user_record::{NewUser, UserRecord},
};
use crate::domain::repository::{RoleRepository, UserRepository};
use crate::domain::value_object::{
    email::Email, role_level::RoleLevel, user_id::UserId, user_password::RawPassword,
};
use crate::error::{RbacError, RbacResult};

/// User directory service
pub struct UserDirectoryService<U, R>
where
    U: UserRepository,
    R: RoleRepository,
{
    user_repo: Arc<U>,
    role_repo: Arc<R>,
    hasher: Arc<CredentialHasher>,
    config: Arc<AuthConfig>,
    events: Arc<dyn PermissionEventSink>,
}

impl<U, R> Clone for UserDirectoryService<U, R>
where
    U: UserRepository,
    R: RoleRepository,
{
    fn clone(&self) -> Self {
        Self {
            user_repo: Arc::clone(&self.user_repo),
            role_repo: Arc::clone(&self.role_repo),
            hasher: Arc::clone(&self.hasher),
            config: Arc::clone(&self.config),
            events: Arc::clone(&self.events),
        }
    }
}

impl<U, R> UserDirectoryService<U, R>
where
    U: UserRepository,
    R: RoleRepository,
{
    pub fn new(
        user_repo: Arc<U>,
        role_repo: Arc<R>,
        hasher: Arc<CredentialHasher>,
        config: Arc<AuthConfig>,
    ) -> Self {
        Self {
            user_repo,
            role_repo,
            hasher,
            config,
            events: Arc::new(TracingEventSink),
        }
    }

    /// Replace the permission event sink
    pub fn with_event_sink(mut self, events: Arc<dyn PermissionEventSink>) -> Self {
        self.events = events;
        self
    }

    /// Create an account holding the configured default role.
    ///
    /// ## Errors
    /// - `InvalidEmail` on malformed email
    /// - `PasswordValidation` when the password violates the policy
    /// - `DuplicateEmail` when the email is already registered
    pub async fn create_account(
        &self,
        email: &str,
        password: String,
        full_name: Option<String>,
    ) -> RbacResult<Identity> {
        self.create_account_with_level(email, password, full_name, self.config.default_role_level)
            .await
    }

    /// Create an account holding the role at `level`.
    ///
    /// A missing role is not an error: the account is created without roles.
    pub async fn create_account_with_level(
        &self,
        email: &str,
        password: String,
        full_name: Option<String>,
        level: RoleLevel,
    ) -> RbacResult<Identity> {
        let email = Email::new(email)?;
        let password = RawPassword::new(password)?;

        if self.user_repo.find_by_email(&email).await?.is_some() {
            return Err(RbacError::DuplicateEmail);
        }

        let password_hash = self.hash_password(password).await?;

        let roles: Vec<Role> = match self.role_repo.find_by_level(level).await? {
            Some(role) => vec![role],
            None => {
                tracing::warn!(
                    role_level = level,
                    email = %email,
                    "Initial role missing, creating account without roles"
                );
                Vec::new()
            }
        };
        let role_ids = roles.iter().filter_map(|role| role.id).collect();

        let full_name = full_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty());

        // The store rejects a concurrent duplicate that slipped past the check
        let record = self
            .user_repo
            .create(NewUser::new(email, password_hash, full_name, role_ids))
            .await?;

        tracing::info!(
            user_id = %record.id,
            email = %record.email,
            role_level = ?roles.first().map(|role| role.level),
            "Account created"
        );

        Ok(Identity::from_record(&record).attach_roles(&roles))
    }

    /// Identity for an exact email, `None` when absent or malformed
    pub async fn lookup_by_email(&self, email: &str) -> RbacResult<Option<Identity>> {
        let Ok(email) = Email::new(email) else {
            return Ok(None);
        };
        match self.user_repo.find_by_email(&email).await? {
            Some(record) => Ok(Some(self.to_identity(&record).await?)),
            None => Ok(None),
        }
    }

    /// Identity for an ID, `None` when absent
    pub async fn lookup_by_id(&self, user_id: UserId) -> RbacResult<Option<Identity>> {
        match self.user_repo.find_by_id(user_id).await? {
            Some(record) => Ok(Some(self.to_identity(&record).await?)),
            None => Ok(None),
        }
    }

    /// Every account, ascending by ID
    pub async fn list_users(&self) -> RbacResult<Vec<Identity>> {
        let records = self.user_repo.list().await?;
        let roles: HashMap<_, _> = self
            .role_repo
            .list()
            .await?
            .into_iter()
            .filter_map(|role| role.id.map(|id| (id, role)))
            .collect();

        Ok(records
            .iter()
            .map(|record| {
                Identity::from_record(record)
                    .attach_roles(record.role_ids.iter().filter_map(|id| roles.get(id)))
            })
            .collect())
    }

    /// Grant the role at `level` to a user. Granting a held role is a no-op.
    ///
    /// ## Errors
    /// - `UserNotFound` when no user has `user_id`
    /// - `RoleNotFound` when no role has `level`
    pub async fn assign_role(&self, user_id: UserId, level: RoleLevel) -> RbacResult<Identity> {
        let user = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .ok_or(RbacError::UserNotFound)?;
        let role = self
            .role_repo
            .find_by_level(level)
            .await?
            .ok_or(RbacError::RoleNotFound)?;
        let role_id = role
            .id
            .ok_or_else(|| RbacError::Internal(format!("Role at level {level} has no ID")))?;

        let newly_granted = !user.role_ids.contains(&role_id);
        let updated = self.user_repo.add_role(user.id, role_id).await?;

        if newly_granted {
            self.events
                .permission_granted(&PermissionGranted::now(updated.id, level));
        } else {
            tracing::debug!(user_id = %updated.id, role_level = level, "Role already held");
        }

        self.to_identity(&updated).await
    }

    /// All roles, ascending by level
    pub async fn list_roles(&self) -> RbacResult<Vec<Role>> {
        self.role_repo.list().await
    }

    /// Stored record for a login attempt. Roles are resolved separately,
    /// once the password has been verified.
    pub(crate) async fn find_record(&self, email: &Email) -> RbacResult<Option<UserRecord>> {
        self.user_repo.find_by_email(email).await
    }

    pub(crate) async fn to_identity(&self, record: &UserRecord) -> RbacResult<Identity> {
        let roles = self.role_repo.find_by_ids(&record.role_ids).await?;
        Ok(Identity::from_record(record).attach_roles(&roles))
    }

    async fn hash_password(&self, password: RawPassword) -> RbacResult<String> {
        let hasher = Arc::clone(&self.hasher);
        let hashed = tokio::task::spawn_blocking(move || hasher.hash(password.inner())).await??;
        Ok(hashed.into_phc_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::events::testing::RecordingSink;
    use crate::infra::memory::InMemoryStore;
    use platform::password::HashingParams;

    async fn directory_with(
        config: AuthConfig,
    ) -> (UserDirectoryService<InMemoryStore, InMemoryStore>, Arc<RecordingSink>) {
        let store = Arc::new(InMemoryStore::new());
        store.ensure_roles(&config.role_presets).await.unwrap();
        let hasher = Arc::new(CredentialHasher::new(HashingParams::minimal(), None).unwrap());
        let sink = Arc::new(RecordingSink::default());
        let directory = UserDirectoryService::new(
            Arc::clone(&store),
            store,
            hasher,
            Arc::new(config),
        )
        .with_event_sink(sink.clone());
        (directory, sink)
    }

    async fn directory() -> (UserDirectoryService<InMemoryStore, InMemoryStore>, Arc<RecordingSink>) {
        directory_with(AuthConfig::new("test-secret")).await
    }

    #[tokio::test]
    async fn test_create_account_assigns_default_role() {
        let (directory, _) = directory().await;
        let identity = directory
            .create_account("alice@example.com", "Password123!".into(), Some("Alice".into()))
            .await
            .unwrap();

        assert!(identity.id.is_some());
        assert_eq!(identity.email.as_str(), "alice@example.com");
        assert_eq!(identity.full_name.as_deref(), Some("Alice"));
        assert!(identity.is_active);
        assert_eq!(identity.role_levels.to_vec(), vec![1]);
    }

    #[tokio::test]
    async fn test_create_account_without_default_role() {
        let config = AuthConfig {
            default_role_level: 42,
            ..AuthConfig::new("test-secret")
        };
        let (directory, _) = directory_with(config).await;
        let identity = directory
            .create_account("carol@example.com", "Password123!".into(), None)
            .await
            .unwrap();
        assert!(identity.role_levels.is_empty());
    }

    #[tokio::test]
    async fn test_create_account_rejections() {
        let (directory, _) = directory().await;
        assert!(matches!(
            directory.create_account("not-an-email", "Password123!".into(), None).await,
            Err(RbacError::InvalidEmail(_))
        ));
        assert!(matches!(
            directory.create_account("dave@example.com", "short".into(), None).await,
            Err(RbacError::PasswordValidation(_))
        ));

        directory
            .create_account("dave@example.com", "Password123!".into(), None)
            .await
            .unwrap();
        assert!(matches!(
            directory.create_account("dave@example.com", "Password456!".into(), None).await,
            Err(RbacError::DuplicateEmail)
        ));
    }

    #[tokio::test]
    async fn test_lookups_return_none_for_absent() {
        let (directory, _) = directory().await;
        assert!(directory.lookup_by_email("nobody@example.com").await.unwrap().is_none());
        assert!(directory.lookup_by_email("garbage").await.unwrap().is_none());
        assert!(directory.lookup_by_id(UserId::from_raw(999)).await.unwrap().is_none());

        let created = directory
            .create_account("erin@example.com", "Password123!".into(), None)
            .await
            .unwrap();
        let found = directory.lookup_by_id(created.id.unwrap()).await.unwrap();
        assert_eq!(found, Some(created.clone()));
        let found = directory.lookup_by_email("erin@example.com").await.unwrap();
        assert_eq!(found, Some(created));
    }

    #[tokio::test]
    async fn test_assign_role_is_idempotent() {
        let (directory, sink) = directory().await;
        let user = directory
            .create_account("frank@example.com", "Password123!".into(), None)
            .await
            .unwrap();
        let id = user.id.unwrap();

        let once = directory.assign_role(id, 4).await.unwrap();
        assert_eq!(once.role_levels.to_vec(), vec![1, 4]);
        let twice = directory.assign_role(id, 4).await.unwrap();
        assert_eq!(twice.role_levels, once.role_levels);

        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].user_id, id);
        assert_eq!(events[0].role_level, 4);
    }

    #[tokio::test]
    async fn test_assign_role_missing_targets() {
        let (directory, sink) = directory().await;
        assert!(matches!(
            directory.assign_role(UserId::from_raw(404), 1).await,
            Err(RbacError::UserNotFound)
        ));

        let user = directory
            .create_account("gina@example.com", "Password123!".into(), None)
            .await
            .unwrap();
        assert!(matches!(
            directory.assign_role(user.id.unwrap(), 99).await,
            Err(RbacError::RoleNotFound)
        ));
        assert!(sink.events().is_empty());
    }

    #[tokio::test]
    async fn test_list_users_and_roles() {
        let (directory, _) = directory().await;
        let a = directory
            .create_account("a@example.com", "Password123!".into(), None)
            .await
            .unwrap();
        directory
            .create_account("b@example.com", "Password123!".into(), None)
            .await
            .unwrap();
        directory.assign_role(a.id.unwrap(), 3).await.unwrap();

        let users = directory.list_users().await.unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].email.as_str(), "a@example.com");
        assert_eq!(users[0].role_levels.to_vec(), vec![1, 3]);
        assert_eq!(users[1].role_levels.to_vec(), vec![1]);

        let levels: Vec<_> = directory
            .list_roles()
            .await
            .unwrap()
            .iter()
            .map(|role| role.level)
            .collect();
        assert_eq!(levels, vec![1, 2, 3, 4, 5]);
    }
}
