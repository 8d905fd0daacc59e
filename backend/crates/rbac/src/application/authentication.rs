//! Authentication Service
//!
//! Verifies credentials, mints access tokens, and resolves tokens back to
//! an identity. Stateless per call: nothing is remembered between requests.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use platform::password::{ClearTextPassword, CredentialHasher};
use platform::token::{self, TokenCodec};
use serde::{Deserialize, Serialize};

use crate::application::config::AuthConfig;
use crate::application::user_directory::UserDirectoryService;
use crate::domain::entity::identity::Identity;
use crate::domain::repository::{RoleRepository, UserRepository};
use crate::domain::value_object::{email::Email, role_level::RoleLevel, user_id::UserId};
use crate::error::{RbacError, RbacResult};

/// Token type reported alongside issued tokens
pub const TOKEN_TYPE: &str = "bearer";

/// Claims carried next to `sub` and `exp`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    #[serde(default)]
    pub role_levels: Vec<RoleLevel>,
}

/// Issued access token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_at: DateTime<Utc>,
}

/// Authentication service
pub struct AuthenticationService<U, R>
where
    U: UserRepository,
    R: RoleRepository,
{
    directory: UserDirectoryService<U, R>,
    codec: Arc<TokenCodec>,
    hasher: Arc<CredentialHasher>,
    config: Arc<AuthConfig>,
}

impl<U, R> Clone for AuthenticationService<U, R>
where
    U: UserRepository,
    R: RoleRepository,
{
    fn clone(&self) -> Self {
        Self {
            directory: self.directory.clone(),
            codec: Arc::clone(&self.codec),
            hasher: Arc::clone(&self.hasher),
            config: Arc::clone(&self.config),
        }
    }
}

impl<U, R> AuthenticationService<U, R>
where
    U: UserRepository,
    R: RoleRepository,
{
    pub fn new(
        directory: UserDirectoryService<U, R>,
        codec: Arc<TokenCodec>,
        hasher: Arc<CredentialHasher>,
        config: Arc<AuthConfig>,
    ) -> Self {
        Self {
            directory,
            codec,
            hasher,
            config,
        }
    }

    pub fn directory(&self) -> &UserDirectoryService<U, R> {
        &self.directory
    }

    /// Create an account with the default role
    pub async fn register(
        &self,
        email: &str,
        password: String,
        full_name: Option<String>,
    ) -> RbacResult<Identity> {
        self.directory.create_account(email, password, full_name).await
    }

    /// Exchange credentials for an identity and a fresh token.
    ///
    /// ## Errors
    /// - `InvalidCredentials` for an unknown email or a wrong password; the
    ///   two cases are indistinguishable
    /// - `InactiveAccount` when the password is right but the account is
    ///   deactivated
    pub async fn authenticate(
        &self,
        email: &str,
        password: String,
    ) -> RbacResult<(Identity, AccessToken)> {
        let password = ClearTextPassword::new(password);

        // A malformed email cannot match any account
        let record = match Email::new(email) {
            Ok(email) => self.directory.find_record(&email).await?,
            Err(_) => None,
        };
        let digest = record.as_ref().map(|record| record.password_hash.clone());

        let verified = self.verify_password(password, digest).await?;
        let record = match record {
            Some(record) if verified => record,
            _ => {
                tracing::debug!("Credential verification failed");
                return Err(RbacError::InvalidCredentials);
            }
        };

        // Checked only after the password matched
        if !record.is_active {
            return Err(RbacError::InactiveAccount);
        }

        let identity = self.directory.to_identity(&record).await?;
        let token = self.issue_token(&identity)?;

        tracing::info!(
            user_id = ?identity.id.map(|id| id.as_i64()),
            role_levels = ?identity.role_levels.to_vec(),
            "User authenticated"
        );

        Ok((identity, token))
    }

    /// Identity named by a token's subject.
    ///
    /// `is_active` is not rechecked: a token issued before deactivation stays
    /// usable until it expires. Only a vanished subject is rejected.
    ///
    /// ## Errors
    /// - `InvalidToken` when decoding fails (including expiry) or the subject
    ///   is missing or not a user ID
    /// - `UserNotFound` when the subject no longer exists
    pub async fn resolve_token(&self, token: &str) -> RbacResult<Identity> {
        let decoded = self.codec.decode::<AccessClaims>(token).map_err(|e| {
            tracing::debug!(error = %e, "Token decode failed");
            RbacError::InvalidToken
        })?;

        let user_id: UserId = decoded
            .subject
            .as_deref()
            .ok_or(RbacError::InvalidToken)?
            .parse()
            .map_err(|_| RbacError::InvalidToken)?;

        self.directory
            .lookup_by_id(user_id)
            .await?
            .ok_or(RbacError::UserNotFound)
    }

    /// `true` when the token is expired or does not decode
    pub fn token_expired(&self, token: &str) -> bool {
        self.codec.is_expired(token)
    }

    fn issue_token(&self, identity: &Identity) -> RbacResult<AccessToken> {
        let user_id = identity
            .id
            .ok_or_else(|| RbacError::Internal("Cannot issue a token for an unsaved user".into()))?;

        let expires_at = token::expiry_after(self.config.access_token_expire_minutes)
            .map_err(|e| RbacError::Internal(e.to_string()))?;

        let claims = AccessClaims {
            role_levels: identity.role_levels.to_vec(),
        };
        let access_token = self
            .codec
            .encode_until(&user_id.to_string(), &claims, expires_at)
            .map_err(|e| RbacError::Internal(e.to_string()))?;

        Ok(AccessToken {
            access_token,
            token_type: TOKEN_TYPE,
            expires_at,
        })
    }

    /// Verify on a blocking thread. Without a digest the decoy is checked so
    /// unknown emails cost the same work as wrong passwords.
    async fn verify_password(
        &self,
        password: ClearTextPassword,
        digest: Option<String>,
    ) -> RbacResult<bool> {
        let hasher = Arc::clone(&self.hasher);
        let verified = tokio::task::spawn_blocking(move || match digest {
            Some(digest) => hasher.verify(&password, &digest),
            None => hasher.verify_decoy(&password),
        })
        .await?;
        Ok(verified)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::role::Role;
    use crate::domain::role_presets::RolePresets;
    use crate::domain::value_object::user_id::RoleId;
    use crate::infra::memory::InMemoryStore;
    use chrono::Duration;
    use platform::password::HashingParams;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const SECRET: &str = "authentication-test-secret";

    async fn service() -> (AuthenticationService<InMemoryStore, InMemoryStore>, Arc<InMemoryStore>) {
        service_with(AuthConfig::new(SECRET)).await
    }

    async fn service_with(
        config: AuthConfig,
    ) -> (AuthenticationService<InMemoryStore, InMemoryStore>, Arc<InMemoryStore>) {
        let config = Arc::new(config);
        let store = Arc::new(InMemoryStore::new());
        store.ensure_roles(&config.role_presets).await.unwrap();
        let hasher = Arc::new(CredentialHasher::new(HashingParams::minimal(), None).unwrap());
        let codec = Arc::new(config.token_codec().unwrap());
        let directory = UserDirectoryService::new(
            Arc::clone(&store),
            Arc::clone(&store),
            Arc::clone(&hasher),
            Arc::clone(&config),
        );
        (
            AuthenticationService::new(directory, codec, hasher, config),
            store,
        )
    }

    /// Role store that counts membership lookups
    struct CountingRoles {
        inner: Arc<InMemoryStore>,
        lookups: AtomicUsize,
    }

    impl RoleRepository for CountingRoles {
        async fn find_by_level(&self, level: RoleLevel) -> RbacResult<Option<Role>> {
            self.inner.find_by_level(level).await
        }

        async fn find_by_name(&self, name: &str) -> RbacResult<Option<Role>> {
            self.inner.find_by_name(name).await
        }

        async fn find_by_ids(&self, ids: &[RoleId]) -> RbacResult<Vec<Role>> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            self.inner.find_by_ids(ids).await
        }

        async fn list(&self) -> RbacResult<Vec<Role>> {
            RoleRepository::list(self.inner.as_ref()).await
        }

        async fn ensure_roles(&self, presets: &RolePresets) -> RbacResult<()> {
            self.inner.ensure_roles(presets).await
        }
    }

    #[tokio::test]
    async fn test_authenticate_issues_resolvable_token() {
        let (auth, _) = service().await;
        let registered = auth
            .register("alice@example.com", "Password123!".into(), None)
            .await
            .unwrap();

        let (identity, token) = auth
            .authenticate("alice@example.com", "Password123!".into())
            .await
            .unwrap();
        assert_eq!(identity, registered);
        assert_eq!(token.token_type, "bearer");
        assert!(token.expires_at > Utc::now() + Duration::minutes(29));
        assert!(token.expires_at <= Utc::now() + Duration::minutes(30));
        assert!(!auth.token_expired(&token.access_token));

        let resolved = auth.resolve_token(&token.access_token).await.unwrap();
        assert_eq!(resolved.email.as_str(), "alice@example.com");
        assert_eq!(resolved.role_levels.to_vec(), vec![1]);
    }

    #[tokio::test]
    async fn test_token_payload_shape() {
        let (auth, _) = service().await;
        let user = auth
            .register("pat@example.com", "Password123!".into(), None)
            .await
            .unwrap();
        let (_, token) = auth
            .authenticate("pat@example.com", "Password123!".into())
            .await
            .unwrap();

        let codec = TokenCodec::new(SECRET, platform::token::DEFAULT_ALGORITHM).unwrap();
        let decoded = codec
            .decode::<serde_json::Map<String, serde_json::Value>>(&token.access_token)
            .unwrap();
        assert_eq!(decoded.subject, Some(user.id.unwrap().to_string()));
        assert_eq!(decoded.claims["role_levels"], serde_json::json!([1]));
        assert_eq!(decoded.expires_at, token.expires_at);
    }

    #[tokio::test]
    async fn test_unknown_email_and_wrong_password_look_the_same() {
        let (auth, _) = service().await;
        auth.register("bob@example.com", "Password123!".into(), None)
            .await
            .unwrap();

        let wrong_password = auth
            .authenticate("bob@example.com", "WrongPassword!".into())
            .await
            .unwrap_err();
        let unknown_email = auth
            .authenticate("nobody@example.com", "Password123!".into())
            .await
            .unwrap_err();
        let malformed_email = auth
            .authenticate("not-an-email", "Password123!".into())
            .await
            .unwrap_err();

        assert!(matches!(wrong_password, RbacError::InvalidCredentials));
        assert!(matches!(unknown_email, RbacError::InvalidCredentials));
        assert!(matches!(malformed_email, RbacError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
    }

    #[tokio::test]
    async fn test_inactive_only_reported_after_password_check() {
        let (auth, store) = service().await;
        let user = auth
            .register("ivy@example.com", "Password123!".into(), None)
            .await
            .unwrap();
        store.set_active(user.id.unwrap(), false).await.unwrap();

        assert!(matches!(
            auth.authenticate("ivy@example.com", "WrongPassword!".into()).await,
            Err(RbacError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.authenticate("ivy@example.com", "Password123!".into()).await,
            Err(RbacError::InactiveAccount)
        ));
    }

    #[tokio::test]
    async fn test_resolve_token_does_not_recheck_active() {
        let (auth, store) = service().await;
        let user = auth
            .register("jay@example.com", "Password123!".into(), None)
            .await
            .unwrap();
        let (_, token) = auth
            .authenticate("jay@example.com", "Password123!".into())
            .await
            .unwrap();
        store.set_active(user.id.unwrap(), false).await.unwrap();

        let resolved = auth.resolve_token(&token.access_token).await.unwrap();
        assert!(!resolved.is_active);
    }

    #[tokio::test]
    async fn test_resolve_token_failures() {
        let (auth, _) = service().await;
        let codec = TokenCodec::new(SECRET, platform::token::DEFAULT_ALGORITHM).unwrap();
        let claims = AccessClaims::default();

        assert!(matches!(
            auth.resolve_token("garbage").await,
            Err(RbacError::InvalidToken)
        ));

        let other = TokenCodec::new("another-secret", platform::token::DEFAULT_ALGORITHM).unwrap();
        let forged = other.encode("1", &claims, 5).unwrap();
        assert!(matches!(auth.resolve_token(&forged).await, Err(RbacError::InvalidToken)));

        let not_numeric = codec.encode("alice", &claims, 5).unwrap();
        assert!(matches!(
            auth.resolve_token(&not_numeric).await,
            Err(RbacError::InvalidToken)
        ));

        let vanished = codec.encode("999", &claims, 5).unwrap();
        assert!(matches!(
            auth.resolve_token(&vanished).await,
            Err(RbacError::UserNotFound)
        ));
    }

    #[tokio::test]
    async fn test_resolve_token_without_subject() {
        #[derive(Serialize)]
        struct NoSubject {
            exp: i64,
            role_levels: Vec<RoleLevel>,
        }

        let (auth, _) = service().await;
        auth.register("sam@example.com", "Password123!".into(), None)
            .await
            .unwrap();

        // Correctly signed and unexpired, but names nobody
        let token = jsonwebtoken::encode(
            &jsonwebtoken::Header::new(platform::token::DEFAULT_ALGORITHM),
            &NoSubject {
                exp: (Utc::now() + Duration::minutes(5)).timestamp(),
                role_levels: vec![5],
            },
            &jsonwebtoken::EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert!(!auth.token_expired(&token));
        assert!(matches!(auth.resolve_token(&token).await, Err(RbacError::InvalidToken)));
    }

    #[tokio::test]
    async fn test_oversized_lifetime_fails_without_panicking() {
        let mut config = AuthConfig::new(SECRET);
        config.access_token_expire_minutes = 1_000_000_000_000;
        let (auth, _) = service_with(config).await;
        auth.register("max@example.com", "Password123!".into(), None)
            .await
            .unwrap();

        assert!(matches!(
            auth.authenticate("max@example.com", "Password123!".into()).await,
            Err(RbacError::Internal(_))
        ));
    }

    #[tokio::test]
    async fn test_roles_loaded_only_after_password_verified() {
        let config = Arc::new(AuthConfig::new(SECRET));
        let store = Arc::new(InMemoryStore::new());
        store.ensure_roles(&config.role_presets).await.unwrap();
        let roles = Arc::new(CountingRoles {
            inner: Arc::clone(&store),
            lookups: AtomicUsize::new(0),
        });
        let hasher = Arc::new(CredentialHasher::new(HashingParams::minimal(), None).unwrap());
        let directory = UserDirectoryService::new(
            Arc::clone(&store),
            Arc::clone(&roles),
            Arc::clone(&hasher),
            Arc::clone(&config),
        );
        let codec = Arc::new(config.token_codec().unwrap());
        let auth = AuthenticationService::new(directory, codec, hasher, config);

        auth.register("nia@example.com", "Password123!".into(), None)
            .await
            .unwrap();
        roles.lookups.store(0, Ordering::SeqCst);

        let _ = auth.authenticate("nia@example.com", "WrongPassword!".into()).await;
        let _ = auth.authenticate("nobody@example.com", "Password123!".into()).await;
        assert_eq!(roles.lookups.load(Ordering::SeqCst), 0);

        let (identity, _) = auth
            .authenticate("nia@example.com", "Password123!".into())
            .await
            .unwrap();
        assert_eq!(roles.lookups.load(Ordering::SeqCst), 1);
        assert_eq!(identity.role_levels.to_vec(), vec![1]);
    }

    #[tokio::test]
    async fn test_token_expiring_now_is_rejected() {
        let (auth, _) = service().await;
        let user = auth
            .register("kim@example.com", "Password123!".into(), None)
            .await
            .unwrap();
        let codec = TokenCodec::new(SECRET, platform::token::DEFAULT_ALGORITHM).unwrap();
        let token = codec
            .encode_until(&user.id.unwrap().to_string(), &AccessClaims::default(), Utc::now())
            .unwrap();

        assert!(auth.token_expired(&token));
        assert!(matches!(auth.resolve_token(&token).await, Err(RbacError::InvalidToken)));
    }

    #[tokio::test]
    async fn test_store_lookup_by_email_is_exact() {
        let (auth, store) = service().await;
        auth.register("Liz@Example.com", "Password123!".into(), None)
            .await
            .unwrap();
        let exact = Email::from_db("Liz@Example.com");
        assert!(store.find_by_email(&exact).await.unwrap().is_some());
        assert!(matches!(
            auth.authenticate("liz@example.com", "Password123!".into()).await,
            Err(RbacError::InvalidCredentials)
        ));
    }
}
