//! Application Configuration
//!
//! Process-wide settings, built once at startup and shared as
//! `Arc<AuthConfig>`. Read-only after construction.

use std::fmt;

use platform::bearer::TokenCookie;
use platform::password::{CredentialHasher, HashingParams};
use platform::token::{self, Algorithm, DEFAULT_ALGORITHM, TokenCodec};

use crate::domain::role_presets::RolePresets;
use crate::domain::value_object::role_level::RoleLevel;
use crate::error::{RbacError, RbacResult};

/// Default access token lifetime
pub const DEFAULT_ACCESS_TOKEN_EXPIRE_MINUTES: i64 = 30;

/// Level of the role attached to new accounts
pub const DEFAULT_ROLE_LEVEL: RoleLevel = 1;

/// Display name of the seeded superuser
pub const SUPERUSER_FULL_NAME: &str = "System Administrator";

/// Account seeded at startup with the highest preset role
#[derive(Clone)]
pub struct SuperuserConfig {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for SuperuserConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SuperuserConfig")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// RBAC application configuration
#[derive(Clone)]
pub struct AuthConfig {
    /// Shared token signing secret (required)
    pub secret_key: String,
    /// HMAC algorithm for tokens
    pub algorithm: Algorithm,
    /// Access token lifetime, at least one minute
    pub access_token_expire_minutes: i64,
    /// Role attached at registration, if it exists
    pub default_role_level: RoleLevel,
    /// Password pepper (optional, application-wide secret)
    pub password_pepper: Option<Vec<u8>>,
    /// Argon2 cost parameters
    pub hashing: HashingParams,
    /// Cookie the login endpoint sets alongside the JSON token
    pub token_cookie: TokenCookie,
    pub superuser: Option<SuperuserConfig>,
    pub role_presets: RolePresets,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret_key: String::new(),
            algorithm: DEFAULT_ALGORITHM,
            access_token_expire_minutes: DEFAULT_ACCESS_TOKEN_EXPIRE_MINUTES,
            default_role_level: DEFAULT_ROLE_LEVEL,
            password_pepper: None,
            hashing: HashingParams::default(),
            token_cookie: TokenCookie::default(),
            superuser: None,
            role_presets: RolePresets::default(),
        }
    }
}

impl AuthConfig {
    /// Defaults with the given signing secret
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            secret_key: secret_key.into(),
            ..Default::default()
        }
    }

    /// Create config for development (random secret, insecure cookie)
    pub fn development() -> Self {
        Self {
            token_cookie: TokenCookie {
                secure: false,
                ..TokenCookie::default()
            },
            ..Self::new(token::generate_secret())
        }
    }

    /// Load from process environment variables.
    ///
    /// | Variable | Default |
    /// |---|---|
    /// | `SECRET_KEY` | required |
    /// | `ALGORITHM` | `HS256` |
    /// | `ACCESS_TOKEN_EXPIRE_MINUTES` | `30` |
    /// | `DEFAULT_ROLE_LEVEL` | `1` |
    /// | `PASSWORD_PEPPER` | none |
    /// | `SUPERUSER_EMAIL` / `SUPERUSER_PASSWORD` | none |
    /// | `COOKIE_SECURE` | `true` |
    pub fn from_env() -> RbacResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> RbacResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let secret_key = get("SECRET_KEY")
            .ok_or_else(|| RbacError::Config("SECRET_KEY must be set".to_string()))?;

        let algorithm = match get("ALGORITHM") {
            Some(name) => {
                token::parse_algorithm(&name).map_err(|e| RbacError::Config(e.to_string()))?
            }
            None => DEFAULT_ALGORITHM,
        };

        let access_token_expire_minutes = match get("ACCESS_TOKEN_EXPIRE_MINUTES") {
            Some(v) => parse_number("ACCESS_TOKEN_EXPIRE_MINUTES", &v)?,
            None => DEFAULT_ACCESS_TOKEN_EXPIRE_MINUTES,
        };

        let default_role_level = match get("DEFAULT_ROLE_LEVEL") {
            Some(v) => parse_number("DEFAULT_ROLE_LEVEL", &v)?,
            None => DEFAULT_ROLE_LEVEL,
        };

        let superuser = match (get("SUPERUSER_EMAIL"), get("SUPERUSER_PASSWORD")) {
            (Some(email), Some(password)) => Some(SuperuserConfig { email, password }),
            (None, None) => None,
            _ => {
                return Err(RbacError::Config(
                    "SUPERUSER_EMAIL and SUPERUSER_PASSWORD must be set together".to_string(),
                ));
            }
        };

        let cookie_secure = match get("COOKIE_SECURE") {
            Some(v) => parse_bool("COOKIE_SECURE", &v)?,
            None => true,
        };

        let config = Self {
            secret_key,
            algorithm,
            access_token_expire_minutes,
            default_role_level,
            password_pepper: get("PASSWORD_PEPPER").map(String::into_bytes),
            token_cookie: TokenCookie {
                secure: cookie_secure,
                ..TokenCookie::default()
            },
            superuser,
            ..Default::default()
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the services cannot run with
    pub fn validate(&self) -> RbacResult<()> {
        if self.secret_key.is_empty() {
            return Err(RbacError::Config("SECRET_KEY must not be empty".to_string()));
        }
        if !(1..=token::MAX_TTL_MINUTES).contains(&self.access_token_expire_minutes) {
            return Err(RbacError::Config(format!(
                "ACCESS_TOKEN_EXPIRE_MINUTES must be between 1 and {} (got {})",
                token::MAX_TTL_MINUTES,
                self.access_token_expire_minutes
            )));
        }
        if let Some(superuser) = &self.superuser
            && (superuser.email.trim().is_empty() || superuser.password.is_empty())
        {
            return Err(RbacError::Config(
                "Superuser email and password must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Get password pepper as slice
    pub fn pepper(&self) -> Option<&[u8]> {
        self.password_pepper.as_deref()
    }

    /// Access token lifetime in seconds
    pub fn access_token_ttl_secs(&self) -> i64 {
        self.access_token_expire_minutes.saturating_mul(60)
    }

    /// Token codec for the configured secret and algorithm
    pub fn token_codec(&self) -> RbacResult<TokenCodec> {
        TokenCodec::new(&self.secret_key, self.algorithm).map_err(|e| RbacError::Config(e.to_string()))
    }

    /// Credential hasher for the configured parameters and pepper
    pub fn credential_hasher(&self) -> RbacResult<CredentialHasher> {
        CredentialHasher::new(self.hashing, self.password_pepper.clone())
            .map_err(|e| RbacError::Config(e.to_string()))
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("secret_key", &"[REDACTED]")
            .field("algorithm", &self.algorithm)
            .field("access_token_expire_minutes", &self.access_token_expire_minutes)
            .field("default_role_level", &self.default_role_level)
            .field("password_pepper", &self.password_pepper.as_ref().map(|_| "[REDACTED]"))
            .field("hashing", &self.hashing)
            .field("token_cookie", &self.token_cookie)
            .field("superuser", &self.superuser)
            .field("role_presets", &self.role_presets)
            .finish()
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> RbacResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| RbacError::Config(format!("{key} must be an integer (got {value:?})")))
}

fn parse_bool(key: &str, value: &str) -> RbacResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(RbacError::Config(format!("{key} must be a boolean (got {value:?})"))),
    }
}
