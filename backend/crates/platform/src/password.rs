//! Password Hashing and Verification
//!
//! One-way credential hashing with:
//! - Argon2id (memory-hard, recommended by OWASP), PHC string output
//! - A fresh random salt on every call
//! - Zeroization of clear text and peppered buffers
//! - Constant-time verification (delegated to `argon2`)
//!
//! The hasher itself enforces no length policy. Registration flows call
//! [`check_policy`] before hashing.

use std::fmt;

use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version,
    password_hash::SaltString,
};
use rand::rngs::OsRng;
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Minimum password length accepted at registration
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Password used to build the decoy digest. Never stored anywhere.
const DECOY_PASSWORD: &str = "decoy-password-for-unknown-accounts";

// ============================================================================
// Error Types
// ============================================================================

/// Password policy violation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PasswordPolicyError {
    /// Password is too short
    #[error("Password must be at least {min} characters (got {actual})")]
    TooShort { min: usize, actual: usize },

    /// Password contains only whitespace
    #[error("Password cannot be empty or contain only whitespace")]
    EmptyOrWhitespace,
}

/// Password hashing errors
#[derive(Debug, Error)]
pub enum PasswordHashError {
    /// Hashing operation failed
    #[error("Password hashing failed: {0}")]
    HashingFailed(String),

    /// Argon2 parameters out of range
    #[error("Invalid hashing parameters: {0}")]
    InvalidParams(String),

    /// Invalid hash format
    #[error("Invalid password hash format")]
    InvalidHashFormat,
}

// ============================================================================
// Clear Text Password (Zeroized on drop)
// ============================================================================

/// Clear text password with automatic memory zeroization
///
/// Input is NFKC-normalized so that visually identical passwords typed on
/// different platforms hash the same way.
///
/// ## Security
/// - Implements `Zeroize` and `ZeroizeOnDrop`
/// - Does not implement `Clone`
/// - Debug output is redacted
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct ClearTextPassword(String);

impl ClearTextPassword {
    pub fn new(raw: impl Into<String>) -> Self {
        let mut raw = raw.into();
        let normalized: String = raw.nfkc().collect();
        raw.zeroize();
        Self(normalized)
    }

    /// Number of Unicode code points
    pub fn char_count(&self) -> usize {
        self.0.chars().count()
    }

    fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    fn peppered(&self, pepper: Option<&[u8]>) -> Zeroizing<Vec<u8>> {
        let mut bytes = self.as_bytes().to_vec();
        if let Some(p) = pepper {
            bytes.extend_from_slice(p);
        }
        Zeroizing::new(bytes)
    }
}

impl fmt::Debug for ClearTextPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ClearTextPassword")
            .field(&"[REDACTED]")
            .finish()
    }
}

/// Registration-time password policy: at least [`MIN_PASSWORD_LENGTH`]
/// code points and not blank.
pub fn check_policy(password: &ClearTextPassword) -> Result<(), PasswordPolicyError> {
    if password.0.trim().is_empty() {
        return Err(PasswordPolicyError::EmptyOrWhitespace);
    }

    let actual = password.char_count();
    if actual < MIN_PASSWORD_LENGTH {
        return Err(PasswordPolicyError::TooShort {
            min: MIN_PASSWORD_LENGTH,
            actual,
        });
    }

    Ok(())
}

// ============================================================================
// Hashed Password (Safe to store)
// ============================================================================

/// Hashed password in PHC string format
///
/// The PHC string embeds algorithm, version, parameters and salt, so a
/// digest stays verifiable after the configured parameters change.
#[derive(Clone, PartialEq, Eq)]
pub struct HashedPassword {
    hash: String,
}

impl HashedPassword {
    /// Create from PHC string (e.g., from database)
    pub fn from_phc_string(s: impl Into<String>) -> Result<Self, PasswordHashError> {
        let hash = s.into();
        PasswordHash::new(&hash).map_err(|_| PasswordHashError::InvalidHashFormat)?;
        Ok(Self { hash })
    }

    pub fn as_phc_string(&self) -> &str {
        &self.hash
    }

    pub fn into_phc_string(self) -> String {
        self.hash
    }
}

impl fmt::Debug for HashedPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashedPassword")
            .field("hash", &"[HASH]")
            .finish()
    }
}

// ============================================================================
// Hashing parameters
// ============================================================================

/// Argon2id cost parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashingParams {
    /// Memory cost in KiB
    pub memory_kib: u32,
    /// Number of passes
    pub iterations: u32,
    /// Degree of parallelism
    pub parallelism: u32,
}

impl Default for HashingParams {
    /// OWASP recommended Argon2id parameters: m=19456 (19 MiB), t=2, p=1
    fn default() -> Self {
        Self {
            memory_kib: 19_456,
            iterations: 2,
            parallelism: 1,
        }
    }
}

impl HashingParams {
    /// Smallest parameters argon2 accepts. Only for tests and local
    /// development; far too cheap for production.
    pub const fn minimal() -> Self {
        Self {
            memory_kib: 8,
            iterations: 1,
            parallelism: 1,
        }
    }

    fn to_argon2(self) -> Result<Argon2<'static>, PasswordHashError> {
        let params = Params::new(self.memory_kib, self.iterations, self.parallelism, None)
            .map_err(|e| PasswordHashError::InvalidParams(e.to_string()))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

// ============================================================================
// Credential Hasher
// ============================================================================

/// Hashes and verifies credentials with fixed parameters and an optional
/// application-wide pepper.
///
/// Hashing is CPU-bound and intentionally slow; async callers should run it
/// on a blocking thread.
#[derive(Clone)]
pub struct CredentialHasher {
    argon2: Argon2<'static>,
    pepper: Option<Zeroizing<Vec<u8>>>,
    decoy: HashedPassword,
}

impl CredentialHasher {
    pub fn new(params: HashingParams, pepper: Option<Vec<u8>>) -> Result<Self, PasswordHashError> {
        let argon2 = params.to_argon2()?;
        let pepper = pepper.map(Zeroizing::new);

        let decoy_password = ClearTextPassword::new(DECOY_PASSWORD);
        let decoy = hash_with(&argon2, pepper.as_deref().map(Vec::as_slice), &decoy_password)?;

        Ok(Self {
            argon2,
            pepper,
            decoy,
        })
    }

    fn pepper(&self) -> Option<&[u8]> {
        self.pepper.as_deref().map(Vec::as_slice)
    }

    /// Hash a password with a fresh random salt.
    pub fn hash(&self, password: &ClearTextPassword) -> Result<HashedPassword, PasswordHashError> {
        hash_with(&self.argon2, self.pepper(), password)
    }

    /// Check a password against a stored PHC digest.
    ///
    /// A malformed digest verifies as `false`.
    pub fn verify(&self, password: &ClearTextPassword, digest: &str) -> bool {
        let parsed_hash = match PasswordHash::new(digest) {
            Ok(h) => h,
            Err(_) => return false,
        };

        let password_bytes = password.peppered(self.pepper());

        // Argon2 uses constant-time comparison internally
        self.argon2
            .verify_password(&password_bytes, &parsed_hash)
            .is_ok()
    }

    /// Spend the same work as [`verify`](Self::verify) without a real
    /// account behind it. Always `false`.
    pub fn verify_decoy(&self, password: &ClearTextPassword) -> bool {
        let _ = self.verify(password, self.decoy.as_phc_string());
        false
    }
}

impl fmt::Debug for CredentialHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialHasher")
            .field("pepper", &self.pepper.as_ref().map(|_| "[REDACTED]"))
            .finish_non_exhaustive()
    }
}

fn hash_with(
    argon2: &Argon2<'static>,
    pepper: Option<&[u8]>,
    password: &ClearTextPassword,
) -> Result<HashedPassword, PasswordHashError> {
    let password_bytes = password.peppered(pepper);

    // Generate random salt (128 bits = 16 bytes)
    let salt = SaltString::generate(OsRng);

    let hash = argon2
        .hash_password(&password_bytes, &salt)
        .map_err(|e| PasswordHashError::HashingFailed(e.to_string()))?;

    Ok(HashedPassword {
        hash: hash.to_string(),
    })
}

// ============================================================================
// Tests
// ============================================================================
