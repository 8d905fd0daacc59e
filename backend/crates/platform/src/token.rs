//! Access Token Codec
//!
//! Compact, signed, expiring tokens (JWT, HMAC family) carrying a subject
//! and arbitrary claims. Verification is stateless: signature plus expiry.
//!
//! ## Expiry
//! A token is expired once `exp <= now`. An expired token is rejected by
//! [`TokenCodec::decode`] exactly like a forged one; callers that only want
//! the yes/no answer use [`TokenCodec::is_expired`].

use std::fmt;

use base64::{Engine, engine::general_purpose};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use rand::{RngCore, rngs::OsRng};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;

pub use jsonwebtoken::Algorithm;

/// Default signing algorithm
pub const DEFAULT_ALGORITHM: Algorithm = Algorithm::HS256;

/// Longest accepted token lifetime (one year)
pub const MAX_TTL_MINUTES: i64 = 60 * 24 * 365;

/// Token errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// Only shared-secret (HMAC) algorithms are supported
    #[error("Unsupported token algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Token secret must not be empty")]
    EmptySecret,

    #[error("Token lifetime must be between 1 and {max} minutes (got {0})", max = MAX_TTL_MINUTES)]
    InvalidTtl(i64),

    #[error("Token has expired")]
    Expired,

    #[error("Token signature is invalid")]
    InvalidSignature,

    /// Structurally invalid, wrong algorithm, or undecodable payload
    #[error("Malformed token: {0}")]
    Malformed(String),

    #[error("Failed to sign token: {0}")]
    Signing(String),
}

/// Parse an algorithm name, accepting only the HMAC family.
pub fn parse_algorithm(name: &str) -> Result<Algorithm, TokenError> {
    match name.trim().to_ascii_uppercase().as_str() {
        "HS256" => Ok(Algorithm::HS256),
        "HS384" => Ok(Algorithm::HS384),
        "HS512" => Ok(Algorithm::HS512),
        other => Err(TokenError::UnsupportedAlgorithm(other.to_string())),
    }
}

/// Expiry `ttl_minutes` from now, truncated to whole seconds.
pub fn expiry_after(ttl_minutes: i64) -> Result<DateTime<Utc>, TokenError> {
    if !(1..=MAX_TTL_MINUTES).contains(&ttl_minutes) {
        return Err(TokenError::InvalidTtl(ttl_minutes));
    }
    let expires_at = Duration::try_minutes(ttl_minutes)
        .and_then(|ttl| Utc::now().checked_add_signed(ttl))
        .ok_or(TokenError::InvalidTtl(ttl_minutes))?;
    DateTime::from_timestamp(expires_at.timestamp(), 0).ok_or(TokenError::InvalidTtl(ttl_minutes))
}

/// Generate a random 256-bit secret, URL-safe base64 encoded.
pub fn generate_secret() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// Wire payload: registered claims plus the caller's claims, flattened.
#[derive(Serialize)]
struct OutgoingPayload<'a, C> {
    sub: &'a str,
    exp: i64,
    #[serde(flatten)]
    claims: &'a C,
}

#[derive(Clone, Deserialize)]
struct IncomingPayload<C> {
    #[serde(default)]
    sub: Option<String>,
    exp: i64,
    #[serde(flatten)]
    claims: C,
}

/// Successfully verified token contents
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedToken<C> {
    /// `sub` claim, if the token carried one
    pub subject: Option<String>,
    /// `exp` claim
    pub expires_at: DateTime<Utc>,
    /// Everything else in the payload
    pub claims: C,
}

/// Signs and verifies access tokens with one shared secret.
#[derive(Clone)]
pub struct TokenCodec {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenCodec {
    pub fn new(secret: &str, algorithm: Algorithm) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::EmptySecret);
        }
        if !matches!(
            algorithm,
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
        ) {
            return Err(TokenError::UnsupportedAlgorithm(format!("{algorithm:?}")));
        }

        let mut validation = Validation::new(algorithm);
        validation.leeway = 0;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp"]);

        Ok(Self {
            algorithm,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        })
    }

    /// Sign a token expiring `ttl_minutes` from now.
    ///
    /// `claims` must serialize as a map; its keys sit next to `sub` and `exp`.
    pub fn encode<C: Serialize>(
        &self,
        subject: &str,
        claims: &C,
        ttl_minutes: i64,
    ) -> Result<String, TokenError> {
        self.encode_until(subject, claims, expiry_after(ttl_minutes)?)
    }

    /// Sign a token with an absolute expiry.
    pub fn encode_until<C: Serialize>(
        &self,
        subject: &str,
        claims: &C,
        expires_at: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let payload = OutgoingPayload {
            sub: subject,
            exp: expires_at.timestamp(),
            claims,
        };

        jsonwebtoken::encode(&Header::new(self.algorithm), &payload, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verify signature and expiry, then return the payload.
    pub fn decode<C>(&self, token: &str) -> Result<DecodedToken<C>, TokenError>
    where
        C: DeserializeOwned + Clone,
    {
        let data = jsonwebtoken::decode::<IncomingPayload<C>>(
            token,
            &self.decoding_key,
            &self.validation,
        )
        .map_err(map_jwt_error)?;

        let payload = data.claims;

        // jsonwebtoken only rejects `exp < now`; the boundary second counts
        // as expired here.
        if payload.exp <= Utc::now().timestamp() {
            return Err(TokenError::Expired);
        }

        let expires_at = DateTime::from_timestamp(payload.exp, 0)
            .ok_or_else(|| TokenError::Malformed("exp out of range".to_string()))?;

        Ok(DecodedToken {
            subject: payload.sub,
            expires_at,
            claims: payload.claims,
        })
    }

    /// `true` when the token is expired or fails to decode for any reason.
    pub fn is_expired(&self, token: &str) -> bool {
        self.decode::<serde_json::Map<String, serde_json::Value>>(token)
            .map(|decoded| decoded.expires_at <= Utc::now())
            .unwrap_or(true)
    }
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &self.algorithm)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

fn map_jwt_error(err: jsonwebtoken::errors::Error) -> TokenError {
    use jsonwebtoken::errors::ErrorKind;

    match err.kind() {
        ErrorKind::ExpiredSignature => TokenError::Expired,
        ErrorKind::InvalidSignature => TokenError::InvalidSignature,
        _ => TokenError::Malformed(err.to_string()),
    }
}
