//! Email Value Object
//!
//! The address is kept as submitted (trimmed, case preserved). Uniqueness is
//! enforced by the store on that exact string.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{RbacError, RbacResult};

/// RFC 5321 path limit
const MAX_LENGTH: usize = 254;

/// RFC 5321 local-part limit
const MAX_LOCAL_LENGTH: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Validate and wrap a submitted address
    pub fn new(email: impl AsRef<str>) -> RbacResult<Self> {
        let email = email.as_ref().trim();

        if email.is_empty() {
            return Err(invalid("Email cannot be empty"));
        }
        if email.len() > MAX_LENGTH {
            return Err(invalid(format!("Email must be at most {MAX_LENGTH} characters")));
        }

        let (local, domain) = email
            .split_once('@')
            .ok_or_else(|| invalid("Email must contain '@'"))?;

        if !valid_local_part(local) {
            return Err(invalid("Invalid email local part"));
        }
        if !valid_domain(domain) {
            return Err(invalid("Invalid email domain"));
        }

        Ok(Self(email.to_owned()))
    }

    /// Wrap an address read back from the store
    pub fn from_db(email: impl Into<String>) -> Self {
        Self(email.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_db(self) -> String {
        self.0
    }
}

fn invalid(reason: impl Into<String>) -> RbacError {
    RbacError::InvalidEmail(reason.into())
}

fn valid_local_part(local: &str) -> bool {
    !local.is_empty() && local.len() <= MAX_LOCAL_LENGTH && !local.chars().any(char::is_whitespace)
}

/// At least two dot-separated labels of ASCII alphanumerics and inner hyphens
fn valid_domain(domain: &str) -> bool {
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2
        && labels.iter().all(|label| {
            !label.is_empty()
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        })
}

impl FromStr for Email {
    type Err = RbacError;

    fn from_str(s: &str) -> RbacResult<Self> {
        Email::new(s)
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_common_addresses() {
        for ok in [
            "user@example.com",
            "user.name@example.co.jp",
            "user+tag@example.com",
            "  alice@example.com  ",
            "ops@mail-relay.example.org",
        ] {
            assert!(Email::new(ok).is_ok(), "{ok}");
        }
    }

    #[test]
    fn test_rejects_malformed_addresses() {
        for bad in [
            "",
            "   ",
            "userexample.com",
            "user@",
            "@example.com",
            "user@@example.com",
            "user@example",
            "user@.example.com",
            "user@example..com",
            "user@-example.com",
            "user@example-.com",
            "us er@example.com",
            "user@exa_mple.com",
        ] {
            assert!(
                matches!(Email::new(bad), Err(RbacError::InvalidEmail(_))),
                "{bad:?}"
            );
        }
    }

    #[test]
    fn test_case_preserved() {
        let email = Email::new(" Alice@Example.COM ").unwrap();
        assert_eq!(email.as_str(), "Alice@Example.COM");
        assert_ne!(email, Email::new("alice@example.com").unwrap());
    }

    #[test]
    fn test_length_limits() {
        let local = "a".repeat(64);
        let domain = format!("{}.com", "b".repeat(200));
        assert!(Email::new(format!("{local}@{domain}")).is_err());
        assert!(Email::new(format!("{}@example.com", "a".repeat(65))).is_err());
        assert!(Email::new(format!("{local}@example.com")).is_ok());
    }
}
