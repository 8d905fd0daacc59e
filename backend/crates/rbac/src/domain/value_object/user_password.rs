//! User Password Value Object
//!
//! Password as submitted at registration, checked against the registration
//! policy. Delegates to `platform::password` for normalization, zeroization
//! and hashing.

use platform::password::{ClearTextPassword, check_policy};
use std::fmt;

use crate::error::RbacResult;

/// Raw password from user input
///
/// Memory is zeroized when dropped.
pub struct RawPassword(ClearTextPassword);

impl RawPassword {
    /// Create a new raw password with validation
    ///
    /// ## Validation Rules
    /// - Minimum 8 characters (Unicode code points, after NFKC)
    /// - Not blank
    ///
    /// ## Errors
    /// `RbacError::PasswordValidation` describing the violated rule
    pub fn new(raw: impl Into<String>) -> RbacResult<Self> {
        let clear_text = ClearTextPassword::new(raw);
        check_policy(&clear_text)?;
        Ok(Self(clear_text))
    }

    /// Access the inner ClearTextPassword
    pub fn inner(&self) -> &ClearTextPassword {
        &self.0
    }
}

impl fmt::Debug for RawPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RawPassword").field(&"[REDACTED]").finish()
    }
}
