//! Shared Kernel - Domain-crossing minimal core
//!
//! This crate contains the "smallest core" of vocabulary shared by every
//! backend crate:
//! - The wire-level error document ([`error::app_error::AppError`]) and its
//!   classification ([`error::kind::ErrorKind`])
//! - Integer-backed typed identifiers ([`id::Id`])
//!
//! **Design Principle**: Only include things that are "hard to change"
//! and have consistent meaning across all domains.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}
pub mod id;
