//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Password hashing (Argon2id) behind [`password::CredentialHasher`]
//! - Signed, expiring access tokens behind [`token::TokenCodec`]
//! - Bearer token and cookie extraction from HTTP headers

pub mod bearer;
pub mod password;
pub mod token;
