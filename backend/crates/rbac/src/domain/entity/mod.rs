//! Entity Module

pub mod identity;
pub mod role;
pub mod user_record;
