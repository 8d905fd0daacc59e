//! Identifier Value Objects
//!
//! Store-assigned integer keys, typed so a role id cannot be passed where a
//! user id is expected.

use kernel::id::Id;

/// Marker for user identifiers
#[derive(Debug)]
pub enum UserMarker {}

/// Marker for role identifiers
#[derive(Debug)]
pub enum RoleMarker {}

/// User primary key
pub type UserId = Id<UserMarker>;

/// Role primary key
pub type RoleId = Id<RoleMarker>;
