//! Permission Events
//!
//! Notifications emitted when a user gains a role. Delivery is synchronous
//! and fire-and-forget; sinks must not fail the operation that emitted them.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::value_object::{role_level::RoleLevel, user_id::UserId};

/// A role was newly associated with a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PermissionGranted {
    pub user_id: UserId,
    pub role_level: RoleLevel,
    pub timestamp: DateTime<Utc>,
}

impl PermissionGranted {
    pub fn now(user_id: UserId, role_level: RoleLevel) -> Self {
        Self {
            user_id,
            role_level,
            timestamp: Utc::now(),
        }
    }
}

/// Receiver of permission events
pub trait PermissionEventSink: Send + Sync {
    fn permission_granted(&self, event: &PermissionGranted);
}

/// Default sink: one structured log line per event
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

impl PermissionEventSink for TracingEventSink {
    fn permission_granted(&self, event: &PermissionGranted) {
        tracing::info!(
            user_id = %event.user_id,
            role_level = event.role_level,
            timestamp = %event.timestamp,
            "Permission granted"
        );
    }
}
