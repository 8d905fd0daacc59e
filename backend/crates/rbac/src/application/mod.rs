//! Application Layer
//!
//! Services orchestrating the domain, plus configuration and startup
//! provisioning.

pub mod authentication;
pub mod bootstrap;
pub mod config;
pub mod events;
pub mod permission;
pub mod user_directory;

// Re-exports
pub use authentication::{AccessClaims, AccessToken, AuthenticationService};
pub use bootstrap::{BootstrapReport, bootstrap};
pub use config::{AuthConfig, SuperuserConfig};
pub use events::{PermissionEventSink, PermissionGranted, TracingEventSink};
pub use permission::PermissionEvaluator;
pub use user_directory::UserDirectoryService;
