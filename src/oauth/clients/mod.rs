//! OAuth client provisioning.
//!
//! Validates configured client definitions, maps them to registry
//! descriptors, and converges the client registry at startup.

pub mod authentication;
pub mod descriptor;
pub mod sync;
pub mod validation;

// Re-export main types and services
pub use authentication::authenticate_client_credentials;
pub use descriptor::build_descriptor;
pub use sync::{ClientSyncService, SkippedClient, SyncReport, SyncStatus};
pub use validation::validate_client_definition;
