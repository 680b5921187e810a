//! OAuth client definitions, registry records, and the startup client sync.

pub mod clients;
pub mod types;

// Re-export frequently used items from each module
pub use crate::storage::{inmemory::MemoryClientRegistry, traits::ClientRegistry};
pub use clients::{
    ClientSyncService, SyncReport, SyncStatus, authenticate_client_credentials, build_descriptor,
    validate_client_definition,
};
pub use types::{
    ClientDefinition, ClientDescriptor, ClientType, GrantType, Permission, RegisteredClient,
};
