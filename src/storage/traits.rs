//! Storage trait definitions for the OAuth client registry.
//!
//! Defines the async registry interface that the sync pipeline and the
//! client credential check consume, implemented by the in-memory, SQLite
//! and PostgreSQL backends.

use crate::errors::StorageError;
use crate::oauth::types::{ClientDescriptor, RegisteredClient};
use async_trait::async_trait;
use futures::stream::BoxStream;

pub type Result<T> = std::result::Result<T, StorageError>;

/// Finite, single-pass enumeration of registry records.
pub type ClientStream<'a> = BoxStream<'a, Result<RegisteredClient>>;

/// Trait for storing and retrieving registered OAuth clients
#[async_trait]
pub trait ClientRegistry: Send + Sync {
    /// Retrieve a client by ID
    async fn find_by_client_id(&self, client_id: &str) -> Result<Option<RegisteredClient>>;

    /// Store a new client built from the descriptor.
    ///
    /// Fails with `StorageError::AlreadyExists` when the client id is taken.
    async fn create(&self, descriptor: &ClientDescriptor) -> Result<RegisteredClient>;

    /// Overwrite every mutable field of an existing client
    async fn update(
        &self,
        existing: &RegisteredClient,
        descriptor: &ClientDescriptor,
    ) -> Result<RegisteredClient>;

    /// Delete a client
    async fn delete(&self, client: &RegisteredClient) -> Result<()>;

    /// Lazily enumerate every client. The stream ends after the last record
    /// and cannot be restarted; call `list_all` again for a new pass.
    fn list_all(&self) -> ClientStream<'_>;
}
