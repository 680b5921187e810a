//! In-memory client registry implementation

use crate::errors::StorageError;
use crate::oauth::types::{ClientDescriptor, RegisteredClient};
use crate::storage::traits::{ClientRegistry, ClientStream, Result};
use async_trait::async_trait;
use chrono::Utc;
use futures::StreamExt;
use futures::stream;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

/// In-memory client registry (for testing/development)
#[derive(Default)]
pub struct MemoryClientRegistry {
    clients: RwLock<BTreeMap<String, RegisteredClient>>,
}

impl MemoryClientRegistry {
    /// Create a new, empty memory client registry
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn is_empty(&self) -> bool {
        self.clients.read().await.is_empty()
    }

    /// Sorted list of stored client ids
    pub async fn client_ids(&self) -> Vec<String> {
        self.clients.read().await.keys().cloned().collect()
    }
}

#[async_trait]
impl ClientRegistry for MemoryClientRegistry {
    async fn find_by_client_id(&self, client_id: &str) -> Result<Option<RegisteredClient>> {
        let clients = self.clients.read().await;
        Ok(clients.get(client_id).cloned())
    }

    async fn create(&self, descriptor: &ClientDescriptor) -> Result<RegisteredClient> {
        let mut clients = self.clients.write().await;
        if clients.contains_key(&descriptor.client_id) {
            return Err(StorageError::AlreadyExists(format!(
                "Client already exists: {}",
                descriptor.client_id
            )));
        }

        let client = RegisteredClient::from_descriptor(descriptor, Utc::now());
        clients.insert(client.client_id.clone(), client.clone());
        Ok(client)
    }

    async fn update(
        &self,
        existing: &RegisteredClient,
        descriptor: &ClientDescriptor,
    ) -> Result<RegisteredClient> {
        let mut clients = self.clients.write().await;
        let client = clients.get_mut(&existing.client_id).ok_or_else(|| {
            StorageError::NotFound(format!("Client not found: {}", existing.client_id))
        })?;

        client.apply_descriptor(descriptor, Utc::now());
        Ok(client.clone())
    }

    async fn delete(&self, client: &RegisteredClient) -> Result<()> {
        let mut clients = self.clients.write().await;
        match clients.remove(&client.client_id) {
            Some(_) => Ok(()),
            None => Err(StorageError::NotFound(format!(
                "Client not found: {}",
                client.client_id
            ))),
        }
    }

    fn list_all(&self) -> ClientStream<'_> {
        // Snapshot on first poll so no lock is held while the caller consumes the stream.
        stream::once(async move {
            let clients = self.clients.read().await;
            clients.values().cloned().collect::<Vec<_>>()
        })
        .flat_map(|snapshot| stream::iter(snapshot.into_iter().map(Ok)))
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oauth::types::{ClientType, Permission};
    use futures::TryStreamExt;
    use std::collections::BTreeSet;

    fn descriptor(client_id: &str, secret: &str) -> ClientDescriptor {
        ClientDescriptor {
            client_id: client_id.to_string(),
            client_secret: secret.to_string(),
            client_type: ClientType::Confidential,
            display_name: client_id.to_string(),
            permissions: BTreeSet::from([
                Permission::TokenEndpoint,
                Permission::ClientCredentialsGrant,
            ]),
        }
    }

    #[tokio::test]
    async fn test_client_lifecycle() {
        let registry = MemoryClientRegistry::new();

        let created = registry.create(&descriptor("svc", "s1")).await.unwrap();
        assert_eq!(created.client_secret, "s1");
        assert_eq!(created.created_at, created.updated_at);

        let found = registry.find_by_client_id("svc").await.unwrap().unwrap();
        let updated = registry
            .update(&found, &descriptor("svc", "s2"))
            .await
            .unwrap();
        assert_eq!(updated.client_secret, "s2");
        assert_eq!(updated.created_at, created.created_at);

        registry.delete(&updated).await.unwrap();
        assert!(registry.find_by_client_id("svc").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_client_id() {
        let registry = MemoryClientRegistry::new();
        registry.create(&descriptor("svc", "s1")).await.unwrap();

        let result = registry.create(&descriptor("svc", "s2")).await;
        assert!(matches!(result, Err(StorageError::AlreadyExists(_))));
    }

    #[tokio::test]
    async fn test_update_and_delete_missing_client() {
        let registry = MemoryClientRegistry::new();
        let ghost = RegisteredClient::from_descriptor(&descriptor("ghost", "s"), Utc::now());

        assert!(matches!(
            registry.update(&ghost, &descriptor("ghost", "t")).await,
            Err(StorageError::NotFound(_))
        ));
        assert!(matches!(
            registry.delete(&ghost).await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_all_is_a_snapshot() {
        let registry = MemoryClientRegistry::new();
        registry.create(&descriptor("b", "s")).await.unwrap();
        registry.create(&descriptor("a", "s")).await.unwrap();

        let mut listing = registry.list_all();
        let first = listing.try_next().await.unwrap().unwrap();
        assert_eq!(first.client_id, "a");

        // Writes while a listing is open do not deadlock or change the pass.
        registry.delete(&first).await.unwrap();
        let rest: Vec<_> = listing.try_collect().await.unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].client_id, "b");

        assert_eq!(registry.client_ids().await, vec!["b".to_string()]);
    }
}
