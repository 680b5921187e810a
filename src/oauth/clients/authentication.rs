//! Registry-side check for `client_credentials` token requests.

use crate::errors::OAuthError;
use crate::oauth::types::{Permission, RegisteredClient};
use crate::storage::traits::ClientRegistry;

/// Authenticate a confidential client for the client credentials grant.
///
/// Returns the registered client when the secret matches and the record
/// carries both token endpoint access and the client credentials grant.
pub async fn authenticate_client_credentials(
    registry: &dyn ClientRegistry,
    client_id: &str,
    client_secret: &str,
) -> Result<RegisteredClient, OAuthError> {
    if client_id.trim().is_empty() {
        return Err(OAuthError::InvalidClient(
            "The client identifier is missing".to_string(),
        ));
    }

    let client = registry
        .find_by_client_id(client_id)
        .await
        .map_err(|e| OAuthError::ServerError(e.to_string()))?
        .ok_or_else(|| OAuthError::InvalidClient("Client not found".to_string()))?;

    if client.client_secret != client_secret {
        return Err(OAuthError::InvalidClient(
            "Invalid client secret".to_string(),
        ));
    }

    if !client.has_permission(Permission::TokenEndpoint) {
        return Err(OAuthError::UnauthorizedClient(
            "Client not authorized to use the token endpoint".to_string(),
        ));
    }

    if !client.has_permission(Permission::ClientCredentialsGrant) {
        return Err(OAuthError::UnauthorizedClient(
            "Client not authorized for client credentials grant".to_string(),
        ));
    }

    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oauth::types::{ClientDescriptor, ClientType};
    use crate::storage::inmemory::MemoryClientRegistry;
    use std::collections::BTreeSet;

    async fn registry_with(permissions: BTreeSet<Permission>) -> MemoryClientRegistry {
        let registry = MemoryClientRegistry::new();
        registry
            .create(&ClientDescriptor {
                client_id: "svc".to_string(),
                client_secret: "s".to_string(),
                client_type: ClientType::Confidential,
                display_name: "svc".to_string(),
                permissions,
            })
            .await
            .unwrap();
        registry
    }

    #[tokio::test]
    async fn test_authenticate_success() {
        let registry = registry_with(BTreeSet::from([
            Permission::TokenEndpoint,
            Permission::ClientCredentialsGrant,
        ]))
        .await;

        let client = authenticate_client_credentials(&registry, "svc", "s")
            .await
            .unwrap();
        assert_eq!(client.client_id, "svc");
    }

    #[tokio::test]
    async fn test_authenticate_rejects_bad_credentials() {
        let registry = registry_with(BTreeSet::from([
            Permission::TokenEndpoint,
            Permission::ClientCredentialsGrant,
        ]))
        .await;

        assert!(matches!(
            authenticate_client_credentials(&registry, "svc", "wrong").await,
            Err(OAuthError::InvalidClient(_))
        ));
        assert!(matches!(
            authenticate_client_credentials(&registry, "nonexistent", "s").await,
            Err(OAuthError::InvalidClient(_))
        ));
        assert!(matches!(
            authenticate_client_credentials(&registry, "", "s").await,
            Err(OAuthError::InvalidClient(_))
        ));
    }

    #[tokio::test]
    async fn test_authenticate_requires_client_credentials_grant() {
        let registry = registry_with(BTreeSet::from([Permission::TokenEndpoint])).await;

        assert!(matches!(
            authenticate_client_credentials(&registry, "svc", "s").await,
            Err(OAuthError::UnauthorizedClient(_))
        ));
    }
}
