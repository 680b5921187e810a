//! Maps a client definition onto the permission set the token endpoint checks.

use crate::errors::DefinitionError;
use crate::oauth::types::{ClientDefinition, ClientDescriptor, ClientType, GrantType, Permission};
use std::collections::BTreeSet;

/// Build the registry descriptor for a definition.
///
/// Token endpoint access is always granted. `client_credentials` adds the
/// client credentials grant, `authorization_code` fails the whole definition,
/// and unknown tokens are logged and dropped.
pub fn build_descriptor(definition: &ClientDefinition) -> Result<ClientDescriptor, DefinitionError> {
    if definition.allowed_grant_types.is_empty() {
        tracing::warn!(
            client_id = %definition.client_id,
            "client has no allowed grant types configured; it will not be usable"
        );
    }

    let mut permissions = BTreeSet::from([Permission::TokenEndpoint]);

    for grant_type in &definition.allowed_grant_types {
        match grant_type {
            GrantType::ClientCredentials => {
                permissions.insert(Permission::ClientCredentialsGrant);
            }
            GrantType::AuthorizationCode => {
                return Err(DefinitionError::UnsupportedGrantType {
                    client_id: definition.client_id.clone(),
                    grant_type: grant_type.to_string(),
                });
            }
            GrantType::Unknown(raw) => {
                tracing::warn!(
                    client_id = %definition.client_id,
                    grant_type = %raw,
                    "ignoring unrecognized grant type"
                );
            }
        }
    }

    let display_name = definition
        .display_name
        .as_deref()
        .filter(|name| !name.trim().is_empty())
        .unwrap_or(&definition.client_id)
        .to_string();

    Ok(ClientDescriptor {
        client_id: definition.client_id.clone(),
        client_secret: definition.client_secret.clone(),
        client_type: ClientType::Confidential,
        display_name,
        permissions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_credentials_mapping() {
        let definition = ClientDefinition::new("svc", "s", [GrantType::ClientCredentials]);
        let descriptor = build_descriptor(&definition).unwrap();

        assert_eq!(
            descriptor.permissions,
            BTreeSet::from([Permission::TokenEndpoint, Permission::ClientCredentialsGrant])
        );
        assert_eq!(descriptor.display_name, "svc");
        assert_eq!(descriptor.client_type, ClientType::Confidential);
        assert_eq!(descriptor.client_secret, "s");
    }

    #[test]
    fn test_display_name_is_kept_when_present() {
        let definition = ClientDefinition::new("svc", "s", [GrantType::ClientCredentials])
            .with_display_name("Billing Service");
        assert_eq!(
            build_descriptor(&definition).unwrap().display_name,
            "Billing Service"
        );

        let blank = ClientDefinition::new("svc", "s", []).with_display_name("  ");
        assert_eq!(build_descriptor(&blank).unwrap().display_name, "svc");
    }

    #[test]
    fn test_display_name_is_stored_as_given() {
        let definition = ClientDefinition::new("svc", "s", [GrantType::ClientCredentials])
            .with_display_name(" Billing Service ");
        assert_eq!(
            build_descriptor(&definition).unwrap().display_name,
            " Billing Service "
        );
    }

    #[test]
    fn test_empty_grant_types_still_builds() {
        let definition = ClientDefinition::new("svc", "s", []);
        let descriptor = build_descriptor(&definition).unwrap();
        assert_eq!(
            descriptor.permissions,
            BTreeSet::from([Permission::TokenEndpoint])
        );
    }

    #[test]
    fn test_unknown_grant_type_is_ignored() {
        let definition = ClientDefinition::new(
            "svc",
            "s",
            [
                GrantType::from("password"),
                GrantType::ClientCredentials,
                GrantType::from("implicit"),
            ],
        );
        let descriptor = build_descriptor(&definition).unwrap();
        assert_eq!(
            descriptor.permissions,
            BTreeSet::from([Permission::TokenEndpoint, Permission::ClientCredentialsGrant])
        );
    }

    #[test]
    fn test_authorization_code_is_unsupported() {
        let definition = ClientDefinition::new(
            "web",
            "s",
            [GrantType::ClientCredentials, GrantType::AuthorizationCode],
        );
        assert_eq!(
            build_descriptor(&definition),
            Err(DefinitionError::UnsupportedGrantType {
                client_id: "web".to_string(),
                grant_type: "authorization_code".to_string(),
            })
        );
    }
}
