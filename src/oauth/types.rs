//! OAuth client types shared by the sync pipeline and the client registry.
//!
//! `ClientDefinition` is the configured input, `ClientDescriptor` the mutable
//! field set derived from it, and `RegisteredClient` the persisted record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::errors::StorageError;

/// OAuth grant types as they appear in client configuration.
///
/// Decoding never fails: tokens this system does not know are kept as
/// `Unknown` so the descriptor builder can report them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum GrantType {
    ClientCredentials,
    AuthorizationCode,
    Unknown(String),
}

impl GrantType {
    pub fn as_str(&self) -> &str {
        match self {
            GrantType::ClientCredentials => "client_credentials",
            GrantType::AuthorizationCode => "authorization_code",
            GrantType::Unknown(raw) => raw,
        }
    }
}

impl From<&str> for GrantType {
    fn from(value: &str) -> Self {
        match value.trim() {
            "client_credentials" => GrantType::ClientCredentials,
            "authorization_code" => GrantType::AuthorizationCode,
            other => GrantType::Unknown(other.to_string()),
        }
    }
}

impl From<String> for GrantType {
    fn from(value: String) -> Self {
        GrantType::from(value.as_str())
    }
}

impl From<GrantType> for String {
    fn from(value: GrantType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for GrantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Capability tokens granted to a registered client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Permission {
    /// Access to the token endpoint
    #[serde(rename = "ept:token")]
    TokenEndpoint,
    /// Permission to use the client credentials grant
    #[serde(rename = "gt:client_credentials")]
    ClientCredentialsGrant,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::TokenEndpoint => "ept:token",
            Permission::ClientCredentialsGrant => "gt:client_credentials",
        }
    }
}

impl FromStr for Permission {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ept:token" => Ok(Permission::TokenEndpoint),
            "gt:client_credentials" => Ok(Permission::ClientCredentialsGrant),
            _ => Err(StorageError::InvalidData(format!(
                "Unknown permission: {}",
                s
            ))),
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Client Type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientType {
    Public,
    Confidential,
}

impl ClientType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientType::Public => "public",
            ClientType::Confidential => "confidential",
        }
    }
}

impl FromStr for ClientType {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(ClientType::Public),
            "confidential" => Ok(ClientType::Confidential),
            _ => Err(StorageError::InvalidData(format!(
                "Unknown client type: {}",
                s
            ))),
        }
    }
}

/// A trusted OAuth client as declared in configuration.
///
/// Field names accept both camelCase and snake_case in file form. Missing
/// fields deserialize to empty values and are rejected later by validation.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientDefinition {
    #[serde(default, alias = "client_id")]
    pub client_id: String,
    #[serde(default, alias = "client_secret")]
    pub client_secret: String,
    #[serde(default, alias = "display_name")]
    pub display_name: Option<String>,
    #[serde(default, alias = "allowed_grant_types")]
    pub allowed_grant_types: Vec<GrantType>,
    /// Reserved for the authorization code flow
    #[serde(default, alias = "redirect_uris")]
    pub redirect_uris: Vec<String>,
}

impl ClientDefinition {
    /// Convenience constructor for a definition without display name or redirect URIs
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        allowed_grant_types: impl IntoIterator<Item = GrantType>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            display_name: None,
            allowed_grant_types: allowed_grant_types.into_iter().collect(),
            redirect_uris: Vec::new(),
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }
}

impl fmt::Debug for ClientDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientDefinition")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("display_name", &self.display_name)
            .field("allowed_grant_types", &self.allowed_grant_types)
            .field("redirect_uris", &self.redirect_uris)
            .finish()
    }
}

/// The mutable field set written to the registry for one client.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientDescriptor {
    pub client_id: String,
    pub client_secret: String,
    pub client_type: ClientType,
    pub display_name: String,
    pub permissions: BTreeSet<Permission>,
}

impl fmt::Debug for ClientDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientDescriptor")
            .field("client_id", &self.client_id)
            .field("client_type", &self.client_type)
            .field("display_name", &self.display_name)
            .field("permissions", &self.permissions)
            .finish_non_exhaustive()
    }
}

/// A client application record persisted in the registry
#[derive(Clone, PartialEq, Eq)]
pub struct RegisteredClient {
    /// Unique client identifier
    pub client_id: String,
    /// Client secret
    pub client_secret: String,
    /// Client type (always confidential for synced clients)
    pub client_type: ClientType,
    /// Human readable name
    pub display_name: String,
    /// Granted capabilities
    pub permissions: BTreeSet<Permission>,
    /// Registration timestamp
    pub created_at: DateTime<Utc>,
    /// Last updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl RegisteredClient {
    /// Build a fresh record from a descriptor
    pub fn from_descriptor(descriptor: &ClientDescriptor, now: DateTime<Utc>) -> Self {
        Self {
            client_id: descriptor.client_id.clone(),
            client_secret: descriptor.client_secret.clone(),
            client_type: descriptor.client_type,
            display_name: descriptor.display_name.clone(),
            permissions: descriptor.permissions.clone(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrite every mutable field with the descriptor's values
    pub fn apply_descriptor(&mut self, descriptor: &ClientDescriptor, now: DateTime<Utc>) {
        self.client_secret = descriptor.client_secret.clone();
        self.client_type = descriptor.client_type;
        self.display_name = descriptor.display_name.clone();
        self.permissions = descriptor.permissions.clone();
        self.updated_at = now;
    }

    /// Whether the record's mutable fields equal the descriptor
    pub fn matches_descriptor(&self, descriptor: &ClientDescriptor) -> bool {
        self.client_id == descriptor.client_id
            && self.client_secret == descriptor.client_secret
            && self.client_type == descriptor.client_type
            && self.display_name == descriptor.display_name
            && self.permissions == descriptor.permissions
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }
}

impl fmt::Debug for RegisteredClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredClient")
            .field("client_id", &self.client_id)
            .field("client_type", &self.client_type)
            .field("display_name", &self.display_name)
            .field("permissions", &self.permissions)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish_non_exhaustive()
    }
}
