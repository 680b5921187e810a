//! Environment-based configuration for the client sync host.
//!
//! Client definitions are resolved separately from `Config`, only when a sync
//! runs. They come from an optional JSON file (`OAUTH_CLIENTS_FILE`)
//! followed by indexed variables:
//!
//! ```text
//! OAUTH_CLIENT_0_ID=billing
//! OAUTH_CLIENT_0_SECRET=...
//! OAUTH_CLIENT_0_DISPLAY_NAME=Billing Service
//! OAUTH_CLIENT_0_GRANT_TYPES=client_credentials
//! OAUTH_CLIENT_0_REDIRECT_URIS=https://billing.example.com/callback
//! ```
//!
//! Indices are read from 0 up to the first index with no variables set.

use anyhow::Result;

use crate::errors::ConfigError;
use crate::oauth::types::{ClientDefinition, GrantType};

/// Whether the OAuth client sync runs at startup
#[derive(Clone, Debug)]
pub struct AuthEnabled(bool);

/// Client definitions resolved from configuration
#[derive(Clone, Debug, Default)]
pub struct ClientDefinitions(Vec<ClientDefinition>);

/// Main application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub version: String,
    pub auth_enabled: AuthEnabled,
    pub storage_backend: String,
    pub database_url: Option<String>,
}

impl Config {
    /// Create a new configuration from environment variables
    pub fn new() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Create a configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let auth_enabled: AuthEnabled = default_env(&lookup, "AUTH_ENABLED", "true").try_into()?;
        let storage_backend = default_env(&lookup, "STORAGE_BACKEND", "memory");
        let database_url = if storage_backend == "postgres" {
            Some(require_env(&lookup, "DATABASE_URL")?)
        } else {
            optional_env(&lookup, "DATABASE_URL")
        };

        Ok(Self {
            version: version()?,
            auth_enabled,
            storage_backend,
            database_url,
        })
    }
}

/// Get application version from build environment
pub fn version() -> Result<String> {
    option_env!("GIT_HASH")
        .or(option_env!("CARGO_PKG_VERSION"))
        .map(|val| val.to_string())
        .ok_or(ConfigError::VersionNotSet.into())
}

fn require_env<F>(lookup: &F, name: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    optional_env(lookup, name).ok_or_else(|| ConfigError::EnvVarRequired(name.to_string()).into())
}

fn optional_env<F>(lookup: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name).filter(|value| !value.is_empty())
}

fn default_env<F>(lookup: &F, name: &str, default_value: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    optional_env(lookup, name).unwrap_or_else(|| default_value.to_string())
}

impl TryFrom<String> for AuthEnabled {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(Self(true)),
            "false" | "0" | "no" | "off" => Ok(Self(false)),
            _ => Err(ConfigError::BoolParsingFailed(value).into()),
        }
    }
}

impl AsRef<bool> for AuthEnabled {
    fn as_ref(&self) -> &bool {
        &self.0
    }
}

impl ClientDefinitions {
    /// Resolve definitions from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(&|name: &str| std::env::var(name).ok())
    }

    /// Resolve definitions from the clients file and indexed variables
    pub fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut definitions = Vec::new();

        if let Some(path) = optional_env(lookup, "OAUTH_CLIENTS_FILE") {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ClientsFileUnreadable(path.clone(), e))?;
            definitions.extend(parse_clients_json(&path, &contents)?);
        }

        definitions.extend((0..).map_while(|index| indexed_definition(lookup, index)));

        Ok(Self(definitions))
    }

    pub fn into_inner(self) -> Vec<ClientDefinition> {
        self.0
    }
}

impl From<Vec<ClientDefinition>> for ClientDefinitions {
    fn from(value: Vec<ClientDefinition>) -> Self {
        Self(value)
    }
}

impl AsRef<Vec<ClientDefinition>> for ClientDefinitions {
    fn as_ref(&self) -> &Vec<ClientDefinition> {
        &self.0
    }
}

/// Parse a JSON array of client definitions
pub fn parse_clients_json(
    source: &str,
    contents: &str,
) -> Result<Vec<ClientDefinition>, ConfigError> {
    serde_json::from_str(contents)
        .map_err(|e| ConfigError::ClientsFileInvalid(source.to_string(), e))
}

fn indexed_definition<F>(lookup: &F, index: usize) -> Option<ClientDefinition>
where
    F: Fn(&str) -> Option<String>,
{
    let var = |field: &str| lookup(&format!("OAUTH_CLIENT_{index}_{field}"));

    let client_id = var("ID");
    let client_secret = var("SECRET");
    let display_name = var("DISPLAY_NAME");
    let grant_types = var("GRANT_TYPES");
    let redirect_uris = var("REDIRECT_URIS");

    if client_id.is_none()
        && client_secret.is_none()
        && display_name.is_none()
        && grant_types.is_none()
        && redirect_uris.is_none()
    {
        return None;
    }

    Some(ClientDefinition {
        client_id: client_id.unwrap_or_default(),
        client_secret: client_secret.unwrap_or_default(),
        display_name,
        allowed_grant_types: split_list(grant_types.as_deref())
            .into_iter()
            .map(GrantType::from)
            .collect(),
        redirect_uris: split_list(redirect_uris.as_deref()),
    })
}

fn split_list(value: Option<&str>) -> Vec<String> {
    value
        .unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert!(*config.auth_enabled.as_ref());
        assert_eq!(config.storage_backend, "memory");
        assert!(config.database_url.is_none());
    }

    #[test]
    fn test_postgres_requires_database_url() {
        let err = Config::from_lookup(lookup(&[("STORAGE_BACKEND", "postgres")])).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::EnvVarRequired(name)) if name == "DATABASE_URL"
        ));

        let config = Config::from_lookup(lookup(&[
            ("STORAGE_BACKEND", "postgres"),
            ("DATABASE_URL", "postgres://localhost/clients"),
        ]))
        .unwrap();
        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/clients")
        );
    }

    #[test]
    fn test_sqlite_database_url_is_optional() {
        let config = Config::from_lookup(lookup(&[("STORAGE_BACKEND", "sqlite")])).unwrap();
        assert!(config.database_url.is_none());
    }

    #[test]
    fn test_config_does_not_read_clients_file() {
        let config = Config::from_lookup(lookup(&[(
            "OAUTH_CLIENTS_FILE",
            "/nonexistent/client-sync/clients.json",
        )]));
        assert!(config.is_ok());
    }

    #[test]
    fn test_indexed_client_definitions() {
        let clients = ClientDefinitions::from_lookup(&lookup(&[
            ("OAUTH_CLIENT_0_ID", "billing"),
            ("OAUTH_CLIENT_0_SECRET", "s0"),
            ("OAUTH_CLIENT_0_DISPLAY_NAME", "Billing Service"),
            ("OAUTH_CLIENT_0_GRANT_TYPES", "client_credentials, password"),
            ("OAUTH_CLIENT_1_ID", "reports"),
            ("OAUTH_CLIENT_1_SECRET", "s1"),
            ("OAUTH_CLIENT_1_REDIRECT_URIS", "https://a.example/cb,https://b.example/cb"),
            // Index 2 is missing, so index 3 is never read.
            ("OAUTH_CLIENT_3_ID", "unreachable"),
        ]))
        .unwrap()
        .into_inner();

        assert_eq!(clients.len(), 2);
        assert_eq!(clients[0].client_id, "billing");
        assert_eq!(clients[0].display_name.as_deref(), Some("Billing Service"));
        assert_eq!(
            clients[0].allowed_grant_types,
            vec![
                GrantType::ClientCredentials,
                GrantType::Unknown("password".to_string())
            ]
        );
        assert_eq!(clients[1].client_id, "reports");
        assert!(clients[1].allowed_grant_types.is_empty());
        assert_eq!(clients[1].redirect_uris.len(), 2);
    }

    #[test]
    fn test_partial_indexed_definition_is_kept_for_validation() {
        let clients = ClientDefinitions::from_lookup(&lookup(&[("OAUTH_CLIENT_0_SECRET", "s")]))
            .unwrap()
            .into_inner();
        assert_eq!(clients.len(), 1);
        assert!(clients[0].client_id.is_empty());
    }

    #[test]
    fn test_auth_enabled_parsing() {
        let config = Config::from_lookup(lookup(&[("AUTH_ENABLED", "off")])).unwrap();
        assert!(!*config.auth_enabled.as_ref());

        let result = Config::from_lookup(lookup(&[("AUTH_ENABLED", "maybe")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_clients_file_is_read_before_indexed_variables() {
        let path = std::env::temp_dir().join(format!("client-sync-test-{}.json", std::process::id()));
        std::fs::write(
            &path,
            r#"[{"clientId": "from-file", "clientSecret": "f", "allowedGrantTypes": ["client_credentials"]}]"#,
        )
        .unwrap();
        let path_str = path.display().to_string();

        let clients = ClientDefinitions::from_lookup(&lookup(&[
            ("OAUTH_CLIENTS_FILE", path_str.as_str()),
            ("OAUTH_CLIENT_0_ID", "from-env"),
            ("OAUTH_CLIENT_0_SECRET", "e"),
        ]))
        .unwrap();
        std::fs::remove_file(&path).unwrap();

        let ids: Vec<_> = clients
            .as_ref()
            .iter()
            .map(|c| c.client_id.clone())
            .collect();
        assert_eq!(ids, vec!["from-file".to_string(), "from-env".to_string()]);
    }

    #[test]
    fn test_missing_clients_file_fails() {
        let result = ClientDefinitions::from_lookup(&lookup(&[(
            "OAUTH_CLIENTS_FILE",
            "/nonexistent/client-sync/clients.json",
        )]));
        assert!(matches!(
            result,
            Err(ConfigError::ClientsFileUnreadable(_, _))
        ));
    }

    #[test]
    fn test_invalid_clients_json() {
        assert!(matches!(
            parse_clients_json("inline", r#"{"clientId": "not-an-array"}"#),
            Err(ConfigError::ClientsFileInvalid(_, _))
        ));
    }
}
