//! Standardized error types following the `error-clientsync-<domain>-<number>` format.

use thiserror::Error;

/// Configuration errors that occur during application startup
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Error when a required environment variable is not set
    #[error("error-clientsync-config-1 {0} must be set")]
    EnvVarRequired(String),

    /// Error when version information is not available
    #[error("error-clientsync-config-2 One of GIT_HASH or CARGO_PKG_VERSION must be set")]
    VersionNotSet,

    /// Error when boolean string cannot be parsed
    #[error(
        "error-clientsync-config-3 Failed to parse boolean '{0}': expected true/false/1/0/yes/no/on/off"
    )]
    BoolParsingFailed(String),

    /// Error when the client definitions file cannot be read
    #[error("error-clientsync-config-4 Failed to read client definitions file '{0}': {1}")]
    ClientsFileUnreadable(String, std::io::Error),

    /// Error when the client definitions file is not a JSON array of definitions
    #[error("error-clientsync-config-5 Failed to parse client definitions file '{0}': {1}")]
    ClientsFileInvalid(String, serde_json::Error),
}

/// Per-definition errors. These never abort a sync run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    /// Client identifier is missing or blank
    #[error("error-clientsync-definition-1 Client definition is missing a client id")]
    MissingClientId,

    /// Client secret is missing or blank
    #[error("error-clientsync-definition-2 Client definition {0} is missing a client secret")]
    MissingClientSecret(String),

    /// Grant type is recognized but cannot be provisioned yet
    #[error("error-clientsync-definition-3 Grant type '{grant_type}' for client {client_id} is not yet supported")]
    UnsupportedGrantType {
        client_id: String,
        grant_type: String,
    },
}

/// Registry storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// Error when database connection fails
    #[error("error-clientsync-storage-1 Database connection failed: {0}")]
    ConnectionFailed(String),

    /// Error when data serialization fails
    #[error("error-clientsync-storage-2 Serialization error: {0}")]
    SerializationError(String),

    /// Error when database operation fails
    #[error("error-clientsync-storage-3 Database error: {0}")]
    DatabaseError(String),

    /// Error when stored or configured data is invalid
    #[error("error-clientsync-storage-4 Invalid data: {0}")]
    InvalidData(String),

    /// Error when requested record is not found
    #[error("error-clientsync-storage-5 Not found: {0}")]
    NotFound(String),

    /// Error when a record with the same client id already exists
    #[error("error-clientsync-storage-6 Already exists: {0}")]
    AlreadyExists(String),
}

/// Fatal sync errors
#[derive(Debug, Error)]
pub enum SyncError {
    /// The client registry failed; the registry state is unknown
    #[error("error-clientsync-sync-1 Client registry operation '{operation}' failed: {source}")]
    Registry {
        operation: &'static str,
        #[source]
        source: StorageError,
    },
}

/// OAuth client authentication errors
#[derive(Debug, Error)]
pub enum OAuthError {
    /// Invalid client credentials
    #[error("error-clientsync-oauth-1 Invalid client credentials: {0}")]
    InvalidClient(String),

    /// Unauthorized client
    #[error("error-clientsync-oauth-2 Unauthorized client: {0}")]
    UnauthorizedClient(String),

    /// Server error
    #[error("error-clientsync-oauth-3 Server error: {0}")]
    ServerError(String),
}
