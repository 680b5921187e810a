//! Trait-based client registry with in-memory, SQLite, and PostgreSQL backends.

pub mod inmemory;
pub mod traits;

// Feature-gated storage implementations
#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "postgres")]
pub mod postgres;

pub use inmemory::MemoryClientRegistry;
pub use traits::*;

#[cfg(feature = "postgres")]
pub use postgres::PostgresClientRegistry;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteClientRegistry;

use crate::errors::StorageError;
use std::sync::Arc;

/// Storage backend configuration and factory
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    #[cfg(feature = "sqlite")]
    Sqlite(String), // Connection string/path
    #[cfg(feature = "postgres")]
    Postgres(String), // Connection string
}

/// Create a client registry based on configuration, running migrations for SQL backends
pub async fn create_client_registry(
    backend: StorageBackend,
) -> std::result::Result<Arc<dyn ClientRegistry>, StorageError> {
    match backend {
        StorageBackend::Memory => Ok(Arc::new(MemoryClientRegistry::new())),
        #[cfg(feature = "sqlite")]
        StorageBackend::Sqlite(database_url) => {
            let options = database_url
                .parse::<sqlx::sqlite::SqliteConnectOptions>()
                .map_err(|e| {
                    StorageError::ConnectionFailed(format!("Invalid SQLite URL: {}", e))
                })?
                .create_if_missing(true);
            let pool = sqlx::SqlitePool::connect_with(options)
                .await
                .map_err(|e| {
                    StorageError::ConnectionFailed(format!("SQLite connection failed: {}", e))
                })?;

            let registry = sqlite::SqliteClientRegistry::new(pool);
            registry.migrate().await?;

            Ok(Arc::new(registry))
        }
        #[cfg(feature = "postgres")]
        StorageBackend::Postgres(database_url) => {
            let pool = sqlx::postgres::PgPool::connect(&database_url)
                .await
                .map_err(|e| {
                    StorageError::ConnectionFailed(format!("PostgreSQL connection failed: {}", e))
                })?;

            let registry = postgres::PostgresClientRegistry::new(pool);
            registry.migrate().await?;

            Ok(Arc::new(registry))
        }
    }
}

/// Parse storage backend from configuration string
#[cfg_attr(
    not(any(feature = "sqlite", feature = "postgres")),
    allow(unused_variables)
)]
pub fn parse_storage_backend(
    backend_name: &str,
    database_url: Option<&str>,
) -> std::result::Result<StorageBackend, StorageError> {
    match backend_name {
        "memory" => Ok(StorageBackend::Memory),
        #[cfg(feature = "sqlite")]
        "sqlite" => {
            let url = database_url.unwrap_or("sqlite:clients.db");
            Ok(StorageBackend::Sqlite(url.to_string()))
        }
        #[cfg(feature = "postgres")]
        "postgres" => {
            let url = database_url.ok_or_else(|| {
                StorageError::InvalidData("DATABASE_URL required for postgres backend".to_string())
            })?;
            Ok(StorageBackend::Postgres(url.to_string()))
        }
        _ => Err(StorageError::InvalidData(format!(
            "Unknown storage backend: {}",
            backend_name
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_storage_backend() {
        assert_eq!(
            parse_storage_backend("memory", None).unwrap(),
            StorageBackend::Memory
        );
        assert!(parse_storage_backend("mongodb", None).is_err());
    }

    #[test]
    fn test_memory_backend_ignores_database_url() {
        assert_eq!(
            parse_storage_backend("memory", Some("sqlite:clients.db")).unwrap(),
            StorageBackend::Memory
        );
    }

    #[cfg(feature = "postgres")]
    #[test]
    fn test_postgres_backend_requires_database_url() {
        assert!(parse_storage_backend("postgres", None).is_err());
        assert_eq!(
            parse_storage_backend("postgres", Some("postgres://localhost/clients")).unwrap(),
            StorageBackend::Postgres("postgres://localhost/clients".to_string())
        );
    }

    #[tokio::test]
    async fn test_create_memory_registry() {
        let registry = create_client_registry(StorageBackend::Memory).await.unwrap();
        assert!(registry.find_by_client_id("anything").await.unwrap().is_none());
    }
}
