//! SQLite implementation for the client registry

use crate::errors::StorageError;
use crate::oauth::types::*;
use crate::storage::traits::{ClientRegistry, ClientStream, Result};
use async_trait::async_trait;
use chrono::Utc;
use futures::StreamExt;
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqliteRow};
use std::collections::BTreeSet;

/// SQLite implementation of the client registry
pub struct SqliteClientRegistry {
    pool: SqlitePool,
}

impl SqliteClientRegistry {
    /// Create a new SQLite client registry
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Run database migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations/sqlite")
            .run(&self.pool)
            .await
            .map_err(|e| StorageError::DatabaseError(format!("Migration failed: {}", e)))?;
        Ok(())
    }

    /// Serialize permissions to JSON string
    fn serialize_permissions(permissions: &BTreeSet<Permission>) -> Result<String> {
        let strings: Vec<&str> = permissions.iter().map(Permission::as_str).collect();
        serde_json::to_string(&strings).map_err(|e| StorageError::SerializationError(e.to_string()))
    }

    /// Deserialize permissions from JSON string
    fn deserialize_permissions(json: &str) -> Result<BTreeSet<Permission>> {
        let strings: Vec<String> = serde_json::from_str(json)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;
        strings.iter().map(|s| s.parse()).collect()
    }

    /// Convert SQLite row to RegisteredClient
    fn row_to_registered_client(row: &SqliteRow) -> Result<RegisteredClient> {
        let client_id: String = row
            .try_get("client_id")
            .map_err(|e| StorageError::DatabaseError(format!("Failed to get client_id: {}", e)))?;
        let client_secret: String = row.try_get("client_secret").map_err(|e| {
            StorageError::DatabaseError(format!("Failed to get client_secret: {}", e))
        })?;

        let client_type_str: String = row.try_get("client_type").map_err(|e| {
            StorageError::DatabaseError(format!("Failed to get client_type: {}", e))
        })?;
        let client_type = client_type_str.parse()?;

        let display_name: String = row.try_get("display_name").map_err(|e| {
            StorageError::DatabaseError(format!("Failed to get display_name: {}", e))
        })?;

        let permissions_json: String = row.try_get("permissions").map_err(|e| {
            StorageError::DatabaseError(format!("Failed to get permissions: {}", e))
        })?;
        let permissions = Self::deserialize_permissions(&permissions_json)?;

        let created_at_str: String = row
            .try_get("created_at")
            .map_err(|e| StorageError::DatabaseError(format!("Failed to get created_at: {}", e)))?;
        let created_at = chrono::DateTime::parse_from_rfc3339(&created_at_str)
            .map_err(|e| StorageError::InvalidData(format!("Invalid created_at timestamp: {}", e)))?
            .with_timezone(&Utc);

        let updated_at_str: String = row
            .try_get("updated_at")
            .map_err(|e| StorageError::DatabaseError(format!("Failed to get updated_at: {}", e)))?;
        let updated_at = chrono::DateTime::parse_from_rfc3339(&updated_at_str)
            .map_err(|e| StorageError::InvalidData(format!("Invalid updated_at timestamp: {}", e)))?
            .with_timezone(&Utc);

        Ok(RegisteredClient {
            client_id,
            client_secret,
            client_type,
            display_name,
            permissions,
            created_at,
            updated_at,
        })
    }
}

#[async_trait]
impl ClientRegistry for SqliteClientRegistry {
    async fn find_by_client_id(&self, client_id: &str) -> Result<Option<RegisteredClient>> {
        let row = sqlx::query("SELECT * FROM registered_clients WHERE client_id = ?")
            .bind(client_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::DatabaseError(e.to_string()))?;

        row.as_ref().map(Self::row_to_registered_client).transpose()
    }

    async fn create(&self, descriptor: &ClientDescriptor) -> Result<RegisteredClient> {
        let client = RegisteredClient::from_descriptor(descriptor, Utc::now());
        let permissions_json = Self::serialize_permissions(&client.permissions)?;

        sqlx::query(
            r#"
            INSERT INTO registered_clients (
                client_id, client_secret, client_type, display_name, permissions,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&client.client_id)
        .bind(&client.client_secret)
        .bind(client.client_type.as_str())
        .bind(&client.display_name)
        .bind(&permissions_json)
        .bind(client.created_at.to_rfc3339())
        .bind(client.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => StorageError::AlreadyExists(
                format!("Client already exists: {}", client.client_id),
            ),
            e => StorageError::DatabaseError(e.to_string()),
        })?;

        Ok(client)
    }

    async fn update(
        &self,
        existing: &RegisteredClient,
        descriptor: &ClientDescriptor,
    ) -> Result<RegisteredClient> {
        let mut client = existing.clone();
        client.apply_descriptor(descriptor, Utc::now());
        let permissions_json = Self::serialize_permissions(&client.permissions)?;

        let result = sqlx::query(
            r#"
            UPDATE registered_clients SET
                client_secret = ?, client_type = ?, display_name = ?, permissions = ?,
                updated_at = ?
            WHERE client_id = ?
            "#,
        )
        .bind(&client.client_secret)
        .bind(client.client_type.as_str())
        .bind(&client.display_name)
        .bind(&permissions_json)
        .bind(client.updated_at.to_rfc3339())
        .bind(&client.client_id)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::DatabaseError(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!(
                "Client not found: {}",
                client.client_id
            )));
        }

        Ok(client)
    }

    async fn delete(&self, client: &RegisteredClient) -> Result<()> {
        let result = sqlx::query("DELETE FROM registered_clients WHERE client_id = ?")
            .bind(&client.client_id)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::DatabaseError(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!(
                "Client not found: {}",
                client.client_id
            )));
        }

        Ok(())
    }

    fn list_all(&self) -> ClientStream<'_> {
        sqlx::query("SELECT * FROM registered_clients ORDER BY client_id")
            .fetch(&self.pool)
            .map(|row| {
                let row = row.map_err(|e| StorageError::DatabaseError(e.to_string()))?;
                Self::row_to_registered_client(&row)
            })
            .boxed()
    }
}
