//! PostgreSQL implementation for the client registry

use crate::errors::StorageError;
use crate::oauth::types::*;
use crate::storage::traits::{ClientRegistry, ClientStream, Result};
use async_trait::async_trait;
use chrono::Utc;
use futures::StreamExt;
use sqlx::Row;
use sqlx::postgres::{PgPool, PgRow};
use std::collections::BTreeSet;

/// PostgreSQL implementation of the client registry
pub struct PostgresClientRegistry {
    pool: PgPool,
}

impl PostgresClientRegistry {
    /// Create a new PostgreSQL client registry
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run database migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations/postgres")
            .run(&self.pool)
            .await
            .map_err(|e| StorageError::DatabaseError(format!("Migration failed: {}", e)))?;
        Ok(())
    }

    /// Serialize permissions to a JSONB value
    fn serialize_permissions(permissions: &BTreeSet<Permission>) -> serde_json::Value {
        serde_json::Value::Array(
            permissions
                .iter()
                .map(|permission| serde_json::Value::String(permission.as_str().to_string()))
                .collect(),
        )
    }

    /// Deserialize permissions from a JSONB value
    fn deserialize_permissions(value: serde_json::Value) -> Result<BTreeSet<Permission>> {
        let strings: Vec<String> = serde_json::from_value(value)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;
        strings.iter().map(|s| s.parse()).collect()
    }

    /// Convert PostgreSQL row to RegisteredClient
    fn row_to_registered_client(row: &PgRow) -> Result<RegisteredClient> {
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

        let permissions_json: serde_json::Value = row.try_get("permissions").map_err(|e| {
            StorageError::DatabaseError(format!("Failed to get permissions: {}", e))
        })?;
        let permissions = Self::deserialize_permissions(permissions_json)?;

        let created_at: chrono::DateTime<Utc> = row
            .try_get("created_at")
            .map_err(|e| StorageError::DatabaseError(format!("Failed to get created_at: {}", e)))?;
        let updated_at: chrono::DateTime<Utc> = row
            .try_get("updated_at")
            .map_err(|e| StorageError::DatabaseError(format!("Failed to get updated_at: {}", e)))?;

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
impl ClientRegistry for PostgresClientRegistry {
    async fn find_by_client_id(&self, client_id: &str) -> Result<Option<RegisteredClient>> {
        let row = sqlx::query("SELECT * FROM registered_clients WHERE client_id = $1")
            .bind(client_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::DatabaseError(e.to_string()))?;

        row.as_ref().map(Self::row_to_registered_client).transpose()
    }

    async fn create(&self, descriptor: &ClientDescriptor) -> Result<RegisteredClient> {
        let client = RegisteredClient::from_descriptor(descriptor, Utc::now());

        sqlx::query(
            r#"
            INSERT INTO registered_clients (
                client_id, client_secret, client_type, display_name, permissions,
                created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(&client.client_id)
        .bind(&client.client_secret)
        .bind(client.client_type.as_str())
        .bind(&client.display_name)
        .bind(Self::serialize_permissions(&client.permissions))
        .bind(client.created_at)
        .bind(client.updated_at)
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

        let result = sqlx::query(
            r#"
            UPDATE registered_clients SET
                client_secret = $1, client_type = $2, display_name = $3, permissions = $4,
                updated_at = $5
            WHERE client_id = $6
            "#,
        )
        .bind(&client.client_secret)
        .bind(client.client_type.as_str())
        .bind(&client.display_name)
        .bind(Self::serialize_permissions(&client.permissions))
        .bind(client.updated_at)
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
        let result = sqlx::query("DELETE FROM registered_clients WHERE client_id = $1")
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
