//! PostgreSQL storage implementations
//!
//! This module provides the PostgreSQL-based client registry.
//! PostgreSQL is suitable for production deployments with high availability requirements.

mod registered_clients;

pub use registered_clients::PostgresClientRegistry;
