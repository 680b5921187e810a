//! SQLite storage implementations
//!
//! This module provides the SQLite-based client registry.
//! SQLite is suitable for single-instance deployments and development.

mod registered_clients;

pub use registered_clients::SqliteClientRegistry;
