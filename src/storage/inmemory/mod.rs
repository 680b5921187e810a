//! In-memory storage implementations
//!
//! This module provides an in-memory client registry.
//! It is suitable for development and testing; nothing survives a restart.

mod clients;

pub use clients::MemoryClientRegistry;
