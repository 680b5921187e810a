//! Declarative OAuth client sync.
//!
//! Converges a configured list of trusted OAuth clients onto a persistent
//! client registry at service startup, so the authorization server can
//! authenticate `client_credentials` requests against it.

pub mod config;
pub mod errors;
pub mod oauth;
pub mod storage;
