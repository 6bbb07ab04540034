//! Source-specific ingest adapters. Each returns canonical `AuthEvent`s with no network
//! I/O — a real deployment replaces these with adapters that poll the actual agent/log
//! source and still return canonical events.

pub mod crowdstrike;
pub mod unix_auth;
