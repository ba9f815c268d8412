//! unbound-gate: a gated command-submission gateway.
//!
//! Callers submit shell-like command strings under an API key. Each command
//! is classified against an ordered, admin-editable set of regex rules
//! (first match wins, deny by default); acceptance spends one per-user
//! credit atomically, and every submission leaves exactly one immutable
//! audit record. No command is ever executed — "execution" is a status flag.
//!
//! # Architecture
//!
//! - **[`engine`]** — Decision engine: classifier, rule store, credit ledger, audit log.
//! - **[`store`]** — Storage handle: record types, `Store` trait, in-memory backend with snapshots.
//! - **[`auth`]** — Authenticate boundary: api-key resolution, auto-provision login, admin bootstrap.
//! - **[`gateway`]** — Boundary facade wiring auth, engine, and admin gating.
//! - **[`config`]** — Configuration loading: embedded defaults + user overlay merge.
//! - **[`logging`]** — Process log setup and best-effort verdict log file.

/// Authentication and account provisioning.
pub mod auth;
/// Configuration types, loading, and overlay merge logic.
pub mod config;
/// Decision engine: classification, credit spend, audit.
pub mod engine;
/// Error taxonomy for gateway operations.
pub mod error;
/// The boundary facade consumed by transports.
pub mod gateway;
/// Log setup and verdict file logging.
pub mod logging;
/// Storage handle, record types, and the in-memory backend.
pub mod store;

pub use error::GatewayError;
pub use gateway::Gateway;

use std::sync::Arc;

use store::MemoryStore;

/// Build a gateway over a fresh in-memory store with default configuration.
///
/// This is the main entry point for tests and simple usage.
/// For persistent state or custom config, build the [`Gateway`] directly.
pub fn open_in_memory() -> Result<Gateway, GatewayError> {
    let config = config::Config::default_config();
    Gateway::new(&config, Arc::new(MemoryStore::new()))
}
