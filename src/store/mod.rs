//! Storage handle and record types.
//!
//! Three logical tables — users, rules, commands — behind a [`Store`] trait
//! so the engine is storage-engine-agnostic. The crate ships an in-memory
//! implementation with JSON snapshot persistence ([`memory::MemoryStore`]);
//! a durable backend only needs to honor the same atomicity contracts.

pub mod memory;

pub use memory::MemoryStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ── Identifiers ──

/// Opaque user identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

/// Opaque rule identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleId(pub u64);

/// Opaque audit record identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandId(pub u64);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

// ── Records ──

/// Account role. Admins may edit the rule set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Member,
}

/// Classification outcome for a rule match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    AutoAccept,
    AutoReject,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::AutoAccept => "AUTO_ACCEPT",
            Action::AutoReject => "AUTO_REJECT",
        }
    }
}

/// Final verdict status of a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Executed,
    Rejected,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Executed => "executed",
            Status::Rejected => "rejected",
        }
    }
}

/// A gateway account. Credits are mutated only through [`Store::try_spend`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub api_key: String,
    pub role: Role,
    pub credits: i64,
}

/// An ordered (pattern, action) classification rule.
/// Insertion order is evaluation order; rules are append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub id: RuleId,
    pub pattern: String,
    pub action: Action,
}

/// One immutable audit entry per submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandRecord {
    pub id: CommandId,
    pub user_id: UserId,
    pub command_text: String,
    pub status: Status,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

/// Fields for a new user row; the store assigns the id.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub api_key: String,
    pub role: Role,
    pub credits: i64,
}

/// Fields for a new audit row; the store assigns id and timestamp.
#[derive(Debug, Clone)]
pub struct NewCommand {
    pub user_id: UserId,
    pub command_text: String,
    pub status: Status,
    pub reason: String,
}

/// Result of an atomic spend attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpendOutcome {
    /// One credit was deducted; carries the post-decrement balance.
    Spent { remaining: i64 },
    /// Balance was non-positive; nothing was deducted.
    Insufficient,
}

// ── Errors ──

/// Storage-level failures. Domain outcomes (insufficient credits, duplicate
/// patterns) are modeled as values or conflict kinds, not panics.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Referenced row does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Uniqueness violation (duplicate username, api key, or pattern).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Snapshot or row failed to serialize/deserialize.
    #[error("corrupt state: {0}")]
    Corrupt(String),

    /// Backend transiently unavailable; safe to retry at the boundary.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

// ── Store contract ──

/// Storage handle shared by the engine components.
///
/// Atomicity contracts:
/// - [`try_spend`](Store::try_spend) must make read-balance-then-decrement
///   indivisible with respect to concurrent spends on the same user.
/// - [`insert_rule`](Store::insert_rule) must publish either the pre-add or
///   post-add rule list to concurrent readers, never a partial rule.
/// - [`append_command`](Store::append_command) must be atomic per record.
pub trait Store: Send + Sync {
    fn insert_user(&self, user: NewUser) -> Result<User, StoreError>;
    fn user_by_id(&self, id: UserId) -> Result<Option<User>, StoreError>;
    fn user_by_name(&self, username: &str) -> Result<Option<User>, StoreError>;
    fn user_by_api_key(&self, api_key: &str) -> Result<Option<User>, StoreError>;
    /// Whether any admin account exists (bootstrap check).
    fn has_admin(&self) -> Result<bool, StoreError>;

    /// Atomically deduct one credit if the balance is positive.
    fn try_spend(&self, id: UserId) -> Result<SpendOutcome, StoreError>;

    /// Append a rule. Fails with [`StoreError::Conflict`] on exact
    /// pattern-text duplicates; pattern validity is the caller's concern.
    fn insert_rule(&self, pattern: &str, action: Action) -> Result<Rule, StoreError>;
    /// All rules in insertion order.
    fn list_rules(&self) -> Result<Vec<Rule>, StoreError>;
    fn rule_by_pattern(&self, pattern: &str) -> Result<Option<Rule>, StoreError>;

    /// Append one audit record. Irrevocable.
    fn append_command(&self, cmd: NewCommand) -> Result<CommandRecord, StoreError>;
    /// Audit records for one user, most-recent first.
    fn commands_by_user(&self, id: UserId) -> Result<Vec<CommandRecord>, StoreError>;
}
