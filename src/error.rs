//! Error taxonomy for gateway operations.

use crate::store::{StoreError, UserId};
use thiserror::Error;

/// Errors surfaced by the decision engine and the boundary facade.
///
/// All variants are recoverable; the caller decides presentation. Storage
/// failures pass through uninterpreted via [`GatewayError::Storage`].
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Rule pattern does not compile under the regex dialect in use.
    #[error("invalid rule pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: Box<regex::Error>,
    },

    /// Exact pattern text already present in the rule store.
    #[error("rule pattern {0:?} already exists")]
    DuplicatePattern(String),

    /// Spend attempted against a non-positive balance.
    #[error("no credits left")]
    InsufficientCredits,

    /// Non-admin caller attempting an admin-only operation.
    #[error("not authorized")]
    Unauthorized,

    /// Operation references a user id that does not exist.
    #[error("unknown user {0}")]
    UnknownUser(UserId),

    /// Storage collaborator failure, propagated without interpretation.
    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl GatewayError {
    /// Stable machine-readable kind, used by the boundary layer for
    /// error responses.
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::InvalidPattern { .. } => "invalid_pattern",
            GatewayError::DuplicatePattern(_) => "duplicate_pattern",
            GatewayError::InsufficientCredits => "insufficient_credits",
            GatewayError::Unauthorized => "unauthorized",
            GatewayError::UnknownUser(_) => "unknown_user",
            GatewayError::Storage(_) => "storage",
        }
    }
}
