//! Per-user credit ledger.

use std::sync::Arc;

use crate::error::GatewayError;
use crate::store::{SpendOutcome, Store, StoreError, UserId};

/// Credit accounting front for the users table.
///
/// `try_spend` is the only mutation path for balances; atomicity with
/// respect to concurrent spends on the same user is delegated to the
/// [`Store`] contract.
pub struct CreditLedger {
    store: Arc<dyn Store>,
}

impl CreditLedger {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Atomically deduct one credit. Returns the post-decrement balance.
    pub fn try_spend(&self, user_id: UserId) -> Result<i64, GatewayError> {
        match self.store.try_spend(user_id) {
            Ok(SpendOutcome::Spent { remaining }) => Ok(remaining),
            Ok(SpendOutcome::Insufficient) => Err(GatewayError::InsufficientCredits),
            Err(StoreError::NotFound(_)) => Err(GatewayError::UnknownUser(user_id)),
            Err(e) => Err(e.into()),
        }
    }

    /// Read-only balance snapshot.
    pub fn balance(&self, user_id: UserId) -> Result<i64, GatewayError> {
        let user = self
            .store
            .user_by_id(user_id)?
            .ok_or(GatewayError::UnknownUser(user_id))?;
        Ok(user.credits)
    }
}
