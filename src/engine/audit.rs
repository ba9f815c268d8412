//! Append-only audit history of submissions.

use std::sync::Arc;

use crate::error::GatewayError;
use crate::store::{CommandRecord, NewCommand, Status, Store, UserId};

/// Audit log front for the commands table. Append-only; no mutation or
/// deletion surface exists.
pub struct AuditLog {
    store: Arc<dyn Store>,
}

impl AuditLog {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Append one record for a submission verdict.
    pub fn append(
        &self,
        user_id: UserId,
        command_text: &str,
        status: Status,
        reason: &str,
    ) -> Result<CommandRecord, GatewayError> {
        Ok(self.store.append_command(NewCommand {
            user_id,
            command_text: command_text.to_string(),
            status,
            reason: reason.to_string(),
        })?)
    }

    /// One user's history, most-recent first.
    pub fn list_by_user(&self, user_id: UserId) -> Result<Vec<CommandRecord>, GatewayError> {
        Ok(self.store.commands_by_user(user_id)?)
    }
}
