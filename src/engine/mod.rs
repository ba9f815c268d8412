//! Decision engine: classification, credit spend, and audit in one pass.

pub mod audit;
pub mod classify;
pub mod ledger;
pub mod rules;

pub use audit::AuditLog;
pub use classify::classify;
pub use ledger::CreditLedger;
pub use rules::RuleStore;

use std::sync::Arc;

use log::{debug, info};

use crate::error::GatewayError;
use crate::store::{Action, CommandRecord, Status, Store, UserId};

/// Verdict reason for an accepted command with credits available.
pub const REASON_EXECUTED: &str = "Command executed successfully";
/// Verdict reason for an accepted command with no credits left.
pub const REASON_NO_CREDITS: &str = "No credits left";
/// Verdict reason for a rejected command. Deliberately identical whether the
/// command matched an explicit reject rule or matched nothing at all.
pub const REASON_BLOCKED: &str = "Blocked by rule";

/// Orchestrates the classifier, ledger, and audit log for one submission.
///
/// Every component shares the same storage handle; nothing here holds
/// mutable state of its own.
pub struct DecisionEngine {
    store: Arc<dyn Store>,
    rules: RuleStore,
    ledger: CreditLedger,
    audit: AuditLog,
}

impl DecisionEngine {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            rules: RuleStore::new(Arc::clone(&store)),
            ledger: CreditLedger::new(Arc::clone(&store)),
            audit: AuditLog::new(Arc::clone(&store)),
            store,
        }
    }

    /// Rule administration surface.
    pub fn rules(&self) -> &RuleStore {
        &self.rules
    }

    /// Credit accounting surface.
    pub fn ledger(&self) -> &CreditLedger {
        &self.ledger
    }

    /// Audit history surface.
    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    /// Classify a command, spend a credit on acceptance, and record the
    /// verdict. Exactly one audit record is appended per call; its status
    /// is `Executed` iff a credit was actually spent.
    pub fn submit(
        &self,
        user_id: UserId,
        command_text: &str,
    ) -> Result<CommandRecord, GatewayError> {
        // Reject unknown users before touching the ledger or the log.
        if self.store.user_by_id(user_id)?.is_none() {
            return Err(GatewayError::UnknownUser(user_id));
        }

        let rules = self.rules.list()?;
        let action = classify(command_text, &rules);
        debug!("user {user_id} submitted {command_text:?} -> {}", action.as_str());

        let (status, reason) = match action {
            Action::AutoAccept => match self.ledger.try_spend(user_id) {
                Ok(remaining) => {
                    debug!("user {user_id} spent one credit, {remaining} left");
                    (Status::Executed, REASON_EXECUTED)
                }
                Err(GatewayError::InsufficientCredits) => (Status::Rejected, REASON_NO_CREDITS),
                Err(e) => return Err(e),
            },
            Action::AutoReject => (Status::Rejected, REASON_BLOCKED),
        };

        let record = self.audit.append(user_id, command_text, status, reason)?;
        info!(
            "verdict for user {user_id}: {} ({reason})",
            status.as_str()
        );
        Ok(record)
    }
}
