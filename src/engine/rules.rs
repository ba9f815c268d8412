//! Rule store component: validated, append-only rule administration.

use std::sync::Arc;

use regex::Regex;

use crate::error::GatewayError;
use crate::store::{Action, Rule, Store, StoreError};

/// Validating front for the rules table.
///
/// Patterns must compile before they are stored, so classification never
/// sees an invalid rule under normal operation. Duplicate detection is
/// exact pattern-text equality, case-sensitive — not semantic equivalence.
pub struct RuleStore {
    store: Arc<dyn Store>,
}

impl RuleStore {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Validate and append a rule.
    pub fn add(&self, pattern: &str, action: Action) -> Result<Rule, GatewayError> {
        if let Err(e) = Regex::new(pattern) {
            return Err(GatewayError::InvalidPattern {
                pattern: pattern.to_string(),
                source: Box::new(e),
            });
        }
        match self.store.insert_rule(pattern, action) {
            Ok(rule) => {
                log::info!("rule {} added: {:?} -> {}", rule.id.0, pattern, action.as_str());
                Ok(rule)
            }
            Err(StoreError::Conflict(_)) => {
                Err(GatewayError::DuplicatePattern(pattern.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// All rules in evaluation order.
    pub fn list(&self) -> Result<Vec<Rule>, GatewayError> {
        Ok(self.store.list_rules()?)
    }

    /// Exact-text existence check.
    pub fn contains(&self, pattern: &str) -> Result<bool, GatewayError> {
        Ok(self.store.rule_by_pattern(pattern)?.is_some())
    }
}
