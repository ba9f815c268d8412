//! Boundary facade: the narrow interface the outside world calls.
//!
//! Owns authentication and admin gating; everything else delegates to the
//! decision engine. Construction bootstraps the store from configuration:
//! a default admin account when none exists, and the seed rule list.

use std::sync::Arc;

use log::warn;

use crate::auth::Authenticator;
use crate::config::Config;
use crate::engine::DecisionEngine;
use crate::error::GatewayError;
use crate::store::{Action, CommandRecord, Role, Rule, Store, User, UserId};

pub struct Gateway {
    store: Arc<dyn Store>,
    engine: DecisionEngine,
    auth: Authenticator,
    /// Admin account created during this bootstrap, if any. Its generated
    /// api key is visible only here; surface it once and drop it.
    bootstrap_admin: Option<User>,
}

impl Gateway {
    /// Wire the components around a shared storage handle and run the
    /// bootstrap seeding.
    pub fn new(config: &Config, store: Arc<dyn Store>) -> Result<Self, GatewayError> {
        let engine = DecisionEngine::new(Arc::clone(&store));
        let auth = Authenticator::new(Arc::clone(&store), config.settings.default_credits);

        let bootstrap_admin =
            auth.ensure_admin(&config.settings.admin_username, config.settings.admin_credits)?;

        for seed in &config.rules.seed {
            if engine.rules().contains(&seed.pattern)? {
                continue;
            }
            match engine.rules().add(&seed.pattern, seed.action) {
                Ok(_) => {}
                // A bad seed pattern shouldn't take the gateway down.
                Err(e @ GatewayError::InvalidPattern { .. }) => {
                    warn!("skipping seed rule: {e}");
                }
                // Lost a seeding race with a concurrent bootstrap.
                Err(GatewayError::DuplicatePattern(_)) => {}
                Err(e) => return Err(e),
            }
        }

        Ok(Self {
            store,
            engine,
            auth,
            bootstrap_admin,
        })
    }

    /// Admin account created by this construction, if one was. The caller
    /// is responsible for showing its api key exactly once.
    pub fn bootstrap_admin(&self) -> Option<&User> {
        self.bootstrap_admin.as_ref()
    }

    // ── Boundary contract ──

    /// Resolve a bearer secret to a user; `None` is anonymous.
    pub fn authenticate(&self, api_key: &str) -> Result<Option<User>, GatewayError> {
        self.auth.authenticate(api_key)
    }

    /// Log in by username, auto-provisioning unknown names.
    pub fn login(&self, username: &str) -> Result<User, GatewayError> {
        self.auth.login(username)
    }

    /// The single write path into the decision engine.
    pub fn submit(&self, user_id: UserId, command_text: &str) -> Result<CommandRecord, GatewayError> {
        self.engine.submit(user_id, command_text)
    }

    /// One user's audit history, most-recent first.
    pub fn history(&self, user_id: UserId) -> Result<Vec<CommandRecord>, GatewayError> {
        self.engine.audit().list_by_user(user_id)
    }

    /// Read-only balance snapshot.
    pub fn credits(&self, user_id: UserId) -> Result<i64, GatewayError> {
        self.engine.ledger().balance(user_id)
    }

    /// Admin-only rule append. Non-admin callers are rejected before the
    /// rule store is touched.
    pub fn add_rule(
        &self,
        caller: UserId,
        pattern: &str,
        action: Action,
    ) -> Result<Rule, GatewayError> {
        self.require_admin(caller)?;
        self.engine.rules().add(pattern, action)
    }

    /// Rule listing; admin-facing in the reference deployment but not
    /// inherently privileged.
    pub fn list_rules(&self) -> Result<Vec<Rule>, GatewayError> {
        self.engine.rules().list()
    }

    fn require_admin(&self, caller: UserId) -> Result<(), GatewayError> {
        match self.store.user_by_id(caller)? {
            Some(user) if user.role == Role::Admin => Ok(()),
            Some(_) => Err(GatewayError::Unauthorized),
            None => Err(GatewayError::UnknownUser(caller)),
        }
    }
}
