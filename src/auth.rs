//! Authenticate boundary: api-key resolution and account provisioning.
//!
//! The decision engine never sees credentials; this module resolves bearer
//! secrets to users and owns the login-by-username trust model (unknown
//! name → new member account), keeping that weak-but-deliberate behavior
//! out of the engine.

use std::sync::Arc;

use log::info;
use rand::Rng;
use rand::distributions::Alphanumeric;

use crate::error::GatewayError;
use crate::store::{NewUser, Role, Store, StoreError, User};

/// Length of generated api keys, in alphanumeric characters.
const API_KEY_LEN: usize = 22;

/// Resolves api keys to users and provisions accounts.
pub struct Authenticator {
    store: Arc<dyn Store>,
    default_credits: i64,
}

impl Authenticator {
    pub fn new(store: Arc<dyn Store>, default_credits: i64) -> Self {
        Self {
            store,
            default_credits,
        }
    }

    /// Resolve a bearer secret to a known user, or `None` for
    /// absent/unknown credentials.
    pub fn authenticate(&self, api_key: &str) -> Result<Option<User>, GatewayError> {
        if api_key.is_empty() {
            return Ok(None);
        }
        Ok(self.store.user_by_api_key(api_key)?)
    }

    /// Log in by username, provisioning a new member account with a fresh
    /// api key if the name is unknown. No password; the returned api key is
    /// the account's only credential.
    pub fn login(&self, username: &str) -> Result<User, GatewayError> {
        if let Some(user) = self.store.user_by_name(username)? {
            return Ok(user);
        }

        match self.store.insert_user(NewUser {
            username: username.to_string(),
            api_key: generate_api_key(),
            role: Role::Member,
            credits: self.default_credits,
        }) {
            Ok(user) => {
                info!("provisioned member account {:?} (user {})", username, user.id);
                Ok(user)
            }
            // Lost a provisioning race: another login created the name first.
            Err(StoreError::Conflict(_)) => {
                let user = self
                    .store
                    .user_by_name(username)?
                    .ok_or_else(|| StoreError::Conflict(format!("username {username:?}")))?;
                Ok(user)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Create the bootstrap admin account if no admin exists yet. Returns
    /// the new account (with its one-time-visible api key) when created.
    pub fn ensure_admin(
        &self,
        username: &str,
        credits: i64,
    ) -> Result<Option<User>, GatewayError> {
        if self.store.has_admin()? {
            return Ok(None);
        }
        let admin = self.store.insert_user(NewUser {
            username: username.to_string(),
            api_key: generate_api_key(),
            role: Role::Admin,
            credits,
        })?;
        info!("bootstrap admin {:?} created (user {})", username, admin.id);
        Ok(Some(admin))
    }
}

/// Random alphanumeric bearer secret.
fn generate_api_key() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(API_KEY_LEN)
        .map(char::from)
        .collect()
}
