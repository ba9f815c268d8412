//! In-memory store with JSON snapshot persistence.

use std::path::Path;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use super::{
    Action, CommandId, CommandRecord, NewCommand, NewUser, Role, Rule, RuleId, SpendOutcome,
    Store, StoreError, User, UserId,
};

/// All tables behind a single `RwLock`. One writer at a time keeps
/// spend-and-record indivisible without per-table lock ordering.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Tables>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Tables {
    users: Vec<User>,
    rules: Vec<Rule>,
    commands: Vec<CommandRecord>,
    next_user_id: u64,
    next_rule_id: u64,
    next_command_id: u64,
}

/// Serializable snapshot of the full store state.
#[derive(Debug, Serialize, Deserialize)]
pub struct Snapshot {
    users: Vec<User>,
    rules: Vec<Rule>,
    commands: Vec<CommandRecord>,
    next_user_id: u64,
    next_rule_id: u64,
    next_command_id: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store from a snapshot.
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            inner: RwLock::new(Tables {
                users: snapshot.users,
                rules: snapshot.rules,
                commands: snapshot.commands,
                next_user_id: snapshot.next_user_id,
                next_rule_id: snapshot.next_rule_id,
                next_command_id: snapshot.next_command_id,
            }),
        }
    }

    /// Copy out the current state for persistence.
    pub fn snapshot(&self) -> Result<Snapshot, StoreError> {
        let t = self.read()?;
        Ok(Snapshot {
            users: t.users.clone(),
            rules: t.rules.clone(),
            commands: t.commands.clone(),
            next_user_id: t.next_user_id,
            next_rule_id: t.next_rule_id,
            next_command_id: t.next_command_id,
        })
    }

    /// Load a store from a JSON snapshot file. A missing file yields an
    /// empty store; a present-but-unparseable file is an error.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let snapshot: Snapshot = serde_json::from_str(&content)
                    .map_err(|e| StoreError::Corrupt(format!("{}: {e}", path.display())))?;
                Ok(Self::from_snapshot(snapshot))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::new()),
            Err(e) => Err(StoreError::Unavailable(format!("{}: {e}", path.display()))),
        }
    }

    /// Write the current state to a JSON snapshot file.
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let snapshot = self.snapshot()?;
        let json = serde_json::to_string_pretty(&snapshot)
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Unavailable(format!("{}: {e}", parent.display())))?;
        }
        std::fs::write(path, json)
            .map_err(|e| StoreError::Unavailable(format!("{}: {e}", path.display())))
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Tables>, StoreError> {
        self.inner
            .read()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".into()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Tables>, StoreError> {
        self.inner
            .write()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".into()))
    }
}

impl Store for MemoryStore {
    fn insert_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut t = self.write()?;
        if t.users.iter().any(|u| u.username == user.username) {
            return Err(StoreError::Conflict(format!(
                "username {:?} already exists",
                user.username
            )));
        }
        if t.users.iter().any(|u| u.api_key == user.api_key) {
            return Err(StoreError::Conflict("api key already exists".into()));
        }
        let id = UserId(t.next_user_id);
        t.next_user_id += 1;
        let row = User {
            id,
            username: user.username,
            api_key: user.api_key,
            role: user.role,
            credits: user.credits,
        };
        t.users.push(row.clone());
        Ok(row)
    }

    fn user_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.read()?.users.iter().find(|u| u.id == id).cloned())
    }

    fn user_by_name(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .read()?
            .users
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }

    fn user_by_api_key(&self, api_key: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .read()?
            .users
            .iter()
            .find(|u| u.api_key == api_key)
            .cloned())
    }

    fn has_admin(&self) -> Result<bool, StoreError> {
        Ok(self.read()?.users.iter().any(|u| u.role == Role::Admin))
    }

    fn try_spend(&self, id: UserId) -> Result<SpendOutcome, StoreError> {
        let mut t = self.write()?;
        let user = t
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("user {id}")))?;
        // Zero or negative blocks the spend; negative is never clamped.
        if user.credits <= 0 {
            return Ok(SpendOutcome::Insufficient);
        }
        user.credits -= 1;
        Ok(SpendOutcome::Spent {
            remaining: user.credits,
        })
    }

    fn insert_rule(&self, pattern: &str, action: Action) -> Result<Rule, StoreError> {
        let mut t = self.write()?;
        // Exact-text, case-sensitive duplicate check.
        if t.rules.iter().any(|r| r.pattern == pattern) {
            return Err(StoreError::Conflict(format!(
                "rule pattern {pattern:?} already exists"
            )));
        }
        let id = RuleId(t.next_rule_id);
        t.next_rule_id += 1;
        let rule = Rule {
            id,
            pattern: pattern.to_string(),
            action,
        };
        t.rules.push(rule.clone());
        Ok(rule)
    }

    fn list_rules(&self) -> Result<Vec<Rule>, StoreError> {
        Ok(self.read()?.rules.clone())
    }

    fn rule_by_pattern(&self, pattern: &str) -> Result<Option<Rule>, StoreError> {
        Ok(self
            .read()?
            .rules
            .iter()
            .find(|r| r.pattern == pattern)
            .cloned())
    }

    fn append_command(&self, cmd: NewCommand) -> Result<CommandRecord, StoreError> {
        let mut t = self.write()?;
        let id = CommandId(t.next_command_id);
        t.next_command_id += 1;
        let record = CommandRecord {
            id,
            user_id: cmd.user_id,
            command_text: cmd.command_text,
            status: cmd.status,
            reason: cmd.reason,
            created_at: chrono::Utc::now(),
        };
        t.commands.push(record.clone());
        Ok(record)
    }

    fn commands_by_user(&self, id: UserId) -> Result<Vec<CommandRecord>, StoreError> {
        let t = self.read()?;
        let mut records: Vec<_> = t
            .commands
            .iter()
            .filter(|c| c.user_id == id)
            .cloned()
            .collect();
        // Append-only ids are monotonic, so id order is submission order.
        records.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(records)
    }
}
