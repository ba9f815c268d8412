//! Configuration types, loading, and overlay merge logic.

use serde::{Deserialize, Serialize};

use crate::store::Action;

/// Embedded default configuration.
const DEFAULT_CONFIG: &str = include_str!("../config.default.toml");

// ── Final (merged) config types ──

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub rules: RulesConfig,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Settings {
    /// Credits granted to auto-provisioned member accounts.
    #[serde(default = "default_member_credits")]
    pub default_credits: i64,
    /// Credits granted to the bootstrap admin account.
    #[serde(default = "default_admin_credits")]
    pub admin_credits: i64,
    /// Username of the bootstrap admin account.
    #[serde(default = "default_admin_username")]
    pub admin_username: String,
}

fn default_member_credits() -> i64 {
    100
}

fn default_admin_credits() -> i64 {
    1000
}

fn default_admin_username() -> String {
    "admin".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_credits: default_member_credits(),
            admin_credits: default_admin_credits(),
            admin_username: default_admin_username(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct RulesConfig {
    /// Rules applied in order at startup, skipping patterns already stored.
    #[serde(default)]
    pub seed: Vec<SeedRule>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SeedRule {
    pub pattern: String,
    pub action: Action,
}

// ── Overlay types (user config that merges with defaults) ──

#[derive(Debug, Deserialize, Default)]
struct ConfigOverlay {
    #[serde(default)]
    settings: SettingsOverlay,
    #[serde(default)]
    rules: RulesOverlay,
}

#[derive(Debug, Deserialize, Default)]
struct SettingsOverlay {
    default_credits: Option<i64>,
    admin_credits: Option<i64>,
    admin_username: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct RulesOverlay {
    #[serde(default)]
    replace: bool,
    #[serde(default)]
    seed: Vec<SeedRule>,
    /// Patterns to drop from the default seed list.
    #[serde(default)]
    remove: Vec<String>,
}

// ── Merge logic ──

/// Merge a user seed list into the default seed list.
/// In replace mode: user list replaces defaults entirely.
/// In merge mode: remove patterns first, then extend (deduped by pattern).
fn merge_seed(base: &mut Vec<SeedRule>, add: Vec<SeedRule>, remove: &[String], replace: bool) {
    if replace {
        *base = add;
    } else {
        base.retain(|rule| !remove.contains(&rule.pattern));
        for rule in add {
            if !base.iter().any(|r| r.pattern == rule.pattern) {
                base.push(rule);
            }
        }
    }
}

impl Config {
    /// Load the default embedded configuration.
    pub fn default_config() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("embedded default config must parse")
    }

    /// Load configuration with resolution order:
    /// 1. Start with embedded defaults
    /// 2. Merge user overlay from ~/.config/unbound-gate/config.toml (if exists)
    ///
    /// User config merges with defaults: seed rules extend, scalars override.
    /// Set `replace = true` under `[rules]` to replace the seed list; use
    /// `remove` to subtract specific default patterns.
    pub fn load() -> Self {
        let mut config = Self::default_config();
        if let Some(overlay) = Self::load_overlay() {
            config.apply_overlay(overlay);
        }
        config
    }

    /// Try to load user overlay from ~/.config/unbound-gate/config.toml.
    fn load_overlay() -> Option<ConfigOverlay> {
        let home = std::env::var_os("HOME")?;
        let path = std::path::Path::new(&home).join(".config/unbound-gate/config.toml");
        let content = std::fs::read_to_string(path).ok()?;
        match toml::from_str(&content) {
            Ok(overlay) => Some(overlay),
            Err(e) => {
                eprintln!("unbound-gate: config parse error: {e}");
                None
            }
        }
    }

    /// Apply an overlay on top of this config (merge semantics).
    fn apply_overlay(&mut self, overlay: ConfigOverlay) {
        // Settings: scalar overrides
        if let Some(v) = overlay.settings.default_credits {
            self.settings.default_credits = v;
        }
        if let Some(v) = overlay.settings.admin_credits {
            self.settings.admin_credits = v;
        }
        if let Some(v) = overlay.settings.admin_username {
            self.settings.admin_username = v;
        }

        // Seed rules
        let r = overlay.rules;
        merge_seed(&mut self.rules.seed, r.seed, &r.remove, r.replace);
    }

    /// Apply an overlay from a TOML string. Used for testing.
    #[cfg(test)]
    fn apply_overlay_str(&mut self, toml_str: &str) {
        let overlay: ConfigOverlay = toml::from_str(toml_str).unwrap();
        self.apply_overlay(overlay);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_parses() {
        let config = Config::default_config();
        assert_eq!(config.settings.default_credits, 100);
        assert_eq!(config.settings.admin_credits, 1000);
        assert_eq!(config.settings.admin_username, "admin");
        assert_eq!(config.rules.seed.len(), 5);
    }

    #[test]
    fn default_seed_rules_all_compile() {
        let config = Config::default_config();
        for rule in &config.rules.seed {
            assert!(
                regex::Regex::new(&rule.pattern).is_ok(),
                "seed pattern must compile: {}",
                rule.pattern
            );
        }
    }

    #[test]
    fn default_seed_has_expected_rules() {
        let config = Config::default_config();
        let patterns: Vec<_> = config.rules.seed.iter().map(|r| r.pattern.as_str()).collect();
        assert!(patterns.contains(&r"rm\s+-rf\s+/"));
        assert!(patterns.contains(&r"^(ls|cat|pwd|echo)"));
        // Reject rules come before accept rules so first-match-wins blocks first.
        assert_eq!(config.rules.seed[0].action, Action::AutoReject);
    }

    // ── Merge semantics ──

    #[test]
    fn overlay_extends_seed_rules() {
        let mut config = Config::default_config();
        config.apply_overlay_str(
            r#"
            [[rules.seed]]
            pattern = '^uptime'
            action = "AUTO_ACCEPT"
        "#,
        );
        assert_eq!(config.rules.seed.len(), 6);
        assert_eq!(config.rules.seed.last().unwrap().pattern, "^uptime");
    }

    #[test]
    fn overlay_removes_seed_rules() {
        let mut config = Config::default_config();
        config.apply_overlay_str(
            r#"
            [rules]
            remove = ['^(ls|cat|pwd|echo)']
        "#,
        );
        assert!(
            !config
                .rules
                .seed
                .iter()
                .any(|r| r.pattern == r"^(ls|cat|pwd|echo)")
        );
        assert_eq!(config.rules.seed.len(), 4);
    }

    #[test]
    fn overlay_replace_seed_rules() {
        let mut config = Config::default_config();
        config.apply_overlay_str(
            r#"
            [rules]
            replace = true

            [[rules.seed]]
            pattern = '^ls'
            action = "AUTO_ACCEPT"
        "#,
        );
        assert_eq!(config.rules.seed.len(), 1);
        assert_eq!(config.rules.seed[0].pattern, "^ls");
    }

    #[test]
    fn overlay_no_duplicate_patterns() {
        let mut config = Config::default_config();
        config.apply_overlay_str(
            r#"
            [[rules.seed]]
            pattern = 'rm\s+-rf\s+/'
            action = "AUTO_REJECT"
        "#,
        );
        let count = config
            .rules
            .seed
            .iter()
            .filter(|r| r.pattern == r"rm\s+-rf\s+/")
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn overlay_scalar_overrides() {
        let mut config = Config::default_config();
        config.apply_overlay_str(
            r#"
            [settings]
            default_credits = 25
            admin_username = "root"
        "#,
        );
        assert_eq!(config.settings.default_credits, 25);
        assert_eq!(config.settings.admin_username, "root");
        // Settings not in overlay remain at defaults
        assert_eq!(config.settings.admin_credits, 1000);
    }

    #[test]
    fn empty_overlay_changes_nothing() {
        let original = Config::default_config();
        let mut config = Config::default_config();
        config.apply_overlay_str("");
        assert_eq!(config.rules.seed, original.rules.seed);
        assert_eq!(
            config.settings.default_credits,
            original.settings.default_credits
        );
    }
}
