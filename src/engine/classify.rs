//! First-match-wins regex classification.

use log::warn;
use regex::Regex;

use crate::store::{Action, Rule};

/// Classify a command against an ordered rule list.
///
/// Rules are scanned in store order; the first rule whose pattern is found
/// anywhere in the text wins and short-circuits. A stored pattern that no
/// longer compiles is skipped rather than aborting classification
/// (admin-time validation should make that unreachable). No match means
/// deny: unmatched commands are never silently allowed.
pub fn classify(command_text: &str, rules: &[Rule]) -> Action {
    for rule in rules {
        match Regex::new(&rule.pattern) {
            Ok(re) => {
                if re.is_match(command_text) {
                    return rule.action;
                }
            }
            Err(e) => {
                warn!("skipping unparseable rule {}: {e}", rule.id.0);
                continue;
            }
        }
    }
    Action::AutoReject
}
