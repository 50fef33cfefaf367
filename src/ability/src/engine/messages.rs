//! Unauthorized message keys
//!
//! The engine does not format or translate text. It produces an ordered list
//! of lookup keys, most specific first, and asks a [`MessageResolver`] for
//! the first one it knows.

use crate::alias::ActionAliasGraph;
use crate::subject::Subject;
use crate::types::{Action, ALL, MANAGE};
use std::collections::{BTreeMap, HashMap};

/// Message used when no resolver knows any key
pub const DEFAULT_MESSAGE: &str = "You are not authorized to access this page.";

/// Looks up unauthorized messages by key (`"update.article"`, `"manage.all"`)
pub trait MessageResolver: Send + Sync {
    fn resolve(&self, key: &str) -> Option<String>;
}

impl MessageResolver for HashMap<String, String> {
    fn resolve(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl MessageResolver for BTreeMap<String, String> {
    fn resolve(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// Keys for `action` on `subject`, most specific first
///
/// Every action the checked action rolls up into (via reverse alias lookup)
/// and finally `manage`, first for the subject's own name, then for `all`.
pub fn message_keys(aliases: &ActionAliasGraph, action: &Action, subject: &Subject) -> Vec<String> {
    let mut actions = aliases.reverse_lookup(action);
    let manage = Action::manage();
    if !actions.contains(&manage) {
        actions.push(manage);
    }

    let subject_name = subject.message_name();
    let mut subjects = vec![subject_name.as_str()];
    if subject_name != ALL {
        subjects.push(ALL);
    }

    let mut keys = Vec::with_capacity(actions.len() * subjects.len());
    for name in subjects {
        for action in &actions {
            keys.push(format!("{}.{}", action, name));
        }
    }
    keys
}

/// First key the resolver knows
pub fn resolve_message(resolver: &dyn MessageResolver, keys: &[String]) -> Option<String> {
    keys.iter().find_map(|key| resolver.resolve(key))
}
