//! Declarative permission export

use crate::alias::ActionAliasGraph;
use crate::rule::Rule;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Subject names granted and denied per expanded action
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permissions {
    /// action → granted subject names
    pub grant: BTreeMap<String, Vec<String>>,

    /// action → denied subject names
    pub deny: BTreeMap<String, Vec<String>>,
}

impl Permissions {
    /// Subjects granted for `action`
    pub fn granted(&self, action: &str) -> &[String] {
        self.grant.get(action).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Subjects denied for `action`
    pub fn denied(&self, action: &str) -> &[String] {
        self.deny.get(action).map(Vec::as_slice).unwrap_or(&[])
    }

    fn record(bucket: &mut BTreeMap<String, Vec<String>>, action: &str, subject: &str) {
        let subjects = bucket.entry(action.to_string()).or_default();
        if !subjects.iter().any(|s| s == subject) {
            subjects.push(subject.to_string());
        }
    }
}

/// Summarizes declared rules without evaluating any of them
#[derive(Debug, Clone, Copy)]
pub struct PermissionExporter<'a> {
    rules: &'a [Rule],
    aliases: &'a ActionAliasGraph,
}

impl<'a> PermissionExporter<'a> {
    pub fn new(rules: &'a [Rule], aliases: &'a ActionAliasGraph) -> Self {
        Self { rules, aliases }
    }

    /// Walk every rule in declaration order
    pub fn export(&self) -> Permissions {
        let mut permissions = Permissions::default();
        for rule in self.rules {
            let bucket = if rule.is_grant() {
                &mut permissions.grant
            } else {
                &mut permissions.deny
            };
            for action in self.aliases.expand(rule.actions()).iter() {
                for subject in rule.subjects() {
                    Permissions::record(bucket, action.as_str(), subject.as_str());
                }
            }
        }
        permissions
    }
}
