//! Check decisions

use crate::rule::Rule;
use crate::subject::Subject;
use crate::types::{Action, Effect};
use serde::{Deserialize, Serialize};

/// Outcome of a check, naming the governing rule if there is one
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    /// Whether the action is allowed
    pub allowed: bool,

    /// Declaration position of the governing rule
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<usize>,

    /// Effect of the governing rule
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effect: Option<Effect>,

    /// Action that was checked
    pub action: String,

    /// Subject that was checked
    pub subject: String,

    /// Reason for the decision
    pub reason: String,
}

impl Decision {
    /// Decision made by the rule at `position`
    pub fn governed(position: usize, rule: &Rule, action: &Action, subject: &Subject) -> Self {
        let verb = if rule.is_grant() { "grants" } else { "denies" };
        Self {
            allowed: rule.is_grant(),
            rule: Some(position),
            effect: Some(rule.effect()),
            action: action.to_string(),
            subject: subject.to_string(),
            reason: format!("Rule #{} ({}) {} this action", position, rule, verb),
        }
    }

    /// No rule matched
    pub fn implicit_deny(action: &Action, subject: &Subject) -> Self {
        Self {
            allowed: false,
            rule: None,
            effect: None,
            action: action.to_string(),
            subject: subject.to_string(),
            reason: "No rule matches, implicit deny".to_string(),
        }
    }
}
