//! Core rule engine types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Wildcard action: a rule declared for it applies to every action
pub const MANAGE: &str = "manage";

/// Wildcard subject: a rule declared for it applies to every subject
pub const ALL: &str = "all";

/// Action being performed (read, update, publish, etc.)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Action {
    /// Action name
    pub name: String,
}

impl Action {
    /// Create a new action
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// The `manage` wildcard action
    pub fn manage() -> Self {
        Self::new(MANAGE)
    }

    /// Whether this is the `manage` wildcard
    pub fn is_manage(&self) -> bool {
        self.name == MANAGE
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }
}

impl From<&str> for Action {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Action {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl From<&Action> for Action {
    fn from(action: &Action) -> Self {
        action.clone()
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Rule effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Effect {
    /// Grant the action
    Grant,
    /// Deny the action
    Deny,
}

impl Effect {
    pub fn is_grant(self) -> bool {
        matches!(self, Effect::Grant)
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Effect::Grant => f.write_str("grant"),
            Effect::Deny => f.write_str("deny"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_creation() {
        let action = Action::new("read");
        assert_eq!(action.as_str(), "read");
        assert!(!action.is_manage());
        assert!(Action::manage().is_manage());
        assert_eq!(Action::from("update"), Action::new("update".to_string()));
    }

    #[test]
    fn test_effect_serde() {
        assert_eq!(serde_json::to_string(&Effect::Grant).unwrap(), "\"grant\"");
        let deny: Effect = serde_json::from_str("\"deny\"").unwrap();
        assert_eq!(deny, Effect::Deny);
        assert!(!deny.is_grant());
    }
}
