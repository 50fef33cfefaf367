//! JSON rule documents
//!
//! Rule sets authored as data: class declarations with their parents, alias
//! declarations, and grant/deny rules with optional conditions or raw query
//! fragments. Blocks cannot be expressed in a document.

use crate::condition::Conditions;
use crate::engine::Ability;
use crate::error::{AbilityError, Result};
use crate::rule::{RawQuery, Rule, RuleBody};
use crate::subject::SubjectClass;
use crate::types::Effect;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

/// A single value or a list of values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            Self::One(value) => vec![value.clone()],
            Self::Many(values) => values.clone(),
        }
    }
}

impl Default for OneOrMany {
    fn default() -> Self {
        Self::Many(Vec::new())
    }
}

/// Class declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassSpec {
    pub name: String,

    /// Parent class, declared earlier in the same document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,
}

/// Alias declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasSpec {
    pub target: String,
    pub sources: OneOrMany,
}

/// Rule declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSpec {
    pub effect: Effect,

    pub actions: OneOrMany,

    /// Defaults to every subject
    #[serde(default)]
    pub subjects: OneOrMany,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Map<String, Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<RawQuery>,
}

impl RuleSpec {
    /// Build the rule; conditions and a raw fragment are mutually exclusive
    pub fn to_rule(&self) -> Result<Rule> {
        let body = match (&self.conditions, &self.raw) {
            (Some(_), Some(_)) => {
                return Err(AbilityError::configuration(
                    "A rule cannot declare both conditions and a raw query",
                ))
            }
            (Some(fields), None) => RuleBody::Conditions(Conditions::from_json(fields)?),
            (None, Some(query)) => RuleBody::RawQuery(query.clone()),
            (None, None) => RuleBody::Always,
        };
        Ok(Rule::new(self.effect, self.actions.to_vec(), self.subjects.to_vec(), body))
    }
}

/// Classes declared by a document, by name
#[derive(Debug, Clone, Default)]
pub struct SubjectRegistry {
    classes: BTreeMap<String, SubjectClass>,
}

impl SubjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `spec`, resolving its parent among known classes
    pub fn declare(&mut self, spec: &ClassSpec) -> Result<&SubjectClass> {
        if self.classes.contains_key(&spec.name) {
            return Err(AbilityError::configuration(format!(
                "Class `{}` is declared twice",
                spec.name
            )));
        }

        let class = match &spec.extends {
            Some(parent) => {
                let parent = self.classes.get(parent).ok_or_else(|| {
                    AbilityError::configuration(format!(
                        "Class `{}` extends unknown class `{}`",
                        spec.name, parent
                    ))
                })?;
                SubjectClass::extends(&spec.name, parent)
            }
            None => SubjectClass::new(&spec.name),
        };

        Ok(self.classes.entry(spec.name.clone()).or_insert(class))
    }

    pub fn get(&self, name: &str) -> Option<&SubjectClass> {
        self.classes.get(name)
    }

    /// Known class, or a root class for an undeclared name
    pub fn class_or_root(&self, name: &str) -> SubjectClass {
        self.get(name).cloned().unwrap_or_else(|| SubjectClass::new(name))
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SubjectClass> {
        self.classes.values()
    }
}

/// Rule document
///
/// # Example
///
/// ```
/// use cretoai_ability::{Ability, RuleDocument, Subject};
///
/// let document = RuleDocument::from_json_str(r#"{
///     "classes": [{"name": "Content"}, {"name": "Article", "extends": "Content"}],
///     "rules": [{"effect": "grant", "actions": "read", "subjects": "Content"}]
/// }"#)?;
///
/// let mut ability = Ability::new();
/// let registry = document.apply(&mut ability)?;
/// let article = registry.class_or_root("Article");
///
/// assert!(ability.allowed("show", &Subject::from(&article))?);
/// # Ok::<(), cretoai_ability::AbilityError>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleDocument {
    pub classes: Vec<ClassSpec>,
    pub aliases: Vec<AliasSpec>,
    pub rules: Vec<RuleSpec>,
}

impl RuleDocument {
    /// Parse a document from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a document from a file
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be read and a document error
    /// if it is not a valid rule document.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading rule document from {}", path.display());
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Declare classes, aliases, then rules (in document order) on `ability`
    ///
    /// Rules are only appended once the whole document has been validated.
    pub fn apply(&self, ability: &mut Ability) -> Result<SubjectRegistry> {
        let mut registry = SubjectRegistry::new();
        for class in &self.classes {
            registry.declare(class)?;
        }

        let rules = self
            .rules
            .iter()
            .map(RuleSpec::to_rule)
            .collect::<Result<Vec<_>>>()?;

        for alias in &self.aliases {
            ability.alias_action(alias.sources.to_vec(), alias.target.as_str())?;
        }
        for rule in rules {
            ability.add_rule(rule);
        }

        info!(
            "Applied rule document: {} classes, {} aliases, {} rules",
            registry.len(),
            self.aliases.len(),
            self.rules.len()
        );
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subject::Subject;

    #[test]
    fn test_one_or_many() {
        let one: OneOrMany = serde_json::from_str(r#""read""#).unwrap();
        let many: OneOrMany = serde_json::from_str(r#"["read", "update"]"#).unwrap();

        assert_eq!(one.to_vec(), vec!["read"]);
        assert_eq!(many.to_vec(), vec!["read", "update"]);
    }

    #[test]
    fn test_unknown_parent_rejected() {
        let document = RuleDocument::from_json_str(
            r#"{"classes": [{"name": "Article", "extends": "Content"}]}"#,
        )
        .unwrap();

        let err = document.apply(&mut Ability::new()).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_conditions_and_raw_rejected() {
        let document = RuleDocument::from_json_str(
            r#"{"rules": [{"effect": "grant", "actions": "read",
                "conditions": {"owner_id": 1}, "raw": {"fragment": "owner_id = 1"}}]}"#,
        )
        .unwrap();

        let mut ability = Ability::new();
        assert!(document.apply(&mut ability).unwrap_err().is_configuration());
        assert!(ability.rules().is_empty());
    }

    #[test]
    fn test_missing_subjects_mean_all() {
        let document =
            RuleDocument::from_json_str(r#"{"rules": [{"effect": "grant", "actions": "read"}]}"#).unwrap();

        let mut ability = Ability::new();
        document.apply(&mut ability).unwrap();

        assert!(ability.rules()[0].is_wildcard_subject());
        assert!(ability.allowed("index", &Subject::tag("dashboard")).unwrap());
    }

    #[test]
    fn test_malformed_document() {
        let err = RuleDocument::from_json_str(r#"{"rules": [{"effect": "maybe"}]}"#).unwrap_err();
        assert!(matches!(err, AbilityError::Document(_)));
    }
}
