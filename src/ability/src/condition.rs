//! Static attribute conditions
//!
//! Conditions are an ordered list of `attribute → constraint` pairs. They are
//! evaluated against instance attributes for checks, and handed verbatim to
//! query-building collaborators for declarative use.

use crate::error::{AbilityError, Result};
use regex::Regex;
use serde_json::{Map, Value};

/// JSON key marking a regex constraint in condition documents
pub const REGEX_KEY: &str = "$regex";

/// Constraint on a single attribute
#[derive(Debug, Clone)]
pub enum Condition {
    /// Attribute equals the value
    Eq(Value),
    /// Attribute is one of the values
    In(Vec<Value>),
    /// String attribute matches the pattern
    Matches(Regex),
    /// Object attribute (or any element of an array attribute) satisfies the
    /// nested conditions
    Nested(Conditions),
}

impl Condition {
    /// Test a single attribute value; a missing attribute is treated as null
    pub fn matches(&self, attribute: Option<&Value>) -> bool {
        let value = attribute.unwrap_or(&Value::Null);
        match self {
            Condition::Eq(expected) => value == expected,
            Condition::In(allowed) => allowed.contains(value),
            Condition::Matches(pattern) => value.as_str().map_or(false, |s| pattern.is_match(s)),
            Condition::Nested(nested) => match value {
                Value::Object(fields) => nested.matches(fields),
                Value::Array(items) => items
                    .iter()
                    .filter_map(Value::as_object)
                    .any(|fields| nested.matches(fields)),
                _ => false,
            },
        }
    }

    fn from_json(value: &Value) -> Result<Self> {
        match value {
            Value::Array(items) => Ok(Condition::In(items.clone())),
            Value::Object(fields) => match fields.get(REGEX_KEY) {
                Some(Value::String(pattern)) if fields.len() == 1 => Ok(Condition::Matches(compile(pattern)?)),
                Some(_) => Err(AbilityError::configuration(format!(
                    "`{}` must be the only key and hold a string pattern",
                    REGEX_KEY
                ))),
                None => Ok(Condition::Nested(Conditions::from_json(fields)?)),
            },
            scalar => Ok(Condition::Eq(scalar.clone())),
        }
    }

    fn to_json(&self) -> Value {
        match self {
            Condition::Eq(value) => value.clone(),
            Condition::In(values) => Value::Array(values.clone()),
            Condition::Matches(pattern) => {
                let mut fields = Map::new();
                fields.insert(REGEX_KEY.to_string(), Value::String(pattern.as_str().to_string()));
                Value::Object(fields)
            }
            Condition::Nested(nested) => nested.to_json(),
        }
    }
}

impl PartialEq for Condition {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Condition::Eq(a), Condition::Eq(b)) => a == b,
            (Condition::In(a), Condition::In(b)) => a == b,
            (Condition::Matches(a), Condition::Matches(b)) => a.as_str() == b.as_str(),
            (Condition::Nested(a), Condition::Nested(b)) => a == b,
            _ => false,
        }
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern)
        .map_err(|e| AbilityError::configuration(format!("Invalid condition pattern `{}`: {}", pattern, e)))
}

/// Ordered attribute conditions
///
/// ```
/// use cretoai_ability::Conditions;
/// use serde_json::json;
///
/// let conditions = Conditions::new()
///     .eq("owner_id", 1)
///     .one_of("state", ["draft", "review"]);
///
/// let attributes = json!({"owner_id": 1, "state": "draft"});
/// assert!(conditions.matches(attributes.as_object().unwrap()));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conditions {
    entries: Vec<(String, Condition)>,
}

impl Conditions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the constraint for `key`, replacing an earlier one
    pub fn with(mut self, key: impl Into<String>, condition: Condition) -> Self {
        self.insert(key, condition);
        self
    }

    /// Require `key` to equal `value`
    pub fn eq(self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(key, Condition::Eq(value.into()))
    }

    /// Require `key` to be one of `values`
    pub fn one_of<I, V>(self, key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.with(key, Condition::In(values.into_iter().map(Into::into).collect()))
    }

    /// Require string attribute `key` to match `pattern`
    pub fn matching(self, key: impl Into<String>, pattern: &str) -> Result<Self> {
        Ok(self.with(key, Condition::Matches(compile(pattern)?)))
    }

    /// Require object attribute `key` to satisfy `nested`
    pub fn nested(self, key: impl Into<String>, nested: Conditions) -> Self {
        self.with(key, Condition::Nested(nested))
    }

    pub fn insert(&mut self, key: impl Into<String>, condition: Condition) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = condition,
            None => self.entries.push((key, condition)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Condition> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, c)| c)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Condition)> {
        self.entries.iter().map(|(k, c)| (k.as_str(), c))
    }

    /// Whether every constraint holds for `attributes`
    pub fn matches(&self, attributes: &Map<String, Value>) -> bool {
        self.entries
            .iter()
            .all(|(key, condition)| condition.matches(attributes.get(key)))
    }

    /// Equality constraints usable as default attributes of a new record
    ///
    /// Membership, pattern, and nested constraints do not pin a single value
    /// and are left out.
    pub fn default_attributes(&self) -> Map<String, Value> {
        self.entries
            .iter()
            .filter_map(|(key, condition)| match condition {
                Condition::Eq(value) if !value.is_array() && !value.is_object() => {
                    Some((key.clone(), value.clone()))
                }
                _ => None,
            })
            .collect()
    }

    /// Parse conditions from a JSON object
    ///
    /// Scalars are equality, arrays are membership, `{"$regex": "..."}` is a
    /// pattern, and any other object is a nested condition set.
    pub fn from_json(fields: &Map<String, Value>) -> Result<Self> {
        let mut conditions = Self::new();
        for (key, value) in fields {
            conditions.insert(key.clone(), Condition::from_json(value)?);
        }
        Ok(conditions)
    }

    /// JSON form accepted by [`from_json`](Self::from_json)
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.entries
                .iter()
                .map(|(key, condition)| (key.clone(), condition.to_json()))
                .collect(),
        )
    }
}
