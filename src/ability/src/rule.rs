//! Rule definitions
//!
//! A rule grants or denies a set of actions on a set of subjects. Its body is
//! exactly one of: unconditional, static conditions, a predicate block, or a
//! raw query fragment. Keeping the body a single enum makes a rule that
//! carries both conditions and a block unrepresentable.

use crate::condition::Conditions;
use crate::error::{AbilityError, PredicateError, Result};
use crate::subject::{Subject, SubjectKey};
use crate::types::{Action, Effect};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

type BlockFn = dyn Fn(&Subject, &[Value]) -> std::result::Result<bool, PredicateError> + Send + Sync;

/// Predicate block evaluated against an instance and extra check arguments
///
/// ```
/// use cretoai_ability::{Predicate, SubjectClass, Subject};
/// use serde_json::Value;
///
/// let article = SubjectClass::new("Article");
/// let published = Predicate::new(|subject, _args| {
///     Ok(subject.attribute("published") == Some(&Value::Bool(true)))
/// });
///
/// let draft = Subject::from(article.instance().with_attribute("published", false));
/// assert!(!published.call(&draft, &[])?);
/// # Ok::<(), cretoai_ability::AbilityError>(())
/// ```
#[derive(Clone)]
pub struct Predicate {
    block: Arc<BlockFn>,
}

impl Predicate {
    pub fn new<F>(block: F) -> Self
    where
        F: Fn(&Subject, &[Value]) -> std::result::Result<bool, PredicateError> + Send + Sync + 'static,
    {
        Self { block: Arc::new(block) }
    }

    /// Invoke the block; its own error is passed through as the error source
    pub fn call(&self, subject: &Subject, args: &[Value]) -> Result<bool> {
        (self.block)(subject, args).map_err(AbilityError::Predicate)
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Predicate(..)")
    }
}

/// Query fragment for a data-store adapter; cannot be evaluated in memory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawQuery {
    /// Native query fragment, e.g. `published_at IS NOT NULL`
    pub fragment: String,

    /// Bind parameters for the fragment
    #[serde(default)]
    pub params: Vec<Value>,
}

impl RawQuery {
    pub fn new(fragment: impl Into<String>) -> Self {
        Self {
            fragment: fragment.into(),
            params: Vec::new(),
        }
    }

    pub fn with_param(mut self, param: impl Into<Value>) -> Self {
        self.params.push(param.into());
        self
    }
}

/// What a rule tests once its actions and subjects apply
#[derive(Debug, Clone)]
pub enum RuleBody {
    /// Applies unconditionally
    Always,
    /// Instance attributes must satisfy the conditions
    Conditions(Conditions),
    /// The block decides
    Block(Predicate),
    /// Only usable when building queries
    RawQuery(RawQuery),
}

/// Immutable grant/deny declaration
#[derive(Debug, Clone)]
pub struct Rule {
    effect: Effect,
    actions: Vec<Action>,
    subjects: Vec<SubjectKey>,
    body: RuleBody,
}

impl Rule {
    /// Create a rule; an empty subject list means every subject
    pub fn new<A, S>(
        effect: Effect,
        actions: impl IntoIterator<Item = A>,
        subjects: impl IntoIterator<Item = S>,
        body: RuleBody,
    ) -> Self
    where
        A: Into<Action>,
        S: Into<SubjectKey>,
    {
        let mut rule_actions: Vec<Action> = Vec::new();
        for action in actions {
            let action = action.into();
            if !rule_actions.contains(&action) {
                rule_actions.push(action);
            }
        }

        let mut rule_subjects: Vec<SubjectKey> = Vec::new();
        for subject in subjects {
            let subject = subject.into();
            if !rule_subjects.contains(&subject) {
                rule_subjects.push(subject);
            }
        }
        if rule_subjects.is_empty() {
            rule_subjects.push(SubjectKey::All);
        }

        Self {
            effect,
            actions: rule_actions,
            subjects: rule_subjects,
            body,
        }
    }

    pub fn grant<A, S>(
        actions: impl IntoIterator<Item = A>,
        subjects: impl IntoIterator<Item = S>,
        body: RuleBody,
    ) -> Self
    where
        A: Into<Action>,
        S: Into<SubjectKey>,
    {
        Self::new(Effect::Grant, actions, subjects, body)
    }

    pub fn deny<A, S>(
        actions: impl IntoIterator<Item = A>,
        subjects: impl IntoIterator<Item = S>,
        body: RuleBody,
    ) -> Self
    where
        A: Into<Action>,
        S: Into<SubjectKey>,
    {
        Self::new(Effect::Deny, actions, subjects, body)
    }

    pub fn effect(&self) -> Effect {
        self.effect
    }

    pub fn is_grant(&self) -> bool {
        self.effect.is_grant()
    }

    /// Actions as declared, before alias expansion
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn subjects(&self) -> &[SubjectKey] {
        &self.subjects
    }

    pub fn body(&self) -> &RuleBody {
        &self.body
    }

    pub fn conditions(&self) -> Option<&Conditions> {
        match &self.body {
            RuleBody::Conditions(conditions) => Some(conditions),
            _ => None,
        }
    }

    pub fn raw_query(&self) -> Option<&RawQuery> {
        match &self.body {
            RuleBody::RawQuery(query) => Some(query),
            _ => None,
        }
    }

    pub fn has_block(&self) -> bool {
        matches!(self.body, RuleBody::Block(_))
    }

    /// Whether the subject set is exactly the `all` wildcard
    pub fn is_wildcard_subject(&self) -> bool {
        self.subjects.len() == 1 && self.subjects[0].is_all()
    }

    /// Whether any of `identities` is one of this rule's subjects
    pub(crate) fn applies_to_subject(&self, identities: &[SubjectKey]) -> bool {
        self.subjects
            .iter()
            .any(|subject| subject.is_all() || identities.contains(subject))
    }

    /// Evaluate the body against a single (non "any of") subject
    ///
    /// Only instances carry attributes to test, so for classes, tags, and the
    /// wildcard the rule applies as soon as its actions and subjects do.
    pub(crate) fn matches(&self, subject: &Subject, args: &[Value]) -> Result<bool> {
        let Subject::Instance(resource) = subject else {
            return Ok(true);
        };

        match &self.body {
            RuleBody::Always => Ok(true),
            RuleBody::Conditions(conditions) => Ok(conditions.matches(resource.attributes())),
            RuleBody::Block(predicate) => predicate.call(subject, args),
            RuleBody::RawQuery(query) => Err(AbilityError::configuration(format!(
                "The raw query rule `{}` cannot be evaluated against {}",
                query.fragment, subject
            ))),
        }
    }

    /// Equality conditions usable as default attributes
    pub fn attributes_from_conditions(&self) -> Map<String, Value> {
        self.conditions()
            .map(Conditions::default_attributes)
            .unwrap_or_default()
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let actions: Vec<&str> = self.actions.iter().map(Action::as_str).collect();
        let subjects: Vec<&str> = self.subjects.iter().map(SubjectKey::as_str).collect();
        write!(f, "{} [{}] on [{}]", self.effect, actions.join(", "), subjects.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subject::SubjectClass;
    use std::io;

    #[test]
    fn test_rule_normalizes_subjects() {
        let rule = Rule::grant(["read", "read"], Vec::<SubjectKey>::new(), RuleBody::Always);

        assert_eq!(rule.actions(), &[Action::new("read")]);
        assert!(rule.is_wildcard_subject());
        assert_eq!(rule.to_string(), "grant [read] on [all]");
    }

    #[test]
    fn test_body_accessors() {
        let article = SubjectClass::new("Article");
        let conditional = Rule::grant(["update"], [&article], RuleBody::Conditions(Conditions::new().eq("owner_id", 1)));
        let raw = Rule::deny(["read"], [&article], RuleBody::RawQuery(RawQuery::new("hidden = true")));
        let block = Rule::grant(["read"], [&article], RuleBody::Block(Predicate::new(|_, _| Ok(true))));

        assert!(conditional.conditions().is_some());
        assert_eq!(raw.raw_query().map(|q| q.fragment.as_str()), Some("hidden = true"));
        assert!(block.has_block());
        assert!(block.is_grant());
        assert!(!raw.is_wildcard_subject());
    }

    #[test]
    fn test_class_subject_skips_body() {
        let article = SubjectClass::new("Article");
        let rule = Rule::grant(["update"], [&article], RuleBody::Conditions(Conditions::new().eq("owner_id", 1)));

        assert!(rule.matches(&Subject::from(&article), &[]).unwrap());
        assert!(rule.matches(&Subject::from(article.instance().with_attribute("owner_id", 1)), &[]).unwrap());
        assert!(!rule.matches(&Subject::from(article.instance().with_attribute("owner_id", 2)), &[]).unwrap());
    }

    #[test]
    fn test_block_receives_args_and_errors_pass_through() {
        let article = SubjectClass::new("Article");
        let rule = Rule::grant(
            ["update"],
            [&article],
            RuleBody::Block(Predicate::new(|_, args| match args.first() {
                Some(Value::Bool(flag)) => Ok(*flag),
                _ => Err(io::Error::new(io::ErrorKind::Other, "lookup failed").into()),
            })),
        );
        let instance = Subject::from(article.instance());

        assert!(rule.matches(&instance, &[Value::Bool(true)]).unwrap());
        let err = rule.matches(&instance, &[]).unwrap_err();
        match err {
            AbilityError::Predicate(source) => {
                assert_eq!(source.downcast_ref::<io::Error>().map(|e| e.kind()), Some(io::ErrorKind::Other));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_raw_query_cannot_match_instances() {
        let article = SubjectClass::new("Article");
        let rule = Rule::grant(["read"], [&article], RuleBody::RawQuery(RawQuery::new("published = ?").with_param(true)));

        assert!(rule.matches(&Subject::from(article.instance()), &[]).unwrap_err().is_configuration());
    }
}
