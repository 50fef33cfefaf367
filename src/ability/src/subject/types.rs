//! Subject type definitions
//!
//! Subjects are what rules are declared about and what checks are asked
//! about: classes with an explicit ancestry chain, instances carrying
//! attributes, symbolic tags, the `all` wildcard, and "any of" selectors.

use convert_case::{Case, Casing};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

use crate::types::ALL;

/// Key a rule is declared against and indexed under
///
/// Class names and plain strings share the `Named` form, so a rule declared
/// for the string `"Article"` applies to the `Article` class and its instances.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SubjectKey {
    /// The `all` wildcard
    All,
    /// A class, ancestor, or tag name
    Named(Arc<str>),
}

impl SubjectKey {
    /// Create a named key; `"all"` maps to the wildcard
    pub fn named(name: impl AsRef<str>) -> Self {
        let name = name.as_ref();
        if name == ALL {
            Self::All
        } else {
            Self::Named(Arc::from(name))
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::All => ALL,
            Self::Named(name) => name.as_ref(),
        }
    }
}

impl From<&str> for SubjectKey {
    fn from(name: &str) -> Self {
        Self::named(name)
    }
}

impl From<String> for SubjectKey {
    fn from(name: String) -> Self {
        Self::named(name)
    }
}

impl From<&SubjectClass> for SubjectKey {
    fn from(class: &SubjectClass) -> Self {
        Self::Named(class.lineage[0].clone())
    }
}

impl From<SubjectClass> for SubjectKey {
    fn from(class: SubjectClass) -> Self {
        Self::from(&class)
    }
}

impl From<&SubjectKey> for SubjectKey {
    fn from(key: &SubjectKey) -> Self {
        key.clone()
    }
}

impl fmt::Display for SubjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A class of subjects with an explicit ancestry chain
///
/// The lineage is ordered most-derived first and always starts with the
/// class itself:
///
/// ```
/// use cretoai_ability::SubjectClass;
///
/// let record = SubjectClass::new("Record");
/// let content = SubjectClass::extends("Content", &record);
/// let article = SubjectClass::extends("Article", &content);
///
/// assert_eq!(article.lineage(), vec!["Article", "Content", "Record"]);
/// assert!(article.is_a("Record"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubjectClass {
    lineage: Arc<[Arc<str>]>,
}

impl SubjectClass {
    /// Create a root class with no ancestors
    pub fn new(name: impl AsRef<str>) -> Self {
        Self {
            lineage: Arc::from(vec![Arc::from(name.as_ref())]),
        }
    }

    /// Create a class deriving from `parent`, inheriting its lineage
    pub fn extends(name: impl AsRef<str>, parent: &SubjectClass) -> Self {
        let mut lineage = Vec::with_capacity(parent.lineage.len() + 1);
        lineage.push(Arc::from(name.as_ref()));
        lineage.extend(parent.lineage.iter().cloned());
        Self {
            lineage: Arc::from(lineage),
        }
    }

    /// Create a class with an explicit ancestor chain (superclasses and
    /// interfaces, most-derived first)
    pub fn with_ancestors<I, S>(name: impl AsRef<str>, ancestors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut lineage: Vec<Arc<str>> = vec![Arc::from(name.as_ref())];
        for ancestor in ancestors {
            let ancestor = ancestor.as_ref();
            if !lineage.iter().any(|known| known.as_ref() == ancestor) {
                lineage.push(Arc::from(ancestor));
            }
        }
        Self {
            lineage: Arc::from(lineage),
        }
    }

    pub fn name(&self) -> &str {
        &self.lineage[0]
    }

    /// Class name followed by its ancestors
    pub fn lineage(&self) -> Vec<&str> {
        self.lineage.iter().map(|name| name.as_ref()).collect()
    }

    /// Ancestors only, nearest first
    pub fn ancestors(&self) -> impl Iterator<Item = &str> {
        self.lineage[1..].iter().map(|name| name.as_ref())
    }

    /// Whether `name` is this class or one of its ancestors
    pub fn is_a(&self, name: &str) -> bool {
        self.lineage.iter().any(|n| n.as_ref() == name)
    }

    pub(crate) fn keys(&self) -> impl Iterator<Item = SubjectKey> + '_ {
        self.lineage.iter().map(|name| SubjectKey::Named(name.clone()))
    }

    /// New instance of this class with no attributes
    pub fn instance(&self) -> Resource {
        Resource::new(self)
    }
}

impl fmt::Display for SubjectClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An instance of a subject class with named attributes
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    class: SubjectClass,
    attributes: Map<String, Value>,
}

impl Resource {
    pub fn new(class: &SubjectClass) -> Self {
        Self {
            class: class.clone(),
            attributes: Map::new(),
        }
    }

    /// Add an attribute to the resource
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Replace all attributes
    pub fn with_attributes(mut self, attributes: Map<String, Value>) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn class(&self) -> &SubjectClass {
        &self.class
    }

    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }
}

/// Subject of a check
#[derive(Debug, Clone, PartialEq)]
pub enum Subject {
    /// The `all` wildcard itself
    All,
    /// A class, checked without any instance attributes
    Class(SubjectClass),
    /// A concrete instance
    Instance(Resource),
    /// A symbolic subject such as `dashboard`
    Tag(String),
    /// Passes if any member passes
    AnyOf(Vec<Subject>),
}

impl Subject {
    pub fn tag(name: impl Into<String>) -> Self {
        Self::Tag(name.into())
    }

    pub fn any_of(subjects: impl IntoIterator<Item = Subject>) -> Self {
        Self::AnyOf(subjects.into_iter().collect())
    }

    pub fn is_instance(&self) -> bool {
        matches!(self, Self::Instance(_))
    }

    pub fn is_any_of(&self) -> bool {
        matches!(self, Self::AnyOf(_))
    }

    /// The class of a class or instance subject
    pub fn class(&self) -> Option<&SubjectClass> {
        match self {
            Self::Class(class) => Some(class),
            Self::Instance(resource) => Some(resource.class()),
            _ => None,
        }
    }

    /// Instance attribute, if this is an instance
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        match self {
            Self::Instance(resource) => resource.attribute(key),
            _ => None,
        }
    }

    /// Name used in message keys (`BlogPost` → `blog_post`)
    pub fn message_name(&self) -> String {
        match self {
            Self::All => ALL.to_string(),
            Self::Class(class) => class.name().to_case(Case::Snake),
            Self::Instance(resource) => resource.class().name().to_case(Case::Snake),
            Self::Tag(tag) => tag.clone(),
            Self::AnyOf(members) => members
                .first()
                .map(Subject::message_name)
                .unwrap_or_else(|| ALL.to_string()),
        }
    }
}

impl From<SubjectClass> for Subject {
    fn from(class: SubjectClass) -> Self {
        Self::Class(class)
    }
}

impl From<&SubjectClass> for Subject {
    fn from(class: &SubjectClass) -> Self {
        Self::Class(class.clone())
    }
}

impl From<Resource> for Subject {
    fn from(resource: Resource) -> Self {
        Self::Instance(resource)
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str(ALL),
            Self::Class(class) => write!(f, "{}", class),
            Self::Instance(resource) => write!(f, "{} instance", resource.class()),
            Self::Tag(tag) => f.write_str(tag),
            Self::AnyOf(members) => {
                f.write_str("any of [")?;
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", member)?;
                }
                f.write_str("]")
            }
        }
    }
}
