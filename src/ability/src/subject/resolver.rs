//! Subject identity resolution
//!
//! Turns a subject into the ordered list of keys the rule index is probed
//! with. Resolution only looks at subject taxonomy, never at rule content.

use super::types::{Subject, SubjectKey};

/// Resolves subjects to the identities they can be matched under
///
/// ```
/// use cretoai_ability::{Subject, SubjectClass, SubjectKey, SubjectResolver};
///
/// let content = SubjectClass::new("Content");
/// let article = SubjectClass::extends("Article", &content);
///
/// let keys = SubjectResolver::identities_for(&Subject::from(article.instance()));
/// assert_eq!(keys, vec![
///     SubjectKey::All,
///     SubjectKey::from("Article"),
///     SubjectKey::from("Content"),
/// ]);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct SubjectResolver;

impl SubjectResolver {
    /// Identities to probe for `subject`, wildcard first
    ///
    /// Classes and instances yield the wildcard, then the class lineage
    /// most-derived first. The class name doubles as the string form, so
    /// string-declared rules resolve through the same key. Tags yield the
    /// wildcard and the tag. An "any of" selector yields the union of its
    /// members' identities in member order.
    pub fn identities_for(subject: &Subject) -> Vec<SubjectKey> {
        let mut keys = vec![SubjectKey::All];
        Self::collect(subject, &mut keys);
        keys
    }

    /// Flatten a subject into the individual subjects a check probes in turn
    pub fn probes(subject: &Subject) -> Vec<&Subject> {
        match subject {
            Subject::AnyOf(members) => members.iter().flat_map(Self::probes).collect(),
            other => vec![other],
        }
    }

    fn collect(subject: &Subject, keys: &mut Vec<SubjectKey>) {
        match subject {
            Subject::All => {}
            Subject::Class(class) => Self::push_all(keys, class.keys()),
            Subject::Instance(resource) => Self::push_all(keys, resource.class().keys()),
            Subject::Tag(tag) => Self::push_all(keys, std::iter::once(SubjectKey::named(tag))),
            Subject::AnyOf(members) => {
                for member in members {
                    Self::collect(member, keys);
                }
            }
        }
    }

    fn push_all(keys: &mut Vec<SubjectKey>, new_keys: impl Iterator<Item = SubjectKey>) {
        for key in new_keys {
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
    }
}
