//! Subject taxonomy
//!
//! Provides the subject union (classes, instances, tags, wildcard, "any of"
//! selectors) and the resolver that maps a subject to its index identities.
//!
//! # Examples
//!
//! ```
//! use cretoai_ability::{Subject, SubjectClass, SubjectResolver};
//!
//! let record = SubjectClass::new("Record");
//! let article = SubjectClass::extends("Article", &record);
//!
//! let keys = SubjectResolver::identities_for(&Subject::from(&article));
//! assert_eq!(keys.len(), 3); // all, Article, Record
//! ```

mod types;
mod resolver;

#[cfg(test)]
mod tests;

pub use types::{Resource, Subject, SubjectClass, SubjectKey};
pub use resolver::SubjectResolver;
