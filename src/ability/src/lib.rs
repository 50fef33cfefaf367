//! # CretoAI Ability
//!
//! In-process authorization rule engine. An [`Ability`] holds an ordered list
//! of grant and deny rules for one actor and answers whether an action is
//! allowed on a subject.
//!
//! ## Features
//!
//! - **Ordered rules**: later declarations override earlier ones
//! - **Action aliases** with transitive expansion (`read` covers `index` and `show`)
//! - **Class lineage**: rules on an ancestor apply to every descendant
//! - **Attribute conditions** and predicate blocks for instance checks
//! - **Query bridge** handing the relevant rules to a data-store adapter
//! - **Declarative export** of granted and denied subjects per action
//! - **JSON rule documents** for declaring rules outside of code
//!
//! ## Example
//!
//! ```rust
//! use cretoai_ability::{Ability, Conditions, Subject, SubjectClass};
//!
//! let record = SubjectClass::new("Record");
//! let article = SubjectClass::extends("Article", &record);
//!
//! let mut ability = Ability::new();
//! ability
//!     .grant(["read"], [&record])
//!     .grant_where(["manage"], [&article], Conditions::new().eq("author_id", 7))
//!     .deny(["destroy"], [&article]);
//!
//! let mine = Subject::from(article.instance().with_attribute("author_id", 7));
//!
//! assert!(ability.allowed("show", &Subject::from(&article))?);
//! assert!(ability.allowed("update", &mine)?);
//! assert!(ability.denied("destroy", &mine)?);
//! # Ok::<(), cretoai_ability::AbilityError>(())
//! ```

pub mod alias;
pub mod condition;
pub mod document;
pub mod engine;
pub mod error;
pub mod rule;
pub mod subject;
pub mod types;

// Re-export commonly used types
pub use alias::{ActionAliasGraph, DEFAULT_ALIASES};
pub use condition::{Condition, Conditions};
pub use document::{RuleDocument, SubjectRegistry};
pub use engine::{
    Ability, AbilityConfig, Decision, MatchEvaluator, MessageResolver, PermissionExporter,
    Permissions, RuleIndex, DEFAULT_MESSAGE,
};
pub use error::{AbilityError, PredicateError, Result};
pub use rule::{Predicate, RawQuery, Rule, RuleBody};
pub use subject::{Resource, Subject, SubjectClass, SubjectKey, SubjectResolver};
pub use types::{Action, Effect, ALL, MANAGE};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
