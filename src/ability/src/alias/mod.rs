//! Action aliases
//!
//! A generic action name (`read`) stands in for the concrete actions it
//! subsumes (`index`, `show`). Aliases chain: `manage_basic` → `read` →
//! `index`, `show`.

pub mod graph;

pub use graph::{ActionAliasGraph, DEFAULT_ALIASES};
