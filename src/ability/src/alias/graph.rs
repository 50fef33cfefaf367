//! Action alias graph with transitive expansion
//!
//! Edges point from a target action to the source actions it stands for
//! (`read` → `index`, `show`). Expansion walks the graph downwards, reverse
//! lookup walks it upwards. The graph stays acyclic because a target may
//! never be an action that is already aliased.

use crate::error::{AbilityError, Result};
use crate::types::Action;
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Default edges seeded into every new graph
pub const DEFAULT_ALIASES: &[(&str, &[&str])] = &[
    ("read", &["index", "show"]),
    ("create", &["new"]),
    ("update", &["edit"]),
];

/// Directed alias graph from target actions to their sources
///
/// # Example
///
/// ```
/// use cretoai_ability::{Action, ActionAliasGraph};
///
/// let mut graph = ActionAliasGraph::with_defaults();
/// graph.declare(["read", "update"], "modify")?;
///
/// let expanded = graph.expand(&[Action::new("modify")]);
/// assert!(expanded.contains(&Action::new("show")));
/// assert!(expanded.contains(&Action::new("edit")));
/// # Ok::<(), cretoai_ability::AbilityError>(())
/// ```
#[derive(Debug)]
pub struct ActionAliasGraph {
    /// target → sources, in declaration order
    edges: BTreeMap<Action, Vec<Action>>,

    /// Memoized expansions keyed by the exact input action list
    expansions: DashMap<Vec<Action>, Arc<[Action]>>,

    /// Whether expansions are memoized
    memoize: bool,
}

impl ActionAliasGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self {
            edges: BTreeMap::new(),
            expansions: DashMap::new(),
            memoize: true,
        }
    }

    /// Create a graph seeded with [`DEFAULT_ALIASES`]
    pub fn with_defaults() -> Self {
        let mut graph = Self::new();
        for (target, sources) in DEFAULT_ALIASES {
            graph
                .edges
                .insert(Action::new(*target), sources.iter().map(|s| Action::new(*s)).collect());
        }
        graph
    }

    /// Enable or disable expansion memoization
    pub fn memoized(mut self, memoize: bool) -> Self {
        self.memoize = memoize;
        self
    }

    /// Declare every action in `sources` as an alias of `target`
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `target` is already declared as an
    /// alias of some other action, or if a source equals the target.
    pub fn declare<I, A>(&mut self, sources: I, target: impl Into<Action>) -> Result<()>
    where
        I: IntoIterator<Item = A>,
        A: Into<Action>,
    {
        let target = target.into();
        self.validate_target(&target)?;

        let sources: Vec<Action> = sources.into_iter().map(Into::into).collect();
        if sources.contains(&target) {
            return Err(AbilityError::configuration(format!(
                "You can't alias `{}` to itself",
                target
            )));
        }

        let entry = self.edges.entry(target.clone()).or_default();
        for source in sources {
            if !entry.contains(&source) {
                entry.push(source);
            }
        }

        debug!("Declared alias target `{}` → {:?}", target, self.edges[&target]);
        self.expansions.clear();
        Ok(())
    }

    fn validate_target(&self, target: &Action) -> Result<()> {
        if self.is_source(target) {
            return Err(AbilityError::configuration(format!(
                "You can't specify target ({}) as alias because it is real action name",
                target
            )));
        }
        Ok(())
    }

    /// Expand `actions` with every action they transitively alias
    ///
    /// Actions that are not alias targets pass through unchanged. The result
    /// keeps first-occurrence order and holds no duplicates.
    pub fn expand(&self, actions: &[Action]) -> Arc<[Action]> {
        if self.memoize {
            if let Some(cached) = self.expansions.get(actions) {
                return cached.clone();
            }
        }

        let mut expanded = Vec::with_capacity(actions.len());
        for action in actions {
            self.expand_into(action, &mut expanded);
        }
        let expanded: Arc<[Action]> = Arc::from(expanded);

        if self.memoize {
            self.expansions.insert(actions.to_vec(), expanded.clone());
        }
        expanded
    }

    fn expand_into(&self, action: &Action, out: &mut Vec<Action>) {
        if out.contains(action) {
            return;
        }
        out.push(action.clone());
        if let Some(sources) = self.edges.get(action) {
            for source in sources {
                self.expand_into(source, out);
            }
        }
    }

    /// `action` followed by every target whose alias chain includes it,
    /// nearest target first
    pub fn reverse_lookup(&self, action: &Action) -> Vec<Action> {
        let mut results = vec![action.clone()];
        for (target, sources) in &self.edges {
            if sources.contains(action) {
                for found in self.reverse_lookup(target) {
                    if !results.contains(&found) {
                        results.push(found);
                    }
                }
            }
        }
        results
    }

    /// Whether `action` is declared as an alias of some target
    pub fn is_source(&self, action: &Action) -> bool {
        self.edges.values().any(|sources| sources.contains(action))
    }

    /// Sources declared directly under `target`
    pub fn sources_of(&self, target: &Action) -> Option<&[Action]> {
        self.edges.get(target).map(Vec::as_slice)
    }

    /// All edges, target → sources
    pub fn edges(&self) -> &BTreeMap<Action, Vec<Action>> {
        &self.edges
    }

    /// Merge another graph's edges into this one
    ///
    /// Sources already declared under the same target are skipped; new edges
    /// go through the same validation as [`declare`](Self::declare).
    pub fn merge(&mut self, other: &ActionAliasGraph) -> Result<()> {
        for (target, sources) in &other.edges {
            let known = self.edges.get(target);
            let missing: Vec<Action> = sources
                .iter()
                .filter(|source| known.map_or(true, |known| !known.contains(source)))
                .cloned()
                .collect();
            if !missing.is_empty() {
                self.declare(missing, target.clone())?;
            }
        }
        Ok(())
    }

    /// Remove every edge, defaults included
    pub fn clear(&mut self) {
        self.edges.clear();
        self.expansions.clear();
    }

    /// Number of memoized expansions
    pub fn cached_expansions(&self) -> usize {
        self.expansions.len()
    }
}

impl Default for ActionAliasGraph {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl Clone for ActionAliasGraph {
    fn clone(&self) -> Self {
        Self {
            edges: self.edges.clone(),
            expansions: DashMap::new(),
            memoize: self.memoize,
        }
    }
}
