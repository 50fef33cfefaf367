//! Subject index over declared rules

use crate::rule::Rule;
use crate::subject::SubjectKey;
use std::collections::HashMap;

/// Append-only map from subject identity to rule positions
///
/// Positions under each identity are ascending because rules are only ever
/// appended. Rules are never removed individually; [`clear`](Self::clear)
/// drops everything.
#[derive(Debug, Clone, Default)]
pub struct RuleIndex {
    positions: HashMap<SubjectKey, Vec<usize>>,
}

impl RuleIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the rule at `position` under each of its subjects
    pub fn record(&mut self, rule: &Rule, position: usize) {
        let subjects = rule.subjects();
        if subjects.is_empty() {
            self.positions.entry(SubjectKey::All).or_default().push(position);
            return;
        }
        for subject in subjects {
            self.positions.entry(subject.clone()).or_default().push(position);
        }
    }

    /// Positions recorded under any of `identities`, in declaration order
    ///
    /// A rule listed under several identities (a class and its ancestor)
    /// appears once.
    pub fn candidates(&self, identities: &[SubjectKey]) -> Vec<usize> {
        let mut positions: Vec<usize> = identities
            .iter()
            .filter_map(|identity| self.positions.get(identity))
            .flatten()
            .copied()
            .collect();
        positions.sort_unstable();
        positions.dedup();
        positions
    }

    /// Positions recorded under a single identity
    pub fn positions_for(&self, identity: &SubjectKey) -> &[usize] {
        self.positions.get(identity).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of distinct identities indexed
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn clear(&mut self) {
        self.positions.clear();
    }
}
