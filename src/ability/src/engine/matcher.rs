//! Match evaluation
//!
//! Finds the rules relevant to an (action, subject) pair, puts them in
//! priority order, and walks them to find the governing rule.

use super::decision::Decision;
use super::index::RuleIndex;
use crate::alias::ActionAliasGraph;
use crate::error::{AbilityError, Result};
use crate::rule::Rule;
use crate::subject::{Subject, SubjectKey, SubjectResolver};
use crate::types::Action;
use serde_json::Value;
use tracing::{debug, trace, warn};

/// Evaluates checks over a borrowed rule set
#[derive(Debug, Clone, Copy)]
pub struct MatchEvaluator<'a> {
    rules: &'a [Rule],
    index: &'a RuleIndex,
    aliases: &'a ActionAliasGraph,
}

impl<'a> MatchEvaluator<'a> {
    pub fn new(rules: &'a [Rule], index: &'a RuleIndex, aliases: &'a ActionAliasGraph) -> Self {
        Self { rules, index, aliases }
    }

    /// Whether `rule` applies to `action` and any of `identities`
    ///
    /// Rules declared for `manage` apply to every action.
    pub fn is_relevant(&self, rule: &Rule, action: &Action, identities: &[SubjectKey]) -> bool {
        let expanded = self.aliases.expand(rule.actions());
        expanded.iter().any(|a| a.is_manage() || a == action) && rule.applies_to_subject(identities)
    }

    /// Positions of relevant rules, highest priority first
    ///
    /// "Any of" selectors bypass the index and scan every rule.
    pub fn relevant_positions(&self, action: &Action, subject: &Subject) -> Vec<usize> {
        self.collect_relevant(action, subject, subject.is_any_of())
    }

    fn collect_relevant(&self, action: &Action, subject: &Subject, full_scan: bool) -> Vec<usize> {
        let identities = SubjectResolver::identities_for(subject);
        let candidates: Vec<usize> = if full_scan {
            (0..self.rules.len()).collect()
        } else {
            self.index.candidates(&identities)
        };

        let mut relevant: Vec<usize> = candidates
            .into_iter()
            .filter(|&position| self.is_relevant(&self.rules[position], action, &identities))
            .collect();
        relevant.reverse();
        promote_wildcard_grants(self.rules, &mut relevant);
        relevant
    }

    /// Relevant rules with their positions, highest priority first
    pub fn relevant_rules(&self, action: &Action, subject: &Subject) -> Vec<(usize, &'a Rule)> {
        self.relevant_positions(action, subject)
            .into_iter()
            .map(|position| (position, &self.rules[position]))
            .collect()
    }

    /// Relevant rules for a boolean check
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a relevant rule only carries a raw
    /// query fragment, which has no in-memory meaning.
    fn relevant_for_match(&self, action: &Action, subject: &Subject, full_scan: bool) -> Result<Vec<usize>> {
        let positions = self.collect_relevant(action, subject, full_scan);
        if let Some(&position) = positions.iter().find(|&&p| self.rules[p].raw_query().is_some()) {
            warn!("Check for `{}` on {} reached raw query rule #{}", action, subject, position);
            return Err(AbilityError::configuration(format!(
                "The allowed and denied checks cannot be used with a raw query rule. \
                 The checking code cannot be determined for `{}` on {}",
                action, subject
            )));
        }
        Ok(positions)
    }

    /// Relevant rules for building a query
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a relevant rule is defined by a block,
    /// which cannot be translated into a query.
    pub fn relevant_for_query(&self, action: &Action, subject: &Subject) -> Result<Vec<usize>> {
        let positions = self.relevant_positions(action, subject);
        if let Some(&position) = positions.iter().find(|&&p| self.rules[p].has_block()) {
            warn!("Query for `{}` on {} reached block rule #{}", action, subject, position);
            return Err(AbilityError::configuration(format!(
                "The query for `{}` on {} cannot be built because rule #{} is defined by a block",
                action, subject, position
            )));
        }
        Ok(positions)
    }

    /// Decide a check
    ///
    /// For an "any of" selector every member is probed in order; the first
    /// member with a granting rule allows the check. If no member is allowed
    /// the first denying rule found (if any) is reported.
    pub fn decide(&self, action: &Action, subject: &Subject, args: &[Value]) -> Result<Decision> {
        if !subject.is_any_of() {
            return Ok(match self.governing(action, subject, args, false)? {
                Some(position) => Decision::governed(position, &self.rules[position], action, subject),
                None => Decision::implicit_deny(action, subject),
            });
        }

        let mut first_deny = None;
        for probe in SubjectResolver::probes(subject) {
            match self.governing(action, probe, args, true)? {
                Some(position) if self.rules[position].is_grant() => {
                    return Ok(Decision::governed(position, &self.rules[position], action, subject));
                }
                Some(position) => {
                    first_deny.get_or_insert(position);
                }
                None => {}
            }
        }

        Ok(match first_deny {
            Some(position) => Decision::governed(position, &self.rules[position], action, subject),
            None => Decision::implicit_deny(action, subject),
        })
    }

    /// Position of the first relevant rule whose body matches `subject`
    fn governing(&self, action: &Action, subject: &Subject, args: &[Value], full_scan: bool) -> Result<Option<usize>> {
        let positions = self.relevant_for_match(action, subject, full_scan)?;
        debug!(
            "Evaluating `{}` on {}: {} relevant rules",
            action,
            subject,
            positions.len()
        );

        for position in positions {
            let rule = &self.rules[position];
            if rule.matches(subject, args)? {
                trace!("Rule #{} ({}) governs", position, rule);
                return Ok(Some(position));
            }
            trace!("Rule #{} ({}) does not match", position, rule);
        }
        Ok(None)
    }
}

/// Move wildcard-subject grants to the front of each run of grants
///
/// `positions` is in priority order. Deny rules never move, so a deny that
/// outranks a run of grants still outranks every grant in it. The move is
/// stable within the wildcard and non-wildcard groups.
pub(crate) fn promote_wildcard_grants(rules: &[Rule], positions: &mut [usize]) {
    let mut start = 0;
    while start < positions.len() {
        if !rules[positions[start]].is_grant() {
            start += 1;
            continue;
        }

        let mut end = start;
        while end < positions.len() && rules[positions[end]].is_grant() {
            end += 1;
        }

        let run = &mut positions[start..end];
        let (mut wildcard, rest): (Vec<usize>, Vec<usize>) =
            run.iter().partition(|&&p| rules[p].is_wildcard_subject());
        wildcard.extend(rest);
        run.copy_from_slice(&wildcard);

        start = end;
    }
}
