//! Ability: the rule engine facade
//!
//! Owns the declared rules, the alias graph, and the subject index, and
//! exposes declaration, checks, merging, and declarative export.

pub mod decision;
pub mod export;
pub mod index;
pub mod matcher;
pub mod messages;

pub use decision::Decision;
pub use export::{PermissionExporter, Permissions};
pub use index::RuleIndex;
pub use matcher::MatchEvaluator;
pub use messages::{MessageResolver, DEFAULT_MESSAGE};

use crate::alias::ActionAliasGraph;
use crate::condition::Conditions;
use crate::error::{AbilityError, PredicateError, Result};
use crate::rule::{Predicate, RawQuery, Rule, RuleBody};
use crate::subject::{Subject, SubjectKey};
use crate::types::{Action, Effect};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Ability configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AbilityConfig {
    /// Seed the default `read`/`create`/`update` aliases
    pub default_aliases: bool,

    /// Memoize alias expansion per action set
    pub cache_expansions: bool,

    /// Message used by `authorize` when no resolver knows a key
    pub default_message: String,
}

impl Default for AbilityConfig {
    fn default() -> Self {
        Self {
            default_aliases: true,
            cache_expansions: true,
            default_message: DEFAULT_MESSAGE.to_string(),
        }
    }
}

/// Declared permissions of one actor
///
/// # Example
///
/// ```
/// use cretoai_ability::{Ability, Conditions, Subject, SubjectClass};
///
/// let article = SubjectClass::new("Article");
///
/// let mut ability = Ability::new();
/// ability
///     .grant(["read"], ["all"])
///     .grant_where(["update"], [&article], Conditions::new().eq("owner_id", 1));
///
/// let own = Subject::from(article.instance().with_attribute("owner_id", 1));
/// let other = Subject::from(article.instance().with_attribute("owner_id", 2));
///
/// assert!(ability.allowed("show", &own)?);
/// assert!(ability.allowed("edit", &own)?);
/// assert!(ability.denied("update", &other)?);
/// # Ok::<(), cretoai_ability::AbilityError>(())
/// ```
pub struct Ability {
    /// Engine configuration
    config: AbilityConfig,

    /// Rules in declaration order
    rules: Vec<Rule>,

    /// Action aliases with expansion memo
    aliases: ActionAliasGraph,

    /// Subject identity → rule positions
    index: RuleIndex,

    /// Unauthorized message lookup
    messages: Option<Arc<dyn MessageResolver>>,
}

impl Ability {
    /// Create an ability with the default configuration
    pub fn new() -> Self {
        Self::with_config(AbilityConfig::default())
    }

    /// Create an ability with the given configuration
    pub fn with_config(config: AbilityConfig) -> Self {
        let aliases = if config.default_aliases {
            ActionAliasGraph::with_defaults()
        } else {
            ActionAliasGraph::new()
        }
        .memoized(config.cache_expansions);

        debug!(
            "Ability initialized with default_aliases={}, cache_expansions={}",
            config.default_aliases, config.cache_expansions
        );

        Self {
            config,
            rules: Vec::new(),
            aliases,
            index: RuleIndex::new(),
            messages: None,
        }
    }

    /// Resolve unauthorized messages through `resolver`
    pub fn with_messages(mut self, resolver: impl MessageResolver + 'static) -> Self {
        self.messages = Some(Arc::new(resolver));
        self
    }

    pub fn config(&self) -> &AbilityConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Declaration
    // ------------------------------------------------------------------

    /// Append a rule, returning its position
    pub fn add_rule(&mut self, rule: Rule) -> usize {
        let position = self.rules.len();
        self.index.record(&rule, position);
        debug!("Declared rule #{}: {}", position, rule);
        self.rules.push(rule);
        position
    }

    fn declare<A, S>(
        &mut self,
        effect: Effect,
        actions: impl IntoIterator<Item = A>,
        subjects: impl IntoIterator<Item = S>,
        body: RuleBody,
    ) -> &mut Self
    where
        A: Into<Action>,
        S: Into<SubjectKey>,
    {
        self.add_rule(Rule::new(effect, actions, subjects, body));
        self
    }

    /// Grant `actions` on `subjects` unconditionally
    pub fn grant<A, S>(&mut self, actions: impl IntoIterator<Item = A>, subjects: impl IntoIterator<Item = S>) -> &mut Self
    where
        A: Into<Action>,
        S: Into<SubjectKey>,
    {
        self.declare(Effect::Grant, actions, subjects, RuleBody::Always)
    }

    /// Deny `actions` on `subjects` unconditionally
    pub fn deny<A, S>(&mut self, actions: impl IntoIterator<Item = A>, subjects: impl IntoIterator<Item = S>) -> &mut Self
    where
        A: Into<Action>,
        S: Into<SubjectKey>,
    {
        self.declare(Effect::Deny, actions, subjects, RuleBody::Always)
    }

    /// Grant for instances whose attributes satisfy `conditions`
    pub fn grant_where<A, S>(
        &mut self,
        actions: impl IntoIterator<Item = A>,
        subjects: impl IntoIterator<Item = S>,
        conditions: Conditions,
    ) -> &mut Self
    where
        A: Into<Action>,
        S: Into<SubjectKey>,
    {
        self.declare(Effect::Grant, actions, subjects, RuleBody::Conditions(conditions))
    }

    /// Deny for instances whose attributes satisfy `conditions`
    pub fn deny_where<A, S>(
        &mut self,
        actions: impl IntoIterator<Item = A>,
        subjects: impl IntoIterator<Item = S>,
        conditions: Conditions,
    ) -> &mut Self
    where
        A: Into<Action>,
        S: Into<SubjectKey>,
    {
        self.declare(Effect::Deny, actions, subjects, RuleBody::Conditions(conditions))
    }

    /// Grant for instances the block accepts
    pub fn grant_if<A, S, F>(
        &mut self,
        actions: impl IntoIterator<Item = A>,
        subjects: impl IntoIterator<Item = S>,
        block: F,
    ) -> &mut Self
    where
        A: Into<Action>,
        S: Into<SubjectKey>,
        F: Fn(&Subject, &[Value]) -> std::result::Result<bool, PredicateError> + Send + Sync + 'static,
    {
        self.declare(Effect::Grant, actions, subjects, RuleBody::Block(Predicate::new(block)))
    }

    /// Deny for instances the block accepts
    pub fn deny_if<A, S, F>(
        &mut self,
        actions: impl IntoIterator<Item = A>,
        subjects: impl IntoIterator<Item = S>,
        block: F,
    ) -> &mut Self
    where
        A: Into<Action>,
        S: Into<SubjectKey>,
        F: Fn(&Subject, &[Value]) -> std::result::Result<bool, PredicateError> + Send + Sync + 'static,
    {
        self.declare(Effect::Deny, actions, subjects, RuleBody::Block(Predicate::new(block)))
    }

    /// Grant through a raw query fragment, usable only when building queries
    pub fn grant_raw<A, S>(
        &mut self,
        actions: impl IntoIterator<Item = A>,
        subjects: impl IntoIterator<Item = S>,
        query: RawQuery,
    ) -> &mut Self
    where
        A: Into<Action>,
        S: Into<SubjectKey>,
    {
        self.declare(Effect::Grant, actions, subjects, RuleBody::RawQuery(query))
    }

    /// Deny through a raw query fragment, usable only when building queries
    pub fn deny_raw<A, S>(
        &mut self,
        actions: impl IntoIterator<Item = A>,
        subjects: impl IntoIterator<Item = S>,
        query: RawQuery,
    ) -> &mut Self
    where
        A: Into<Action>,
        S: Into<SubjectKey>,
    {
        self.declare(Effect::Deny, actions, subjects, RuleBody::RawQuery(query))
    }

    /// Declared rules in declaration order
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Drop every rule
    pub fn clear_rules(&mut self) {
        self.rules.clear();
        self.index.clear();
    }

    // ------------------------------------------------------------------
    // Aliases
    // ------------------------------------------------------------------

    /// Declare `sources` as aliases of `target`
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `target` is itself an alias of
    /// another action.
    pub fn alias_action<I, A>(&mut self, sources: I, target: impl Into<Action>) -> Result<&mut Self>
    where
        I: IntoIterator<Item = A>,
        A: Into<Action>,
    {
        self.aliases.declare(sources, target)?;
        Ok(self)
    }

    /// Remove every alias, defaults included
    pub fn clear_aliased_actions(&mut self) {
        self.aliases.clear();
    }

    pub fn aliased_actions(&self) -> &ActionAliasGraph {
        &self.aliases
    }

    /// Alias-transitive closure of `actions`
    pub fn expand_actions(&self, actions: &[Action]) -> Vec<Action> {
        self.aliases.expand(actions).to_vec()
    }

    // ------------------------------------------------------------------
    // Checks
    // ------------------------------------------------------------------

    fn evaluator(&self) -> MatchEvaluator<'_> {
        MatchEvaluator::new(&self.rules, &self.index, &self.aliases)
    }

    /// Decide `action` on `subject`, reporting the governing rule
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a relevant rule only has a raw query
    /// fragment, and passes through any failure of a predicate block.
    pub fn check_with(&self, action: impl Into<Action>, subject: &Subject, args: &[Value]) -> Result<Decision> {
        let action = action.into();
        let decision = self.evaluator().decide(&action, subject, args)?;
        debug!(
            "Decision for `{}` on {}: {} ({})",
            action,
            subject,
            if decision.allowed { "ALLOW" } else { "DENY" },
            decision.reason
        );
        Ok(decision)
    }

    /// [`check_with`](Self::check_with) without extra arguments
    pub fn check(&self, action: impl Into<Action>, subject: &Subject) -> Result<Decision> {
        self.check_with(action, subject, &[])
    }

    /// Whether `action` is allowed on `subject`
    pub fn allowed(&self, action: impl Into<Action>, subject: &Subject) -> Result<bool> {
        self.allowed_with(action, subject, &[])
    }

    /// Whether `action` is allowed on `subject`, passing `args` to blocks
    pub fn allowed_with(&self, action: impl Into<Action>, subject: &Subject, args: &[Value]) -> Result<bool> {
        Ok(self.check_with(action, subject, args)?.allowed)
    }

    /// Negation of [`allowed`](Self::allowed)
    pub fn denied(&self, action: impl Into<Action>, subject: &Subject) -> Result<bool> {
        self.allowed(action, subject).map(|allowed| !allowed)
    }

    /// Negation of [`allowed_with`](Self::allowed_with)
    pub fn denied_with(&self, action: impl Into<Action>, subject: &Subject, args: &[Value]) -> Result<bool> {
        self.allowed_with(action, subject, args).map(|allowed| !allowed)
    }

    /// Return `subject` if `action` is allowed, otherwise an access denial
    /// carrying the resolved unauthorized message
    pub fn authorize<'s>(&self, action: impl Into<Action>, subject: &'s Subject, args: &[Value]) -> Result<&'s Subject> {
        self.authorize_inner(action.into(), subject, args, None)
    }

    /// [`authorize`](Self::authorize) with an explicit message
    pub fn authorize_with_message<'s>(
        &self,
        action: impl Into<Action>,
        subject: &'s Subject,
        args: &[Value],
        message: impl Into<String>,
    ) -> Result<&'s Subject> {
        self.authorize_inner(action.into(), subject, args, Some(message.into()))
    }

    fn authorize_inner<'s>(
        &self,
        action: Action,
        subject: &'s Subject,
        args: &[Value],
        message: Option<String>,
    ) -> Result<&'s Subject> {
        if self.check_with(action.clone(), subject, args)?.allowed {
            return Ok(subject);
        }
        let message = message.unwrap_or_else(|| self.unauthorized_message(&action, subject));
        Err(AbilityError::AccessDenied {
            action: action.to_string(),
            subject: subject.to_string(),
            message,
        })
    }

    /// Relevant rules in priority order, without evaluating them
    pub fn relevant_rules(&self, action: impl Into<Action>, subject: &Subject) -> Vec<&Rule> {
        let action = action.into();
        self.evaluator()
            .relevant_rules(&action, subject)
            .into_iter()
            .map(|(_, rule)| rule)
            .collect()
    }

    /// Whether a relevant rule is defined by a block
    pub fn has_block(&self, action: impl Into<Action>, subject: &Subject) -> bool {
        self.relevant_rules(action, subject).iter().any(|rule| rule.has_block())
    }

    /// Whether a relevant rule is defined by a raw query fragment
    pub fn has_raw_query(&self, action: impl Into<Action>, subject: &Subject) -> bool {
        self.relevant_rules(action, subject)
            .iter()
            .any(|rule| rule.raw_query().is_some())
    }

    // ------------------------------------------------------------------
    // Export
    // ------------------------------------------------------------------

    /// Default attributes for a new record: equality conditions of every
    /// relevant grant, merged in declaration order
    pub fn attributes_for(&self, action: impl Into<Action>, subject: &Subject) -> Map<String, Value> {
        let action = action.into();
        let mut positions = self.evaluator().relevant_positions(&action, subject);
        positions.sort_unstable();

        let mut attributes = Map::new();
        for position in positions {
            let rule = &self.rules[position];
            if rule.is_grant() {
                attributes.extend(rule.attributes_from_conditions());
            }
        }
        attributes
    }

    /// Rules a query-building collaborator translates, in priority order
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a relevant rule is defined by a block.
    pub fn rule_set_for_query(&self, action: impl Into<Action>, subject: &Subject) -> Result<Vec<&Rule>> {
        let action = action.into();
        let positions = self.evaluator().relevant_for_query(&action, subject)?;
        Ok(positions.into_iter().map(|position| &self.rules[position]).collect())
    }

    /// Granted and denied subject names per expanded action
    pub fn permissions(&self) -> Permissions {
        PermissionExporter::new(&self.rules, &self.aliases).export()
    }

    /// Lookup keys for the unauthorized message, most specific first
    pub fn unauthorized_message_keys(&self, action: impl Into<Action>, subject: &Subject) -> Vec<String> {
        messages::message_keys(&self.aliases, &action.into(), subject)
    }

    /// Unauthorized message from the resolver, or the configured default
    pub fn unauthorized_message(&self, action: &Action, subject: &Subject) -> String {
        let keys = messages::message_keys(&self.aliases, action, subject);
        self.messages
            .as_deref()
            .and_then(|resolver| messages::resolve_message(resolver, &keys))
            .unwrap_or_else(|| self.config.default_message.clone())
    }

    // ------------------------------------------------------------------
    // Merge
    // ------------------------------------------------------------------

    /// Append `other`'s rules after this ability's own, and merge its aliases
    ///
    /// Merged rules count as more recent than every existing rule.
    pub fn merge(&mut self, other: &Ability) -> Result<&mut Self> {
        self.aliases.merge(&other.aliases)?;
        for rule in &other.rules {
            self.add_rule(rule.clone());
        }
        info!(
            "Merged {} rules, ability now holds {}",
            other.rules.len(),
            self.rules.len()
        );
        Ok(self)
    }
}

impl Default for Ability {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Ability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ability")
            .field("config", &self.config)
            .field("rules", &self.rules)
            .field("aliases", &self.aliases)
            .field("messages", &self.messages.is_some())
            .finish()
    }
}
