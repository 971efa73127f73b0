//! Backward chaining
//!
//! Goal-directed, depth-first resolution:
//! 1. Scan rules in order for ones concluding the goal name
//! 2. Filter on the wanted conclusion value (or accept any value for an open question)
//! 3. Evaluate the rule's premises left to right, stopping at the first failure
//! 4. A premise that is itself a conclusion becomes a nested goal; anything else is a
//!    primitive variable, asked from the oracle once and remembered
//!
//! The first rule whose premises all hold proves the goal. Conclusions proved along the
//! way are recorded so forward chaining can start from everything learned here.

use crate::clause::Clause;
use crate::error::{DiagError, DiagResult};
use crate::registry::{VariableBinding, VariableRegistry};
use crate::store::{Rule, RuleStore};
use super::oracle::ValueOracle;
use super::strategy::{DesiredValue, GoalOutcome, InferenceStats, ResolverConfig};

/// Backward chaining resolver
///
/// Borrows the rule store, owns the variable registry for the session and asks `O` for
/// values it cannot derive.
pub struct BackwardChaining<'s, O> {
    store: &'s RuleStore,
    registry: VariableRegistry,
    /// Conclusions proved while resolving premises, in proof order
    intermediates: Vec<VariableBinding>,
    oracle: O,
    config: ResolverConfig,
    stats: InferenceStats,
    depth: usize,
}

impl<'s, O: ValueOracle> BackwardChaining<'s, O> {
    /// Create a resolver with the default configuration
    pub fn new(store: &'s RuleStore, registry: VariableRegistry, oracle: O) -> Self {
        Self::with_config(store, registry, oracle, ResolverConfig::default())
    }

    pub fn with_config(
        store: &'s RuleStore,
        registry: VariableRegistry,
        oracle: O,
        config: ResolverConfig,
    ) -> Self {
        BackwardChaining {
            store,
            registry,
            intermediates: Vec::new(),
            oracle,
            config,
            stats: InferenceStats::default(),
            depth: 0,
        }
    }

    /// Answer an open question: prove `goal` with whatever value the first provable rule has
    pub fn solve_top_goal(&mut self, goal: &str) -> DiagResult<GoalOutcome> {
        tracing::info!(goal, "solving top-level goal");
        let outcome = self.resolve_goal(goal, 0, DesiredValue::Any)?;
        tracing::info!(goal, ?outcome, "top-level goal resolved");
        Ok(outcome)
    }

    /// Try to prove `goal`, scanning rules from `search_start`
    ///
    /// Returns `NotAConclusion` when no scanned rule concludes `goal`, `Contradiction` when
    /// some do but none could be proved, and `Proved(i)` for the first rule that held.
    /// Oracle failures abort the whole resolution and are returned unchanged.
    pub fn resolve_goal(
        &mut self,
        goal: &str,
        search_start: usize,
        desired: DesiredValue<'_>,
    ) -> DiagResult<GoalOutcome> {
        if search_start > self.store.len() {
            return Err(DiagError::rule_out_of_range(search_start, self.store.len()));
        }

        self.depth += 1;
        let result = if self.config.max_depth > 0 && self.depth > self.config.max_depth {
            Err(DiagError::depth_exceeded(goal, self.config.max_depth))
        } else {
            self.stats.max_depth_reached = self.stats.max_depth_reached.max(self.depth);
            self.scan_rules(goal, search_start, desired)
        };
        self.depth -= 1;
        result
    }

    fn scan_rules(
        &mut self,
        goal: &str,
        search_start: usize,
        desired: DesiredValue<'_>,
    ) -> DiagResult<GoalOutcome> {
        self.stats.goals_resolved += 1;
        let store = self.store;
        let mut concluded_here = false;

        for (index, rule) in store.rules().iter().enumerate().skip(search_start) {
            if rule.conclusion.name != goal {
                continue;
            }
            concluded_here = true;
            if !desired.accepts(&rule.conclusion.value) {
                continue;
            }

            tracing::trace!(goal, rule = index, depth = self.depth, "trying rule");
            if self.evaluate_premises(rule)? {
                tracing::debug!(goal, rule = index, value = %rule.conclusion.value, "goal proved");
                return Ok(GoalOutcome::Proved(index));
            }
        }

        if concluded_here {
            tracing::debug!(goal, "no rule for goal could be proved");
            Ok(GoalOutcome::Contradiction)
        } else {
            Ok(GoalOutcome::NotAConclusion)
        }
    }

    /// Evaluate the premises of the rule at `index`
    pub fn evaluate_rule(&mut self, index: usize) -> DiagResult<bool> {
        let store = self.store;
        let rule = store.rule_at(index)?;
        self.evaluate_premises(rule)
    }

    /// Conjunction of `rule`'s premises, short-circuiting on the first that fails
    fn evaluate_premises(&mut self, rule: &Rule) -> DiagResult<bool> {
        self.stats.rules_tried += 1;
        for premise in &rule.premises {
            if !self.evaluate_premise(premise)? {
                self.stats.premise_failures += 1;
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn evaluate_premise(&mut self, premise: &Clause) -> DiagResult<bool> {
        if self.store.is_conclusion(&premise.name) {
            return self.evaluate_derived(premise);
        }
        self.evaluate_primitive(premise)
    }

    /// Premise whose name some rule concludes: prove it as a nested goal
    fn evaluate_derived(&mut self, premise: &Clause) -> DiagResult<bool> {
        match self.resolve_goal(&premise.name, 0, DesiredValue::Exactly(&premise.value))? {
            GoalOutcome::Proved(_) => {
                self.intermediates.push(VariableBinding::intermediate(
                    &premise.name,
                    &premise.value,
                    premise.kind,
                ));
                Ok(true)
            }
            GoalOutcome::Contradiction => Ok(false),
            GoalOutcome::NotAConclusion => {
                // conclusion set and rule list disagree
                self.stats.inconsistencies += 1;
                tracing::warn!(
                    premise = %premise.name,
                    "premise is listed as a conclusion but no rule concludes it"
                );
                Ok(false)
            }
        }
    }

    /// Premise on an input variable: get it, asking the oracle the first time
    fn evaluate_primitive(&mut self, premise: &Clause) -> DiagResult<bool> {
        let Some(binding) = self.registry.get_mut(&premise.name) else {
            self.stats.inconsistencies += 1;
            if self.config.strict {
                return Err(DiagError::unknown_variable(&premise.name));
            }
            tracing::warn!(
                variable = %premise.name,
                "premise references a variable missing from the variable list"
            );
            return Ok(false);
        };

        if !binding.known {
            self.stats.oracle_calls += 1;
            let answer = self
                .oracle
                .ask_variable(&binding.name, &binding.prompt)
                .map_err(|e| DiagError::from(e).with_context("variable", premise.name.as_str()))?;
            tracing::debug!(variable = %binding.name, value = %answer, "variable bound");
            binding.bind(answer);
        }

        Ok(binding.satisfies(premise))
    }

    /// The conclusion established by a `Proved` outcome
    pub fn conclusion_of(&self, outcome: GoalOutcome) -> Option<&'s Clause> {
        let store = self.store;
        outcome
            .rule_index()
            .and_then(|i| store.rule_at(i).ok())
            .map(|rule| &rule.conclusion)
    }

    /// The value a `Proved` outcome concluded
    pub fn conclusion_value(&self, outcome: GoalOutcome) -> Option<&'s str> {
        self.conclusion_of(outcome).map(|c| c.value.as_str())
    }

    pub fn rules(&self) -> &'s RuleStore {
        self.store
    }

    pub fn registry(&self) -> &VariableRegistry {
        &self.registry
    }

    /// Conclusions proved as nested goals, in the order they were proved
    pub fn intermediate_conclusions(&self) -> &[VariableBinding] {
        &self.intermediates
    }

    pub fn stats(&self) -> &InferenceStats {
        &self.stats
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }
}
