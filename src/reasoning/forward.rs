//! Forward chaining
//!
//! Data-driven, breadth-first propagation from facts that backward chaining established:
//! 1. Seed a FIFO queue with the root variable's fact
//! 2. Take a fact off the queue and look up its variable's inverted index
//! 3. Fire each indexed rule whose premises all match bound variables
//! 4. Queue every fired conclusion, until the queue runs dry
//!
//! Premises are only looked up, never asked. Conclusions are queued without checking
//! whether the same fact was already processed, so a rule base whose conclusions feed
//! back into their own premises keeps the queue filling. Set `max_facts` to stop such a
//! run early.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::clause::{Clause, Fact};
use crate::error::DiagResult;
use crate::registry::{VariableBinding, VariableRegistry};
use crate::store::RuleStore;
use super::backward::BackwardChaining;
use super::strategy::{ForwardConfig, InferenceStats};

/// What a forward run produced
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwardOutcome {
    /// Every fact taken off the queue, in order
    pub processed: Vec<Fact>,
    /// Conclusions of fired rules, in firing order
    pub derived: Vec<Fact>,
    /// Last fact taken off the queue
    pub final_fact: Option<Fact>,
    /// Whether the run stopped at `max_facts` with facts still queued
    pub truncated: bool,
}

impl ForwardOutcome {
    /// The final fact, or `inconclusive = no valid solution.` when nothing was processed
    pub fn final_or_placeholder(&self) -> Fact {
        self.final_fact.clone().unwrap_or_else(Fact::placeholder)
    }
}

/// Forward chaining propagator
///
/// Owns its own copy of the rule store and the bindings merged from the backward pass.
/// The merged list may name a variable more than once: the first entry for a name supplies
/// the rules to try for a fact, and a premise holds when any known entry matches it.
#[derive(Debug, Clone)]
pub struct ForwardChaining {
    store: RuleStore,
    bindings: Vec<VariableBinding>,
    queue: VecDeque<Fact>,
    config: ForwardConfig,
    stats: InferenceStats,
}

impl ForwardChaining {
    /// Create a propagator over `registry`, indexing it against `store`
    pub fn new(store: RuleStore, registry: VariableRegistry, config: ForwardConfig) -> Self {
        Self::from_parts(store, registry, Vec::new(), config)
    }

    /// Append the intermediate conclusions to the backward bindings and index the result
    ///
    /// Nothing is dropped: an intermediate conclusion sharing a name with a binding, or
    /// repeating an earlier conclusion, gets its own entry.
    pub fn from_parts(
        store: RuleStore,
        bindings: VariableRegistry,
        intermediates: impl IntoIterator<Item = VariableBinding>,
        config: ForwardConfig,
    ) -> Self {
        let mut bindings: Vec<VariableBinding> =
            bindings.iter().cloned().chain(intermediates).collect();
        for binding in &mut bindings {
            binding.build_index(&store);
        }
        ForwardChaining {
            store,
            bindings,
            queue: VecDeque::new(),
            config,
            stats: InferenceStats::default(),
        }
    }

    /// Build from a finished backward pass
    pub fn from_backward<O>(backward: &BackwardChaining<'_, O>, config: ForwardConfig) -> Self
    where
        O: super::oracle::ValueOracle,
    {
        Self::from_parts(
            backward.rules().clone(),
            backward.registry().clone(),
            backward.intermediate_conclusions().iter().cloned(),
            config,
        )
    }

    /// Queue the root variable's fact if it is bound
    ///
    /// Returns whether anything was queued.
    pub fn seed(&mut self) -> bool {
        let root = &self.config.root_variable;
        let seed = self
            .bindings
            .iter()
            .filter(|b| &b.name == root)
            .find_map(VariableBinding::fact);
        match seed {
            Some(fact) => {
                tracing::debug!(fact = %fact, "seeding forward chaining");
                self.queue.push_back(fact);
                true
            }
            None => {
                tracing::info!(root = %root, "root variable unbound, nothing to propagate");
                false
            }
        }
    }

    /// Queue an extra fact behind whatever is already queued
    pub fn enqueue(&mut self, fact: Fact) {
        self.queue.push_back(fact);
    }

    /// Drain the queue, firing every indexed rule whose premises are bound
    pub fn run(&mut self) -> DiagResult<ForwardOutcome> {
        let mut outcome = ForwardOutcome::default();

        while let Some(fact) = self.queue.pop_front() {
            if self.config.max_facts > 0 && outcome.processed.len() >= self.config.max_facts {
                self.queue.push_front(fact);
                tracing::warn!(
                    limit = self.config.max_facts,
                    pending = self.queue.len(),
                    "forward chaining stopped at fact limit"
                );
                outcome.truncated = true;
                break;
            }
            self.stats.facts_processed += 1;
            tracing::debug!(fact = %fact, "processing fact");

            if let Some(binding) = self.bindings.iter().find(|b| b.name == fact.name) {
                for &index in &binding.rule_refs {
                    let rule = self.store.rule_at(index)?;
                    if rule.premises.iter().all(|p| is_established(&self.bindings, p)) {
                        let derived = rule.conclusion.to_fact();
                        tracing::debug!(rule = index, fact = %derived, "rule fired");
                        self.stats.rules_fired += 1;
                        outcome.derived.push(derived.clone());
                        self.queue.push_back(derived);
                    }
                }
            } else {
                tracing::trace!(fact = %fact, "no variable for fact, discarded");
            }

            outcome.final_fact = Some(fact.clone());
            outcome.processed.push(fact);
        }

        tracing::info!(
            processed = outcome.processed.len(),
            fired = outcome.derived.len(),
            "forward chaining finished"
        );
        Ok(outcome)
    }

    /// Seed from the root variable, then run
    pub fn propagate(&mut self) -> DiagResult<ForwardOutcome> {
        self.seed();
        self.run()
    }

    /// Merged bindings in order: backward bindings, then intermediate conclusions
    pub fn bindings(&self) -> &[VariableBinding] {
        &self.bindings
    }

    pub fn rules(&self) -> &RuleStore {
        &self.store
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn stats(&self) -> &InferenceStats {
        &self.stats
    }
}

/// Whether any known binding matches `premise`
fn is_established(bindings: &[VariableBinding], premise: &Clause) -> bool {
    bindings.iter().any(|b| b.satisfies(premise))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reasoning::oracle::ScriptedOracle;
    use crate::reasoning::strategy::GoalOutcome;
    use crate::store::Rule;

    fn rule(premises: &[(&str, &str)], conclusion: (&str, &str)) -> Rule {
        Rule::new(
            premises.iter().map(|(n, v)| Clause::new(*n, *v)).collect(),
            Clause::new(conclusion.0, conclusion.1),
        )
    }

    fn first<'a>(fc: &'a ForwardChaining, name: &str) -> &'a VariableBinding {
        fc.bindings().iter().find(|b| b.name == name).unwrap()
    }

    #[test]
    fn test_handoff_from_root() {
        let store = RuleStore::from_rules(vec![rule(&[("has_issue", "yes")], ("needs_fuel", "yes"))]);
        let registry = VariableRegistry::from_bindings(vec![VariableBinding::known(
            "has_issue",
            "yes",
            "Is there an issue?",
        )]);
        let mut fc = ForwardChaining::new(store, registry, ForwardConfig::default());

        let outcome = fc.propagate().unwrap();

        assert!(outcome.processed.contains(&Fact::new("needs_fuel", "yes")));
        assert_eq!(outcome.derived, vec![Fact::new("needs_fuel", "yes")]);
        assert_eq!(outcome.final_or_placeholder(), Fact::new("needs_fuel", "yes"));
    }

    #[test]
    fn test_unseeded_reports_placeholder() {
        let store = RuleStore::from_rules(vec![rule(&[("has_issue", "yes")], ("needs_fuel", "yes"))]);
        let registry =
            VariableRegistry::from_bindings(vec![VariableBinding::new("has_issue", "Issue?")]);
        let mut fc = ForwardChaining::new(store, registry, ForwardConfig::default());

        assert!(!fc.seed());
        let outcome = fc.run().unwrap();
        assert!(outcome.processed.is_empty());
        assert!(outcome.final_fact.is_none());
        assert!(outcome.final_or_placeholder().is_placeholder());
    }

    #[test]
    fn test_rule_needs_every_premise_bound() {
        let store = RuleStore::from_rules(vec![
            rule(&[("has_issue", "yes"), ("noise", "click")], ("repair", "starter")),
            rule(&[("has_issue", "yes"), ("lights", "dim")], ("repair", "battery")),
        ]);
        let registry = VariableRegistry::from_bindings(vec![
            VariableBinding::known("has_issue", "yes", ""),
            VariableBinding::new("noise", ""),
            VariableBinding::known("lights", "dim", ""),
        ]);
        let mut fc = ForwardChaining::new(store, registry, ForwardConfig::default());

        let outcome = fc.propagate().unwrap();
        assert_eq!(outcome.derived, vec![Fact::new("repair", "battery")]);
        assert_eq!(fc.stats().rules_fired, 1);
    }

    #[test]
    fn test_chain_through_intermediate_conclusion() {
        let store = RuleStore::from_rules(vec![
            rule(&[("fuel", "yes"), ("spark", "no")], ("issue", "no_spark")),
            rule(&[("has_issue", "yes")], ("issue_checked", "yes")),
            rule(&[("issue", "no_spark")], ("repair", "replace_plugs")),
        ]);
        let bindings = VariableRegistry::from_bindings(vec![
            VariableBinding::known("has_issue", "yes", ""),
            VariableBinding::known("fuel", "yes", ""),
            VariableBinding::known("spark", "no", ""),
        ]);
        let intermediates = vec![
            VariableBinding::intermediate("issue", "no_spark", Default::default()),
            VariableBinding::intermediate("issue_checked", "yes", Default::default()),
        ];
        let mut fc =
            ForwardChaining::from_parts(store, bindings, intermediates, ForwardConfig::default());
        fc.enqueue(Fact::new("issue", "no_spark"));

        let outcome = fc.propagate().unwrap();
        let names: Vec<&str> = outcome.processed.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["issue", "has_issue", "repair", "issue_checked"]);
        assert_eq!(outcome.final_or_placeholder(), Fact::new("issue_checked", "yes"));
    }

    #[test]
    fn test_derived_fact_without_variable_is_final() {
        let store = RuleStore::from_rules(vec![rule(&[("has_issue", "yes")], ("repair", "tow"))]);
        let registry =
            VariableRegistry::from_bindings(vec![VariableBinding::known("has_issue", "yes", "")]);
        let mut fc = ForwardChaining::new(store, registry, ForwardConfig::default());

        let outcome = fc.propagate().unwrap();
        assert_eq!(outcome.processed.len(), 2);
        assert_eq!(outcome.final_fact, Some(Fact::new("repair", "tow")));
    }

    #[test]
    fn test_no_dedup_of_repeated_conclusions() {
        let store = RuleStore::from_rules(vec![
            rule(&[("has_issue", "yes")], ("check", "yes")),
            rule(&[("has_issue", "yes")], ("check", "yes")),
        ]);
        let registry = VariableRegistry::from_bindings(vec![
            VariableBinding::known("has_issue", "yes", ""),
            VariableBinding::known("check", "yes", ""),
        ]);
        let mut fc = ForwardChaining::new(store, registry, ForwardConfig::default());

        let outcome = fc.propagate().unwrap();
        assert_eq!(outcome.derived.len(), 2);
        assert_eq!(outcome.processed.len(), 3);
    }

    #[test]
    fn test_fact_limit_truncates_cycle() {
        let store = RuleStore::from_rules(vec![
            rule(&[("has_issue", "yes")], ("loop", "on")),
            rule(&[("loop", "on")], ("has_issue", "yes")),
        ]);
        let registry = VariableRegistry::from_bindings(vec![
            VariableBinding::known("has_issue", "yes", ""),
            VariableBinding::known("loop", "on", ""),
        ]);
        let config = ForwardConfig {
            max_facts: 5,
            ..ForwardConfig::default()
        };
        let mut fc = ForwardChaining::new(store, registry, config);

        let outcome = fc.propagate().unwrap();
        assert!(outcome.truncated);
        assert_eq!(outcome.processed.len(), 5);
        assert_eq!(fc.stats().facts_processed, 5);
        // the sixth fact goes back on the queue untouched
        assert_eq!(fc.pending(), 1);
        assert_eq!(fc.run().unwrap().processed[0], Fact::new("loop", "on"));
    }

    #[test]
    fn test_custom_root_variable() {
        let store = RuleStore::from_rules(vec![rule(&[("engine_cranks", "no")], ("check", "battery"))]);
        let registry =
            VariableRegistry::from_bindings(vec![VariableBinding::known("engine_cranks", "no", "")]);
        let config = ForwardConfig {
            root_variable: "engine_cranks".to_string(),
            ..ForwardConfig::default()
        };
        let mut fc = ForwardChaining::new(store, registry, config);
        assert_eq!(
            fc.propagate().unwrap().final_fact,
            Some(Fact::new("check", "battery"))
        );
    }

    #[test]
    fn test_from_backward_merges_and_indexes() {
        let store = RuleStore::from_rules(vec![
            rule(&[("fuel", "yes"), ("spark", "no")], ("issue", "no_spark")),
            rule(&[("has_issue", "yes"), ("issue", "no_spark")], ("repair", "replace_plugs")),
        ]);
        let registry = VariableRegistry::from_bindings(vec![
            VariableBinding::new("has_issue", "Is there an issue?"),
            VariableBinding::new("fuel", "Fuel?"),
            VariableBinding::new("spark", "Spark?"),
        ]);
        let oracle =
            ScriptedOracle::from_pairs([("has_issue", "yes"), ("fuel", "yes"), ("spark", "no")]);
        let mut bc = BackwardChaining::new(&store, registry, oracle);
        bc.solve_top_goal("repair").unwrap();

        let mut fc = ForwardChaining::from_backward(&bc, ForwardConfig::default());
        assert_eq!(first(&fc, "has_issue").rule_refs, vec![1]);
        assert_eq!(first(&fc, "issue").rule_refs, vec![1]);

        let outcome = fc.propagate().unwrap();
        assert_eq!(outcome.final_fact, Some(Fact::new("repair", "replace_plugs")));
    }

    #[test]
    fn test_every_intermediate_value_is_usable() {
        let store = RuleStore::from_rules(vec![
            rule(&[("fuel", "yes")], ("issue", "x")),
            rule(&[("fuel", "yes")], ("issue", "y")),
            rule(&[("has_issue", "yes"), ("issue", "x"), ("spark", "yes")], ("repair", "a")),
            rule(&[("issue", "y")], ("repair", "b")),
            rule(&[("has_issue", "yes"), ("issue", "y")], ("fix", "z")),
        ]);
        let registry = VariableRegistry::from_bindings(vec![
            VariableBinding::new("has_issue", "Is there an issue?"),
            VariableBinding::new("fuel", "Fuel?"),
            VariableBinding::new("spark", "Spark?"),
        ]);
        let oracle =
            ScriptedOracle::from_pairs([("has_issue", "yes"), ("fuel", "yes"), ("spark", "no")]);
        let mut bc = BackwardChaining::new(&store, registry, oracle);
        assert_eq!(bc.solve_top_goal("repair").unwrap(), GoalOutcome::Proved(3));
        let proved: Vec<String> = bc
            .intermediate_conclusions()
            .iter()
            .map(|b| format!("{}={}", b.name, b.value))
            .collect();
        assert_eq!(proved, ["issue=x", "issue=y"]);

        let mut fc = ForwardChaining::from_backward(&bc, ForwardConfig::default());
        assert_eq!(fc.bindings().iter().filter(|b| b.name == "issue").count(), 2);

        let outcome = fc.propagate().unwrap();
        assert_eq!(outcome.derived, vec![Fact::new("fix", "z")]);
        assert_eq!(outcome.final_fact, Some(Fact::new("fix", "z")));
    }

    #[test]
    fn test_unbound_variable_does_not_hide_proved_conclusion() {
        let store = RuleStore::from_rules(vec![
            rule(&[("fuel", "no")], ("issue", "no_fuel")),
            rule(&[("has_issue", "yes"), ("issue", "no_fuel")], ("advice", "walk")),
        ]);
        let registry = VariableRegistry::from_bindings(vec![
            VariableBinding::known("has_issue", "yes", "Is there an issue?"),
            VariableBinding::known("fuel", "no", "Fuel?"),
            VariableBinding::new("issue", "What is the issue?"),
        ]);
        let intermediates = vec![VariableBinding::intermediate(
            "issue",
            "no_fuel",
            Default::default(),
        )];
        let mut fc =
            ForwardChaining::from_parts(store, registry, intermediates, ForwardConfig::default());

        // the variable-list entry comes first and still owns the index
        assert!(!first(&fc, "issue").known);
        let outcome = fc.propagate().unwrap();
        assert_eq!(outcome.derived, vec![Fact::new("advice", "walk")]);
        assert_eq!(fc.stats().rules_fired, 1);
    }

    #[test]
    fn test_seed_skips_unbound_root_entry() {
        let store = RuleStore::from_rules(vec![rule(&[("has_issue", "yes")], ("check", "yes"))]);
        let registry =
            VariableRegistry::from_bindings(vec![VariableBinding::new("has_issue", "Issue?")]);
        let intermediates = vec![VariableBinding::intermediate(
            "has_issue",
            "yes",
            Default::default(),
        )];
        let mut fc =
            ForwardChaining::from_parts(store, registry, intermediates, ForwardConfig::default());

        assert!(fc.seed());
        assert_eq!(fc.run().unwrap().final_fact, Some(Fact::new("check", "yes")));
    }
}
