//! Variable registry
//!
//! One [`VariableBinding`] per named variable, keyed by name in insertion order. Each
//! binding remembers whether it has been bound, to what value, which prompt to show when
//! asking for it, and an inverted index of the rules whose premises reference it.
//! Forward chaining copies the bindings into a plain list where a name may repeat.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::clause::{Clause, ClauseKind, Fact};
use crate::store::RuleStore;

/// A named variable and what is known about it this session
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableBinding {
    pub name: String,
    pub known: bool,
    pub value: String,
    pub prompt: String,
    #[serde(default)]
    pub kind: ClauseKind,
    /// Rules referencing this variable among their premises, one entry per rule
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rule_refs: Vec<usize>,
}

impl VariableBinding {
    /// An unbound variable
    pub fn new(name: impl Into<String>, prompt: impl Into<String>) -> Self {
        VariableBinding {
            name: name.into(),
            known: false,
            value: String::new(),
            prompt: prompt.into(),
            kind: ClauseKind::String,
            rule_refs: Vec::new(),
        }
    }

    /// An unbound variable with a declared kind
    pub fn with_kind(name: impl Into<String>, prompt: impl Into<String>, kind: ClauseKind) -> Self {
        VariableBinding {
            kind,
            ..Self::new(name, prompt)
        }
    }

    /// A variable that is already bound
    pub fn known(name: impl Into<String>, value: impl Into<String>, prompt: impl Into<String>) -> Self {
        VariableBinding {
            known: true,
            value: value.into(),
            ..Self::new(name, prompt)
        }
    }

    /// Binding recorded for a conclusion proved while resolving another goal
    pub fn intermediate(name: &str, value: &str, kind: ClauseKind) -> Self {
        VariableBinding {
            known: true,
            value: value.to_string(),
            kind,
            ..Self::new(name, format!("{}(y/n)", name))
        }
    }

    /// Bind the variable. A binding that is already known keeps its value.
    ///
    /// Returns `true` when the value was stored.
    pub fn bind(&mut self, value: impl Into<String>) -> bool {
        if self.known {
            return false;
        }
        self.value = value.into();
        self.known = true;
        true
    }

    /// Whether the binding is known and establishes `clause`
    pub fn satisfies(&self, clause: &Clause) -> bool {
        self.known && clause.matches(&self.name, &self.value)
    }

    /// The fact this binding establishes, if bound
    pub fn fact(&self) -> Option<Fact> {
        self.known.then(|| Fact::new(self.name.clone(), self.value.clone()))
    }

    /// Rebuild the inverted index against `store`
    ///
    /// Scans rules in order and records a rule's index once, at the first premise named
    /// after this variable. The index is only valid for the store it was built from.
    pub fn build_index(&mut self, store: &RuleStore) {
        self.rule_refs = store
            .iter()
            .enumerate()
            .filter(|(_, rule)| rule.first_premise_named(&self.name).is_some())
            .map(|(i, _)| i)
            .collect();
    }
}

/// Name-keyed, insertion-ordered set of variable bindings
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct VariableRegistry {
    bindings: IndexMap<String, VariableBinding>,
}

impl VariableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_bindings(bindings: impl IntoIterator<Item = VariableBinding>) -> Self {
        let mut registry = Self::new();
        registry.extend(bindings);
        registry
    }

    /// Insert a binding unless its name is already present
    ///
    /// Names are unique and the first entry wins, so a later duplicate is handed back.
    pub fn insert(&mut self, binding: VariableBinding) -> Option<VariableBinding> {
        if self.bindings.contains_key(&binding.name) {
            return Some(binding);
        }
        self.bindings.insert(binding.name.clone(), binding);
        None
    }

    pub fn extend(&mut self, bindings: impl IntoIterator<Item = VariableBinding>) {
        for binding in bindings {
            self.insert(binding);
        }
    }

    pub fn get(&self, name: &str) -> Option<&VariableBinding> {
        self.bindings.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut VariableBinding> {
        self.bindings.get_mut(name)
    }

    /// Facts for every bound variable, in registry order
    pub fn known_facts(&self) -> Vec<Fact> {
        self.bindings.values().filter_map(VariableBinding::fact).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &VariableBinding> {
        self.bindings.values()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl FromIterator<VariableBinding> for VariableRegistry {
    fn from_iter<I: IntoIterator<Item = VariableBinding>>(iter: I) -> Self {
        Self::from_bindings(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Rule;

    fn store() -> RuleStore {
        RuleStore::from_rules(vec![
            Rule::new(vec![Clause::new("fuel", "no")], Clause::new("issue", "no_fuel")),
            Rule::new(vec![Clause::new("spark", "no")], Clause::new("issue", "no_spark")),
            Rule::new(
                vec![
                    Clause::new("fuel", "yes"),
                    Clause::new("spark", "yes"),
                    Clause::new("fuel", "maybe"),
                ],
                Clause::new("issue", "none"),
            ),
        ])
    }

    #[test]
    fn test_index_one_entry_per_rule() {
        let mut fuel = VariableBinding::new("fuel", "Is there fuel?");
        fuel.build_index(&store());
        assert_eq!(fuel.rule_refs, vec![0, 2]);

        let mut spark = VariableBinding::new("spark", "Is there spark?");
        spark.build_index(&store());
        assert_eq!(spark.rule_refs, vec![1, 2]);
    }

    #[test]
    fn test_index_rebuild_replaces_old_refs() {
        let mut fuel = VariableBinding::new("fuel", "Is there fuel?");
        fuel.build_index(&store());
        let other = RuleStore::from_rules(vec![Rule::new(
            vec![Clause::new("fuel", "no")],
            Clause::new("tow", "yes"),
        )]);
        fuel.build_index(&other);
        assert_eq!(fuel.rule_refs, vec![0]);
    }

    #[test]
    fn test_conclusion_is_not_indexed() {
        let mut issue = VariableBinding::new("issue", "");
        issue.build_index(&store());
        assert!(issue.rule_refs.is_empty());
    }

    #[test]
    fn test_bind_is_write_once() {
        let mut b = VariableBinding::new("fuel", "Is there fuel?");
        assert!(b.bind("yes"));
        assert!(!b.bind("no"));
        assert_eq!(b.value, "yes");
        assert!(b.satisfies(&Clause::new("fuel", "yes")));
    }

    #[test]
    fn test_first_insert_wins() {
        let mut registry = VariableRegistry::new();
        assert!(registry
            .insert(VariableBinding::known("issue", "no_spark", "issue(y/n)"))
            .is_none());
        let rejected = registry.insert(VariableBinding::known("issue", "no_fuel", "issue(y/n)"));
        assert!(rejected.is_some());
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("issue").unwrap().value, "no_spark");
    }

    #[test]
    fn test_satisfies_needs_known_name_and_value() {
        let premise = Clause::new("issue", "no_fuel");
        assert!(!VariableBinding::new("issue", "").satisfies(&premise));
        assert!(VariableBinding::intermediate("issue", "no_fuel", ClauseKind::Int).satisfies(&premise));
        assert!(!VariableBinding::known("issue", "no_spark", "").satisfies(&premise));
        assert!(!VariableBinding::known("fuel", "no_fuel", "").satisfies(&premise));
    }

    #[test]
    fn test_intermediate_prompt() {
        let b = VariableBinding::intermediate("issue", "no_spark", ClauseKind::String);
        assert!(b.known);
        assert_eq!(b.prompt, "issue(y/n)");
    }

    #[test]
    fn test_known_facts_in_order() {
        let registry: VariableRegistry = vec![
            VariableBinding::known("b", "1", ""),
            VariableBinding::new("c", ""),
            VariableBinding::known("a", "2", ""),
        ]
        .into_iter()
        .collect();
        assert_eq!(
            registry.known_facts(),
            vec![Fact::new("b", "1"), Fact::new("a", "2")]
        );
    }
}
