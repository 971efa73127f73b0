//! Rule store
//!
//! A store holds the knowledge base: an ordered list of rules plus the set of names that
//! appear as a conclusion of at least one rule. Rule order is search order and premise
//! order is evaluation order, so both are kept exactly as inserted.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::clause::Clause;
use crate::error::{DiagError, DiagResult};

/// A rule: `IF premises THEN conclusion`
///
/// A rule without premises is an atomic fact: its conclusion always holds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// Clause established when every premise holds
    pub conclusion: Clause,
    /// Conjunction of premises, in evaluation order
    #[serde(default)]
    pub premises: Vec<Clause>,
}

impl Rule {
    /// Create a new rule
    pub fn new(premises: Vec<Clause>, conclusion: Clause) -> Self {
        Rule { conclusion, premises }
    }

    /// Create an atomic fact (a rule with no premises)
    pub fn fact(conclusion: Clause) -> Self {
        Rule {
            conclusion,
            premises: Vec::new(),
        }
    }

    pub fn is_fact(&self) -> bool {
        self.premises.is_empty()
    }

    /// Position of the first premise named `name`
    pub fn first_premise_named(&self, name: &str) -> Option<usize> {
        self.premises.iter().position(|p| p.name == name)
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.premises.is_empty() {
            return write!(f, "{}", self.conclusion);
        }
        write!(f, "IF ")?;
        for (i, premise) in self.premises.iter().enumerate() {
            if i > 0 {
                write!(f, " AND ")?;
            }
            write!(f, "{}", premise)?;
        }
        write!(f, " THEN {}", self.conclusion)
    }
}

/// The knowledge base
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RuleStore {
    rules: Vec<Rule>,
    conclusion_names: BTreeSet<String>,
}

impl RuleStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from rules in search order
    pub fn from_rules(rules: impl IntoIterator<Item = Rule>) -> Self {
        let mut store = Self::new();
        for rule in rules {
            store.push(rule);
        }
        store
    }

    /// Append a rule at the end of the search order
    pub fn push(&mut self, rule: Rule) {
        self.conclusion_names.insert(rule.conclusion.name.clone());
        self.rules.push(rule);
    }

    /// The rule at `index`
    pub fn rule_at(&self, index: usize) -> DiagResult<&Rule> {
        self.rules
            .get(index)
            .ok_or_else(|| DiagError::rule_out_of_range(index, self.rules.len()))
    }

    /// Premise `premise` of rule `rule`
    pub fn premise_at(&self, rule: usize, premise: usize) -> DiagResult<&Clause> {
        let r = self.rule_at(rule)?;
        r.premises
            .get(premise)
            .ok_or_else(|| DiagError::premise_out_of_range(rule, premise, r.premises.len()))
    }

    /// Every name that is the conclusion of some rule, sorted
    pub fn distinct_conclusion_names(&self) -> &BTreeSet<String> {
        &self.conclusion_names
    }

    /// Whether `name` can be derived by at least one rule
    pub fn is_conclusion(&self, name: &str) -> bool {
        self.conclusion_names.contains(name)
    }

    /// All rules in search order
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    /// Get the number of rules
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Knowledge base listing, one numbered rule per line
impl fmt::Display for RuleStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, rule) in self.rules.iter().enumerate() {
            writeln!(f, "{}. {}", i + 1, rule)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn sample() -> RuleStore {
        RuleStore::from_rules(vec![
            Rule::new(vec![Clause::new("fuel", "no")], Clause::new("issue", "no_fuel")),
            Rule::new(
                vec![Clause::new("fuel", "yes"), Clause::new("spark", "no")],
                Clause::new("issue", "no_spark"),
            ),
            Rule::new(vec![Clause::new("issue", "no_spark")], Clause::new("repair", "plugs")),
        ])
    }

    #[test]
    fn test_conclusion_names() {
        let store = sample();
        let names: Vec<&str> = store
            .distinct_conclusion_names()
            .iter()
            .map(String::as_str)
            .collect();
        assert_eq!(names, vec!["issue", "repair"]);
        assert!(store.is_conclusion("repair"));
        assert!(!store.is_conclusion("fuel"));
    }

    #[test]
    fn test_accessors_in_range() {
        let store = sample();
        assert_eq!(store.rule_at(1).unwrap().conclusion.value, "no_spark");
        assert_eq!(store.premise_at(1, 1).unwrap().name, "spark");
    }

    #[test]
    fn test_accessors_out_of_range() {
        let store = sample();
        assert_eq!(store.rule_at(3).unwrap_err().code, ErrorCode::RuleIndexOutOfRange);
        assert_eq!(
            store.premise_at(0, 1).unwrap_err().code,
            ErrorCode::PremiseIndexOutOfRange
        );
        assert_eq!(
            store.premise_at(9, 0).unwrap_err().code,
            ErrorCode::RuleIndexOutOfRange
        );
    }

    #[test]
    fn test_listing() {
        let mut store = sample();
        store.push(Rule::fact(Clause::new("has_issue", "yes")));
        let listing = store.to_string();
        let lines: Vec<&str> = listing.lines().collect();
        assert_eq!(lines[0], "1. IF fuel = no THEN issue = no_fuel");
        assert_eq!(lines[1], "2. IF fuel = yes AND spark = no THEN issue = no_spark");
        assert_eq!(lines[3], "4. has_issue = yes");
    }

    #[test]
    fn test_first_premise_named() {
        let rule = Rule::new(
            vec![
                Clause::new("a", "1"),
                Clause::new("b", "2"),
                Clause::new("a", "3"),
            ],
            Clause::new("c", "4"),
        );
        assert_eq!(rule.first_premise_named("a"), Some(0));
        assert_eq!(rule.first_premise_named("b"), Some(1));
        assert_eq!(rule.first_premise_named("z"), None);
        assert!(!rule.is_fact());
    }
}
