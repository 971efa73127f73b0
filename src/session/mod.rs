//! Diagnostic sessions
//!
//! A session owns one rule store and one initial variable list. Each call to
//! [`DiagnosticSession::diagnose`] starts from a fresh copy of the variables, runs
//! backward chaining on the chosen goal, hands everything learned to forward chaining
//! and collects the result in a [`DiagnosisReport`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::clause::Fact;
use crate::config::DiagConfig;
use crate::error::{DiagError, DiagResult};
use crate::parser::{load_rules, load_variables};
use crate::reasoning::{
    BackwardChaining, ForwardChaining, ForwardConfig, ForwardOutcome, GoalOutcome,
    InferenceStats, ResolverConfig, ValueOracle,
};
use crate::registry::VariableRegistry;
use crate::store::RuleStore;

/// How the top-level goal was settled
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    /// A rule concluding the goal held
    Proved,
    /// Rules conclude the goal but none held for these answers
    Inconclusive,
    /// No rule concludes the goal
    Unknown,
}

impl From<GoalOutcome> for Verdict {
    fn from(outcome: GoalOutcome) -> Self {
        match outcome {
            GoalOutcome::Proved(_) => Verdict::Proved,
            GoalOutcome::Contradiction => Verdict::Inconclusive,
            GoalOutcome::NotAConclusion => Verdict::Unknown,
        }
    }
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Proved => "proved",
            Verdict::Inconclusive => "inconclusive",
            Verdict::Unknown => "unknown",
        }
    }
}

/// Everything one diagnosis produced
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosisReport {
    pub goal: String,
    pub verdict: Verdict,
    /// Value of the proved conclusion
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Index of the rule that proved the goal
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<usize>,
    /// Variables bound during backward chaining, in registry order
    pub answers: Vec<Fact>,
    /// Conclusions proved on the way to the goal
    pub intermediates: Vec<Fact>,
    pub forward: ForwardOutcome,
    /// Last propagated fact, or `inconclusive = no valid solution.`
    pub final_fact: Fact,
    pub backward_stats: InferenceStats,
    pub forward_stats: InferenceStats,
}

impl DiagnosisReport {
    pub fn is_proved(&self) -> bool {
        self.verdict == Verdict::Proved
    }

    /// Serialize the report as pretty-printed JSON
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| format!("{{\"error\":\"{}\"}}", e))
    }
}

impl fmt::Display for DiagnosisReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.verdict, &self.value) {
            (Verdict::Proved, Some(value)) => {
                writeln!(f, "Result is: {}", value)?;
                writeln!(f, "Conclusion is valid.")?;
            }
            (Verdict::Inconclusive, _) | (Verdict::Proved, None) => writeln!(
                f,
                "No conclusion match available. Based on your entries, the results are inconclusive."
            )?,
            (Verdict::Unknown, _) => writeln!(f, "No conclusion.")?,
        }
        if self.forward.truncated {
            writeln!(f, "Forward chaining stopped early at the fact limit.")?;
        }
        write!(
            f,
            "The final conclusion is - {} - with a value of: {}",
            self.final_fact.name, self.final_fact.value
        )
    }
}

/// A loaded knowledge base ready to diagnose goals
#[derive(Debug, Clone)]
pub struct DiagnosticSession {
    store: RuleStore,
    registry: VariableRegistry,
    resolver: ResolverConfig,
    forward: ForwardConfig,
}

impl DiagnosticSession {
    pub fn new(store: RuleStore, registry: VariableRegistry, config: &DiagConfig) -> Self {
        DiagnosticSession {
            store,
            registry,
            resolver: config.resolver_config(),
            forward: config.forward_config(),
        }
    }

    /// Load the rule and variable files named in `config`
    ///
    /// In strict mode the first malformed line of either file is an error; otherwise
    /// malformed lines are logged and skipped.
    pub fn from_config(config: &DiagConfig) -> DiagResult<Self> {
        let rules = load_rules(&config.session.rules_file)?;
        let variables = load_variables(&config.session.variables_file)?;

        let (store, registry) = if config.reasoning.strict {
            (rules.into_strict()?, variables.into_strict()?)
        } else {
            (rules.items, variables.items)
        };

        Ok(Self::new(store, registry, config))
    }

    pub fn rules(&self) -> &RuleStore {
        &self.store
    }

    pub fn variables(&self) -> &VariableRegistry {
        &self.registry
    }

    /// Goal names offered to the user, sorted
    pub fn goal_menu(&self) -> Vec<&str> {
        self.store
            .distinct_conclusion_names()
            .iter()
            .map(String::as_str)
            .collect()
    }

    /// Resolve `goal` backward, then propagate forward from the root variable
    ///
    /// The forward pass runs whatever the verdict; with an unbound root it processes
    /// nothing and the final fact is the placeholder.
    pub fn diagnose<O: ValueOracle>(&self, goal: &str, oracle: O) -> DiagResult<DiagnosisReport> {
        let goal = goal.trim();
        if goal.is_empty() {
            return Err(DiagError::empty_input("goal")
                .with_hint("Pick one of the conclusions the rules define"));
        }

        let mut backward = BackwardChaining::with_config(
            &self.store,
            self.registry.clone(),
            oracle,
            self.resolver.clone(),
        );
        let outcome = backward.solve_top_goal(goal)?;
        let value = backward.conclusion_value(outcome).map(str::to_string);

        let mut forward = ForwardChaining::from_backward(&backward, self.forward.clone());
        let propagated = forward.propagate()?;

        let report = DiagnosisReport {
            goal: goal.to_string(),
            verdict: Verdict::from(outcome),
            value,
            rule: outcome.rule_index(),
            answers: backward.registry().known_facts(),
            intermediates: backward
                .intermediate_conclusions()
                .iter()
                .filter_map(|b| b.fact())
                .collect(),
            final_fact: propagated.final_or_placeholder(),
            forward: propagated,
            backward_stats: backward.stats().clone(),
            forward_stats: forward.stats().clone(),
        };

        tracing::info!(
            goal = %report.goal,
            verdict = report.verdict.as_str(),
            final_fact = %report.final_fact,
            "diagnosis complete"
        );
        Ok(report)
    }
}
