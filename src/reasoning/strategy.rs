//! Resolver configuration, outcomes and statistics

use serde::{Deserialize, Serialize};

/// Configuration for the backward resolver
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Raise `UnknownVariable` instead of failing a premise whose variable is missing
    pub strict: bool,
    /// Maximum nesting of goals (0 = unlimited)
    pub max_depth: usize,
}

/// Configuration for the forward propagator
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForwardConfig {
    /// Variable whose binding seeds the fact queue
    pub root_variable: String,
    /// Stop after this many processed facts (0 = unlimited)
    pub max_facts: usize,
}

impl Default for ForwardConfig {
    fn default() -> Self {
        ForwardConfig {
            root_variable: DEFAULT_ROOT_VARIABLE.to_string(),
            max_facts: 0,
        }
    }
}

/// Root variable used when none is configured
pub const DEFAULT_ROOT_VARIABLE: &str = "has_issue";

/// Value filter for a goal
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DesiredValue<'a> {
    /// Accept the first rule whose premises hold, whatever its conclusion value
    Any,
    /// Only rules concluding exactly this value
    Exactly(&'a str),
}

impl DesiredValue<'_> {
    pub fn accepts(&self, value: &str) -> bool {
        match self {
            DesiredValue::Any => true,
            DesiredValue::Exactly(wanted) => *wanted == value,
        }
    }
}

/// Result of resolving a goal
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "rule", rename_all = "snake_case")]
pub enum GoalOutcome {
    /// No rule concludes this name
    NotAConclusion,
    /// Some rules conclude this name, but none of them could be proved
    Contradiction,
    /// The rule at this index proved the goal
    Proved(usize),
}

impl GoalOutcome {
    pub fn is_proved(&self) -> bool {
        matches!(self, GoalOutcome::Proved(_))
    }

    pub fn rule_index(&self) -> Option<usize> {
        match self {
            GoalOutcome::Proved(i) => Some(*i),
            _ => None,
        }
    }
}

/// Counters gathered during a resolution or propagation run
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferenceStats {
    /// Goals passed to the backward resolver
    pub goals_resolved: usize,
    /// Rules whose premises were evaluated
    pub rules_tried: usize,
    /// Oracle questions asked
    pub oracle_calls: usize,
    /// Premises that failed
    pub premise_failures: usize,
    /// Premises naming a variable absent from the registry
    pub inconsistencies: usize,
    /// Deepest goal nesting reached
    pub max_depth_reached: usize,
    /// Facts taken off the forward queue
    pub facts_processed: usize,
    /// Rules fired by forward propagation
    pub rules_fired: usize,
}
