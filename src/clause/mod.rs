//! Clauses and facts
//!
//! A clause is a `name = value` pair. Rules are built from clauses (premises and a
//! conclusion); facts are clauses known to hold in the current session.
//!
//! Values are opaque tokens: two clauses agree when their names and values are equal
//! strings. The [`ClauseKind`] tag travels with each clause but never takes part in
//! comparison.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Declared type of a clause value
///
/// Carried through parsing, indexing and reporting unchanged. Comparison is always
/// token equality, regardless of kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ClauseKind {
    Int,
    #[default]
    String,
    Float,
}

impl ClauseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClauseKind::Int => "int",
            ClauseKind::String => "string",
            ClauseKind::Float => "float",
        }
    }
}

impl FromStr for ClauseKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "int" | "integer" | "1" => Ok(ClauseKind::Int),
            "string" | "str" | "2" | "" => Ok(ClauseKind::String),
            "float" | "real" | "3" => Ok(ClauseKind::Float),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for ClauseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A `name = value` pair with an inert type tag
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Clause {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub kind: ClauseKind,
}

impl Clause {
    /// Create a string-kinded clause
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Clause {
            name: name.into(),
            value: value.into(),
            kind: ClauseKind::String,
        }
    }

    /// Create a clause with an explicit kind
    pub fn with_kind(name: impl Into<String>, value: impl Into<String>, kind: ClauseKind) -> Self {
        Clause {
            name: name.into(),
            value: value.into(),
            kind,
        }
    }

    /// Token equality on name and value; `kind` is ignored
    pub fn matches(&self, name: &str, value: &str) -> bool {
        self.name == name && self.value == value
    }

    /// The fact this clause asserts
    pub fn to_fact(&self) -> Fact {
        Fact::new(self.name.clone(), self.value.clone())
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.name, self.value)
    }
}

/// A name/value pair known to be true in the current session
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fact {
    pub name: String,
    pub value: String,
}

impl Fact {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Fact {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Reported when forward propagation was never seeded
    pub fn placeholder() -> Self {
        Fact::new("inconclusive", "no valid solution.")
    }

    pub fn is_placeholder(&self) -> bool {
        *self == Self::placeholder()
    }
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.name, self.value)
    }
}
