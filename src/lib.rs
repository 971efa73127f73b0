//! autodiag - rule-based diagnostic engine
//!
//! A small expert-system core: a knowledge base of `IF premises THEN conclusion` rules
//! over named string variables, solved first by backward chaining (which asks for the
//! values it needs) and then by forward chaining (which propagates what was learned).
//!
//! # Architecture
//!
//! - [`RuleStore`] - ordered rules plus the set of names any rule concludes
//! - [`VariableRegistry`] - name-keyed bindings with per-variable inverted rule index
//! - [`BackwardChaining`] - depth-first, first-match goal resolution
//! - [`ForwardChaining`] - FIFO propagation from the root variable
//! - [`ValueOracle`] - host capability that supplies values for unbound variables
//! - [`DiagnosticSession`] - runs both resolvers and builds a [`DiagnosisReport`]
//!
//! # Example
//!
//! ```rust,ignore
//! use autodiag::{parse_rules, parse_variables, DiagConfig, DiagnosticSession, ScriptedOracle};
//!
//! let rules = parse_rules("has_issue = yes ^ fuel = no : issue = no_fuel\n").items;
//! let variables = parse_variables("has_issue,Any issue?\nfuel,Fuel in tank?\n").items;
//!
//! let session = DiagnosticSession::new(rules, variables, &DiagConfig::default());
//! let oracle = ScriptedOracle::from_pairs([("has_issue", "yes"), ("fuel", "no")]);
//! let report = session.diagnose("issue", oracle)?;
//!
//! assert_eq!(report.value.as_deref(), Some("no_fuel"));
//! ```

pub mod clause;
pub mod config;
pub mod error;
pub mod parser;
pub mod registry;
pub mod reasoning;
pub mod session;
pub mod store;

// Re-export data model
pub use clause::{Clause, ClauseKind, Fact};
pub use registry::{VariableBinding, VariableRegistry};
pub use store::{Rule, RuleStore};

// Re-export parser types
pub use parser::{
    load_rules, load_variables, parse_rule, parse_rules, parse_variables, ParseError,
    ParseResult, RejectedLine,
};

// Re-export reasoning types
pub use reasoning::{
    BackwardChaining, DesiredValue, FnOracle, ForwardChaining, ForwardConfig, ForwardOutcome,
    GoalOutcome, InferenceStats, OracleError, PromptOracle, ResolverConfig, ScriptedOracle,
    ValueOracle, DEFAULT_ROOT_VARIABLE,
};

// Re-export session types
pub use session::{DiagnosisReport, DiagnosticSession, Verdict};

// Re-export configuration types
pub use config::{
    ConfigError, DiagConfig, GeneralConfig, LogLevel, OutputFormat, ReasoningConfig,
    SessionConfig,
};

// Re-export error types
pub use error::{DiagError, DiagResult, ErrorCode, ErrorContext};
