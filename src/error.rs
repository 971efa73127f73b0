//! Structured error handling for autodiag
//!
//! Provides a single error type with:
//! - Numeric error codes for programmatic handling
//! - Structured, JSON-friendly error output
//! - Context preservation through error chains
//!
//! # Error Categories
//!
//! - `1xxx` - Rule and variable file parsing
//! - `2xxx` - Inference failures (goal depth guard)
//! - `3xxx` - Data consistency between the rule store and the variable registry
//! - `4xxx` - Value oracle failures (closed input, cancellation, I/O)
//! - `5xxx` - Input validation
//! - `6xxx` - Missing or unreadable input files
//! - `7xxx` - Configuration issues
//! - `9xxx` - Internal errors
//!
//! Negative reasoning outcomes (a goal that cannot be proved, or a name that is not a
//! conclusion at all) are *not* errors; they are reported through
//! [`GoalOutcome`](crate::reasoning::GoalOutcome).
//!
//! # Example
//!
//! ```rust,ignore
//! use autodiag::error::{DiagError, ErrorCode};
//!
//! fn check_goal(goal: &str) -> Result<(), DiagError> {
//!     if goal.is_empty() {
//!         return Err(DiagError::empty_input("goal").with_hint("Pass --goal <NAME>"));
//!     }
//!     Ok(())
//! }
//! ```

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::parser::ParseError;
use crate::reasoning::OracleError;

// ============================================================================
// Error Codes
// ============================================================================

/// Unique error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Parse errors (1xxx)
    /// Malformed rule line
    InvalidRule = 1001,
    /// Malformed variable record
    InvalidVariable = 1002,
    /// Unknown clause kind tag
    InvalidKind = 1003,

    // Reasoning errors (2xxx)
    /// Goal recursion went deeper than the configured limit
    DepthExceeded = 2001,

    // Data consistency errors (3xxx)
    /// Rule index outside the rule store
    RuleIndexOutOfRange = 3001,
    /// Premise index outside a rule's premise list
    PremiseIndexOutOfRange = 3002,
    /// A primitive premise names a variable the registry does not hold
    UnknownVariable = 3003,

    // Oracle errors (4xxx)
    /// Generic oracle failure
    OracleFailed = 4000,
    /// The oracle's input was closed before an answer arrived
    OracleClosed = 4001,
    /// The host cancelled the question
    OracleCancelled = 4002,
    /// A scripted oracle had no answer for the prompt
    OracleUnanswered = 4003,

    // Validation errors (5xxx)
    /// Empty input
    EmptyInput = 5001,

    // File errors (6xxx)
    /// Input file not found
    FileNotFound = 6001,

    // Config errors (7xxx)
    /// Config file not found
    ConfigNotFound = 7001,
    /// Invalid config syntax
    InvalidConfigSyntax = 7002,
    /// File access denied
    FileAccessDenied = 7003,

    // Internal errors (9xxx)
    /// Internal error
    InternalError = 9000,
}

impl ErrorCode {
    /// Get the numeric code value
    pub fn code(&self) -> u32 {
        *self as u32
    }

    /// Get a short description of the error code
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::InvalidRule => "Invalid rule",
            ErrorCode::InvalidVariable => "Invalid variable record",
            ErrorCode::InvalidKind => "Invalid clause kind",

            ErrorCode::DepthExceeded => "Maximum goal depth exceeded",

            ErrorCode::RuleIndexOutOfRange => "Rule index out of range",
            ErrorCode::PremiseIndexOutOfRange => "Premise index out of range",
            ErrorCode::UnknownVariable => "Unknown variable",

            ErrorCode::OracleFailed => "Oracle failed",
            ErrorCode::OracleClosed => "Oracle input closed",
            ErrorCode::OracleCancelled => "Oracle cancelled",
            ErrorCode::OracleUnanswered => "Oracle has no answer",

            ErrorCode::EmptyInput => "Empty input",
            ErrorCode::FileNotFound => "File not found",

            ErrorCode::ConfigNotFound => "Configuration file not found",
            ErrorCode::InvalidConfigSyntax => "Invalid configuration syntax",
            ErrorCode::FileAccessDenied => "File access denied",

            ErrorCode::InternalError => "Internal error",
        }
    }

    /// Whether this code marks a broken rule store / registry pair
    pub fn is_consistency(&self) -> bool {
        (3000..4000).contains(&self.code())
    }

    /// Process exit code used by the CLI
    pub fn exit_code(&self) -> i32 {
        match self.code() / 1000 {
            1 => 65, // EX_DATAERR
            3 => 65,
            4 => 74, // EX_IOERR
            6 => 66, // EX_NOINPUT
            7 => 78, // EX_CONFIG
            _ => 70, // EX_SOFTWARE
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

// ============================================================================
// Error Context
// ============================================================================

/// Additional context information for an error
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Key-value pairs of context information
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub fields: HashMap<String, String>,
}

impl ErrorContext {
    /// Create a new empty context
    pub fn new() -> Self {
        Self::default()
    }
}

// ============================================================================
// Main Error Type
// ============================================================================

/// The main error type for autodiag
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagError {
    /// Error code for programmatic handling
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Additional context
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<ErrorContext>,
    /// Hint for resolving the error
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl DiagError {
    /// Create a new error with a code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: None,
            hint: None,
        }
    }

    // ========================================================================
    // Factory methods for common error types
    // ========================================================================

    /// Create a depth exceeded error
    pub fn depth_exceeded(goal: &str, limit: usize) -> Self {
        Self::new(
            ErrorCode::DepthExceeded,
            format!("Resolving '{}' exceeded the goal depth limit of {}", goal, limit),
        )
        .with_context("goal", goal)
        .with_hint("Check the rule base for a conclusion that depends on itself")
    }

    /// Create a rule index error
    pub fn rule_out_of_range(index: usize, len: usize) -> Self {
        Self::new(
            ErrorCode::RuleIndexOutOfRange,
            format!("Rule index {} is out of range (store holds {} rules)", index, len),
        )
    }

    /// Create a premise index error
    pub fn premise_out_of_range(rule: usize, index: usize, len: usize) -> Self {
        Self::new(
            ErrorCode::PremiseIndexOutOfRange,
            format!(
                "Premise index {} is out of range for rule {} ({} premises)",
                index, rule, len
            ),
        )
    }

    /// Create an unknown variable error
    pub fn unknown_variable(name: &str) -> Self {
        Self::new(
            ErrorCode::UnknownVariable,
            format!("Premise references variable '{}' which is not in the variable list", name),
        )
        .with_context("variable", name)
        .with_hint("Add the variable to the variables file or derive it from a rule")
    }

    /// Create an empty input error
    pub fn empty_input(field: &str) -> Self {
        Self::new(ErrorCode::EmptyInput, format!("{} cannot be empty", field))
    }

    // ========================================================================
    // Builder methods
    // ========================================================================

    /// Add context to the error
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let ctx = self.context.get_or_insert_with(ErrorContext::new);
        ctx.fields.insert(key.into(), value.into());
        self
    }

    /// Add a hint for resolving the error
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Check if this error reports an inconsistent rule store / registry pair
    pub fn is_consistency(&self) -> bool {
        self.code.is_consistency()
    }

    /// Convert to JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"code":"INTERNAL_ERROR","message":"{}"}}"#, self.message)
        })
    }
}

impl fmt::Display for DiagError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.code(), self.message)?;

        if let Some(ref ctx) = self.context {
            let mut fields: Vec<_> = ctx.fields.iter().collect();
            fields.sort();
            for (key, value) in fields {
                write!(f, "\n  {}: {}", key, value)?;
            }
        }

        if let Some(ref hint) = self.hint {
            write!(f, "\nHint: {}", hint)?;
        }

        Ok(())
    }
}

impl std::error::Error for DiagError {}

// ============================================================================
// Conversions from other error types
// ============================================================================

impl From<std::io::Error> for DiagError {
    fn from(err: std::io::Error) -> Self {
        use std::io::ErrorKind;
        let code = match err.kind() {
            ErrorKind::NotFound => ErrorCode::FileNotFound,
            ErrorKind::PermissionDenied => ErrorCode::FileAccessDenied,
            _ => ErrorCode::InternalError,
        };
        DiagError::new(code, err.to_string())
    }
}

impl From<ConfigError> for DiagError {
    fn from(err: ConfigError) -> Self {
        let code = match err {
            ConfigError::ParseError(..) => ErrorCode::InvalidConfigSyntax,
            ConfigError::IoError(..) => ErrorCode::ConfigNotFound,
        };
        DiagError::new(code, err.to_string())
    }
}

impl From<ParseError> for DiagError {
    fn from(err: ParseError) -> Self {
        let code = match err {
            ParseError::Rule { .. } => ErrorCode::InvalidRule,
            ParseError::Variable { .. } => ErrorCode::InvalidVariable,
            ParseError::UnknownKind { .. } => ErrorCode::InvalidKind,
        };
        let line = err.line();
        DiagError::new(code, err.to_string()).with_context("line", line.to_string())
    }
}

impl From<OracleError> for DiagError {
    fn from(err: OracleError) -> Self {
        let code = match err {
            OracleError::Closed { .. } => ErrorCode::OracleClosed,
            OracleError::Cancelled { .. } => ErrorCode::OracleCancelled,
            OracleError::Unanswered { .. } => ErrorCode::OracleUnanswered,
            OracleError::Io(_) => ErrorCode::OracleFailed,
        };
        DiagError::new(code, err.to_string())
    }
}

// ============================================================================
// Result type alias
// ============================================================================

/// A Result type using DiagError
pub type DiagResult<T> = Result<T, DiagError>;

// ============================================================================
// Tests
// ============================================================================
