//! Knowledge base parsers
//!
//! Two line-oriented formats feed the engine:
//!
//! - Rule files: one rule per line, `premise = value ^ premise = value : conclusion = value`.
//!   Premises are optional (`: conclusion = value` is an atomic fact) and every token is
//!   trimmed.
//! - Variable files (see [`variables`]): CSV records `name,prompt[,kind]`.
//!
//! Blank lines and lines starting with `#` are skipped. A malformed line does not stop the
//! load: it is collected as a [`RejectedLine`] and the rest of the file is still read.
//! Callers that want all-or-nothing loading use [`ParseResult::into_strict`].

pub mod variables;

pub use variables::{load_variables, parse_variables};

use std::fs;
use std::path::Path;

use nom::{
    IResult,
    bytes::complete::take_while1,
    character::complete::{char, space0},
    combinator::{all_consuming, map, opt, verify},
    multi::separated_list1,
    sequence::{separated_pair, tuple},
};

use crate::clause::Clause;
use crate::error::{DiagError, DiagResult};
use crate::store::{Rule, RuleStore};

/// Parser error type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Invalid rule on line {line}: {reason}")]
    Rule { line: usize, reason: String },

    #[error("Invalid variable on line {line}: {reason}")]
    Variable { line: usize, reason: String },

    #[error("Unknown kind '{kind}' on line {line} (expected int, string or float)")]
    UnknownKind { line: usize, kind: String },
}

impl ParseError {
    /// 1-based line number the error refers to
    pub fn line(&self) -> usize {
        match self {
            ParseError::Rule { line, .. }
            | ParseError::Variable { line, .. }
            | ParseError::UnknownKind { line, .. } => *line,
        }
    }
}

/// A line that was skipped because it could not be parsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedLine {
    pub content: String,
    pub error: ParseError,
}

/// Parsed items plus the lines that were rejected on the way
#[derive(Debug, Clone)]
pub struct ParseResult<T> {
    pub items: T,
    pub rejected: Vec<RejectedLine>,
}

impl<T> ParseResult<T> {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }

    /// The parsed items, or the first rejection as an error
    pub fn into_strict(self) -> Result<T, ParseError> {
        match self.rejected.into_iter().next() {
            Some(rejected) => Err(rejected.error),
            None => Ok(self.items),
        }
    }
}

/// Lines worth parsing, with their 1-based line numbers
pub(crate) fn content_lines(input: &str) -> impl Iterator<Item = (usize, &str)> {
    input
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
}

fn token(input: &str) -> IResult<&str, &str> {
    map(
        verify(
            take_while1(|c: char| !matches!(c, '=' | '^' | ':')),
            |s: &str| !s.trim().is_empty(),
        ),
        str::trim,
    )(input)
}

fn clause(input: &str) -> IResult<&str, Clause> {
    map(separated_pair(token, char('='), token), |(name, value)| {
        Clause::new(name, value)
    })(input)
}

fn premises(input: &str) -> IResult<&str, Vec<Clause>> {
    separated_list1(char('^'), clause)(input)
}

fn rule_line(input: &str) -> IResult<&str, Rule> {
    map(
        all_consuming(tuple((opt(premises), space0, char(':'), clause))),
        |(premises, _, _, conclusion)| Rule::new(premises.unwrap_or_default(), conclusion),
    )(input)
}

/// Explain why `line` is not a rule
fn rejection_reason(line: &str) -> String {
    let Some((premises, conclusion)) = line.split_once(':') else {
        return "missing ':' between premises and conclusion".to_string();
    };
    if all_consuming(clause)(conclusion.trim()).is_err() {
        return "conclusion must be of the form name = value".to_string();
    }
    if premises.trim().is_empty() {
        return "malformed atomic fact".to_string();
    }
    "premises must be name = value clauses joined by '^'".to_string()
}

/// Parse a single rule line
pub fn parse_rule(line: &str, line_no: usize) -> Result<Rule, ParseError> {
    rule_line(line.trim()).map(|(_, rule)| rule).map_err(|_| ParseError::Rule {
        line: line_no,
        reason: rejection_reason(line),
    })
}

/// Parse a rule file into a store, in file order
pub fn parse_rules(input: &str) -> ParseResult<RuleStore> {
    let mut store = RuleStore::new();
    let mut rejected = Vec::new();

    for (line_no, line) in content_lines(input) {
        match parse_rule(line, line_no) {
            Ok(rule) => store.push(rule),
            Err(error) => rejected.push(RejectedLine {
                content: line.to_string(),
                error,
            }),
        }
    }

    ParseResult {
        items: store,
        rejected,
    }
}

/// Read and parse a rule file
pub fn load_rules(path: &Path) -> DiagResult<ParseResult<RuleStore>> {
    let content = fs::read_to_string(path)
        .map_err(|e| DiagError::from(e).with_context("rules", path.display().to_string()))?;
    let parsed = parse_rules(&content);

    for rejected in &parsed.rejected {
        tracing::warn!(line = rejected.error.line(), content = %rejected.content, "{}", rejected.error);
    }
    tracing::info!(
        path = %path.display(),
        rules = parsed.items.len(),
        rejected = parsed.rejected.len(),
        "knowledge base loaded"
    );
    Ok(parsed)
}
