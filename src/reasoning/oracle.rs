//! Value oracles
//!
//! The resolver never talks to a user directly. When a primitive variable is needed and
//! still unbound, it asks a [`ValueOracle`] and blocks until an answer (or an error)
//! comes back. Hosts wrap whatever they like behind this trait: a terminal, a scripted
//! answer file, a UI with a timeout.

use std::fs;
use std::io::{self, BufRead, Stdin, StdinLock, Stdout, Write};
use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::error::{DiagError, DiagResult, ErrorCode};

/// Failure to obtain a value from an oracle
#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    #[error("input closed while asking '{prompt}'")]
    Closed { prompt: String },

    #[error("question cancelled: '{prompt}'")]
    Cancelled { prompt: String },

    #[error("no scripted answer for '{prompt}'")]
    Unanswered { prompt: String },

    #[error("oracle I/O failure: {0}")]
    Io(#[from] io::Error),
}

/// Host capability that supplies values for unbound variables
pub trait ValueOracle {
    /// Ask the host for a value, showing `prompt`
    fn ask(&mut self, prompt: &str) -> Result<String, OracleError>;

    /// Ask for the variable `name`. Defaults to asking its prompt.
    fn ask_variable(&mut self, _name: &str, prompt: &str) -> Result<String, OracleError> {
        self.ask(prompt)
    }
}

impl<O: ValueOracle + ?Sized> ValueOracle for &mut O {
    fn ask(&mut self, prompt: &str) -> Result<String, OracleError> {
        (**self).ask(prompt)
    }

    fn ask_variable(&mut self, name: &str, prompt: &str) -> Result<String, OracleError> {
        (**self).ask_variable(name, prompt)
    }
}

impl<O: ValueOracle + ?Sized> ValueOracle for Box<O> {
    fn ask(&mut self, prompt: &str) -> Result<String, OracleError> {
        (**self).ask(prompt)
    }

    fn ask_variable(&mut self, name: &str, prompt: &str) -> Result<String, OracleError> {
        (**self).ask_variable(name, prompt)
    }
}

/// Oracle backed by a closure
pub struct FnOracle<F>(pub F);

impl<F> ValueOracle for FnOracle<F>
where
    F: FnMut(&str) -> Result<String, OracleError>,
{
    fn ask(&mut self, prompt: &str) -> Result<String, OracleError> {
        (self.0)(prompt)
    }
}

/// Line-oriented oracle: writes `<prompt>: ` and reads one answer per line
///
/// Blank answers are asked again. End of input is reported as [`OracleError::Closed`].
pub struct PromptOracle<R, W> {
    input: R,
    output: W,
    echo: bool,
}

impl<R: BufRead, W: Write> PromptOracle<R, W> {
    pub fn new(input: R, output: W) -> Self {
        PromptOracle {
            input,
            output,
            echo: false,
        }
    }

    /// Repeat each answer back as `You entered: <value>`
    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    pub fn into_inner(self) -> (R, W) {
        (self.input, self.output)
    }

    /// Read one non-blank line after showing `prompt`
    pub fn read_answer(&mut self, prompt: &str) -> Result<String, OracleError> {
        loop {
            write!(self.output, "{}: ", prompt)?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Err(OracleError::Closed {
                    prompt: prompt.to_string(),
                });
            }

            let answer = line.trim();
            if answer.is_empty() {
                continue;
            }
            if self.echo {
                writeln!(self.output, "You entered: {}", answer)?;
            }
            return Ok(answer.to_string());
        }
    }
}

impl PromptOracle<StdinLock<'static>, Stdout> {
    /// Prompt on stdout, read from stdin
    pub fn stdio() -> Self {
        let stdin: Stdin = io::stdin();
        PromptOracle::new(stdin.lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> ValueOracle for PromptOracle<R, W> {
    fn ask(&mut self, prompt: &str) -> Result<String, OracleError> {
        self.read_answer(prompt)
    }
}

#[derive(Debug, Default, Deserialize)]
struct AnswerFile {
    #[serde(default)]
    answers: IndexMap<String, String>,
}

/// Oracle that answers from a fixed table
///
/// Answers are looked up by variable name first, then by prompt text. Every question is
/// recorded, in order, so callers can check exactly what was asked.
#[derive(Debug, Clone, Default)]
pub struct ScriptedOracle {
    answers: IndexMap<String, String>,
    asked: Vec<String>,
}

impl ScriptedOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        ScriptedOracle {
            answers: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
            asked: Vec::new(),
        }
    }

    /// Parse an `[answers]` table
    ///
    /// ```toml
    /// [answers]
    /// has_issue = "yes"
    /// fuel = "yes"
    /// ```
    pub fn from_toml(content: &str) -> DiagResult<Self> {
        let file: AnswerFile = toml::from_str(content)
            .map_err(|e| DiagError::new(ErrorCode::InvalidConfigSyntax, e.to_string()))?;
        Ok(ScriptedOracle {
            answers: file.answers,
            asked: Vec::new(),
        })
    }

    /// Load an answer file from disk
    pub fn load(path: &Path) -> DiagResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            DiagError::from(e).with_context("answers", path.display().to_string())
        })?;
        Self::from_toml(&content)
    }

    pub fn answer(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.answers.insert(key.into(), value.into());
        self
    }

    /// Names (or prompts) asked so far, in order
    pub fn asked(&self) -> &[String] {
        &self.asked
    }

    pub fn call_count(&self) -> usize {
        self.asked.len()
    }
}

impl ValueOracle for ScriptedOracle {
    fn ask(&mut self, prompt: &str) -> Result<String, OracleError> {
        self.asked.push(prompt.to_string());
        self.answers
            .get(prompt)
            .cloned()
            .ok_or_else(|| OracleError::Unanswered {
                prompt: prompt.to_string(),
            })
    }

    fn ask_variable(&mut self, name: &str, prompt: &str) -> Result<String, OracleError> {
        self.asked.push(name.to_string());
        self.answers
            .get(name)
            .or_else(|| self.answers.get(prompt))
            .cloned()
            .ok_or_else(|| OracleError::Unanswered {
                prompt: prompt.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_prompt_oracle_format() {
        let mut oracle = PromptOracle::new(Cursor::new("yes\n"), Vec::new());
        assert_eq!(oracle.ask("Is there fuel?").unwrap(), "yes");
        let (_, out) = oracle.into_inner();
        assert_eq!(String::from_utf8(out).unwrap(), "Is there fuel?: ");
    }

    #[test]
    fn test_prompt_oracle_reasks_on_blank() {
        let mut oracle = PromptOracle::new(Cursor::new("\n   \n  no  \n"), Vec::new()).with_echo(true);
        assert_eq!(oracle.ask("Spark?").unwrap(), "no");
        let (_, out) = oracle.into_inner();
        let out = String::from_utf8(out).unwrap();
        assert_eq!(out.matches("Spark?: ").count(), 3);
        assert!(out.ends_with("You entered: no\n"));
    }

    #[test]
    fn test_prompt_oracle_closed_input() {
        let mut oracle = PromptOracle::new(Cursor::new(""), Vec::new());
        assert!(matches!(
            oracle.ask("Battery?"),
            Err(OracleError::Closed { prompt }) if prompt == "Battery?"
        ));
    }

    #[test]
    fn test_scripted_by_name_then_prompt() {
        let mut oracle = ScriptedOracle::from_pairs([("fuel", "yes"), ("Is there spark?", "no")]);
        assert_eq!(oracle.ask_variable("fuel", "Is there fuel?").unwrap(), "yes");
        assert_eq!(oracle.ask_variable("spark", "Is there spark?").unwrap(), "no");
        assert!(matches!(
            oracle.ask_variable("oil", "Oil level?"),
            Err(OracleError::Unanswered { .. })
        ));
        assert_eq!(oracle.asked(), ["fuel", "spark", "oil"]);
    }

    #[test]
    fn test_scripted_from_toml() {
        let oracle = ScriptedOracle::from_toml(
            r#"
            [answers]
            has_issue = "yes"
            fuel = "no"
            "#,
        )
        .unwrap();
        let mut oracle = oracle;
        assert_eq!(oracle.ask_variable("has_issue", "").unwrap(), "yes");
        assert_eq!(oracle.call_count(), 1);
    }

    #[test]
    fn test_fn_oracle_and_mut_ref() {
        let mut count = 0;
        let mut oracle = FnOracle(|prompt: &str| {
            count += 1;
            Ok(prompt.len().to_string())
        });
        fn ask_through<O: ValueOracle>(mut oracle: O, prompt: &str) -> String {
            oracle.ask(prompt).unwrap()
        }
        assert_eq!(ask_through(&mut oracle, "abc"), "3");
        assert_eq!(oracle.ask_variable("x", "abcd").unwrap(), "4");
        drop(oracle);
        assert_eq!(count, 2);
    }
}
