//! Variable list parser
//!
//! Each record is `name,prompt[,kind]`. The kind defaults to `string` and is carried
//! through untouched; matching is always by string equality.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use nom::{
    IResult,
    bytes::complete::take_while,
    character::complete::char,
    multi::separated_list1,
};

use super::{content_lines, ParseError, ParseResult, RejectedLine};
use crate::clause::ClauseKind;
use crate::error::{DiagError, DiagResult};
use crate::registry::{VariableBinding, VariableRegistry};

fn fields(input: &str) -> IResult<&str, Vec<&str>> {
    separated_list1(char(','), take_while(|c: char| c != ','))(input)
}

/// Parse one record into an unbound variable
pub fn parse_variable(line: &str, line_no: usize) -> Result<VariableBinding, ParseError> {
    let invalid = |reason: &str| ParseError::Variable {
        line: line_no,
        reason: reason.to_string(),
    };

    let (_, record) = fields(line).map_err(|_| invalid("expected name,prompt[,kind]"))?;
    let record: Vec<&str> = record.into_iter().map(str::trim).collect();

    let (name, prompt, kind) = match record.as_slice() {
        [name, prompt] => (*name, *prompt, ""),
        [name, prompt, kind] => (*name, *prompt, *kind),
        [_] => return Err(invalid("missing prompt field")),
        _ => return Err(invalid("too many fields, expected name,prompt[,kind]")),
    };

    if name.is_empty() {
        return Err(invalid("empty variable name"));
    }
    if name.contains(|c: char| c.is_whitespace() || matches!(c, '=' | '^' | ':')) {
        return Err(invalid("variable name may not contain spaces or '=', '^', ':'"));
    }

    let kind: ClauseKind = kind.parse().map_err(|kind| ParseError::UnknownKind {
        line: line_no,
        kind,
    })?;

    Ok(VariableBinding::with_kind(name, prompt, kind))
}

/// Parse a variable list into a registry, keeping the first record for each name
pub fn parse_variables(input: &str) -> ParseResult<VariableRegistry> {
    let mut registry = VariableRegistry::new();
    let mut seen = HashSet::new();
    let mut rejected = Vec::new();

    for (line_no, line) in content_lines(input) {
        let parsed = parse_variable(line, line_no).and_then(|binding| {
            if seen.insert(binding.name.clone()) {
                Ok(binding)
            } else {
                Err(ParseError::Variable {
                    line: line_no,
                    reason: format!("duplicate variable '{}'", binding.name),
                })
            }
        });

        match parsed {
            Ok(binding) => {
                registry.insert(binding);
            }
            Err(error) => rejected.push(RejectedLine {
                content: line.to_string(),
                error,
            }),
        }
    }

    ParseResult {
        items: registry,
        rejected,
    }
}

/// Read and parse a variable list
pub fn load_variables(path: &Path) -> DiagResult<ParseResult<VariableRegistry>> {
    let content = fs::read_to_string(path)
        .map_err(|e| DiagError::from(e).with_context("variables", path.display().to_string()))?;
    let parsed = parse_variables(&content);

    for rejected in &parsed.rejected {
        tracing::warn!(line = rejected.error.line(), content = %rejected.content, "{}", rejected.error);
    }
    tracing::info!(
        path = %path.display(),
        variables = parsed.items.len(),
        rejected = parsed.rejected.len(),
        "variables loaded"
    );
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_variable_record() {
        let binding = parse_variable("fuel, Is there fuel in the tank? ,string", 1).unwrap();
        assert_eq!(binding.name, "fuel");
        assert_eq!(binding.prompt, "Is there fuel in the tank?");
        assert!(!binding.known);
        assert_eq!(binding.kind, ClauseKind::String);
    }

    #[test]
    fn test_kind_is_optional_and_case_insensitive() {
        assert_eq!(parse_variable("rpm,Engine RPM?", 1).unwrap().kind, ClauseKind::String);
        assert_eq!(parse_variable("rpm,Engine RPM?,INT", 1).unwrap().kind, ClauseKind::Int);
        assert_eq!(parse_variable("volts,Battery volts?,3", 1).unwrap().kind, ClauseKind::Float);
    }

    #[test]
    fn test_malformed_records() {
        assert!(matches!(
            parse_variable("fuel", 4),
            Err(ParseError::Variable { line: 4, .. })
        ));
        assert!(matches!(
            parse_variable(" ,Prompt?", 4),
            Err(ParseError::Variable { .. })
        ));
        assert!(matches!(
            parse_variable("a,b,string,extra", 4),
            Err(ParseError::Variable { .. })
        ));
        assert!(matches!(
            parse_variable("has issue,Prompt?", 4),
            Err(ParseError::Variable { .. })
        ));
        match parse_variable("fuel,Fuel?,boolean", 7) {
            Err(ParseError::UnknownKind { line, kind }) => {
                assert_eq!(line, 7);
                assert_eq!(kind, "boolean");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_duplicates_keep_first() {
        let parsed = parse_variables(
            "# name,prompt,kind\nfuel,First?,string\nspark,Spark?\nfuel,Second?,string\n",
        );
        assert_eq!(parsed.items.len(), 2);
        assert_eq!(parsed.items.get("fuel").unwrap().prompt, "First?");
        assert_eq!(parsed.rejected.len(), 1);
        assert_eq!(parsed.rejected[0].error.line(), 4);
    }

    #[test]
    fn test_insertion_order_preserved() {
        let parsed = parse_variables("c,C?\na,A?\nb,B?\n");
        let names: Vec<_> = parsed.items.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, ["c", "a", "b"]);
    }

    #[test]
    fn test_load_variables_strict() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vars.csv");
        fs::write(&path, "fuel,Fuel?\nbroken\n").unwrap();
        let parsed = load_variables(&path).unwrap();
        assert_eq!(parsed.items.len(), 1);
        assert_eq!(parsed.into_strict().unwrap_err().line(), 2);
    }
}
