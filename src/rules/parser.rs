// src/rules/parser.rs

//! Line-oriented rule file parser.
//!
//! ```text
//! # comments and blank lines are ignored
//! *.css:
//!     sass {asset} {static}
//! js/*.js:
//!     cp {asset} {static}
//! ```
//!
//! An unindented line ending in `:` opens a rule; every indented line below
//! it is one command template of that rule, in order.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::errors::{MakeStaticError, ParsingError, Result};
use crate::rules::Rule;

/// Read and parse a rule file from disk.
pub fn load_rules(path: impl AsRef<Path>) -> Result<Vec<Rule>> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|e| MakeStaticError::io(path, e))?;
    let rules = parse_rules(&contents)?;
    debug!(path = ?path, count = rules.len(), "loaded rule file");
    Ok(rules)
}

/// Parse rule file contents into an ordered list of rules.
pub fn parse_rules(contents: &str) -> std::result::Result<Vec<Rule>, ParsingError> {
    let mut rules: Vec<Rule> = Vec::new();
    // Line (text, number) of the header whose commands we are collecting.
    let mut open_header: Option<(String, usize)> = None;

    for (idx, raw) in contents.lines().enumerate() {
        let line_number = idx + 1;
        let trimmed = raw.trim();

        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let indented = raw.starts_with(char::is_whitespace);

        if indented {
            match rules.last_mut() {
                Some(rule) if open_header.is_some() => {
                    rule.commands.push(trimmed.to_string());
                }
                _ => {
                    return Err(ParsingError::new(
                        "command without a preceding pattern header",
                        raw,
                        line_number,
                    ));
                }
            }
            continue;
        }

        let Some(pattern) = trimmed.strip_suffix(':') else {
            return Err(ParsingError::new(
                "expected a pattern header ending in ':'",
                raw,
                line_number,
            ));
        };
        let pattern = pattern.trim_end();
        if pattern.is_empty() {
            return Err(ParsingError::new("empty pattern", raw, line_number));
        }

        close_section(&rules, open_header.take())?;
        rules.push(Rule::new(pattern, Vec::new()));
        open_header = Some((raw.to_string(), line_number));
    }

    close_section(&rules, open_header)?;
    Ok(rules)
}

/// A header must have collected at least one command before the next header
/// or the end of the file.
fn close_section(
    rules: &[Rule],
    header: Option<(String, usize)>,
) -> std::result::Result<(), ParsingError> {
    if let (Some((line, line_number)), Some(rule)) = (header, rules.last()) {
        if rule.commands.is_empty() {
            return Err(ParsingError::new(
                format!("pattern {:?} has no commands", rule.pattern),
                line,
                line_number,
            ));
        }
    }
    Ok(())
}
