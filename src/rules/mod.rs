// src/rules/mod.rs

//! Build rules: which commands turn an asset into its static counterpart.
//!
//! - [`parser`] reads the line-oriented rule file into ordered [`Rule`]s.
//! - [`table`] compiles them, in one [`PatternDialect`](crate::types::PatternDialect),
//!   into a [`RuleTable`] whose lookup returns the first matching rule.

pub mod parser;
pub mod table;

pub use parser::{load_rules, parse_rules};
pub use table::RuleTable;

/// A pattern plus the command templates run, in order, for matching assets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub pattern: String,
    pub commands: Vec<String>,
}

impl Rule {
    pub fn new(pattern: impl Into<String>, commands: Vec<String>) -> Self {
        Self {
            pattern: pattern.into(),
            commands,
        }
    }
}
