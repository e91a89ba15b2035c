// src/rules/table.rs

use std::fmt;

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use regex::Regex;
use tracing::debug;

use crate::errors::{MakeStaticError, Result};
use crate::rules::Rule;
use crate::types::PatternDialect;

/// Compiled form of the patterns, fixed at construction.
#[derive(Clone)]
enum Matcher {
    /// One anchored alternation with one named group per rule; `groups[i]`
    /// is the capture index of rule `i`.
    Regex { regex: Regex, groups: Vec<usize> },
    /// One glob per rule, indices in declaration order.
    Glob(GlobSet),
}

/// Ordered rule table: relative path -> commands of the first matching rule.
#[derive(Clone)]
pub struct RuleTable {
    dialect: PatternDialect,
    rules: Vec<Rule>,
    /// `None` for an empty table; nothing can match.
    matcher: Option<Matcher>,
}

impl fmt::Debug for RuleTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleTable")
            .field("dialect", &self.dialect)
            .field("rules", &self.rules)
            .finish_non_exhaustive()
    }
}

fn group_name(index: usize) -> String {
    format!("__rule{index}")
}

impl RuleTable {
    pub fn build(rules: Vec<Rule>, dialect: PatternDialect) -> Result<Self> {
        let matcher = if rules.is_empty() {
            None
        } else {
            Some(match dialect {
                PatternDialect::Regex => build_regex(&rules)?,
                PatternDialect::Globbing => Matcher::Glob(build_globset(&rules)?),
            })
        };

        debug!(%dialect, rules = rules.len(), "built rule table");

        Ok(Self {
            dialect,
            rules,
            matcher,
        })
    }

    pub fn dialect(&self) -> PatternDialect {
        self.dialect
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// The first rule whose pattern matches `rel_path` (forward slashes,
    /// relative to the assets root).
    pub fn find(&self, rel_path: &str) -> Option<&Rule> {
        let index = match self.matcher.as_ref()? {
            Matcher::Regex { regex, groups } => {
                let caps = regex.captures(rel_path)?;
                groups.iter().position(|g| caps.get(*g).is_some())?
            }
            Matcher::Glob(set) => set.matches(rel_path).into_iter().min()?,
        };
        self.rules.get(index)
    }

    /// Commands of the first matching rule, or `None`.
    pub fn lookup(&self, rel_path: &str) -> Option<&[String]> {
        self.find(rel_path).map(|rule| rule.commands.as_slice())
    }
}

/// `^(?:(?P<__rule0>p0)|(?P<__rule1>p1)|...)$`
///
/// The outer group keeps both anchors applying to every alternative; the
/// regex engine prefers earlier alternatives, so the first declared rule that
/// can match the whole path wins. Each pattern is also compiled on its own so
/// an unbalanced group cannot leak into its neighbours.
fn build_regex(rules: &[Rule]) -> Result<Matcher> {
    let mut alternatives = Vec::with_capacity(rules.len());

    for (index, rule) in rules.iter().enumerate() {
        Regex::new(&rule.pattern).map_err(|e| {
            MakeStaticError::InvalidPattern {
                pattern: rule.pattern.clone(),
                message: e.to_string(),
            }
        })?;
        alternatives.push(format!("(?P<{}>{})", group_name(index), rule.pattern));
    }

    let combined = format!("^(?:{})$", alternatives.join("|"));
    let regex = Regex::new(&combined).map_err(|e| MakeStaticError::InvalidPattern {
        pattern: combined.clone(),
        message: e.to_string(),
    })?;

    let mut groups = Vec::with_capacity(rules.len());
    for index in 0..rules.len() {
        let name = group_name(index);
        let position = regex
            .capture_names()
            .position(|n| n == Some(name.as_str()))
            .ok_or_else(|| MakeStaticError::InvalidPattern {
                pattern: rules[index].pattern.clone(),
                message: format!("capture group {name} missing from combined pattern"),
            })?;
        groups.push(position);
    }

    Ok(Matcher::Regex { regex, groups })
}

fn build_globset(rules: &[Rule]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for rule in rules {
        let glob = GlobBuilder::new(&rule.pattern)
            .literal_separator(true)
            .build()
            .map_err(|e| MakeStaticError::InvalidPattern {
                pattern: rule.pattern.clone(),
                message: e.to_string(),
            })?;
        builder.add(glob);
    }
    builder.build().map_err(|e| MakeStaticError::InvalidPattern {
        pattern: "<glob set>".to_string(),
        message: e.to_string(),
    })
}
