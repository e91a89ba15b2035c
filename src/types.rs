use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

/// Which pattern language a rule table is written in.
///
/// - `Regex`: every pattern is a regular expression that must match the
///   whole relative path.
/// - `Globbing`: every pattern is a shell-style glob; `*` does not cross `/`.
///
/// Chosen once per configuration and never changed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternDialect {
    Regex,
    Globbing,
}

impl Default for PatternDialect {
    fn default() -> Self {
        PatternDialect::Globbing
    }
}

impl FromStr for PatternDialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "regex" => Ok(PatternDialect::Regex),
            "globbing" | "glob" => Ok(PatternDialect::Globbing),
            other => Err(format!(
                "invalid dialect: {other} (expected \"regex\" or \"globbing\")"
            )),
        }
    }
}

impl std::fmt::Display for PatternDialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PatternDialect::Regex => f.write_str("regex"),
            PatternDialect::Globbing => f.write_str("globbing"),
        }
    }
}

/// Parse a simple duration string like `"100ms"`, `"3s"`, `"1m"`, `"2h"`.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| "duration missing unit suffix".to_string())?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;
    let unit = unit_part.trim().to_lowercase();

    match unit.as_str() {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        "m" => value
            .checked_mul(60)
            .map(Duration::from_secs)
            .ok_or_else(|| "duration too large".to_string()),
        "h" => value
            .checked_mul(60 * 60)
            .map(Duration::from_secs)
            .ok_or_else(|| "duration too large".to_string()),
        _ => Err(format!(
            "unsupported duration unit '{}'; expected ms, s, m, or h",
            unit
        )),
    }
}
