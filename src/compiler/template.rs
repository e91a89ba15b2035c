// src/compiler/template.rs

//! Placeholder substitution for command templates.
//!
//! Recognised placeholders are `{asset}`, `{static}`, `{static_dir}` and
//! `{static_base}`. `{{` and `}}` produce literal braces. Anything else in
//! braces is rejected so typos surface when the rules are loaded rather
//! than as a confusing shell error at build time.

use crate::errors::{MakeStaticError, Result};

pub const PLACEHOLDERS: [&str; 4] = ["asset", "static", "static_dir", "static_base"];

/// Values substituted into one command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateVars {
    pub asset: String,
    pub static_path: String,
    pub static_dir: String,
    pub static_base: String,
}

impl TemplateVars {
    fn get(&self, name: &str) -> Option<&str> {
        match name {
            "asset" => Some(&self.asset),
            "static" => Some(&self.static_path),
            "static_dir" => Some(&self.static_dir),
            "static_base" => Some(&self.static_base),
            _ => None,
        }
    }
}

/// Check a template without substituting anything.
pub fn validate(template: &str) -> Result<()> {
    expand(template, |name| {
        PLACEHOLDERS.contains(&name).then_some("")
    })
    .map(|_| ())
}

/// Substitute `vars` into `template`.
pub fn render(template: &str, vars: &TemplateVars) -> Result<String> {
    expand(template, |name| vars.get(name))
}

fn expand<'v>(template: &str, lookup: impl Fn(&str) -> Option<&'v str>) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.char_indices().peekable();

    while let Some((idx, c)) = chars.next() {
        match c {
            '{' if chars.peek().map(|(_, n)| *n) == Some('{') => {
                chars.next();
                out.push('{');
            }
            '}' if chars.peek().map(|(_, n)| *n) == Some('}') => {
                chars.next();
                out.push('}');
            }
            '{' => {
                let rest = &template[idx + 1..];
                let Some(end) = rest.find('}') else {
                    return Err(bad_template(template, "unterminated '{'"));
                };
                let name = &rest[..end];
                let value = lookup(name).ok_or_else(|| {
                    bad_template(template, &format!("unknown placeholder {{{name}}}"))
                })?;
                out.push_str(value);
                // Skip the name and the closing brace.
                for _ in 0..=name.chars().count() {
                    chars.next();
                }
            }
            '}' => return Err(bad_template(template, "unmatched '}'")),
            other => out.push(other),
        }
    }

    Ok(out)
}

fn bad_template(template: &str, reason: &str) -> MakeStaticError {
    MakeStaticError::ConfigError(format!("invalid command template {template:?}: {reason}"))
}
