#![allow(dead_code)]

use std::path::PathBuf;

use makestatic::config::{ConfigFile, ConfigSection, RawConfigFile};
use makestatic::rules::{Rule, RuleTable};
use makestatic::types::PatternDialect;

/// Builder for an ordered rule list, its rule-file text, or a compiled table.
#[derive(Debug, Clone, Default)]
pub struct RulesBuilder {
    rules: Vec<Rule>,
}

impl RulesBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rule(mut self, pattern: &str, commands: &[&str]) -> Self {
        self.rules.push(Rule::new(
            pattern,
            commands.iter().map(|c| c.to_string()).collect(),
        ));
        self
    }

    pub fn rules(&self) -> Vec<Rule> {
        self.rules.clone()
    }

    /// Render in the on-disk rule file format.
    pub fn to_rule_file(&self) -> String {
        let mut out = String::new();
        for rule in &self.rules {
            out.push_str(&rule.pattern);
            out.push_str(":\n");
            for command in &rule.commands {
                out.push_str("    ");
                out.push_str(command);
                out.push('\n');
            }
        }
        out
    }

    pub fn table(&self, dialect: PatternDialect) -> RuleTable {
        RuleTable::build(self.rules(), dialect).expect("Failed to build rule table from builder")
    }
}

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                config: ConfigSection::default(),
            },
        }
    }

    pub fn with_dialect(mut self, dialect: PatternDialect) -> Self {
        self.config.config.dialect = dialect;
        self
    }

    pub fn with_assets(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.config.assets = path.into();
        self
    }

    pub fn with_static(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.config.static_root = path.into();
        self
    }

    pub fn with_rules(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.config.rules = path.into();
        self
    }

    pub fn with_interval(mut self, interval: &str) -> Self {
        self.config.config.interval = interval.to_string();
        self
    }

    /// Render as a `Makestatic.toml` document.
    pub fn to_toml(&self) -> String {
        let c = &self.config.config;
        format!(
            "[config]\ndialect = \"{}\"\nassets = {:?}\nstatic = {:?}\nrules = {:?}\ninterval = \"{}\"\n",
            c.dialect,
            c.assets.to_string_lossy(),
            c.static_root.to_string_lossy(),
            c.rules.to_string_lossy(),
            c.interval,
        )
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}
