// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::compiler::template;
use crate::config::model::{ConfigFile, RawConfigFile};
use crate::config::validate::check_root_overlap;
use crate::errors::{MakeStaticError, Result};
use crate::rules::{load_rules, RuleTable};

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|e| MakeStaticError::io(path, e))?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path, validate it and resolve its paths.
///
/// Relative paths inside the file are taken relative to the directory that
/// contains it.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    let raw_config = load_from_path(path)?;
    let config = ConfigFile::try_from(raw_config)?.relative_to(&config_dir(path));
    check_root_overlap(&config.assets_root, &config.static_root)?;
    debug!(?config, "configuration loaded");
    Ok(config)
}

/// Read the rule file named by `cfg`, check every command template and
/// compile the patterns in the configured dialect.
pub fn load_rule_table(cfg: &ConfigFile) -> Result<RuleTable> {
    let rules = load_rules(&cfg.rules_path)?;
    for rule in &rules {
        for command in &rule.commands {
            template::validate(command)?;
        }
    }
    RuleTable::build(rules, cfg.dialect)
}

/// `Makestatic.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Makestatic.toml")
}

fn config_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_file_name_resolves_against_cwd() {
        assert_eq!(config_dir(Path::new("Makestatic.toml")), PathBuf::from("."));
        assert_eq!(
            config_dir(Path::new("site/Makestatic.toml")),
            PathBuf::from("site")
        );
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_from_path("/definitely/not/here/Makestatic.toml").unwrap_err();
        assert!(err.is_not_found());
    }
}
