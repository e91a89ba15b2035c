// src/config/model.rs

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::types::PatternDialect;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [config]
/// dialect = "globbing"
/// assets = "assets"
/// static = "static"
/// rules = "assets.rules"
/// interval = "100ms"
/// ```
///
/// Every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// `"globbing"` (default) or `"regex"`.
    #[serde(default)]
    pub dialect: PatternDialect,

    /// Directory holding the source assets.
    #[serde(default = "default_assets")]
    pub assets: PathBuf,

    /// Directory the compiled files are written to.
    #[serde(default = "default_static", rename = "static")]
    pub static_root: PathBuf,

    /// Rule file mapping patterns to commands.
    #[serde(default = "default_rules")]
    pub rules: PathBuf,

    /// Polling interval of `makestatic watch`, e.g. `"100ms"` or `"1s"`.
    #[serde(default = "default_interval")]
    pub interval: String,
}

fn default_assets() -> PathBuf {
    PathBuf::from("assets")
}

fn default_static() -> PathBuf {
    PathBuf::from("static")
}

fn default_rules() -> PathBuf {
    PathBuf::from("assets.rules")
}

fn default_interval() -> String {
    "100ms".to_string()
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            dialect: PatternDialect::default(),
            assets: default_assets(),
            static_root: default_static(),
            rules: default_rules(),
            interval: default_interval(),
        }
    }
}

/// Validated configuration.
///
/// Construct through `TryFrom<RawConfigFile>` (or the loader) so the
/// interval and the roots have been checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    pub dialect: PatternDialect,
    pub assets_root: PathBuf,
    pub static_root: PathBuf,
    pub rules_path: PathBuf,
    pub interval: Duration,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(section: ConfigSection, interval: Duration) -> Self {
        Self {
            dialect: section.dialect,
            assets_root: section.assets,
            static_root: section.static_root,
            rules_path: section.rules,
            interval,
        }
    }

    /// Anchor every relative path at `base`.
    pub fn relative_to(mut self, base: &Path) -> Self {
        let anchor = |p: PathBuf| if p.is_absolute() { p } else { base.join(p) };
        self.assets_root = anchor(self.assets_root);
        self.static_root = anchor(self.static_root);
        self.rules_path = anchor(self.rules_path);
        self
    }
}
