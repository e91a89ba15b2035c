// src/config/validate.rs

use std::path::{Component, Path, PathBuf};

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{MakeStaticError, Result};
use crate::types::parse_duration;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = MakeStaticError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_roots(&raw)?;
        let interval = parse_duration(&raw.config.interval).map_err(|e| {
            MakeStaticError::ConfigError(format!("[config].interval: {e}"))
        })?;
        if interval.is_zero() {
            return Err(MakeStaticError::ConfigError(
                "[config].interval must be greater than zero".to_string(),
            ));
        }
        Ok(ConfigFile::new_unchecked(raw.config, interval))
    }
}

fn validate_roots(cfg: &RawConfigFile) -> Result<()> {
    let section = &cfg.config;
    if section.assets.as_os_str().is_empty() || section.static_root.as_os_str().is_empty() {
        return Err(MakeStaticError::ConfigError(
            "[config].assets and [config].static must not be empty".to_string(),
        ));
    }
    // Mixed absolute/relative roots are checked again once anchored.
    if section.assets.is_absolute() == section.static_root.is_absolute() {
        check_root_overlap(&section.assets, &section.static_root)?;
    }
    Ok(())
}

/// Reject a static root equal to, or nested inside, the assets root.
///
/// Compiled output written under the assets root would be picked up by the
/// watcher as a new asset.
pub(crate) fn check_root_overlap(assets: &Path, static_root: &Path) -> Result<()> {
    let assets = normalize(assets);
    let static_root = normalize(static_root);
    if static_root.starts_with(&assets) {
        return Err(MakeStaticError::ConfigError(format!(
            "[config].static ({:?}) must not be inside [config].assets ({:?})",
            static_root, assets
        )));
    }
    Ok(())
}

/// Lexically drop `.` and fold `..` so `web` and `./web` compare equal.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(out.components().next_back(), Some(Component::Normal(_))) {
                    out.pop();
                } else {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}
