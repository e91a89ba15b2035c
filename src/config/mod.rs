// src/config/mod.rs

//! Configuration loading and validation.
//!
//! - [`model`] mirrors the TOML layout.
//! - [`validate`] turns the raw file into a checked [`ConfigFile`].
//! - [`loader`] reads it from disk, anchors relative paths at the config
//!   file's directory and loads the rule table it points to.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, load_rule_table};
pub use model::{ConfigFile, ConfigSection, RawConfigFile};
