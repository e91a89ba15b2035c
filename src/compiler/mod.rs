// src/compiler/mod.rs

//! Turning assets into static files.
//!
//! The [`Compiler`] resolves an asset path to its rule, substitutes the
//! per-invocation placeholders into each command template and runs the
//! commands in order through a [`CommandRunner`].
//!
//! - A missing rule is a diagnostic, never an error.
//! - A non-zero exit status aborts the remaining commands of that asset and is
//!   returned as [`MakeStaticError::BuildFailed`].

pub mod freshness;
pub mod template;

use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::errors::{MakeStaticError, Result};
use crate::exec::CommandRunner;
use crate::fs::{relative_str, FileSystem};
use crate::rules::{Rule, RuleTable};

pub use freshness::is_newer;
pub use template::{render, TemplateVars};

/// Where assets are read from and static files are written to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerSettings {
    pub assets_root: PathBuf,
    pub static_root: PathBuf,
}

/// Non-fatal diagnostic: no rule matches this asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleMissing {
    /// Path relative to the assets root, forward slashes.
    pub path: String,
}

impl fmt::Display for RuleMissing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot find a rule for {}", self.path)
    }
}

/// What happened to one asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileOutcome {
    /// All commands of the matching rule exited with status 0.
    Compiled { path: String, commands: usize },
    /// The static file is newer than the asset; nothing was run.
    UpToDate { path: String },
    RuleMissing(RuleMissing),
}

/// Result of a bulk pass over the whole assets tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileReport {
    pub compiled: Vec<String>,
    pub missing: Vec<RuleMissing>,
}

#[derive(Debug, Clone)]
pub struct Compiler {
    settings: CompilerSettings,
    table: Arc<RuleTable>,
    runner: Arc<dyn CommandRunner>,
    fs: Arc<dyn FileSystem>,
}

impl Compiler {
    pub fn new(
        settings: CompilerSettings,
        table: Arc<RuleTable>,
        runner: Arc<dyn CommandRunner>,
        fs: Arc<dyn FileSystem>,
    ) -> Self {
        Self {
            settings,
            table,
            runner,
            fs,
        }
    }

    pub fn settings(&self) -> &CompilerSettings {
        &self.settings
    }

    pub fn table(&self) -> &RuleTable {
        &self.table
    }

    /// Compile a single asset unconditionally.
    ///
    /// `asset` is either a path under the assets root (as emitted by the
    /// watcher) or a path relative to it (as requested over HTTP).
    pub async fn compile_one(&self, asset: impl AsRef<Path>) -> Result<CompileOutcome> {
        let rel = self.relative_asset(asset.as_ref())?;
        match self.table.find(&rel) {
            Some(rule) => self.run_rule(rel, rule).await,
            None => Ok(self.rule_missing(rel)),
        }
    }

    /// Compile a single asset only if its static file is missing or older.
    ///
    /// This is what a static file server calls right before reading the
    /// static file from disk.
    pub async fn compile_if_stale(&self, asset: impl AsRef<Path>) -> Result<CompileOutcome> {
        let rel = self.relative_asset(asset.as_ref())?;
        let Some(rule) = self.table.find(&rel) else {
            return Ok(self.rule_missing(rel));
        };

        let asset_path = self.settings.assets_root.join(&rel);
        let static_path = self.settings.static_root.join(&rel);
        if is_newer(self.fs.as_ref(), &asset_path, &static_path)? {
            self.run_rule(rel, rule).await
        } else {
            debug!(path = %rel, "static file up to date");
            Ok(CompileOutcome::UpToDate { path: rel })
        }
    }

    /// Walk the whole assets tree depth-first and compile every regular file.
    ///
    /// Missing rules are collected into the report; the first build failure
    /// aborts the pass.
    pub async fn compile_all(&self) -> Result<CompileReport> {
        let root = self.settings.assets_root.clone();
        let files = self.collect_files(&root)?;
        info!(root = ?root, files = files.len(), "compiling all assets");

        let mut report = CompileReport::default();
        for file in files {
            match self.compile_one(&file).await? {
                CompileOutcome::Compiled { path, .. } => report.compiled.push(path),
                CompileOutcome::RuleMissing(missing) => report.missing.push(missing),
                CompileOutcome::UpToDate { .. } => {}
            }
        }

        info!(
            compiled = report.compiled.len(),
            missing = report.missing.len(),
            "bulk compilation finished"
        );
        Ok(report)
    }

    async fn run_rule(&self, rel: String, rule: &Rule) -> Result<CompileOutcome> {
        let vars = self.template_vars(&rel);

        if let Some(parent) = Path::new(&vars.static_path).parent() {
            self.fs
                .create_dir_all(parent)
                .map_err(|e| MakeStaticError::io(parent, e))?;
        }

        debug!(path = %rel, pattern = %rule.pattern, "rule matched");

        for template in &rule.commands {
            let command = render(template, &vars)?;
            let status = self.runner.run(&command).await?;
            if status != 0 {
                return Err(MakeStaticError::BuildFailed { command, status });
            }
        }

        info!(path = %rel, commands = rule.commands.len(), "compiled asset");
        Ok(CompileOutcome::Compiled {
            path: rel,
            commands: rule.commands.len(),
        })
    }

    fn rule_missing(&self, rel: String) -> CompileOutcome {
        let missing = RuleMissing { path: rel };
        warn!("{missing}");
        CompileOutcome::RuleMissing(missing)
    }

    fn template_vars(&self, rel: &str) -> TemplateVars {
        let asset = self.settings.assets_root.join(rel);
        let static_path = self.settings.static_root.join(rel);
        let static_base = static_path.with_extension("");
        TemplateVars {
            asset: asset.to_string_lossy().into_owned(),
            static_path: static_path.to_string_lossy().into_owned(),
            static_dir: self.settings.static_root.to_string_lossy().into_owned(),
            static_base: static_base.to_string_lossy().into_owned(),
        }
    }

    /// Relative, forward-slash form of `asset` used for rule lookup.
    fn relative_asset(&self, asset: &Path) -> Result<String> {
        let root = &self.settings.assets_root;
        let rel = if let Some(rel) = relative_str(root, asset) {
            rel
        } else if asset.is_absolute() {
            return Err(MakeStaticError::ConfigError(format!(
                "asset {:?} is outside the assets root {:?}",
                asset, root
            )));
        } else {
            asset.to_string_lossy().replace('\\', "/")
        };

        let escapes = Path::new(&rel)
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if rel.is_empty() || escapes {
            return Err(MakeStaticError::ConfigError(format!(
                "invalid asset path {:?}",
                asset
            )));
        }
        Ok(rel.trim_start_matches("./").to_string())
    }

    fn collect_files(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        let mut stack = vec![root.to_path_buf()];

        while let Some(dir) = stack.pop() {
            let mut members = self
                .fs
                .read_dir(&dir)
                .map_err(|e| MakeStaticError::io(&dir, e))?;
            members.sort();
            let mut subdirs = Vec::new();
            for path in members {
                let meta = self
                    .fs
                    .metadata(&path)
                    .map_err(|e| MakeStaticError::io(&path, e))?;
                if meta.is_dir() {
                    subdirs.push(path);
                } else if meta.is_file() {
                    files.push(path);
                }
            }
            // Reversed so the alphabetically first directory is popped next.
            stack.extend(subdirs.into_iter().rev());
        }

        Ok(files)
    }
}
