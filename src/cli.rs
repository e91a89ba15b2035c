// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for `makestatic`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "makestatic",
    version,
    about = "Compile assets into static files using pattern-based build rules.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Relative paths inside it are resolved against its directory.
    #[arg(long, value_name = "PATH", default_value = "Makestatic.toml", global = true)]
    pub config: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `MAKESTATIC_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Compile every asset once and exit.
    Build,

    /// Watch the assets directory and rebuild whatever changes.
    Watch {
        /// Do not compile the whole tree before watching.
        #[arg(long)]
        skip_initial: bool,
    },

    /// Rebuild one asset if its static file is missing or older.
    Check {
        /// Asset path relative to the assets root.
        path: String,
    },

    /// Print the parsed rule table without running anything.
    Rules,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
