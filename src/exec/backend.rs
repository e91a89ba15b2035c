// src/exec/backend.rs

//! Pluggable command runner abstraction.
//!
//! The compiler talks to a `CommandRunner` instead of spawning processes
//! itself. Production code uses [`ShellRunner`](super::ShellRunner); tests
//! can provide an implementation that records commands and reports canned
//! exit codes without touching the OS.

use std::fmt::Debug;
use std::future::Future;
use std::pin::Pin;

use crate::errors::Result;

/// Future returned by [`CommandRunner::run`].
pub type RunFuture<'a> = Pin<Box<dyn Future<Output = Result<i32>> + Send + 'a>>;

/// Runs one fully substituted shell command and reports its exit code.
///
/// - `Ok(0)` is success; any other code is a build failure for the caller
///   to act on. `-1` stands for "terminated without an exit code".
/// - `Err(_)` means the command could not be run at all (spawn failure).
///
/// Implementations must be safe to call concurrently from several tasks.
pub trait CommandRunner: Send + Sync + Debug {
    fn run<'a>(&'a self, command: &'a str) -> RunFuture<'a>;
}
