// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`backend`] provides the `CommandRunner` trait the compiler depends on.
//! - [`task_runner`] holds `ShellRunner`, the production implementation that
//!   runs each command through the host shell with `tokio::process::Command`.

pub mod backend;
pub mod task_runner;

pub use backend::{CommandRunner, RunFuture};
pub use task_runner::ShellRunner;
