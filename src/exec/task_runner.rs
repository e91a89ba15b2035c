// src/exec/task_runner.rs

//! Shell command runner backed by `tokio::process`.

use std::process::Stdio;

use anyhow::Context;
use tokio::process::Command;
use tracing::{debug, info};

use crate::exec::backend::{CommandRunner, RunFuture};

/// Runs commands through the host shell (`sh -c`, or `cmd /C` on Windows).
///
/// Stdio is inherited: compiler output goes straight to the terminal.
#[derive(Debug, Clone, Default)]
pub struct ShellRunner;

impl ShellRunner {
    pub fn new() -> Self {
        Self
    }
}

fn shell_command(command: &str) -> Command {
    if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(command);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(command);
        c
    }
}

impl CommandRunner for ShellRunner {
    fn run<'a>(&'a self, command: &'a str) -> RunFuture<'a> {
        Box::pin(async move {
            info!(cmd = %command, "running build command");

            let mut cmd = shell_command(command);
            cmd.stdin(Stdio::null())
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit())
                .kill_on_drop(true);

            let status = cmd
                .status()
                .await
                .with_context(|| format!("spawning shell for command `{command}`"))?;

            let code = status.code().unwrap_or(-1);
            debug!(
                cmd = %command,
                exit_code = code,
                success = status.success(),
                "build command exited"
            );
            Ok(code)
        })
    }
}
