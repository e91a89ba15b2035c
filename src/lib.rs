// src/lib.rs

pub mod cli;
pub mod compiler;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod rules;
pub mod types;
pub mod watch;

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::cli::{CliArgs, Command};
use crate::compiler::{CompileOutcome, Compiler, CompilerSettings};
use crate::config::model::ConfigFile;
use crate::config::{load_and_validate, load_rule_table};
use crate::engine::{Runtime, RuntimeEvent};
use crate::exec::ShellRunner;
use crate::fs::RealFileSystem;
use crate::rules::RuleTable;
use crate::watch::{ScheduledWatcher, Watcher};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config and rule loading
/// - the compiler with the real shell runner and filesystem
/// - (for `watch`) the scheduled watcher, the rebuild runtime and Ctrl-C
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_and_validate(&args.config)?;
    let table = Arc::new(load_rule_table(&cfg)?);

    match args.command {
        Command::Rules => {
            print_rules(&cfg, &table);
            Ok(())
        }
        Command::Build => {
            let report = build_compiler(&cfg, table).compile_all().await?;
            println!(
                "compiled {} asset(s), {} without a rule",
                report.compiled.len(),
                report.missing.len()
            );
            Ok(())
        }
        Command::Check { path } => {
            match build_compiler(&cfg, table).compile_if_stale(&path).await? {
                CompileOutcome::Compiled { path, commands } => {
                    println!("{path}: rebuilt ({commands} command(s))")
                }
                CompileOutcome::UpToDate { path } => println!("{path}: up to date"),
                CompileOutcome::RuleMissing(missing) => println!("{missing}"),
            }
            Ok(())
        }
        Command::Watch { skip_initial } => {
            let compiler = Arc::new(build_compiler(&cfg, table));
            watch(&cfg, compiler, skip_initial).await
        }
    }
}

/// Compiler over the real filesystem and the host shell.
fn build_compiler(cfg: &ConfigFile, table: Arc<RuleTable>) -> Compiler {
    Compiler::new(
        CompilerSettings {
            assets_root: cfg.assets_root.clone(),
            static_root: cfg.static_root.clone(),
        },
        table,
        Arc::new(ShellRunner::new()),
        Arc::new(RealFileSystem),
    )
}

async fn watch(cfg: &ConfigFile, compiler: Arc<Compiler>, skip_initial: bool) -> Result<()> {
    if !skip_initial {
        // A broken asset should not keep the watcher from starting.
        match compiler.compile_all().await {
            Ok(report) => info!(
                compiled = report.compiled.len(),
                missing = report.missing.len(),
                "initial build finished"
            ),
            Err(err) => error!(error = %err, "initial build failed"),
        }
    }

    let (rt_tx, rt_rx) = mpsc::unbounded_channel::<RuntimeEvent>();

    let mut watcher = Watcher::new(Arc::new(RealFileSystem));
    watcher.add_directory(&cfg.assets_root, true)?;
    watcher.forward_to(rt_tx.clone());

    let mut scheduled = ScheduledWatcher::new(watcher, cfg.interval);
    scheduled.start()?;
    info!(root = ?cfg.assets_root, interval = ?cfg.interval, "watching assets");

    // Ctrl-C → graceful shutdown.
    {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(RuntimeEvent::ShutdownRequested);
        });
    }
    drop(rt_tx);

    let runtime = Runtime::new(compiler, rt_rx);
    let result = tokio::select! {
        stats = runtime.run() => stats.map(|stats| {
            info!(?stats, "rebuild runtime finished");
        }),
        res = scheduled.wait() => res,
    };

    // The runtime dropped its receiver, so a tick racing this shutdown can
    // fail to forward its events.
    if let Err(err) = scheduled.shutdown().await {
        debug!(error = %err, "watcher ended during shutdown");
    }

    result.map_err(Into::into)
}

/// Print the dialect and every rule in lookup order.
fn print_rules(cfg: &ConfigFile, table: &RuleTable) {
    println!("makestatic rules");
    println!("  dialect = {}", table.dialect());
    println!("  assets  = {}", cfg.assets_root.display());
    println!("  static  = {}", cfg.static_root.display());
    println!();

    println!("rules ({}):", table.rules().len());
    for rule in table.rules() {
        println!("  - {}", rule.pattern);
        for command in &rule.commands {
            println!("      {command}");
        }
    }

    debug!("rule listing complete (no execution)");
}
