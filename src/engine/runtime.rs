// src/engine/runtime.rs

use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::compiler::{CompileOutcome, Compiler};
use crate::errors::Result;
use crate::watch::WatchEvent;

use super::RuntimeEvent;

/// Counters reported when the runtime exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RebuildStats {
    pub compiled: usize,
    pub missing: usize,
    pub failed: usize,
}

/// Rebuilds assets in response to `RuntimeEvent`s.
///
/// Only `file_added` and `file_modified` trigger a compile; every other
/// watcher event is logged and ignored. A failed build is logged and the
/// loop keeps going so the next save can fix it.
pub struct Runtime {
    compiler: Arc<Compiler>,
    event_rx: mpsc::UnboundedReceiver<RuntimeEvent>,
    stats: RebuildStats,
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl Runtime {
    pub fn new(compiler: Arc<Compiler>, event_rx: mpsc::UnboundedReceiver<RuntimeEvent>) -> Self {
        Self {
            compiler,
            event_rx,
            stats: RebuildStats::default(),
        }
    }

    /// Main event loop.
    ///
    /// Returns when a shutdown is requested or every sender is gone.
    pub async fn run(mut self) -> Result<RebuildStats> {
        info!("rebuild runtime started");

        while let Some(event) = self.event_rx.recv().await {
            debug!(?event, "runtime received event");
            match event {
                RuntimeEvent::Watch(event) => self.handle_watch_event(event).await,
                RuntimeEvent::ShutdownRequested => {
                    info!("shutdown requested; stopping runtime");
                    return Ok(self.stats);
                }
            }
        }

        info!("runtime event channel closed; exiting");
        Ok(self.stats)
    }

    async fn handle_watch_event(&mut self, event: WatchEvent) {
        if !event.kind.is_content_change() {
            debug!(%event, "ignoring structural event");
            return;
        }

        match self.compiler.compile_one(&event.path).await {
            Ok(CompileOutcome::Compiled { path, .. }) => {
                info!(%path, "rebuilt");
                self.stats.compiled += 1;
            }
            Ok(CompileOutcome::RuleMissing(_)) => self.stats.missing += 1,
            Ok(CompileOutcome::UpToDate { .. }) => {}
            Err(err) => {
                error!(path = ?event.path, error = %err, "rebuild failed");
                self.stats.failed += 1;
            }
        }
    }
}
