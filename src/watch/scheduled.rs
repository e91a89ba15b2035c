// src/watch/scheduled.rs

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use anyhow::anyhow;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::errors::{MakeStaticError, Result};
use crate::watch::watcher::Watcher;

/// Cloneable handle that stops a [`ScheduledWatcher`] from any thread,
/// including from inside a watcher listener.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    stopped: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

/// Runs [`Watcher::tick`] on a background task every `interval` until
/// stopped.
///
/// The stop flag is checked while holding the watcher lock right before each
/// tick, so once [`stop`](Self::stop) returns no new tick starts. A tick that
/// already passed the check runs to completion.
#[derive(Debug)]
pub struct ScheduledWatcher {
    watcher: Arc<Mutex<Watcher>>,
    interval: Duration,
    stop: StopHandle,
    started: bool,
    handle: Option<JoinHandle<Result<()>>>,
}

impl ScheduledWatcher {
    pub fn new(watcher: Watcher, interval: Duration) -> Self {
        Self {
            watcher: Arc::new(Mutex::new(watcher)),
            interval,
            stop: StopHandle::default(),
            started: false,
            handle: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Exclusive access to the wrapped watcher, e.g. to connect listeners or
    /// track more paths. Blocks while a tick is running.
    pub fn lock(&self) -> MutexGuard<'_, Watcher> {
        self.watcher.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Spawn the polling task on the current tokio runtime.
    ///
    /// A watcher can be started once; later calls fail with
    /// [`MakeStaticError::AlreadyStarted`], even after a stop.
    pub fn start(&mut self) -> Result<()> {
        if self.started {
            return Err(MakeStaticError::AlreadyStarted);
        }
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| anyhow!("scheduled watcher needs a tokio runtime: {e}"))?;

        self.started = true;
        let watcher = Arc::clone(&self.watcher);
        let stop = self.stop.clone();
        let interval = self.interval;

        self.handle = Some(runtime.spawn(poll_loop(watcher, stop, interval)));
        debug!("scheduled watcher task spawned");
        Ok(())
    }

    /// Request a stop. Idempotent and non-blocking.
    pub fn stop(&self) {
        self.stop.stop();
    }

    /// Wait for the background task to finish and return its outcome.
    ///
    /// Returns immediately when the watcher was never started or has already
    /// been waited on. Does not request a stop by itself.
    pub async fn wait(&mut self) -> Result<()> {
        match self.handle.take() {
            Some(handle) => handle
                .await
                .map_err(|e| anyhow!("scheduled watcher task failed: {e}"))?,
            None => Ok(()),
        }
    }

    /// `stop` followed by `wait`.
    pub async fn shutdown(&mut self) -> Result<()> {
        self.stop();
        self.wait().await
    }
}

async fn poll_loop(watcher: Arc<Mutex<Watcher>>, stop: StopHandle, interval: Duration) -> Result<()> {
    info!(?interval, "scheduled watcher started");
    let mut ticks: u64 = 0;

    loop {
        let watcher = Arc::clone(&watcher);
        let stop = stop.clone();
        let ran = tokio::task::spawn_blocking(move || -> Result<bool> {
            let mut guard = watcher.lock().unwrap_or_else(PoisonError::into_inner);
            if stop.is_stopped() {
                return Ok(false);
            }
            guard.tick()?;
            Ok(true)
        })
        .await
        .map_err(|e| anyhow!("watcher tick panicked: {e}"))?;

        match ran {
            Ok(true) => ticks += 1,
            Ok(false) => break,
            Err(err) => {
                error!(error = %err, ticks, "watcher tick failed; stopping");
                return Err(err);
            }
        }

        tokio::time::sleep(interval).await;
    }

    info!(ticks, "scheduled watcher stopped");
    Ok(())
}

impl Drop for ScheduledWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}
