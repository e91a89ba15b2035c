// src/engine/mod.rs

//! Rebuild engine for `makestatic watch`.
//!
//! This module ties together:
//! - the watcher event stream (forwarded from the polling thread)
//! - the compiler (one `compile_one` per added or modified asset)
//! - shutdown signals (Ctrl-C)
//!
//! The async loop itself lives in [`runtime`].

use crate::watch::WatchEvent;

/// Events flowing into the runtime from the watcher and signal handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeEvent {
    /// A change reported by the watcher.
    Watch(WatchEvent),
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

impl From<WatchEvent> for RuntimeEvent {
    fn from(event: WatchEvent) -> Self {
        RuntimeEvent::Watch(event)
    }
}

pub mod runtime;

pub use runtime::{RebuildStats, Runtime};
