// src/watch/mod.rs

//! Polling change detection for the assets tree.
//!
//! This module is responsible for:
//! - Keeping a snapshot of tracked directories and file modification times
//!   ([`WatchState`]).
//! - Diffing that snapshot against the filesystem once per tick and fanning
//!   the resulting events out to listeners ([`Watcher`], [`Signal`]).
//! - Repeating ticks on a background task until stopped
//!   ([`ScheduledWatcher`]).
//!
//! It does **not** know about rules or compilation; wiring events to the
//! compiler happens in the engine.

pub mod events;
pub mod scheduled;
pub mod signal;
pub mod state;
pub mod watcher;

pub use events::{WatchEvent, WatchEventKind};
pub use scheduled::{ScheduledWatcher, StopHandle};
pub use signal::{Listener, Signal};
pub use state::WatchState;
pub use watcher::Watcher;
