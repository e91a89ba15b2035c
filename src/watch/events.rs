// src/watch/events.rs

use std::fmt;
use std::path::PathBuf;

/// The six kinds of change a tick can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WatchEventKind {
    FileAdded,
    FileModified,
    FileRemoved,
    DirectoryAdded,
    DirectoryModified,
    DirectoryRemoved,
}

impl WatchEventKind {
    pub const ALL: [WatchEventKind; 6] = [
        WatchEventKind::FileAdded,
        WatchEventKind::FileModified,
        WatchEventKind::FileRemoved,
        WatchEventKind::DirectoryAdded,
        WatchEventKind::DirectoryModified,
        WatchEventKind::DirectoryRemoved,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            WatchEventKind::FileAdded => "file_added",
            WatchEventKind::FileModified => "file_modified",
            WatchEventKind::FileRemoved => "file_removed",
            WatchEventKind::DirectoryAdded => "directory_added",
            WatchEventKind::DirectoryModified => "directory_modified",
            WatchEventKind::DirectoryRemoved => "directory_removed",
        }
    }

    /// True for the events that mean a file's content may need rebuilding.
    pub fn is_content_change(self) -> bool {
        matches!(self, WatchEventKind::FileAdded | WatchEventKind::FileModified)
    }
}

impl fmt::Display for WatchEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tagged watcher event, used when events leave the polling thread
/// through a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    pub kind: WatchEventKind,
    pub path: PathBuf,
}

impl WatchEvent {
    pub fn new(kind: WatchEventKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }
}

impl fmt::Display for WatchEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.kind, self.path.display())
    }
}
