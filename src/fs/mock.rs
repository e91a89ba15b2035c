// src/fs/mock.rs

//! In-memory filesystem with explicit modification times.
//!
//! Lets watcher tests bump mtimes and inject I/O failures without sleeping
//! on real filesystem timestamp granularity.

use std::collections::{BTreeMap, HashMap};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, SystemTime};

use super::{EntryKind, EntryMeta, FileSystem};

#[derive(Debug, Clone, Copy)]
enum MockEntry {
    File { modified: SystemTime },
    Dir { modified: SystemTime },
}

#[derive(Debug, Default)]
struct MockState {
    entries: BTreeMap<PathBuf, MockEntry>,
    failures: HashMap<PathBuf, io::ErrorKind>,
}

/// Cloning shares the underlying tree, so a test can keep one handle while
/// the watcher owns another.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    state: Arc<Mutex<MockState>>,
}

/// Timestamp helper: `secs` seconds after the epoch.
pub fn at(secs: u64) -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_secs(secs)
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create (or overwrite) a file with the given mtime, creating parents.
    pub fn add_file(&self, path: impl AsRef<Path>, modified: SystemTime) {
        let path = path.as_ref();
        let mut state = self.lock();
        if let Some(parent) = path.parent() {
            ensure_dirs(&mut state, parent, modified);
        }
        state
            .entries
            .insert(path.to_path_buf(), MockEntry::File { modified });
    }

    /// Create a directory and any missing parents.
    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let mut state = self.lock();
        ensure_dirs(&mut state, path.as_ref(), at(0));
    }

    /// Set the mtime of an existing entry; no-op when it does not exist.
    pub fn touch(&self, path: impl AsRef<Path>, modified: SystemTime) {
        let mut state = self.lock();
        match state.entries.get_mut(path.as_ref()) {
            Some(MockEntry::File { modified: m }) | Some(MockEntry::Dir { modified: m }) => {
                *m = modified;
            }
            None => {}
        }
    }

    /// Remove an entry and everything below it.
    pub fn remove(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        let mut state = self.lock();
        state.entries.retain(|p, _| !p.starts_with(path));
    }

    /// Make every operation on `path` fail with `kind` until cleared.
    pub fn fail_with(&self, path: impl AsRef<Path>, kind: io::ErrorKind) {
        self.lock()
            .failures
            .insert(path.as_ref().to_path_buf(), kind);
    }

    pub fn clear_failure(&self, path: impl AsRef<Path>) {
        self.lock().failures.remove(path.as_ref());
    }

    fn check_failure(state: &MockState, path: &Path) -> io::Result<()> {
        match state.failures.get(path) {
            Some(kind) => Err(io::Error::new(*kind, format!("injected failure on {:?}", path))),
            None => Ok(()),
        }
    }
}

fn ensure_dirs(state: &mut MockState, path: &Path, modified: SystemTime) {
    if path.as_os_str().is_empty() {
        return;
    }
    if let Some(parent) = path.parent() {
        if parent != path {
            ensure_dirs(state, parent, modified);
        }
    }
    state
        .entries
        .entry(path.to_path_buf())
        .or_insert(MockEntry::Dir { modified });
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("no such entry: {:?}", path))
}

impl FileSystem for MockFileSystem {
    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let state = self.lock();
        Self::check_failure(&state, path)?;
        match state.entries.get(path) {
            Some(MockEntry::Dir { .. }) => Ok(state
                .entries
                .keys()
                .filter(|p| p.parent() == Some(path))
                .cloned()
                .collect()),
            Some(MockEntry::File { .. }) => Err(io::Error::new(
                io::ErrorKind::NotADirectory,
                format!("not a directory: {:?}", path),
            )),
            None => Err(not_found(path)),
        }
    }

    fn metadata(&self, path: &Path) -> io::Result<EntryMeta> {
        let state = self.lock();
        Self::check_failure(&state, path)?;
        match state.entries.get(path) {
            Some(MockEntry::File { modified }) => Ok(EntryMeta {
                kind: EntryKind::File,
                modified: *modified,
            }),
            Some(MockEntry::Dir { modified }) => Ok(EntryMeta {
                kind: EntryKind::Directory,
                modified: *modified,
            }),
            None => Err(not_found(path)),
        }
    }

    fn try_exists(&self, path: &Path) -> io::Result<bool> {
        let state = self.lock();
        Self::check_failure(&state, path)?;
        Ok(state.entries.contains_key(path))
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        let mut state = self.lock();
        Self::check_failure(&state, path)?;
        ensure_dirs(&mut state, path, at(0));
        Ok(())
    }
}
