// src/watch/state.rs

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Snapshot of a watched subtree: which members each tracked directory had
/// and when each tracked file was last modified, as of the previous tick.
///
/// Keys are full paths. A directory's descendants sort directly after it in
/// a `BTreeMap<PathBuf, _>` because `PathBuf` orders by component, so
/// subtree queries are range scans.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchState {
    directories: BTreeMap<PathBuf, BTreeSet<PathBuf>>,
    files: BTreeMap<PathBuf, SystemTime>,
}

impl WatchState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.directories.is_empty() && self.files.is_empty()
    }

    pub fn directories(&self) -> impl Iterator<Item = &Path> {
        self.directories.keys().map(PathBuf::as_path)
    }

    pub fn files(&self) -> impl Iterator<Item = (&Path, SystemTime)> {
        self.files.iter().map(|(p, t)| (p.as_path(), *t))
    }

    pub fn is_tracking_dir(&self, path: &Path) -> bool {
        self.directories.contains_key(path)
    }

    pub fn is_tracking_file(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    pub fn members(&self, dir: &Path) -> Option<&BTreeSet<PathBuf>> {
        self.directories.get(dir)
    }

    pub fn modified(&self, file: &Path) -> Option<SystemTime> {
        self.files.get(file).copied()
    }

    pub(crate) fn set_members(&mut self, dir: PathBuf, members: BTreeSet<PathBuf>) {
        self.directories.insert(dir, members);
    }

    pub(crate) fn set_modified(&mut self, file: PathBuf, modified: SystemTime) {
        self.files.insert(file, modified);
    }

    pub(crate) fn forget_file(&mut self, file: &Path) -> bool {
        self.files.remove(file).is_some()
    }

    pub(crate) fn forget_dir(&mut self, dir: &Path) -> bool {
        self.directories.remove(dir).is_some()
    }

    /// Drop `member` from its parent's member set, if the parent is tracked.
    pub(crate) fn unlink(&mut self, member: &Path) {
        if let Some(members) = member.parent().and_then(|p| self.directories.get_mut(p)) {
            members.remove(member);
        }
    }

    /// Tracked files anywhere below `dir`, sorted.
    pub(crate) fn files_under(&self, dir: &Path) -> Vec<PathBuf> {
        self.files
            .range(dir.to_path_buf()..)
            .map(|(p, _)| p)
            .take_while(|p| p.starts_with(dir))
            .filter(|p| p.as_path() != dir)
            .cloned()
            .collect()
    }

    /// Tracked directories strictly below `dir`, deepest first.
    pub(crate) fn dirs_under(&self, dir: &Path) -> Vec<PathBuf> {
        let mut nested: Vec<PathBuf> = self
            .directories
            .range(dir.to_path_buf()..)
            .map(|(p, _)| p)
            .take_while(|p| p.starts_with(dir))
            .filter(|p| p.as_path() != dir)
            .cloned()
            .collect();
        nested.sort_by(|a, b| {
            b.components()
                .count()
                .cmp(&a.components().count())
                .then_with(|| a.cmp(b))
        });
        nested
    }
}
