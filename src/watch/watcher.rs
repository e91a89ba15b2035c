// src/watch/watcher.rs

use std::collections::{BTreeSet, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::errors::{MakeStaticError, Result};
use crate::fs::{EntryMeta, FileSystem};
use crate::watch::events::{WatchEvent, WatchEventKind};
use crate::watch::signal::Signal;
use crate::watch::state::WatchState;

#[derive(Debug, Default)]
struct Signals {
    file_added: Signal<PathBuf>,
    file_modified: Signal<PathBuf>,
    file_removed: Signal<PathBuf>,
    directory_added: Signal<PathBuf>,
    directory_modified: Signal<PathBuf>,
    directory_removed: Signal<PathBuf>,
}

impl Signals {
    fn get_mut(&mut self, kind: WatchEventKind) -> &mut Signal<PathBuf> {
        match kind {
            WatchEventKind::FileAdded => &mut self.file_added,
            WatchEventKind::FileModified => &mut self.file_modified,
            WatchEventKind::FileRemoved => &mut self.file_removed,
            WatchEventKind::DirectoryAdded => &mut self.directory_added,
            WatchEventKind::DirectoryModified => &mut self.directory_modified,
            WatchEventKind::DirectoryRemoved => &mut self.directory_removed,
        }
    }
}

/// Polling change detector.
///
/// Each [`tick`](Watcher::tick) diffs the filesystem against the stored
/// [`WatchState`] and emits events through six signals. Within a tick all
/// directory membership changes are reported before any modification-time
/// change.
///
/// A tracked path that turns from a file into a directory, or the reverse,
/// is reported as removed and re-added within the same tick.
///
/// `NotFound` while listing or statting a tracked path is a removal. Any
/// other I/O error aborts the tick and is returned to the caller, as is the
/// first listener error.
#[derive(Debug)]
pub struct Watcher {
    fs: Arc<dyn FileSystem>,
    state: WatchState,
    signals: Signals,
}

fn is_gone(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
    )
}

impl Watcher {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self {
            fs,
            state: WatchState::new(),
            signals: Signals::default(),
        }
    }

    pub fn state(&self) -> &WatchState {
        &self.state
    }

    /// Register a listener for one event kind.
    pub fn connect<F>(&mut self, kind: WatchEventKind, listener: F)
    where
        F: FnMut(&PathBuf) -> anyhow::Result<()> + Send + 'static,
    {
        self.signals.get_mut(kind).connect(listener);
    }

    /// Register a listener on every event kind that sends a tagged
    /// [`WatchEvent`] down `tx`.
    ///
    /// A closed receiver fails the listener and therefore the tick.
    pub fn forward_to<T>(&mut self, tx: mpsc::UnboundedSender<T>)
    where
        T: From<WatchEvent> + Send + 'static,
    {
        for kind in WatchEventKind::ALL {
            let tx = tx.clone();
            self.connect(kind, move |path| {
                tx.send(T::from(WatchEvent::new(kind, path.clone())))
                    .map_err(|_| anyhow::anyhow!("watch event receiver dropped"))
            });
        }
    }

    /// Start tracking `dir` without emitting any events.
    ///
    /// Files get their current modification time recorded. Sub-directories
    /// are tracked as well when `recurse` is true; otherwise they are only
    /// remembered as members of `dir`.
    pub fn add_directory(&mut self, dir: impl Into<PathBuf>, recurse: bool) -> Result<()> {
        let dir = dir.into();
        let mut listing = self
            .fs
            .read_dir(&dir)
            .map_err(|e| MakeStaticError::io(&dir, e))?;
        listing.sort();

        let mut members = BTreeSet::new();
        for member in listing {
            let Some(meta) = self.stat_member(&member)? else {
                continue;
            };
            if meta.is_file() {
                self.state.set_modified(member.clone(), meta.modified);
                members.insert(member);
            } else if meta.is_dir() {
                if recurse {
                    self.add_directory(member.clone(), true)?;
                }
                members.insert(member);
            }
        }

        debug!(dir = ?dir, members = members.len(), "tracking directory");
        self.state.set_members(dir, members);
        Ok(())
    }

    /// Start tracking a single file's modification time.
    pub fn add_file(&mut self, file: impl Into<PathBuf>) -> Result<()> {
        let file = file.into();
        let meta = self
            .fs
            .metadata(&file)
            .map_err(|e| MakeStaticError::io(&file, e))?;
        if !meta.is_file() {
            return Err(MakeStaticError::ConfigError(format!(
                "{:?} is not a regular file",
                file
            )));
        }
        debug!(file = ?file, "tracking file");
        self.state.set_modified(file, meta.modified);
        Ok(())
    }

    /// Run one polling pass.
    pub fn tick(&mut self) -> Result<()> {
        let mut fresh = HashSet::new();
        self.scan_directories(&mut fresh)?;
        self.check_files(&mut fresh)
    }

    fn emit(&mut self, kind: WatchEventKind, path: &Path) -> Result<()> {
        trace!(event = %kind, path = ?path, "watch event");
        self.signals.get_mut(kind).send(&path.to_path_buf())
    }

    /// `Ok(None)` when the entry vanished between listing and stat.
    fn stat_member(&self, path: &Path) -> Result<Option<EntryMeta>> {
        match self.fs.metadata(path) {
            Ok(meta) => Ok(Some(meta)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(MakeStaticError::io(path, e)),
        }
    }

    fn scan_directories(&mut self, fresh: &mut HashSet<PathBuf>) -> Result<()> {
        let tracked: Vec<PathBuf> = self.state.directories().map(Path::to_path_buf).collect();

        for dir in tracked {
            // Already dropped together with an ancestor this pass.
            if !self.state.is_tracking_dir(&dir) {
                continue;
            }

            let listing = match self.fs.read_dir(&dir) {
                Ok(listing) => listing,
                Err(e) if is_gone(&e) => {
                    self.settle_lost_directory(&dir, fresh)?;
                    continue;
                }
                Err(e) => return Err(MakeStaticError::io(&dir, e)),
            };

            let previous = self.state.members(&dir).cloned().unwrap_or_default();
            let mut current: BTreeSet<PathBuf> = listing.into_iter().collect();
            let mut changed = false;

            let added: Vec<PathBuf> = current.difference(&previous).cloned().collect();
            for member in added {
                match self.stat_member(&member)? {
                    Some(meta) if meta.is_file() => {
                        self.state.set_modified(member.clone(), meta.modified);
                        fresh.insert(member.clone());
                        self.emit(WatchEventKind::FileAdded, &member)?;
                        changed = true;
                    }
                    Some(meta) if meta.is_dir() => {
                        if self.track_new_directory(&member, fresh)? {
                            changed = true;
                        } else {
                            current.remove(&member);
                        }
                    }
                    _ => {
                        current.remove(&member);
                    }
                }
            }

            let removed: Vec<PathBuf> = previous.difference(&current).cloned().collect();
            for member in removed {
                if self.state.forget_file(&member) {
                    self.emit(WatchEventKind::FileRemoved, &member)?;
                } else if self.state.is_tracking_dir(&member) {
                    self.remove_tree(&member)?;
                }
                changed = true;
            }

            self.state.set_members(dir.clone(), current);
            if changed {
                self.emit(WatchEventKind::DirectoryModified, &dir)?;
            }
        }

        Ok(())
    }

    /// Track a directory discovered during a tick, with everything below it.
    ///
    /// Returns `false` if it disappeared before it could be listed.
    fn track_new_directory(&mut self, dir: &Path, fresh: &mut HashSet<PathBuf>) -> Result<bool> {
        let mut listing = match self.fs.read_dir(dir) {
            Ok(listing) => listing,
            Err(e) if is_gone(&e) => return Ok(false),
            Err(e) => return Err(MakeStaticError::io(dir, e)),
        };
        listing.sort();

        self.state.set_members(dir.to_path_buf(), BTreeSet::new());
        self.emit(WatchEventKind::DirectoryAdded, dir)?;

        let mut members = BTreeSet::new();
        for member in listing {
            match self.stat_member(&member)? {
                Some(meta) if meta.is_file() => {
                    self.state.set_modified(member.clone(), meta.modified);
                    fresh.insert(member.clone());
                    self.emit(WatchEventKind::FileAdded, &member)?;
                    members.insert(member);
                }
                Some(meta) if meta.is_dir() => {
                    if self.track_new_directory(&member, fresh)? {
                        members.insert(member);
                    }
                }
                _ => {}
            }
        }

        self.state.set_members(dir.to_path_buf(), members);
        Ok(true)
    }

    /// A tracked directory that can no longer be listed.
    ///
    /// Its subtree is dropped. If the parent is tracked and a file now sits at
    /// the same path, that file is tracked in its place; either way the
    /// parent is reported as modified.
    fn settle_lost_directory(&mut self, dir: &Path, fresh: &mut HashSet<PathBuf>) -> Result<()> {
        self.remove_tree(dir)?;
        let Some(parent) = dir.parent().filter(|p| self.state.is_tracking_dir(p)) else {
            return Ok(());
        };

        match self.stat_member(dir)? {
            Some(meta) if meta.is_file() => {
                self.state.set_modified(dir.to_path_buf(), meta.modified);
                fresh.insert(dir.to_path_buf());
                self.emit(WatchEventKind::FileAdded, dir)?;
            }
            _ => self.state.unlink(dir),
        }
        self.emit(WatchEventKind::DirectoryModified, parent)
    }

    /// A tracked file that is now a directory: report the file as gone and
    /// track the directory, with its contents, in its place.
    fn replace_file_with_directory(
        &mut self,
        file: &Path,
        fresh: &mut HashSet<PathBuf>,
    ) -> Result<()> {
        self.state.forget_file(file);
        self.emit(WatchEventKind::FileRemoved, file)?;
        if !self.track_new_directory(file, fresh)? {
            self.state.unlink(file);
        }
        match file.parent() {
            Some(parent) => self.emit(WatchEventKind::DirectoryModified, parent),
            None => Ok(()),
        }
    }

    fn parent_is_tracked(&self, path: &Path) -> bool {
        path.parent().is_some_and(|p| self.state.is_tracking_dir(p))
    }

    /// Forget a directory and everything tracked below it.
    ///
    /// Emits `file_removed` for every tracked file first, then
    /// `directory_removed` deepest first, ending with `dir` itself.
    fn remove_tree(&mut self, dir: &Path) -> Result<()> {
        for file in self.state.files_under(dir) {
            self.state.forget_file(&file);
            self.emit(WatchEventKind::FileRemoved, &file)?;
        }
        for nested in self.state.dirs_under(dir) {
            self.state.forget_dir(&nested);
            self.emit(WatchEventKind::DirectoryRemoved, &nested)?;
        }
        self.state.forget_dir(dir);
        self.emit(WatchEventKind::DirectoryRemoved, dir)
    }

    fn check_files(&mut self, fresh: &mut HashSet<PathBuf>) -> Result<()> {
        let tracked: Vec<(PathBuf, _)> = self
            .state
            .files()
            .filter(|(path, _)| !fresh.contains(*path))
            .map(|(path, modified)| (path.to_path_buf(), modified))
            .collect();

        for (file, recorded) in tracked {
            match self.fs.metadata(&file) {
                Ok(meta) if meta.is_file() => {
                    if meta.modified > recorded {
                        self.state.set_modified(file.clone(), meta.modified);
                        self.emit(WatchEventKind::FileModified, &file)?;
                        if let Some(parent) = file.parent() {
                            self.emit(WatchEventKind::DirectoryModified, parent)?;
                        }
                    }
                }
                Ok(meta) if meta.is_dir() && self.parent_is_tracked(&file) => {
                    self.replace_file_with_directory(&file, fresh)?
                }
                Ok(_) => self.drop_vanished_file(&file)?,
                Err(e) if e.kind() == io::ErrorKind::NotFound => self.drop_vanished_file(&file)?,
                Err(e) => return Err(MakeStaticError::io(&file, e)),
            }
        }

        Ok(())
    }

    fn drop_vanished_file(&mut self, file: &Path) -> Result<()> {
        self.state.forget_file(file);
        self.state.unlink(file);
        self.emit(WatchEventKind::FileRemoved, file)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::fs::mock::{at, MockFileSystem};

    type Log = Arc<Mutex<Vec<(WatchEventKind, PathBuf)>>>;

    fn watcher(fs: &MockFileSystem) -> (Watcher, Log) {
        let log: Log = Arc::default();
        let mut watcher = Watcher::new(Arc::new(fs.clone()));
        for kind in WatchEventKind::ALL {
            let log = Arc::clone(&log);
            watcher.connect(kind, move |path| {
                log.lock().unwrap().push((kind, path.clone()));
                Ok(())
            });
        }
        (watcher, log)
    }

    fn drain(log: &Log) -> Vec<(WatchEventKind, PathBuf)> {
        std::mem::take(&mut *log.lock().unwrap())
    }

    fn ev(kind: WatchEventKind, path: &str) -> (WatchEventKind, PathBuf) {
        (kind, PathBuf::from(path))
    }

    #[test]
    fn initial_registration_is_silent() {
        let fs = MockFileSystem::new();
        fs.add_file("/w/a.css", at(1));
        fs.add_file("/w/sub/b.css", at(1));
        let (mut watcher, log) = watcher(&fs);

        watcher.add_directory("/w", true).unwrap();
        assert!(watcher.state().is_tracking_dir(Path::new("/w/sub")));
        assert_eq!(watcher.state().modified(Path::new("/w/sub/b.css")), Some(at(1)));

        watcher.tick().unwrap();
        assert!(drain(&log).is_empty());
    }

    #[test]
    fn new_directory_reports_its_contents_once() {
        use WatchEventKind::*;
        let fs = MockFileSystem::new();
        fs.add_dir("/w");
        let (mut watcher, log) = watcher(&fs);
        watcher.add_directory("/w", true).unwrap();

        fs.add_file("/w/sub/deep/a.css", at(5));
        watcher.tick().unwrap();
        assert_eq!(
            drain(&log),
            vec![
                ev(DirectoryAdded, "/w/sub"),
                ev(DirectoryAdded, "/w/sub/deep"),
                ev(FileAdded, "/w/sub/deep/a.css"),
                ev(DirectoryModified, "/w"),
            ]
        );

        watcher.tick().unwrap();
        assert!(drain(&log).is_empty());
    }

    #[test]
    fn removed_directory_reports_files_then_directories() {
        use WatchEventKind::*;
        let fs = MockFileSystem::new();
        fs.add_file("/w/sub/a.css", at(1));
        fs.add_file("/w/sub/deep/b.css", at(1));
        let (mut watcher, log) = watcher(&fs);
        watcher.add_directory("/w", true).unwrap();

        fs.remove("/w/sub");
        watcher.tick().unwrap();
        assert_eq!(
            drain(&log),
            vec![
                ev(FileRemoved, "/w/sub/a.css"),
                ev(FileRemoved, "/w/sub/deep/b.css"),
                ev(DirectoryRemoved, "/w/sub/deep"),
                ev(DirectoryRemoved, "/w/sub"),
                ev(DirectoryModified, "/w"),
            ]
        );
        assert!(!watcher.state().is_tracking_dir(Path::new("/w/sub/deep")));
    }

    #[test]
    fn vanished_root_is_removed_not_fatal() {
        use WatchEventKind::*;
        let fs = MockFileSystem::new();
        fs.add_file("/w/a.css", at(1));
        let (mut watcher, log) = watcher(&fs);
        watcher.add_directory("/w", true).unwrap();

        fs.remove("/w");
        watcher.tick().unwrap();
        assert_eq!(
            drain(&log),
            vec![ev(FileRemoved, "/w/a.css"), ev(DirectoryRemoved, "/w")]
        );
        assert!(watcher.state().is_empty());
    }

    #[test]
    fn permission_error_on_stat_is_fatal() {
        let fs = MockFileSystem::new();
        fs.add_file("/w/a.css", at(1));
        let (mut watcher, _log) = watcher(&fs);
        watcher.add_directory("/w", true).unwrap();

        fs.fail_with("/w/a.css", io::ErrorKind::PermissionDenied);
        let err = watcher.tick().unwrap_err();
        assert!(matches!(err, MakeStaticError::Io { .. }));
        assert!(!err.is_not_found());
    }

    #[test]
    fn file_replaced_by_directory_settles_in_one_tick() {
        use WatchEventKind::*;
        let fs = MockFileSystem::new();
        fs.add_file("/w/x", at(1));
        let (mut watcher, log) = watcher(&fs);
        watcher.add_directory("/w", true).unwrap();

        fs.remove("/w/x");
        fs.add_file("/w/x/inner", at(2));
        // Membership of /w is unchanged, so only the mtime pass notices.
        watcher.tick().unwrap();
        assert_eq!(
            drain(&log),
            vec![
                ev(FileRemoved, "/w/x"),
                ev(DirectoryAdded, "/w/x"),
                ev(FileAdded, "/w/x/inner"),
                ev(DirectoryModified, "/w"),
            ]
        );
        assert!(watcher.state().is_tracking_dir(Path::new("/w/x")));
        assert!(!watcher.state().is_tracking_file(Path::new("/w/x")));

        watcher.tick().unwrap();
        assert!(drain(&log).is_empty());
    }

    #[test]
    fn directory_replaced_by_file_settles_in_one_tick() {
        use WatchEventKind::*;
        let fs = MockFileSystem::new();
        fs.add_file("/w/d/inner", at(1));
        let (mut watcher, log) = watcher(&fs);
        watcher.add_directory("/w", true).unwrap();

        fs.remove("/w/d");
        fs.add_file("/w/d", at(2));
        watcher.tick().unwrap();
        assert_eq!(
            drain(&log),
            vec![
                ev(FileRemoved, "/w/d/inner"),
                ev(DirectoryRemoved, "/w/d"),
                ev(FileAdded, "/w/d"),
                ev(DirectoryModified, "/w"),
            ]
        );
        assert_eq!(watcher.state().modified(Path::new("/w/d")), Some(at(2)));
        assert!(watcher.state().members(Path::new("/w")).unwrap().contains(Path::new("/w/d")));

        watcher.tick().unwrap();
        assert!(drain(&log).is_empty());
    }

    #[test]
    fn individually_tracked_file_turning_into_a_directory_is_only_removed() {
        use WatchEventKind::*;
        let fs = MockFileSystem::new();
        fs.add_file("/etc/site.conf", at(1));
        let (mut watcher, log) = watcher(&fs);
        watcher.add_file("/etc/site.conf").unwrap();

        fs.remove("/etc/site.conf");
        fs.add_file("/etc/site.conf/part", at(2));
        watcher.tick().unwrap();
        assert_eq!(drain(&log), vec![ev(FileRemoved, "/etc/site.conf")]);
        assert!(!watcher.state().is_tracking_dir(Path::new("/etc/site.conf")));

        watcher.tick().unwrap();
        assert!(drain(&log).is_empty());
    }

    #[test]
    fn several_members_added_report_the_directory_once() {
        use WatchEventKind::*;
        let fs = MockFileSystem::new();
        fs.add_file("/w/old.css", at(1));
        let (mut watcher, log) = watcher(&fs);
        watcher.add_directory("/w", true).unwrap();

        fs.add_file("/w/a.css", at(2));
        fs.add_file("/w/b.css", at(2));
        fs.add_dir("/w/img");
        fs.remove("/w/old.css");
        watcher.tick().unwrap();
        assert_eq!(
            drain(&log),
            vec![
                ev(FileAdded, "/w/a.css"),
                ev(FileAdded, "/w/b.css"),
                ev(DirectoryAdded, "/w/img"),
                ev(FileRemoved, "/w/old.css"),
                ev(DirectoryModified, "/w"),
            ]
        );
    }

    #[test]
    fn listener_error_aborts_tick() {
        let fs = MockFileSystem::new();
        fs.add_dir("/w");
        let mut watcher = Watcher::new(Arc::new(fs.clone()));
        watcher.connect(WatchEventKind::FileAdded, |_| anyhow::bail!("listener broke"));
        watcher.add_directory("/w", true).unwrap();

        fs.add_file("/w/a.css", at(1));
        let err = watcher.tick().unwrap_err();
        assert!(matches!(err, MakeStaticError::Listener(_)));
    }

    #[test]
    fn forwards_tagged_events_to_a_channel() {
        let fs = MockFileSystem::new();
        fs.add_dir("/w");
        let (tx, mut rx) = mpsc::unbounded_channel::<WatchEvent>();
        let mut watcher = Watcher::new(Arc::new(fs.clone()));
        watcher.forward_to(tx);
        watcher.add_directory("/w", true).unwrap();

        fs.add_file("/w/a.css", at(1));
        watcher.tick().unwrap();
        assert_eq!(
            rx.try_recv().unwrap(),
            WatchEvent::new(WatchEventKind::FileAdded, "/w/a.css")
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            WatchEvent::new(WatchEventKind::DirectoryModified, "/w")
        );
        assert!(rx.try_recv().is_err());
    }
}
