mod common;
use crate::common::init_tracing;

use std::io;
use std::path::Path;
use std::sync::Arc;

use makestatic::fs::mock::{at, MockFileSystem};
use makestatic::watch::WatchEventKind::*;
use makestatic::watch::{WatchEventKind, Watcher};
use makestatic_test_utils::EventRecorder;

fn tracked(fs: &MockFileSystem, root: &str) -> (Watcher, EventRecorder) {
    let mut watcher = Watcher::new(Arc::new(fs.clone()));
    let recorder = EventRecorder::attach(&mut watcher);
    watcher.add_directory(root, true).unwrap();
    (watcher, recorder)
}

fn pairs(events: &[(WatchEventKind, &str)]) -> Vec<(WatchEventKind, String)> {
    events.iter().map(|(k, p)| (*k, p.to_string())).collect()
}

#[test]
fn new_file_is_added_then_directory_modified() {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_dir("/site/assets");
    let (mut watcher, recorder) = tracked(&fs, "/site/assets");

    fs.add_file("/site/assets/foo", at(10));
    watcher.tick().unwrap();

    assert_eq!(
        recorder.take_pairs(),
        pairs(&[
            (FileAdded, "/site/assets/foo"),
            (DirectoryModified, "/site/assets"),
        ])
    );
}

#[test]
fn bumped_mtime_is_modified_without_membership_events() {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_file("/site/assets/foo", at(10));
    let (mut watcher, recorder) = tracked(&fs, "/site/assets");

    fs.touch("/site/assets/foo", at(11));
    watcher.tick().unwrap();

    assert_eq!(
        recorder.take_pairs(),
        pairs(&[
            (FileModified, "/site/assets/foo"),
            (DirectoryModified, "/site/assets"),
        ])
    );
    assert_eq!(
        watcher.state().modified(Path::new("/site/assets/foo")),
        Some(at(11))
    );
}

#[test]
fn older_mtime_is_not_a_modification() {
    let fs = MockFileSystem::new();
    fs.add_file("/site/assets/foo", at(10));
    let (mut watcher, recorder) = tracked(&fs, "/site/assets");

    fs.touch("/site/assets/foo", at(9));
    watcher.tick().unwrap();
    assert!(recorder.take().is_empty());
}

#[test]
fn deleted_file_is_removed_once() {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_file("/site/assets/foo", at(10));
    let (mut watcher, recorder) = tracked(&fs, "/site/assets");

    fs.remove("/site/assets/foo");
    watcher.tick().unwrap();
    assert_eq!(
        recorder.take_pairs(),
        pairs(&[
            (FileRemoved, "/site/assets/foo"),
            (DirectoryModified, "/site/assets"),
        ])
    );

    watcher.tick().unwrap();
    watcher.tick().unwrap();
    assert!(recorder.take().is_empty());
}

#[test]
fn second_tick_without_changes_is_silent() {
    let fs = MockFileSystem::new();
    fs.add_file("/a/x.css", at(1));
    fs.add_dir("/a/empty");
    let (mut watcher, recorder) = tracked(&fs, "/a");

    fs.add_file("/a/new/y.css", at(2));
    fs.touch("/a/x.css", at(3));
    watcher.tick().unwrap();
    assert!(!recorder.take().is_empty());

    watcher.tick().unwrap();
    assert!(recorder.take().is_empty());
}

#[test]
fn add_then_remove_restores_the_snapshot() {
    let fs = MockFileSystem::new();
    fs.add_file("/a/keep.css", at(1));
    let (mut watcher, recorder) = tracked(&fs, "/a");
    let before = watcher.state().clone();

    fs.add_file("/a/tmp.css", at(5));
    watcher.tick().unwrap();
    assert!(recorder.take_pairs().contains(&(FileAdded, "/a/tmp.css".to_string())));

    fs.remove("/a/tmp.css");
    watcher.tick().unwrap();
    assert!(recorder.take_pairs().contains(&(FileRemoved, "/a/tmp.css".to_string())));

    assert_eq!(watcher.state(), &before);
}

#[test]
fn files_found_in_a_new_directory_are_not_also_modified() {
    let fs = MockFileSystem::new();
    fs.add_dir("/a");
    let (mut watcher, recorder) = tracked(&fs, "/a");

    fs.add_file("/a/css/site.css", at(50));
    watcher.tick().unwrap();
    let events = recorder.take();
    assert!(events.iter().all(|e| e.kind != FileModified));
    assert_eq!(
        events.iter().filter(|e| e.kind == FileAdded).count(),
        1
    );
}

#[test]
fn file_and_directory_removal_both_fire() {
    let fs = MockFileSystem::new();
    fs.add_file("/a/css/site.css", at(1));
    let (mut watcher, recorder) = tracked(&fs, "/a");

    fs.remove("/a/css");
    watcher.tick().unwrap();
    assert_eq!(
        recorder.take_pairs(),
        pairs(&[
            (FileRemoved, "/a/css/site.css"),
            (DirectoryRemoved, "/a/css"),
            (DirectoryModified, "/a"),
        ])
    );
}

#[test]
fn structural_events_precede_modifications() {
    let fs = MockFileSystem::new();
    fs.add_file("/a/old.css", at(1));
    let (mut watcher, recorder) = tracked(&fs, "/a");

    fs.touch("/a/old.css", at(2));
    fs.add_file("/a/new.css", at(2));
    watcher.tick().unwrap();
    assert_eq!(
        recorder.take_pairs(),
        pairs(&[
            (FileAdded, "/a/new.css"),
            (DirectoryModified, "/a"),
            (FileModified, "/a/old.css"),
            (DirectoryModified, "/a"),
        ])
    );
}

#[test]
fn entry_vanishing_between_listing_and_stat_is_skipped() {
    let fs = MockFileSystem::new();
    fs.add_dir("/a");
    let (mut watcher, recorder) = tracked(&fs, "/a");

    fs.add_file("/a/racy.css", at(1));
    fs.fail_with("/a/racy.css", io::ErrorKind::NotFound);
    watcher.tick().unwrap();
    assert!(recorder.take().is_empty());
    assert!(!watcher.state().is_tracking_file(Path::new("/a/racy.css")));

    fs.clear_failure("/a/racy.css");
    watcher.tick().unwrap();
    assert_eq!(
        recorder.take_pairs(),
        pairs(&[(FileAdded, "/a/racy.css"), (DirectoryModified, "/a")])
    );
}

#[test]
fn tracked_file_not_found_in_mtime_pass_is_removed() {
    let fs = MockFileSystem::new();
    fs.add_file("/a/x.css", at(1));
    let (mut watcher, recorder) = tracked(&fs, "/a");

    // Still listed by the directory, but stat says it is gone.
    fs.fail_with("/a/x.css", io::ErrorKind::NotFound);
    watcher.tick().unwrap();
    assert_eq!(recorder.take_pairs(), pairs(&[(FileRemoved, "/a/x.css")]));
    assert!(!watcher.state().is_tracking_file(Path::new("/a/x.css")));
}

#[test]
fn directory_vanishing_before_listing_is_not_tracked() {
    let fs = MockFileSystem::new();
    fs.add_dir("/a");
    let (mut watcher, recorder) = tracked(&fs, "/a");

    fs.add_dir("/a/sub");
    fs.fail_with("/a/sub", io::ErrorKind::NotFound);
    watcher.tick().unwrap();
    assert!(recorder.take().is_empty());
    assert!(!watcher.state().is_tracking_dir(Path::new("/a/sub")));
}

#[test]
fn permission_denied_while_listing_is_fatal() {
    let fs = MockFileSystem::new();
    fs.add_file("/a/sub/x.css", at(1));
    let (mut watcher, _recorder) = tracked(&fs, "/a");

    fs.fail_with("/a/sub", io::ErrorKind::PermissionDenied);
    let err = watcher.tick().unwrap_err();
    assert!(!err.is_not_found());
    assert!(err.to_string().contains("/a/sub"));
}

#[test]
fn non_recursive_registration_keeps_subdirectories_untracked() {
    let fs = MockFileSystem::new();
    fs.add_file("/a/x.css", at(1));
    fs.add_file("/a/sub/y.css", at(1));

    let mut watcher = Watcher::new(Arc::new(fs.clone()));
    let recorder = EventRecorder::attach(&mut watcher);
    watcher.add_directory("/a", false).unwrap();
    assert!(!watcher.state().is_tracking_dir(Path::new("/a/sub")));

    fs.touch("/a/sub/y.css", at(2));
    watcher.tick().unwrap();
    assert!(recorder.take().is_empty());

    fs.remove("/a/sub");
    watcher.tick().unwrap();
    assert_eq!(recorder.take_pairs(), pairs(&[(DirectoryModified, "/a")]));
}

#[test]
fn individually_added_file_is_watched() {
    let fs = MockFileSystem::new();
    fs.add_file("/etc/site.conf", at(1));
    let mut watcher = Watcher::new(Arc::new(fs.clone()));
    let recorder = EventRecorder::attach(&mut watcher);
    watcher.add_file("/etc/site.conf").unwrap();
    assert!(watcher.add_file("/etc").is_err());

    fs.touch("/etc/site.conf", at(2));
    watcher.tick().unwrap();
    assert_eq!(
        recorder.take_pairs(),
        pairs(&[(FileModified, "/etc/site.conf"), (DirectoryModified, "/etc")])
    );
}

#[test]
fn listeners_for_one_kind_run_in_registration_order() {
    use std::sync::Mutex;

    let fs = MockFileSystem::new();
    fs.add_dir("/a");
    let mut watcher = Watcher::new(Arc::new(fs.clone()));
    let order = Arc::new(Mutex::new(Vec::new()));
    for id in ["first", "second"] {
        let order = Arc::clone(&order);
        watcher.connect(FileAdded, move |_| {
            order.lock().unwrap().push(id);
            Ok(())
        });
    }
    watcher.add_directory("/a", true).unwrap();

    fs.add_file("/a/x", at(1));
    fs.add_file("/a/y", at(1));
    watcher.tick().unwrap();
    assert_eq!(
        *order.lock().unwrap(),
        vec!["first", "second", "first", "second"]
    );
}
