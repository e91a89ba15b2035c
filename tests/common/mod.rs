#![allow(dead_code)]

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

pub use makestatic_test_utils::{init_tracing, with_timeout};

/// `secs` seconds after a fixed base, far enough in the past that nothing
/// else touches files with that timestamp during a test.
pub fn stamp(secs: u64) -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_secs(1_600_000_000 + secs)
}

/// Write `contents` to `path` (creating parents) and pin its mtime.
pub fn write_file(path: &Path, contents: &str, modified: SystemTime) -> PathBuf {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
    set_mtime(path, modified);
    path.to_path_buf()
}

pub fn set_mtime(path: &Path, modified: SystemTime) {
    File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(modified)
        .unwrap();
}
