// src/compiler/freshness.rs

use std::io;
use std::path::Path;

use crate::errors::{MakeStaticError, Result};
use crate::fs::FileSystem;

/// True if `checked` was modified after `against`, or if `against` does not
/// exist at all. A missing `checked` is an error, whether or not `against`
/// exists.
pub fn is_newer(fs: &dyn FileSystem, checked: &Path, against: &Path) -> Result<bool> {
    let checked_modified = fs
        .metadata(checked)
        .map_err(|e| MakeStaticError::io(checked, e))?
        .modified;
    match fs.metadata(against) {
        Ok(meta) => Ok(checked_modified > meta.modified),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(true),
        Err(e) => Err(MakeStaticError::io(against, e)),
    }
}
