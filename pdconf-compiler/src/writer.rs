//! Filesystem helpers for generated artifacts.
//!
//! `write_config` writes to `<path>.pdconf.tmp` and renames over the target,
//! so a failed write never leaves a truncated config in place.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{io_err, CompileError};

/// Create the parent directory of `path` if needed. Idempotent.
pub fn ensure_parent_dir(path: &Path) -> Result<(), CompileError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
        }
    }
    Ok(())
}

/// Atomically replace `path` with `content`.
pub fn write_config(path: &Path, content: &str) -> Result<(), CompileError> {
    ensure_parent_dir(path)?;
    let tmp = PathBuf::from(format!("{}.pdconf.tmp", path.display()));
    std::fs::write(&tmp, content).map_err(|e| io_err(&tmp, e))?;

    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(path, e));
    }

    tracing::info!("wrote: {}", path.display());
    Ok(())
}

/// Remove `path`; a file that is already gone is success.
pub fn safe_remove(path: &Path) -> std::io::Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            tracing::debug!("removed: {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}
