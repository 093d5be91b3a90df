//! Scoped file-permission toggling.

use anyhow::{Context, Result};
use std::fs::{self, Permissions};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// Restores a file's original permission bits when dropped.
///
/// Returned by [`make_writable`]. Inert when the file was already writable.
#[derive(Debug)]
pub struct WritableGuard {
    restore: Option<(PathBuf, u32)>,
}

/// Make `path` owner-writable for the lifetime of the returned guard.
///
/// If the file already has the owner-write bit the mode is left untouched.
/// Otherwise the original mode is restored when the guard drops, on every
/// exit path including panics.
pub fn make_writable(path: &Path) -> Result<WritableGuard> {
    let mode = fs::metadata(path)
        .with_context(|| format!("failed to read metadata: {}", path.display()))?
        .permissions()
        .mode();

    if mode & 0o200 != 0 {
        return Ok(WritableGuard { restore: None });
    }

    fs::set_permissions(path, Permissions::from_mode(mode | 0o200))
        .with_context(|| format!("failed to make writable: {}", path.display()))?;

    Ok(WritableGuard {
        restore: Some((path.to_path_buf(), mode)),
    })
}

impl Drop for WritableGuard {
    fn drop(&mut self) {
        if let Some((path, mode)) = self.restore.take() {
            // Drop cannot surface errors; restoration is best-effort here.
            let _ = fs::set_permissions(&path, Permissions::from_mode(mode));
        }
    }
}
