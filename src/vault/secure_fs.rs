//! Owner-only directories and files, and atomic replace-on-write.
//!
//! Every persisted artifact goes through [`atomic_write`]: the bytes land in
//! a 0600 temp file in the target's directory, are synced, and the temp file
//! is renamed over the target. Readers see either the old file or the new
//! one, never a truncated mix.
//!
//! Atomic replace does not serialize writers. Two processes that each load,
//! modify and save the same store will race, and the last rename wins.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::errors::{AkError, Result};

/// Create `path` (and parents) if missing and restrict it to the owner.
pub fn ensure_secure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o700))?;
    }

    Ok(())
}

/// Create an empty file at `path` if missing and restrict it to the owner.
pub fn ensure_secure_file(path: &Path) -> Result<()> {
    if let Some(parent) = non_empty_parent(path) {
        ensure_secure_dir(parent)?;
    }

    let mut options = OpenOptions::new();
    options.create(true).append(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options.open(path)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    }

    Ok(())
}

/// A fully written temp file waiting to be renamed over its target.
///
/// Dropping a `StagedWrite` without calling [`commit`](Self::commit) removes
/// the temp file and leaves the target untouched, which is exactly what a
/// crash between write and rename looks like to the next reader.
pub struct StagedWrite {
    tmp: NamedTempFile,
    target: PathBuf,
}

impl StagedWrite {
    /// Write `bytes` to a fresh owner-only temp file next to `target`.
    pub fn stage(target: &Path, bytes: &[u8]) -> Result<Self> {
        let dir = non_empty_parent(target).unwrap_or_else(|| Path::new("."));
        ensure_secure_dir(dir)?;

        let file_name = target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        // NamedTempFile is created 0600, so no secret byte is ever
        // readable by another user, even mid-write.
        let mut tmp = tempfile::Builder::new()
            .prefix(&format!(".{file_name}."))
            .suffix(".tmp")
            .tempfile_in(dir)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tmp.as_file()
                .set_permissions(fs::Permissions::from_mode(0o600))?;
        }

        tmp.write_all(bytes)?;
        tmp.as_file().sync_all()?;

        Ok(Self {
            tmp,
            target: target.to_path_buf(),
        })
    }

    /// Path of the temp file (for tests and diagnostics).
    pub fn temp_path(&self) -> &Path {
        self.tmp.path()
    }

    /// Rename the temp file over the target.
    pub fn commit(self) -> Result<()> {
        let target = self.target;
        self.tmp.persist(&target).map_err(|e| {
            AkError::Io(std::io::Error::new(
                e.error.kind(),
                format!("failed to replace {}: {}", target.display(), e.error),
            ))
        })?;
        tracing::debug!(path = %target.display(), "atomic write committed");
        Ok(())
    }
}

/// Atomically replace `path` with `bytes` (owner-only permissions).
pub fn atomic_write(path: &Path, bytes: &[u8]) -> Result<()> {
    StagedWrite::stage(path, bytes)?.commit()
}

/// Remove `path` if it exists. Returns whether something was removed.
pub fn remove_if_exists(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

fn non_empty_parent(path: &Path) -> Option<&Path> {
    path.parent().filter(|p| !p.as_os_str().is_empty())
}
