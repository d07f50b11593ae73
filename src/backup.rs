//! Backup naming and atomic file overwrites.
//!
//! New content is written to a temporary file in the target's directory and
//! renamed into place, so a crash mid-write never leaves a truncated file.
//! Backups are plain copies named by appending a separator and extension to
//! the full file name, with a numeric infix on collision.

use crate::errors::{io_error_for, ReplaceResult};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// Appends `sep` + `ext` to the file name. With the default separator `~`
/// and an empty extension this yields `file~`; a configured extension uses
/// `.` and yields `file.bak`.
fn backup_name(path: &Path, extension: &str, separator: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(separator);
    name.push(extension);
    PathBuf::from(name)
}

/// First candidate that does not already exist on disk: `file~`, then
/// `file~1~`, `file~2~` and so on (or `file.bak`, `file.1.bak`, ...).
pub fn collision_free_backup_name(path: &Path, extension: &str, separator: &str) -> PathBuf {
    let candidate = backup_name(path, extension, separator);
    if !candidate.exists() {
        return candidate;
    }
    for n in 1.. {
        let infixed = format!("{}{}{}", n, separator, extension);
        let candidate = backup_name(path, &infixed, separator);
        if !candidate.exists() {
            return candidate;
        }
    }
    unreachable!()
}

/// Replaces `path`'s content via a temporary file in the same directory
/// followed by a rename. The original permissions are preserved where the
/// platform supports it.
pub fn write_atomic(path: &Path, content: &str) -> ReplaceResult<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let permissions = fs::metadata(path)
        .map(|m| m.permissions())
        .map_err(|e| io_error_for(path, e))?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| io_error_for(path, e))?;
    tmp.write_all(content.as_bytes())
        .map_err(|e| io_error_for(path, e))?;
    tmp.flush().map_err(|e| io_error_for(path, e))?;
    tmp.as_file()
        .set_permissions(permissions)
        .map_err(|e| io_error_for(path, e))?;
    tmp.persist(path).map_err(|e| io_error_for(path, e.error))?;

    debug!(path = %path.display(), bytes = content.len(), "wrote file atomically");
    Ok(())
}

/// Copies the file to a collision-free backup name, then overwrites it
/// atomically. Returns the backup path.
pub fn backup_and_overwrite(
    path: &Path,
    content: &str,
    extension: &str,
    separator: &str,
) -> ReplaceResult<PathBuf> {
    let backup = collision_free_backup_name(path, extension, separator);
    fs::copy(path, &backup).map_err(|e| io_error_for(path, e))?;
    debug!(path = %path.display(), backup = %backup.display(), "backed up file");
    write_atomic(path, content)?;
    Ok(backup)
}
