//! File write policies and link checks
//!
//! Saving to a path follows write-fsync-rename for
//! [`WriteAccess::OverwriteIfNecessary`]: the text goes to a sibling
//! `.tmp` file which replaces the target only once it is fully on disk.
//! [`WriteAccess::OnlyIfNotExists`] creates the target exclusively and does
//! nothing at all when the target already exists.
//!
//! Syncing the parent directory after a rename is best-effort; a failure
//! there is logged and suppressed.

use confstore_core::{ConfigError, Result, WriteAccess};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Write `text` to `path` under `access`
///
/// Returns `true` if the file was written, `false` if `OnlyIfNotExists`
/// found an existing target.
///
/// # Errors
///
/// - [`ConfigError::Precondition`] if `path` is a directory and would be
///   overwritten
/// - [`ConfigError::Io`] for any other filesystem failure
pub fn write_text(path: &Path, text: &str, access: WriteAccess) -> Result<bool> {
    match access {
        WriteAccess::OnlyIfNotExists => {
            let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
                Ok(file) => file,
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    debug!(target: "confstore::durability", path = %path.display(), "Target exists, skipping save");
                    return Ok(false);
                }
                Err(e) => return Err(e.into()),
            };
            let written = file.write_all(text.as_bytes()).and_then(|()| file.sync_all());
            drop(file);
            if let Err(e) = written {
                // Created by this call, so nothing of the caller's is lost
                remove_unfinished(path);
                return Err(e.into());
            }
        }
        WriteAccess::OverwriteIfNecessary => {
            if path.is_dir() {
                return Err(ConfigError::precondition(format!(
                    "cannot save to directory {}",
                    path.display()
                )));
            }
            replace_via_temp(path, |file| file.write_all(text.as_bytes()))?;
        }
    }

    debug!(target: "confstore::durability", path = %path.display(), bytes = text.len(), "Saved document");
    Ok(true)
}

/// Write `text` to a caller-owned stream and flush it
pub fn write_stream(writer: &mut dyn Write, text: &str) -> Result<()> {
    writer.write_all(text.as_bytes())?;
    writer.flush()?;
    Ok(())
}

/// Read a whole document from `path`
pub fn read_text(path: &Path) -> Result<String> {
    Ok(fs::read_to_string(path)?)
}

/// Validate a path for linking as a store's save target
///
/// # Errors
///
/// Returns [`ConfigError::Precondition`] if `path` does not exist or is a
/// directory.
pub fn check_link_target(path: &Path) -> Result<PathBuf> {
    if !path.exists() {
        return Err(ConfigError::precondition(format!(
            "{} does not exist",
            path.display()
        )));
    }
    if path.is_dir() {
        return Err(ConfigError::precondition(format!(
            "{} is a directory",
            path.display()
        )));
    }
    Ok(path.to_path_buf())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Fill a sibling temp file, sync it, and rename it over `path`
///
/// On any failure the temp file is removed (best-effort) and `path` is
/// left as it was.
fn replace_via_temp<F>(path: &Path, fill: F) -> Result<()>
where
    F: FnOnce(&mut File) -> io::Result<()>,
{
    let temp_path = temp_path_for(path);
    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&temp_path)?;
    let filled = fill(&mut file).and_then(|()| file.sync_all());
    drop(file);

    if let Err(e) = filled.and_then(|()| fs::rename(&temp_path, path)) {
        remove_unfinished(&temp_path);
        return Err(e.into());
    }
    sync_parent(path);
    Ok(())
}

fn remove_unfinished(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        if e.kind() != io::ErrorKind::NotFound {
            warn!(target: "confstore::durability", path = %path.display(), error = %e, "Failed to remove unfinished file");
        }
    }
}

fn sync_parent(path: &Path) {
    let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) else {
        return;
    };
    if let Err(e) = File::open(parent).and_then(|dir| dir.sync_all()) {
        warn!(target: "confstore::durability", path = %parent.display(), error = %e, "Failed to sync parent directory");
    }
}
