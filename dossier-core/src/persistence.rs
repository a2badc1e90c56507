//! Write-then-rename helpers shared by the history store and the report
//! finalizer.
//!
//! Every file Dossier produces is first written to a sibling staging path and
//! then renamed over the target, so a crash or a failed render never leaves a
//! half-written history file or document behind.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

/// Staging sibling for `path`: the same file name with `.part` appended.
///
/// `report.pdf` stages as `report.pdf.part`, so the staged file never
/// collides with another report that differs only by extension.
pub fn staging_path(path: &Path) -> PathBuf {
    let mut name: OsString = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| OsString::from("output"));
    name.push(".part");
    path.with_file_name(name)
}

/// Replace `target` with the fully written `staged` file.
pub fn promote(staged: &Path, target: &Path) -> io::Result<()> {
    std::fs::rename(staged, target)
}

/// Serialize `data` as pretty JSON and write it over `path` via a staging file.
///
/// Creates parent directories if they don't exist.
pub fn write_json_replacing<T: serde::Serialize>(path: &Path, data: &T) -> io::Result<()> {
    let json = serde_json::to_string_pretty(data).map_err(io::Error::other)?;
    write_replacing(path, json.as_bytes())
}

/// Write raw bytes over `path` via a staging file.
pub fn write_replacing(path: &Path, data: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let staged = staging_path(path);
    if let Err(e) = std::fs::write(&staged, data) {
        let _ = std::fs::remove_file(&staged);
        return Err(e);
    }
    promote(&staged, path)
}

/// Remove a file, treating "already gone" as success.
pub fn remove_if_exists(path: &Path) -> io::Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}
