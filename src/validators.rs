//! Pure validating constructors for filesystem-facing value objects,
//! grounded on `original_source`'s path/filename validators and the
//! distilled spec's §4.9 component design. Each function fails closed: no
//! directory is created and nothing is touched on the rejecting path.

use crate::error::IngestError;
use std::path::{Path, PathBuf};

const FORBIDDEN_ROOTS: &[&str] = &["/etc", "/sys", "/proc", "/dev", "/boot", "/root"];

/// Validate and prepare a destination directory.
///
/// Rejects any path whose canonicalized form begins with a forbidden
/// system root, and any path that exists but is not a directory. On
/// success, creates the directory (and its parents) if it does not yet
/// exist.
pub fn validate_destination(path: &Path) -> Result<PathBuf, IngestError> {
    if path.exists() && !path.is_dir() {
        return Err(IngestError::PathIsNotDirectory(format!("{}", path.display())));
    }

    let canonical = resolve_canonical(path)?;
    for root in FORBIDDEN_ROOTS {
        if canonical.starts_with(root) {
            return Err(IngestError::SecurityError(format!(
                "destination path resolves under forbidden root {}: {}",
                root,
                canonical.display()
            )));
        }
    }

    std::fs::create_dir_all(path)
        .map_err(|e| IngestError::PathPermissionError(format!("{}: {}", path.display(), e)))?;

    probe_writable(path)?;

    Ok(path.to_path_buf())
}

/// Eagerly probe write access at construction time rather than deferring
/// discovery to the first download/shard write: `create_dir_all` above
/// only fails when the directory itself must be created, so a pre-existing
/// but read-only directory (e.g. a read-only mount) would otherwise only
/// surface as a permission error deep inside a later job.
fn probe_writable(dir: &Path) -> Result<(), IngestError> {
    let probe = dir.join(".datafin-write-probe");
    std::fs::write(&probe, b"")
        .map_err(|e| IngestError::PathPermissionError(format!("{}: {}", dir.display(), e)))?;
    let _ = std::fs::remove_file(&probe);
    Ok(())
}

/// Resolve `path` to its canonical form without requiring it to exist:
/// canonicalize the nearest existing ancestor and re-append the remaining
/// (not-yet-created) components.
fn resolve_canonical(path: &Path) -> Result<PathBuf, IngestError> {
    let mut existing = path.to_path_buf();
    let mut tail = Vec::new();

    while !existing.exists() {
        match existing.file_name() {
            Some(name) => {
                tail.push(name.to_os_string());
                existing.pop();
            }
            None => {
                existing = std::env::current_dir().map_err(IngestError::Io)?;
                break;
            }
        }
    }

    let mut canonical = std::fs::canonicalize(&existing).map_err(IngestError::Io)?;
    for component in tail.into_iter().rev() {
        canonical.push(component);
    }
    Ok(canonical)
}

/// Validate a bare filename (not a path): rejects separators, characters
/// outside `[A-Za-z0-9_.-]`, and names longer than 255 characters.
pub fn validate_filename(name: &str) -> Result<String, IngestError> {
    if name.is_empty() {
        return Err(IngestError::InvalidDestinationPath(
            "filename must not be empty".to_string(),
        ));
    }

    if name.contains('/') || name.contains('\\') {
        return Err(IngestError::InvalidDestinationPath(format!(
            "filename must not contain a path separator: {}",
            name
        )));
    }

    if name.len() > 255 {
        return Err(IngestError::InvalidDestinationPath(format!(
            "filename exceeds 255 characters: {}",
            name
        )));
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
    {
        return Err(IngestError::InvalidDestinationPath(format!(
            "filename contains invalid characters: {}",
            name
        )));
    }

    Ok(name.to_string())
}
