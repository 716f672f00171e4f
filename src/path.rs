//! Archive path normalization
//!
//! Every path that crosses an API boundary (pack, load, open, stat, walk,
//! readdir) goes through [`normalize`], so the index only ever sees one
//! spelling of a path.

use crate::error::{BroccoliError, Result};
use std::path::Path;

/// Maximum path length in bytes (UTF-8)
pub const MAX_PATH_LENGTH: usize = 4096;

/// Normalize a path to the archive's canonical form.
///
/// Backslashes become forward slashes, and empty or `.` components are
/// dropped. This strips a leading `./`, leading and trailing slashes, and
/// doubled separators. The archive root normalizes to `""`.
pub fn normalize(path: &str) -> String {
    let translated = path.replace('\\', "/");
    let mut out = String::with_capacity(translated.len());
    for component in translated.split('/') {
        if component.is_empty() || component == "." {
            continue;
        }
        if !out.is_empty() {
            out.push('/');
        }
        out.push_str(component);
    }
    out
}

/// Normalize a path destined for a packed entry, rejecting paths that
/// cannot name an entry.
pub fn validate(path: &str) -> Result<String> {
    let normalized = normalize(path);
    if normalized.is_empty() {
        return Err(BroccoliError::InvalidPath(format!(
            "{:?} does not name an entry",
            path
        )));
    }
    if normalized.split('/').any(|c| c == "..") {
        return Err(BroccoliError::InvalidPath(format!(
            "{:?} escapes the archive root",
            path
        )));
    }
    if normalized.len() > MAX_PATH_LENGTH {
        return Err(BroccoliError::InvalidPath(format!(
            "path too long: {} bytes (max {})",
            normalized.len(),
            MAX_PATH_LENGTH
        )));
    }
    Ok(normalized)
}

/// Express `path` relative to `root` in archive form.
pub fn relative_to(root: &Path, path: &Path) -> Result<String> {
    let rel = path.strip_prefix(root).map_err(|_| {
        BroccoliError::InvalidPath(format!(
            "{} is outside {}",
            path.display(),
            root.display()
        ))
    })?;

    let mut out = String::new();
    for (i, component) in rel.components().enumerate() {
        if i != 0 {
            out.push('/');
        }
        out.push_str(&component.as_os_str().to_string_lossy());
    }
    validate(&out)
}

/// Last component of a normalized path
pub fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Prefix a child path must carry to live under `dir`
pub(crate) fn child_prefix(dir: &str) -> String {
    if dir.is_empty() {
        String::new()
    } else {
        format!("{}/", dir)
    }
}
