//! Small file helpers shared by the store and the CLI

use crate::error::{IoOperation, StoreError, StoreResult};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// Read `<dir>/<name>` and split it into lines
///
/// With `strip`, surrounding whitespace of the whole content is trimmed
/// first, so a trailing newline does not yield an empty last line.
pub fn read_lines(dir: &Path, name: &str, strip: bool) -> StoreResult<Vec<String>> {
    let path = dir.join(name);
    let content = fs::read_to_string(&path)
        .map_err(|e| StoreError::io_error(path.clone(), IoOperation::Read, e))?;

    let content = if strip { content.trim() } else { content.as_str() };
    if content.is_empty() {
        return Ok(Vec::new());
    }
    Ok(content.split('\n').map(str::to_string).collect())
}

/// Write or append `content` to `<dir>/<name>`, creating directories as needed
pub fn write_file(dir: &Path, name: &str, content: &str, append: bool) -> StoreResult<PathBuf> {
    let path = dir.join(name);
    ensure_parent(&path)?;

    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .append(append)
        .truncate(!append)
        .open(&path)
        .map_err(|e| StoreError::io_error(path.clone(), IoOperation::Write, e))?;
    file.write_all(content.as_bytes())
        .map_err(|e| StoreError::io_error(path.clone(), IoOperation::Write, e))?;

    debug!("Wrote {} bytes to {}", content.len(), path.display());
    Ok(path)
}

/// Replace `path` with `content` through a temp file in the same directory
pub fn write_atomic(path: &Path, content: &str) -> StoreResult<()> {
    let dir = ensure_parent(path)?;

    let mut temp = NamedTempFile::new_in(&dir)
        .map_err(|e| StoreError::io_error(dir.clone(), IoOperation::Write, e))?;
    temp.write_all(content.as_bytes())
        .map_err(|e| StoreError::io_error(temp.path().to_path_buf(), IoOperation::Write, e))?;
    temp.persist(path)
        .map_err(|e| StoreError::io_error(path.to_path_buf(), IoOperation::Write, e.error))?;
    Ok(())
}

/// Create the parent directory of `path` and return it
fn ensure_parent(path: &Path) -> StoreResult<PathBuf> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    if !parent.exists() {
        fs::create_dir_all(&parent)
            .map_err(|e| StoreError::directory_creation_failed(parent.clone(), e))?;
    }
    Ok(parent)
}
