//! File operations used while bundling

use std::fs;
use std::io::Write;
use std::path::Path;

use crate::error::{BundlerError, Result};
use crate::path_utils;

/// What a copy request ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyStatus {
    Copied { bytes: u64 },
    /// Source and destination are the same file.
    Unchanged,
}

/// Copy capability: bytes plus permissions from `source` to `target`.
pub trait FileCopier: Send + Sync {
    fn copy(&self, source: &Path, target: &Path) -> Result<CopyStatus>;
}

/// Plain filesystem copier.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsCopier;

impl FileCopier for FsCopier {
    fn copy(&self, source: &Path, target: &Path) -> Result<CopyStatus> {
        if same_file(source, target) {
            return Ok(CopyStatus::Unchanged);
        }

        ensure_parent(target)?;
        let bytes = fs::copy(source, target).map_err(|e| BundlerError::copy_failed(source, target, e))?;
        let permissions = fs::metadata(source)
            .map_err(|e| BundlerError::copy_failed(source, target, e))?
            .permissions();
        fs::set_permissions(target, permissions).map_err(|e| BundlerError::copy_failed(source, target, e))?;

        Ok(CopyStatus::Copied { bytes })
    }
}

/// Same path, lexically or after resolving links when both exist.
pub fn same_file(a: &Path, b: &Path) -> bool {
    if path_utils::clean(a) == path_utils::clean(b) {
        return true;
    }
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Create the parent directory of `path` if needed.
pub fn ensure_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|e| BundlerError::write_failed(parent, e))
        }
        _ => Ok(()),
    }
}

/// Write through a temp file in the target directory, then rename over `path`.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    ensure_parent(path)?;
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut file = tempfile::NamedTempFile::new_in(dir).map_err(|e| BundlerError::write_failed(path, e))?;
    file.write_all(contents.as_bytes())
        .map_err(|e| BundlerError::write_failed(path, e))?;
    file.persist(path)
        .map_err(|e| BundlerError::write_failed(path, e.error))?;
    Ok(())
}
