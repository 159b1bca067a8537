//! Resource discovery
//!
//! Classifies the input path and, for directories, walks the tree for
//! manifest files. Manifest names match `meta.xml` case-insensitively.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;
use wax::{CandidatePath, Glob, Pattern};

use crate::error::{BundlerError, Result};
use crate::manifest::MANIFEST_FILE_NAME;
use crate::path_utils::{self, has_lua_extension};

/// What the user pointed the tool at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputKind {
    /// A single `meta.xml`.
    Manifest(PathBuf),
    /// A directory to search for manifests.
    Directory(PathBuf),
    /// A lone `.lua` file, compiled without a manifest.
    Script(PathBuf),
}

/// Classify an input path. Fails when it does not exist or is a file of
/// another kind.
pub fn classify(input: &Path) -> Result<InputKind> {
    if input.is_dir() {
        return Ok(InputKind::Directory(input.to_path_buf()));
    }
    if !input.is_file() {
        return Err(BundlerError::InputNotFound {
            path: input.display().to_string(),
        });
    }

    let file_name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    if is_manifest_name(&file_name) {
        Ok(InputKind::Manifest(input.to_path_buf()))
    } else if has_lua_extension(&file_name) {
        Ok(InputKind::Script(input.to_path_buf()))
    } else {
        Err(BundlerError::UnsupportedInput {
            path: input.display().to_string(),
        })
    }
}

pub fn is_manifest_name(file_name: &str) -> bool {
    file_name.eq_ignore_ascii_case(MANIFEST_FILE_NAME)
}

/// Directory walk options.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryOptions<'a> {
    /// Glob patterns, relative to the walk root, for paths to leave out.
    pub exclude: &'a [String],
    /// Subtree never descended into, typically the output root.
    pub skip_dir: Option<&'a Path>,
}

/// Every manifest below `root`, sorted by path.
///
/// Unreadable entries are logged and skipped. Returns
/// [`BundlerError::NoResourcesFound`] when nothing matches.
pub fn discover_manifests(root: &Path, options: &DiscoveryOptions<'_>) -> Result<Vec<PathBuf>> {
    let globs = options
        .exclude
        .iter()
        .map(|pattern| {
            Glob::new(pattern).map_err(|e| BundlerError::InvalidGlob {
                pattern: pattern.clone(),
                reason: e.to_string(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let is_excluded = |path: &Path| -> bool {
        if options.skip_dir.is_some_and(|skip| path == skip) {
            return true;
        }
        let Ok(relative) = path.strip_prefix(root) else {
            return false;
        };
        if relative.as_os_str().is_empty() {
            return false;
        }
        let relative = path_utils::to_forward_slashes(relative);
        let candidate = CandidatePath::from(relative.as_str());
        globs.iter().any(|glob| glob.matched(&candidate).is_some())
    };

    let mut manifests = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_excluded(entry.path()));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "cannot access directory entry, skipping");
                continue;
            }
        };

        if entry.file_type().is_file() && is_manifest_name(&entry.file_name().to_string_lossy()) {
            debug!(manifest = %entry.path().display(), "found manifest");
            manifests.push(entry.into_path());
        }
    }

    if manifests.is_empty() {
        return Err(BundlerError::NoResourcesFound {
            path: root.display().to_string(),
        });
    }

    manifests.sort();
    Ok(manifests)
}
