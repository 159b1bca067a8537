//! Cross-platform path utilities for mta-bundler
//!
//! All arithmetic here is lexical: nothing touches the filesystem except
//! [`absolutize`], which only consults the current working directory. Output
//! directories usually do not exist yet, so canonicalization is not an option.

use std::io;
use std::path::{Component, Path, PathBuf};

/// Extension of Lua sources referenced from `meta.xml`.
pub(crate) const LUA_EXTENSION: &str = ".lua";

/// Extension of compiled Lua chunks.
pub(crate) const LUAC_EXTENSION: &str = ".luac";

/// Convert a path to a string with forward slashes
///
/// ```ignore
/// let forward = to_forward_slashes(Path::new("C:\\Users\\file.txt"));
/// assert_eq!(forward, "C:/Users/file.txt");
/// ```
pub fn to_forward_slashes(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Lexically normalize a path, the way `filepath.Clean` style helpers do.
///
/// Drops `.` components and folds `name/..` pairs. Leading `..` components of a
/// relative path are kept; `..` directly under a root is dropped.
pub fn clean(path: &Path) -> PathBuf {
    let mut parts: Vec<Component<'_>> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }

    parts.iter().map(|c| c.as_os_str()).collect()
}

/// Make a path absolute against the current working directory and clean it.
pub fn absolutize(path: &Path) -> io::Result<PathBuf> {
    let absolute = std::path::absolute(path)?;
    Ok(dunce::simplified(&clean(&absolute)).to_path_buf())
}

/// Compute `target` relative to `base`.
///
/// Both paths are cleaned first. Returns `None` when the paths cannot be
/// related: one is absolute and the other is not, or they live on different
/// volumes. An empty path means `target == base`.
pub fn relative_to(base: &Path, target: &Path) -> Option<PathBuf> {
    let base = clean(base);
    let target = clean(target);

    if base.is_absolute() != target.is_absolute() {
        return None;
    }

    let base_parts: Vec<Component<'_>> = base.components().collect();
    let target_parts: Vec<Component<'_>> = target.components().collect();

    let base_prefix = base_parts.iter().find(|c| matches!(c, Component::Prefix(_)));
    let target_prefix = target_parts.iter().find(|c| matches!(c, Component::Prefix(_)));
    if !prefixes_match(base_prefix, target_prefix) {
        return None;
    }

    let common = base_parts
        .iter()
        .zip(target_parts.iter())
        .take_while(|(a, b)| components_equal(a, b))
        .count();

    let mut relative = PathBuf::new();
    for component in &base_parts[common..] {
        match component {
            Component::Normal(_) => relative.push(".."),
            // `..` left in a relative base cannot be walked back
            Component::ParentDir => return None,
            _ => {}
        }
    }
    for component in &target_parts[common..] {
        relative.push(component.as_os_str());
    }

    Some(relative)
}

/// Whether a relative path is empty or `.`, i.e. names its own base.
pub fn is_empty_or_current(path: &Path) -> bool {
    path.components().all(|c| matches!(c, Component::CurDir))
}

/// Whether the path climbs above its base (`..` as the first component).
pub fn escapes_base(path: &Path) -> bool {
    matches!(path.components().next(), Some(Component::ParentDir))
}

/// Whether a declared path or file name carries a `.lua` extension (any case).
pub fn has_lua_extension(name: &str) -> bool {
    name.len() >= LUA_EXTENSION.len()
        && name
            .get(name.len() - LUA_EXTENSION.len()..)
            .is_some_and(|ext| ext.eq_ignore_ascii_case(LUA_EXTENSION))
}

/// Replace a trailing `.lua` (any case) with `.luac`; other names pass through.
pub fn to_luac_name(name: &str) -> String {
    if has_lua_extension(name) {
        format!("{}{}", &name[..name.len() - LUA_EXTENSION.len()], LUAC_EXTENSION)
    } else {
        name.to_string()
    }
}

/// Final path segment of a resource-relative declared path.
///
/// Declared paths use `/` by convention but `\` shows up in hand-written
/// manifests, so both separators are honoured on every platform.
pub fn declared_file_name(declared: &str) -> &str {
    declared
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(declared)
}

/// Directory part of a resource-relative declared path, as a relative `PathBuf`.
///
/// Empty when the file sits at the resource root.
pub fn declared_dir(declared: &str) -> PathBuf {
    let mut segments: Vec<&str> = declared.split(['/', '\\']).collect();
    segments.pop();
    clean(&segments.iter().filter(|s| !s.is_empty()).collect::<PathBuf>())
}

fn prefixes_match(a: Option<&Component<'_>>, b: Option<&Component<'_>>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => components_equal(a, b),
        _ => false,
    }
}

#[cfg(windows)]
fn components_equal(a: &Component<'_>, b: &Component<'_>) -> bool {
    a.as_os_str()
        .to_string_lossy()
        .eq_ignore_ascii_case(&b.as_os_str().to_string_lossy())
}

#[cfg(not(windows))]
fn components_equal(a: &Component<'_>, b: &Component<'_>) -> bool {
    a == b
}
