//! Output path resolution
//!
//! Every artifact a bundling pass writes (the manifest, compiled scripts,
//! merged bundles and copied assets) gets its location from
//! [`resolve_output_path`] or from a [`ResourceLayout`], which memoizes the
//! per-resource half of the same computation.
//!
//! Without an output root the output mirrors the source in place. With one,
//! each resource lands under the output root at the position its base
//! directory holds relative to the input root, so a batch of resources keeps
//! its tree shape:
//!
//! ```text
//! input root   /resources                 output root  /out
//! resource     /resources/games/race      ->           /out/games/race
//! script       client/gui.lua             ->           /out/games/race/client/gui.luac
//! ```

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{BundlerError, Result};
use crate::manifest::catalog::FileReference;
use crate::path_utils::{self, clean, declared_dir, escapes_base, is_empty_or_current, relative_to};

/// Compilation strategy for scripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// One `.luac` per `.lua`, mirroring the source layout.
    #[default]
    Individual,
    /// `client.luac` and `server.luac` per resource.
    Merged,
}

/// Resolved bundling target for a whole run. Read-only once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputConfig {
    /// Absolute input path as given: a manifest, a script, or a directory.
    pub input_root: PathBuf,
    /// Directory relative positions are measured from. Equal to `input_root`
    /// for directories, its parent for files.
    pub input_base: PathBuf,
    /// `None` writes alongside the sources.
    pub output_root: Option<PathBuf>,
    pub mode: OutputMode,
}

impl OutputConfig {
    /// Build from user input. Both paths are made absolute against the
    /// current directory; `input` must exist.
    pub fn new(input: &Path, output: Option<&Path>, mode: OutputMode) -> Result<Self> {
        let input_root = path_utils::absolutize(input)?;
        if !input_root.exists() {
            return Err(BundlerError::InputNotFound {
                path: input.display().to_string(),
            });
        }

        let input_base = if input_root.is_file() {
            input_root
                .parent()
                .map_or_else(|| input_root.clone(), Path::to_path_buf)
        } else {
            input_root.clone()
        };

        let output_root = output.map(path_utils::absolutize).transpose()?;

        Ok(OutputConfig {
            input_root,
            input_base,
            output_root,
            mode,
        })
    }
}

/// Compute where the file `relative_path` of the resource in `base_dir` is
/// written, under the name `file_name`.
///
/// 1. `rel_from_input = relative(input_base, base_dir)`
/// 2. `rel_dir = dir_of(relative_path)`
/// 3. `full_relative_dir = rel_from_input / rel_dir`, or just `rel_dir` when
///    `rel_from_input` is empty
/// 4. `output_root / full_relative_dir / file_name`
///
/// Without an output root the result is `base_dir / rel_dir / file_name`.
pub fn resolve_output_path(
    input_base: &Path,
    output_root: Option<&Path>,
    base_dir: &Path,
    relative_path: &str,
    file_name: &str,
) -> Result<PathBuf> {
    let resource_root = resolve_resource_root(input_base, output_root, base_dir)?;
    Ok(place(&resource_root, relative_path, file_name))
}

/// Steps 1 and 3: where the resource directory itself lands.
fn resolve_resource_root(
    input_base: &Path,
    output_root: Option<&Path>,
    base_dir: &Path,
) -> Result<PathBuf> {
    let Some(output_root) = output_root else {
        return Ok(clean(base_dir));
    };

    let failed = |reason: &str| BundlerError::PathResolutionFailed {
        input_root: input_base.display().to_string(),
        base_dir: base_dir.display().to_string(),
        reason: reason.to_string(),
    };

    let rel_from_input =
        relative_to(input_base, base_dir).ok_or_else(|| failed("paths share no common root"))?;
    if escapes_base(&rel_from_input) {
        return Err(failed("resource lies outside the input root"));
    }

    if is_empty_or_current(&rel_from_input) {
        Ok(clean(output_root))
    } else {
        Ok(clean(&output_root.join(rel_from_input)))
    }
}

/// Steps 2 and 4: position inside the resource.
fn place(resource_root: &Path, relative_path: &str, file_name: &str) -> PathBuf {
    let rel_dir = declared_dir(relative_path);
    if rel_dir.as_os_str().is_empty() {
        resource_root.join(file_name)
    } else {
        clean(&resource_root.join(rel_dir).join(file_name))
    }
}

/// Output locations for one resource, with the resource root resolved once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceLayout {
    base_dir: PathBuf,
    output_dir: PathBuf,
}

impl ResourceLayout {
    pub fn new(config: &OutputConfig, base_dir: &Path) -> Result<Self> {
        let output_dir =
            resolve_resource_root(&config.input_base, config.output_root.as_deref(), base_dir)?;
        debug!(
            base_dir = %base_dir.display(),
            output_dir = %output_dir.display(),
            "resolved resource output directory"
        );
        Ok(ResourceLayout {
            base_dir: base_dir.to_path_buf(),
            output_dir,
        })
    }

    /// Directory the resource is written to.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Output happens in place.
    pub fn is_in_place(&self) -> bool {
        self.output_dir == clean(&self.base_dir)
    }

    /// Compiled script (`.luac`) or copied file, depending on the reference.
    pub fn reference_output(&self, reference: &FileReference) -> PathBuf {
        place(
            &self.output_dir,
            &reference.relative_path,
            &reference.output_file_name(),
        )
    }

    /// The rewritten manifest, treated as a root-level reference.
    pub fn manifest_output(&self, manifest_file_name: &str) -> PathBuf {
        place(&self.output_dir, "meta", manifest_file_name)
    }

    /// `client.luac` / `server.luac` at the resource output root.
    pub fn bundle_output(&self, bundle_name: &str) -> PathBuf {
        place(&self.output_dir, bundle_name, bundle_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::catalog::ReferenceCategory;
    use crate::manifest::Audience;

    fn script(base_dir: &str, src: &str) -> FileReference {
        FileReference {
            full_path: Path::new(base_dir).join(src),
            relative_path: src.to_string(),
            category: ReferenceCategory::Script,
            audience: Some(Audience::Server),
        }
    }

    fn config(input_base: &str, output_root: Option<&str>, mode: OutputMode) -> OutputConfig {
        OutputConfig {
            input_root: PathBuf::from(input_base),
            input_base: PathBuf::from(input_base),
            output_root: output_root.map(PathBuf::from),
            mode,
        }
    }

    #[test]
    fn test_in_place_mirrors_source() {
        let path = resolve_output_path(
            Path::new("/resources"),
            None,
            Path::new("/resources/games/race"),
            "client/gui/main.lua",
            "main.luac",
        )
        .unwrap();
        assert_eq!(path, PathBuf::from("/resources/games/race/client/gui/main.luac"));
    }

    #[test]
    fn test_batch_input_keeps_relative_position() {
        let path = resolve_output_path(
            Path::new("/resources"),
            Some(Path::new("/out")),
            Path::new("/resources/games/resource_a"),
            "server.lua",
            "server.luac",
        )
        .unwrap();
        assert_eq!(path, PathBuf::from("/out/games/resource_a/server.luac"));
    }

    #[test]
    fn test_single_manifest_input_collapses_prefix() {
        // input `/resources/games/resource_a/meta.xml` has base `/resources/games/resource_a`
        let path = resolve_output_path(
            Path::new("/resources/games/resource_a"),
            Some(Path::new("/out")),
            Path::new("/resources/games/resource_a"),
            "server.lua",
            "server.luac",
        )
        .unwrap();
        assert_eq!(path, PathBuf::from("/out/server.luac"));
    }

    #[test]
    fn test_nested_reference_under_output_root() {
        let path = resolve_output_path(
            Path::new("/resources"),
            Some(Path::new("/out")),
            Path::new("/resources/race"),
            "images/ui/logo.png",
            "logo.png",
        )
        .unwrap();
        assert_eq!(path, PathBuf::from("/out/race/images/ui/logo.png"));
    }

    #[test]
    fn test_resource_outside_input_root_fails() {
        let result = resolve_output_path(
            Path::new("/resources/games"),
            Some(Path::new("/out")),
            Path::new("/elsewhere/race"),
            "a.lua",
            "a.luac",
        );
        assert!(matches!(result, Err(BundlerError::PathResolutionFailed { .. })));
    }

    #[test]
    fn test_unrelated_roots_fail() {
        let result = resolve_output_path(
            Path::new("relative/input"),
            Some(Path::new("/out")),
            Path::new("/resources/race"),
            "a.lua",
            "a.luac",
        );
        assert!(matches!(result, Err(BundlerError::PathResolutionFailed { .. })));
    }

    #[test]
    fn test_tree_shape_is_preserved() {
        let input_base = Path::new("/resources");
        let output_root = Path::new("/out");
        let base_dir = Path::new("/resources/games/race");
        let refs = [
            script("/resources/games/race", "main.lua"),
            script("/resources/games/race", "client/gui/window.lua"),
            script("/resources/games/race", "./shared/util.lua"),
        ];

        for reference in &refs {
            let output = resolve_output_path(
                input_base,
                Some(output_root),
                base_dir,
                &reference.relative_path,
                &reference.output_file_name(),
            )
            .unwrap();

            let from_output = relative_to(output_root, &output).unwrap();
            let from_input = relative_to(input_base, &reference.full_path).unwrap();
            assert_eq!(from_output.parent(), from_input.parent());
            assert_eq!(
                from_output.file_name().unwrap().to_string_lossy(),
                reference.output_file_name()
            );
        }
    }

    #[test]
    fn test_layout_matches_shared_helper() {
        let config = config("/resources", Some("/out"), OutputMode::Individual);
        let base_dir = Path::new("/resources/games/resource_a");
        let layout = ResourceLayout::new(&config, base_dir).unwrap();
        let reference = script("/resources/games/resource_a", "lib/core.lua");

        let direct = resolve_output_path(
            &config.input_base,
            config.output_root.as_deref(),
            base_dir,
            &reference.relative_path,
            &reference.output_file_name(),
        )
        .unwrap();

        assert_eq!(layout.reference_output(&reference), direct);
        assert_eq!(layout.output_dir(), Path::new("/out/games/resource_a"));
        assert!(!layout.is_in_place());
    }

    #[test]
    fn test_layout_manifest_and_bundles() {
        let config = config("/resources/games/resource_a", Some("/out"), OutputMode::Merged);
        let layout = ResourceLayout::new(&config, Path::new("/resources/games/resource_a")).unwrap();

        assert_eq!(layout.manifest_output("meta.xml"), PathBuf::from("/out/meta.xml"));
        assert_eq!(layout.bundle_output("client.luac"), PathBuf::from("/out/client.luac"));
        assert_eq!(layout.bundle_output("server.luac"), PathBuf::from("/out/server.luac"));
    }

    #[test]
    fn test_layout_in_place() {
        let config = config("/resources", None, OutputMode::Individual);
        let layout = ResourceLayout::new(&config, Path::new("/resources/race")).unwrap();
        assert!(layout.is_in_place());
        assert_eq!(
            layout.manifest_output("meta.xml"),
            PathBuf::from("/resources/race/meta.xml")
        );
    }

    #[test]
    fn test_output_config_for_manifest_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let manifest = temp.path().join("meta.xml");
        std::fs::write(&manifest, "<meta/>").unwrap();

        let config = OutputConfig::new(&manifest, Some(Path::new("out")), OutputMode::Individual)
            .unwrap();
        assert_eq!(config.input_base, dunce::simplified(temp.path()));
        assert!(config.output_root.unwrap().is_absolute());
    }

    #[test]
    fn test_output_config_missing_input() {
        let result = OutputConfig::new(Path::new("/nonexistent/input"), None, OutputMode::Individual);
        assert!(matches!(result, Err(BundlerError::InputNotFound { .. })));
    }
}
