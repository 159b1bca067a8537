//! Command helper utilities

use std::path::{Path, PathBuf};

use crate::config::ProjectConfig;
use crate::error::Result;
use crate::path_utils;
use crate::resolver::OutputConfig;
use crate::resource::discovery::{self, DiscoveryOptions, InputKind};

/// Directory the input lives in: the input itself for directories, its
/// parent for files. Absolute.
pub fn input_dir(input: &Path) -> Result<PathBuf> {
    let input = path_utils::absolutize(input)?;
    if input.is_dir() {
        return Ok(input);
    }
    Ok(input.parent().map_or_else(|| input.clone(), Path::to_path_buf))
}

/// Classify `input` and load the project configuration that applies to it.
pub fn load_project(input: &Path, config: Option<&Path>) -> Result<(InputKind, ProjectConfig)> {
    let kind = discovery::classify(input)?;
    let project = ProjectConfig::discover(config, &input_dir(input)?)?;
    Ok((kind, project))
}

/// Manifests to process for a manifest or directory input. The output root
/// is never searched.
pub fn manifests_for(kind: &InputKind, output: &OutputConfig, exclude: &[String]) -> Result<Vec<PathBuf>> {
    match kind {
        InputKind::Directory(_) => discovery::discover_manifests(
            &output.input_root,
            &DiscoveryOptions {
                exclude,
                skip_dir: output.output_root.as_deref(),
            },
        ),
        InputKind::Manifest(_) | InputKind::Script(_) => Ok(vec![output.input_root.clone()]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::OutputMode;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_input_dir() {
        let temp = TempDir::new().unwrap();
        let base = path_utils::absolutize(temp.path()).unwrap();
        let manifest = temp.path().join("meta.xml");
        fs::write(&manifest, "<meta/>").unwrap();

        assert_eq!(input_dir(temp.path()).unwrap(), base);
        assert_eq!(input_dir(&manifest).unwrap(), base);
    }

    #[test]
    fn test_load_project_reads_config_next_to_input() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("meta.xml"), "<meta/>").unwrap();
        fs::write(temp.path().join("mta-bundler.yaml"), "merge: true\n").unwrap();

        let (kind, project) = load_project(&temp.path().join("meta.xml"), None).unwrap();
        assert!(matches!(kind, InputKind::Manifest(_)));
        assert!(project.merge);
    }

    #[test]
    fn test_manifests_for_directory_skips_output_root() {
        let temp = TempDir::new().unwrap();
        for dir in ["race", "dist/race"] {
            fs::create_dir_all(temp.path().join(dir)).unwrap();
            fs::write(temp.path().join(dir).join("meta.xml"), "<meta/>").unwrap();
        }

        let output = OutputConfig::new(temp.path(), Some(&temp.path().join("dist")), OutputMode::Individual).unwrap();
        let kind = discovery::classify(&output.input_root).unwrap();
        let manifests = manifests_for(&kind, &output, &[]).unwrap();
        assert_eq!(manifests, vec![output.input_root.join("race/meta.xml")]);
    }
}
