//! Resource model
//!
//! A **Resource** is a directory with a `meta.xml` manifest plus every file
//! that manifest declares. It is loaded once per discovered manifest and is
//! immutable afterwards.

pub mod discovery;
pub mod groups;

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{BundlerError, Result};
use crate::manifest::catalog::{self, FileReference};
use crate::manifest::{MANIFEST_FILE_NAME, Manifest};
use crate::path_utils;

#[derive(Debug, Clone)]
pub struct Resource {
    /// Absolute path of the manifest file.
    pub manifest_path: PathBuf,
    /// Directory holding the manifest.
    pub base_dir: PathBuf,
    /// Final segment of `base_dir`.
    pub name: String,
    pub manifest: Manifest,
    /// Catalog of declared files, in catalog order.
    pub files: Vec<FileReference>,
}

impl Resource {
    /// Read, parse and catalog the manifest at `manifest_path`.
    pub fn load(manifest_path: &Path) -> Result<Self> {
        let manifest_path = path_utils::absolutize(manifest_path)?;
        let base_dir = manifest_path
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| BundlerError::ManifestInvalid {
                path: manifest_path.display().to_string(),
                message: "manifest has no parent directory".to_string(),
            })?;
        let name = base_dir
            .file_name()
            .map_or_else(|| base_dir.display().to_string(), |n| n.to_string_lossy().into_owned());

        let manifest = Manifest::load(&manifest_path)?;
        let files = catalog::extract(&manifest, &base_dir);
        debug!(
            resource = %name,
            references = manifest.reference_count(),
            "loaded manifest"
        );

        Ok(Resource {
            manifest_path,
            base_dir,
            name,
            manifest,
            files,
        })
    }

    /// File name of the manifest as found on disk.
    pub fn manifest_file_name(&self) -> String {
        self.manifest_path
            .file_name()
            .map_or_else(|| MANIFEST_FILE_NAME.to_string(), |n| n.to_string_lossy().into_owned())
    }

    /// Scripts the compiler accepts, in declaration order.
    pub fn lua_scripts(&self) -> impl Iterator<Item = &FileReference> {
        self.files.iter().filter(|f| f.is_lua_script())
    }

    /// References copied as-is in individual mode: non-scripts plus scripts
    /// that are not `.lua`.
    pub fn passthrough_files(&self) -> impl Iterator<Item = &FileReference> {
        self.files.iter().filter(|f| !f.is_lua_script())
    }

    /// Non-script references, copied in every mode.
    pub fn asset_files(&self) -> impl Iterator<Item = &FileReference> {
        self.files.iter().filter(|f| !f.category.is_compiled())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::catalog::ReferenceCategory;
    use tempfile::TempDir;

    fn write_resource(dir: &Path, meta: &str) -> PathBuf {
        std::fs::create_dir_all(dir).unwrap();
        let path = dir.join("meta.xml");
        std::fs::write(&path, meta).unwrap();
        path
    }

    #[test]
    fn test_load_resource() {
        let temp = TempDir::new().unwrap();
        let path = write_resource(
            &temp.path().join("race"),
            r#"<meta>
                <script src="main.lua" type="server"/>
                <script src="lib.luac" type="client"/>
                <file src="logo.png"/>
            </meta>"#,
        );

        let resource = Resource::load(&path).unwrap();
        assert_eq!(resource.name, "race");
        assert_eq!(resource.base_dir, dunce::simplified(&temp.path().join("race")));
        assert_eq!(resource.manifest_file_name(), "meta.xml");
        assert_eq!(resource.files.len(), 3);

        assert_eq!(resource.lua_scripts().count(), 1);
        let passthrough: Vec<_> = resource.passthrough_files().map(|f| f.relative_path.as_str()).collect();
        assert_eq!(passthrough, vec!["lib.luac", "logo.png"]);
        let assets: Vec<_> = resource.asset_files().map(|f| f.category).collect();
        assert_eq!(assets, vec![ReferenceCategory::Asset]);
    }

    #[test]
    fn test_load_unreadable_manifest() {
        let temp = TempDir::new().unwrap();
        let result = Resource::load(&temp.path().join("missing/meta.xml"));
        assert!(matches!(result, Err(BundlerError::ManifestReadFailed { .. })));
    }

    #[test]
    fn test_load_unparsable_manifest() {
        let temp = TempDir::new().unwrap();
        let path = write_resource(temp.path(), "<meta><script></meta>");
        let result = Resource::load(&path);
        assert!(matches!(result, Err(BundlerError::ManifestParseFailed { .. })));
    }
}
