//! Reference catalog: every file a manifest declares, as a flat list
//!
//! Categories are emitted in a fixed sequence (scripts, maps, configs, files,
//! html) and each category keeps document order. Nothing here touches the
//! filesystem.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::{Audience, Manifest};
use crate::path_utils::{clean, declared_dir, declared_file_name, has_lua_extension, to_luac_name};

/// Kind of manifest element a reference came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceCategory {
    Script,
    Map,
    Config,
    /// `<file>` elements
    #[serde(rename = "file")]
    Asset,
    Html,
}

impl ReferenceCategory {
    /// Only scripts go through the compiler; everything else is copied.
    pub fn is_compiled(self) -> bool {
        self == ReferenceCategory::Script
    }
}

impl fmt::Display for ReferenceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReferenceCategory::Script => "script",
            ReferenceCategory::Map => "map",
            ReferenceCategory::Config => "config",
            ReferenceCategory::Asset => "file",
            ReferenceCategory::Html => "html",
        };
        f.write_str(name)
    }
}

/// A single file declared by a manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReference {
    /// Declared path joined onto the resource base directory.
    pub full_path: PathBuf,
    /// `src` exactly as declared.
    pub relative_path: String,
    pub category: ReferenceCategory,
    /// Set for scripts only.
    pub audience: Option<Audience>,
}

impl FileReference {
    fn new(base_dir: &Path, src: &str, category: ReferenceCategory, audience: Option<Audience>) -> Self {
        let full_path = clean(&base_dir.join(declared_dir(src)).join(declared_file_name(src)));
        FileReference {
            full_path,
            relative_path: src.to_string(),
            category,
            audience,
        }
    }

    /// A script the compiler accepts (`.lua`, any case).
    pub fn is_lua_script(&self) -> bool {
        self.category == ReferenceCategory::Script && has_lua_extension(&self.relative_path)
    }

    pub fn file_name(&self) -> &str {
        declared_file_name(&self.relative_path)
    }

    /// Name of the produced artifact: `.luac` for Lua scripts, unchanged otherwise.
    pub fn output_file_name(&self) -> String {
        if self.is_lua_script() {
            to_luac_name(self.file_name())
        } else {
            self.file_name().to_string()
        }
    }
}

/// Build the catalog for a manifest living in `base_dir`.
pub fn extract(manifest: &Manifest, base_dir: &Path) -> Vec<FileReference> {
    let scripts = manifest.scripts.iter().map(|s| {
        FileReference::new(base_dir, &s.src, ReferenceCategory::Script, Some(s.audience()))
    });
    let maps = manifest
        .maps
        .iter()
        .map(|m| FileReference::new(base_dir, &m.src, ReferenceCategory::Map, None));
    let configs = manifest
        .configs
        .iter()
        .map(|c| FileReference::new(base_dir, &c.src, ReferenceCategory::Config, None));
    let assets = manifest
        .files
        .iter()
        .map(|f| FileReference::new(base_dir, &f.src, ReferenceCategory::Asset, None));
    let html = manifest
        .html
        .iter()
        .map(|h| FileReference::new(base_dir, &h.src, ReferenceCategory::Html, None));

    scripts.chain(maps).chain(configs).chain(assets).chain(html).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::tests::{SAMPLE, parse};

    #[test]
    fn test_extract_orders_categories() {
        let manifest = parse(SAMPLE);
        let refs = extract(&manifest, Path::new("/resources/race"));

        let categories: Vec<_> = refs.iter().map(|r| r.category).collect();
        assert_eq!(
            categories,
            vec![
                ReferenceCategory::Script,
                ReferenceCategory::Script,
                ReferenceCategory::Script,
                ReferenceCategory::Script,
                ReferenceCategory::Map,
                ReferenceCategory::Config,
                ReferenceCategory::Asset,
                ReferenceCategory::Html,
            ]
        );
    }

    #[test]
    fn test_extract_keeps_document_order_within_category() {
        let manifest = parse(
            r#"<meta>
                <file src="b.png"/>
                <script src="z.lua"/>
                <file src="a.png"/>
                <script src="a.lua"/>
            </meta>"#,
        );
        let refs = extract(&manifest, Path::new("/r"));
        let paths: Vec<_> = refs.iter().map(|r| r.relative_path.as_str()).collect();
        assert_eq!(paths, vec!["z.lua", "a.lua", "b.png", "a.png"]);
    }

    #[test]
    fn test_full_path_joins_base_dir() {
        let manifest = parse(SAMPLE);
        let refs = extract(&manifest, Path::new("/resources/race"));
        assert_eq!(refs[0].full_path, PathBuf::from("/resources/race/server/main.lua"));
        assert_eq!(refs[0].relative_path, "server/main.lua");
        assert_eq!(refs[0].audience, Some(Audience::Server));
        assert_eq!(refs[4].audience, None);
    }

    #[test]
    fn test_output_file_name() {
        let manifest = parse(
            r#"<meta><script src="c/Main.LUA"/><script src="pre.luac"/><file src="x/logo.png"/></meta>"#,
        );
        let refs = extract(&manifest, Path::new("/r"));
        assert_eq!(refs[0].output_file_name(), "Main.luac");
        assert!(refs[0].is_lua_script());
        assert_eq!(refs[1].output_file_name(), "pre.luac");
        assert!(!refs[1].is_lua_script());
        assert_eq!(refs[2].output_file_name(), "logo.png");
    }

    #[test]
    fn test_category_display() {
        assert_eq!(ReferenceCategory::Asset.to_string(), "file");
        assert!(ReferenceCategory::Script.is_compiled());
        assert!(!ReferenceCategory::Html.is_compiled());
    }
}
