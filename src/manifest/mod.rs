//! `meta.xml` manifest model
//!
//! Only the file-referencing direct children of `<meta>` are modeled:
//! `script`, `map`, `file`, `config` and `html`. Everything else (info,
//! includes, exports, settings, comments) is left in the source text, which
//! the manifest keeps verbatim so that [`rewrite`] can edit it by byte span.

pub mod catalog;
pub mod rewrite;

use std::fs;
use std::ops::Range;
use std::path::Path;

use roxmltree::{Document, Node};

use crate::error::{BundlerError, Result};

/// Name of the manifest root element.
pub const ROOT_ELEMENT: &str = "meta";

/// Conventional manifest file name.
pub const MANIFEST_FILE_NAME: &str = "meta.xml";

/// Declared execution target of a script (`type` attribute).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Audience {
    Client,
    Server,
    Shared,
    /// Missing, empty or unrecognised `type`.
    Unspecified,
}

impl Audience {
    /// Map a declared `type` attribute to an audience, ignoring ASCII case.
    pub fn from_declared(value: Option<&str>) -> Self {
        match value.map(str::to_ascii_lowercase).as_deref() {
            Some("client") => Audience::Client,
            Some("server") => Audience::Server,
            Some("shared") => Audience::Shared,
            _ => Audience::Unspecified,
        }
    }
}

impl std::fmt::Display for Audience {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Audience::Client => "client",
            Audience::Server => "server",
            Audience::Shared => "shared",
            Audience::Unspecified => "unspecified",
        };
        f.write_str(name)
    }
}

/// `<script src type cache validate>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptElement {
    pub src: String,
    pub script_type: Option<String>,
    pub cache: Option<String>,
    pub validate: Option<String>,
    pub(crate) span: Range<usize>,
}

impl ScriptElement {
    pub fn audience(&self) -> Audience {
        Audience::from_declared(self.script_type.as_deref())
    }
}

/// `<map src dimension>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapElement {
    pub src: String,
    pub dimension: Option<String>,
}

/// `<file src download>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileElement {
    pub src: String,
    pub download: Option<String>,
}

/// `<config src type>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigElement {
    pub src: String,
    pub config_type: Option<String>,
}

/// `<html src default raw>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlElement {
    pub src: String,
    pub default: Option<String>,
    pub raw: Option<String>,
}

/// Location of the `<meta>` element in the source text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct RootSpan {
    /// Whole element, start tag through end tag.
    pub range: Range<usize>,
    /// `<meta/>` with no end tag.
    pub self_closing: bool,
}

/// A parsed manifest together with the text it was parsed from.
#[derive(Debug, Clone)]
pub struct Manifest {
    text: String,
    root: RootSpan,
    /// Every `<script>` child, including ones without a usable `src`.
    script_spans: Vec<Range<usize>>,
    pub scripts: Vec<ScriptElement>,
    pub maps: Vec<MapElement>,
    pub files: Vec<FileElement>,
    pub configs: Vec<ConfigElement>,
    pub html: Vec<HtmlElement>,
}

impl Manifest {
    /// Read and parse a manifest file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| BundlerError::ManifestReadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::parse(text, path)
    }

    /// Parse manifest text. `path` is only used for error messages.
    pub fn parse(text: String, path: &Path) -> Result<Self> {
        let parsed = {
            let document =
                Document::parse(&text).map_err(|e| BundlerError::ManifestParseFailed {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                })?;
            Parsed::from_document(&document, &text, path)?
        };

        Ok(Manifest {
            text,
            root: parsed.root,
            script_spans: parsed.script_spans,
            scripts: parsed.scripts,
            maps: parsed.maps,
            files: parsed.files,
            configs: parsed.configs,
            html: parsed.html,
        })
    }

    /// The manifest exactly as read.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub(crate) fn root(&self) -> &RootSpan {
        &self.root
    }

    pub(crate) fn script_spans(&self) -> &[Range<usize>] {
        &self.script_spans
    }

    /// Total number of modeled elements with a usable `src`.
    pub fn reference_count(&self) -> usize {
        self.scripts.len() + self.maps.len() + self.files.len() + self.configs.len() + self.html.len()
    }
}

/// Owned extraction result, built while the borrowed document is alive.
#[derive(Default)]
struct Parsed {
    root: RootSpan,
    script_spans: Vec<Range<usize>>,
    scripts: Vec<ScriptElement>,
    maps: Vec<MapElement>,
    files: Vec<FileElement>,
    configs: Vec<ConfigElement>,
    html: Vec<HtmlElement>,
}

impl Parsed {
    fn from_document(document: &Document<'_>, text: &str, path: &Path) -> Result<Self> {
        let root = document.root_element();
        if root.tag_name().name() != ROOT_ELEMENT {
            return Err(BundlerError::ManifestInvalid {
                path: path.display().to_string(),
                message: format!(
                    "root element is <{}>, expected <{ROOT_ELEMENT}>",
                    root.tag_name().name()
                ),
            });
        }

        let range = root.range();
        let self_closing = text[range.clone()].ends_with("/>");
        let mut parsed = Parsed {
            root: RootSpan {
                range,
                self_closing,
            },
            ..Parsed::default()
        };

        for node in root.children().filter(Node::is_element) {
            if node.tag_name().name() == "script" {
                parsed.script_spans.push(node.range());
            }

            let Some(src) = declared_src(&node, path)? else {
                continue;
            };

            match node.tag_name().name() {
                "script" => parsed.scripts.push(ScriptElement {
                    src,
                    script_type: attr(&node, "type"),
                    cache: attr(&node, "cache"),
                    validate: attr(&node, "validate"),
                    span: node.range(),
                }),
                "map" => parsed.maps.push(MapElement {
                    src,
                    dimension: attr(&node, "dimension"),
                }),
                "file" => parsed.files.push(FileElement {
                    src,
                    download: attr(&node, "download"),
                }),
                "config" => parsed.configs.push(ConfigElement {
                    src,
                    config_type: attr(&node, "type"),
                }),
                "html" => parsed.html.push(HtmlElement {
                    src,
                    default: attr(&node, "default"),
                    raw: attr(&node, "raw"),
                }),
                _ => {}
            }
        }

        Ok(parsed)
    }
}

fn attr(node: &Node<'_, '_>, name: &str) -> Option<String> {
    node.attribute(name).map(str::to_string)
}

/// The `src` of a file-referencing element, or `None` when the element is not
/// file-referencing or its `src` is missing or blank.
fn declared_src(node: &Node<'_, '_>, path: &Path) -> Result<Option<String>> {
    if !matches!(
        node.tag_name().name(),
        "script" | "map" | "file" | "config" | "html"
    ) {
        return Ok(None);
    }

    let Some(src) = node.attribute("src") else {
        return Ok(None);
    };
    if src.trim().is_empty() {
        return Ok(None);
    }

    if is_rooted(src) {
        return Err(BundlerError::ManifestInvalid {
            path: path.display().to_string(),
            message: format!("<{}> src '{src}' must be relative to the resource", node.tag_name().name()),
        });
    }
    if crate::path_utils::escapes_base(&crate::path_utils::clean(Path::new(&src.replace('\\', "/")))) {
        return Err(BundlerError::ManifestInvalid {
            path: path.display().to_string(),
            message: format!("<{}> src '{src}' points outside the resource", node.tag_name().name()),
        });
    }

    Ok(Some(src.to_string()))
}

/// Absolute on any platform: leading separator or a drive letter.
fn is_rooted(src: &str) -> bool {
    let bytes = src.as_bytes();
    src.starts_with(['/', '\\'])
        || (bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':')
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const SAMPLE: &str = r#"<meta>
    <info author="someone" type="gamemode" name="Race" />
    <!-- core scripts -->
    <script src="server/main.lua" type="server" />
    <script src="client/gui.lua" type="client" cache="false" />
    <script src="shared/util.lua" type="shared" />
    <script src="legacy.lua" />
    <map src="maps/arena.map" dimension="1" />
    <file src="images/logo.png" />
    <config src="settings.xml" type="server" />
    <html src="web/index.htm" default="true" />
    <include resource="scoreboard" />
    <export function="getScore" type="server" />
</meta>
"#;

    pub(crate) fn parse(text: &str) -> Manifest {
        Manifest::parse(text.to_string(), Path::new("meta.xml")).unwrap()
    }

    #[test]
    fn test_parse_models_file_referencing_elements() {
        let manifest = parse(SAMPLE);

        assert_eq!(manifest.scripts.len(), 4);
        assert_eq!(manifest.maps.len(), 1);
        assert_eq!(manifest.files.len(), 1);
        assert_eq!(manifest.configs.len(), 1);
        assert_eq!(manifest.html.len(), 1);
        assert_eq!(manifest.reference_count(), 8);

        assert_eq!(manifest.scripts[0].src, "server/main.lua");
        assert_eq!(manifest.scripts[1].cache.as_deref(), Some("false"));
        assert_eq!(manifest.maps[0].dimension.as_deref(), Some("1"));
        assert_eq!(manifest.configs[0].config_type.as_deref(), Some("server"));
        assert_eq!(manifest.html[0].default.as_deref(), Some("true"));
    }

    #[test]
    fn test_script_audience() {
        let manifest = parse(SAMPLE);
        let audiences: Vec<_> = manifest.scripts.iter().map(ScriptElement::audience).collect();
        assert_eq!(
            audiences,
            vec![
                Audience::Server,
                Audience::Client,
                Audience::Shared,
                Audience::Unspecified
            ]
        );
    }

    #[test]
    fn test_script_span_covers_element() {
        let manifest = parse(SAMPLE);
        let span = manifest.scripts[0].span.clone();
        assert_eq!(
            &manifest.text()[span],
            r#"<script src="server/main.lua" type="server" />"#
        );
    }

    #[test]
    fn test_text_is_kept_verbatim() {
        let manifest = parse(SAMPLE);
        assert_eq!(manifest.text(), SAMPLE);
        assert!(!manifest.root().self_closing);
    }

    #[test]
    fn test_empty_and_missing_src_are_skipped() {
        let manifest = parse(r#"<meta><script src="" /><file /><script src="a.lua"/></meta>"#);
        assert_eq!(manifest.scripts.len(), 1);
        assert_eq!(manifest.script_spans().len(), 2);
        assert!(manifest.files.is_empty());
    }

    #[test]
    fn test_nested_elements_are_ignored() {
        let manifest = parse(r#"<meta><group><script src="nested.lua"/></group></meta>"#);
        assert!(manifest.scripts.is_empty());
    }

    #[test]
    fn test_self_closing_root() {
        let manifest = parse("<meta />");
        assert!(manifest.root().self_closing);
        assert_eq!(manifest.reference_count(), 0);
    }

    #[test]
    fn test_wrong_root_is_invalid() {
        let result = Manifest::parse("<resource/>".to_string(), Path::new("meta.xml"));
        assert!(matches!(result, Err(BundlerError::ManifestInvalid { .. })));
    }

    #[test]
    fn test_malformed_xml_fails_to_parse() {
        let result = Manifest::parse("<meta><script src=\"a.lua\">".to_string(), Path::new("meta.xml"));
        assert!(matches!(result, Err(BundlerError::ManifestParseFailed { .. })));
    }

    #[test]
    fn test_absolute_src_is_invalid() {
        for src in ["/etc/passwd", "C:\\scripts\\a.lua", "\\share\\a.lua"] {
            let text = format!(r#"<meta><file src="{src}"/></meta>"#);
            let result = Manifest::parse(text, Path::new("meta.xml"));
            assert!(
                matches!(result, Err(BundlerError::ManifestInvalid { .. })),
                "{src} should be rejected"
            );
        }
    }

    #[test]
    fn test_escaping_src_is_invalid() {
        let result = Manifest::parse(
            r#"<meta><file src="../other/logo.png"/></meta>"#.to_string(),
            Path::new("meta.xml"),
        );
        assert!(matches!(result, Err(BundlerError::ManifestInvalid { .. })));
    }

    #[test]
    fn test_load_missing_file() {
        let result = Manifest::load(Path::new("/nonexistent/meta.xml"));
        assert!(matches!(result, Err(BundlerError::ManifestReadFailed { .. })));
    }
}
