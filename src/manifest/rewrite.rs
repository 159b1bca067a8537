//! Manifest rewriting
//!
//! Both modes are expressed as a list of [`Edit`]s over the original manifest
//! text. Bytes outside the edited spans are copied through untouched, so
//! comments, formatting and elements this crate does not model survive as-is.
//! Every rewrite is re-parsed before it is returned; a result that does not
//! describe the expected scripts is rejected instead of written.

use std::ops::Range;
use std::path::Path;

use super::Manifest;
use crate::error::{BundlerError, Result};
use crate::path_utils::{LUA_EXTENSION, LUAC_EXTENSION, has_lua_extension, to_luac_name};

/// Merged client artifact name.
pub const CLIENT_BUNDLE: &str = "client.luac";

/// Merged server artifact name.
pub const SERVER_BUNDLE: &str = "server.luac";

const DEFAULT_INDENT: &str = "    ";

/// Which merged script entries the rewritten manifest declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MergedTargets {
    pub client: bool,
    pub server: bool,
}

impl MergedTargets {
    fn entries(self) -> Vec<(&'static str, &'static str)> {
        let mut entries = Vec::new();
        if self.client {
            entries.push((CLIENT_BUNDLE, "client"));
        }
        if self.server {
            entries.push((SERVER_BUNDLE, "server"));
        }
        entries
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Edit {
    Replace { range: Range<usize>, with: String },
    Delete(Range<usize>),
    Insert { at: usize, text: String },
}

impl Edit {
    fn span(&self) -> (usize, usize) {
        match self {
            Edit::Replace { range, .. } | Edit::Delete(range) => (range.start, range.end),
            Edit::Insert { at, .. } => (*at, *at),
        }
    }
}

/// Individual mode: `.lua` becomes `.luac` at the end of every script `src`.
///
/// Scripts whose `src` does not end in `.lua` are left alone, which makes the
/// rewrite idempotent.
pub fn rewrite_individual(manifest: &Manifest, path: &Path) -> Result<String> {
    let text = manifest.text();
    let mut edits = Vec::new();

    for script in manifest.scripts.iter().filter(|s| has_lua_extension(&s.src)) {
        let value = src_value_range(text, &script.span).ok_or_else(|| {
            BundlerError::rewrite_failed(
                path,
                format!("cannot locate the src attribute of <script src=\"{}\">", script.src),
            )
        })?;

        // `.lu&#97;` and friends decode to `.lua` but cannot be edited in place
        if !has_lua_extension(&text[value.clone()]) {
            return Err(BundlerError::rewrite_failed(
                path,
                format!("src \"{}\" ends in a character reference", script.src),
            ));
        }

        edits.push(Edit::Replace {
            range: value.end - LUA_EXTENSION.len()..value.end,
            with: LUAC_EXTENSION.to_string(),
        });
    }

    let output = apply(text, edits, path)?;

    let expected: Vec<String> = manifest.scripts.iter().map(|s| to_luac_name(&s.src)).collect();
    verify(manifest, &output, &expected, path)?;
    Ok(output)
}

/// Merged mode: drop every `<script>` and declare the merged bundles instead.
///
/// The client entry precedes the server entry. Nothing is inserted for a
/// target that is not requested.
pub fn rewrite_merged(manifest: &Manifest, targets: MergedTargets, path: &Path) -> Result<String> {
    let text = manifest.text();
    let newline = if text.contains("\r\n") { "\r\n" } else { "\n" };
    let indent = detect_indent(text, manifest);

    let mut edits: Vec<Edit> = manifest
        .script_spans()
        .iter()
        .map(|span| Edit::Delete(own_line(text, span)))
        .collect();

    let entries = targets.entries();
    if !entries.is_empty() {
        let lines: Vec<String> = entries
            .iter()
            .map(|(src, audience)| {
                format!(r#"{indent}<script src="{src}" type="{audience}" cache="true" />"#)
            })
            .collect();
        edits.push(insertion(text, manifest, &lines, newline, path)?);
    }

    let output = apply(text, edits, path)?;

    let expected: Vec<String> = entries.iter().map(|(src, _)| (*src).to_string()).collect();
    verify(manifest, &output, &expected, path)?;
    Ok(output)
}

/// Where and what to insert so the new lines close out `<meta>`.
fn insertion(
    text: &str,
    manifest: &Manifest,
    lines: &[String],
    newline: &str,
    path: &Path,
) -> Result<Edit> {
    let root = &manifest.root().range;

    if manifest.root().self_closing {
        // `<meta ... />` becomes `<meta ...>` + lines + `</meta>`
        let slash = root.end - 2;
        let start = root.start + text[root.start..slash].trim_end().len();
        let mut with = format!(">{newline}");
        for line in lines {
            with.push_str(line);
            with.push_str(newline);
        }
        with.push_str("</meta>");
        return Ok(Edit::Replace {
            range: start..root.end,
            with,
        });
    }

    let close = text[root.clone()]
        .rfind("</")
        .map(|offset| root.start + offset)
        .ok_or_else(|| BundlerError::rewrite_failed(path, "cannot locate </meta>"))?;

    let line_start = line_start(text, close);
    if is_blank(&text[line_start..close]) {
        let mut block = String::new();
        for line in lines {
            block.push_str(line);
            block.push_str(newline);
        }
        Ok(Edit::Insert {
            at: line_start,
            text: block,
        })
    } else {
        let mut block = String::new();
        for line in lines {
            block.push_str(newline);
            block.push_str(line);
        }
        block.push_str(newline);
        Ok(Edit::Insert {
            at: close,
            text: block,
        })
    }
}

fn apply(text: &str, mut edits: Vec<Edit>, path: &Path) -> Result<String> {
    edits.sort_by_key(Edit::span);

    let mut output = String::with_capacity(text.len() + 128);
    let mut cursor = 0;
    for edit in edits {
        let (start, end) = edit.span();
        if start < cursor {
            return Err(BundlerError::rewrite_failed(
                path,
                format!("overlapping edits at byte {start}"),
            ));
        }
        output.push_str(&text[cursor..start]);
        match edit {
            Edit::Replace { with, .. } => output.push_str(&with),
            Edit::Delete(_) => {}
            Edit::Insert { text: inserted, .. } => output.push_str(&inserted),
        }
        cursor = end;
    }
    output.push_str(&text[cursor..]);

    Ok(output)
}

/// Re-parse the rewrite and check it declares exactly `expected_scripts` while
/// every other modeled element is unchanged.
fn verify(original: &Manifest, output: &str, expected_scripts: &[String], path: &Path) -> Result<()> {
    let rewritten = Manifest::parse(output.to_string(), path)
        .map_err(|e| BundlerError::rewrite_failed(path, format!("rewritten manifest is invalid: {e}")))?;

    let scripts: Vec<&str> = rewritten.scripts.iter().map(|s| s.src.as_str()).collect();
    if scripts != expected_scripts {
        return Err(BundlerError::rewrite_failed(
            path,
            format!("expected scripts {expected_scripts:?}, rewrite declares {scripts:?}"),
        ));
    }

    if rewritten.maps != original.maps
        || rewritten.files != original.files
        || rewritten.configs != original.configs
        || rewritten.html != original.html
    {
        return Err(BundlerError::rewrite_failed(
            path,
            "rewrite altered non-script references",
        ));
    }

    Ok(())
}

/// Byte range of the `src` value inside a start tag, quotes excluded.
///
/// Scans the raw markup because the parsed attribute value has entities
/// decoded and cannot be mapped back onto the text.
fn src_value_range(text: &str, element: &Range<usize>) -> Option<Range<usize>> {
    let tag = &text[element.clone()];
    let bytes = tag.as_bytes();
    let len = bytes.len();
    let is_space = |b: u8| matches!(b, b' ' | b'\t' | b'\r' | b'\n');

    // element name
    let mut i = 1;
    while i < len && !is_space(bytes[i]) && bytes[i] != b'/' && bytes[i] != b'>' {
        i += 1;
    }

    loop {
        while i < len && is_space(bytes[i]) {
            i += 1;
        }
        if i >= len || bytes[i] == b'/' || bytes[i] == b'>' {
            return None;
        }

        let name_start = i;
        while i < len && !is_space(bytes[i]) && bytes[i] != b'=' {
            i += 1;
        }
        let name = &tag[name_start..i];

        while i < len && is_space(bytes[i]) {
            i += 1;
        }
        if bytes.get(i) != Some(&b'=') {
            return None;
        }
        i += 1;
        while i < len && is_space(bytes[i]) {
            i += 1;
        }

        let quote = *bytes.get(i)?;
        if quote != b'"' && quote != b'\'' {
            return None;
        }
        let value_start = i + 1;
        let value_end = value_start + tag[value_start..].find(char::from(quote))?;

        if name == "src" {
            return Some(element.start + value_start..element.start + value_end);
        }
        i = value_end + 1;
    }
}

/// Widen an element span to its whole line when it is alone on that line.
fn own_line(text: &str, span: &Range<usize>) -> Range<usize> {
    let start = line_start(text, span.start);
    if !is_blank(&text[start..span.start]) {
        return span.clone();
    }

    let rest = &text[span.end..];
    match rest.find('\n') {
        Some(newline) if is_blank(&rest[..newline]) => start..span.end + newline + 1,
        _ => span.clone(),
    }
}

fn line_start(text: &str, at: usize) -> usize {
    text[..at].rfind('\n').map_or(0, |i| i + 1)
}

fn is_blank(s: &str) -> bool {
    s.chars().all(|c| matches!(c, ' ' | '\t' | '\r'))
}

/// Indentation of the first script line, or four spaces.
fn detect_indent<'a>(text: &'a str, manifest: &Manifest) -> &'a str {
    manifest
        .script_spans()
        .first()
        .map(|span| &text[line_start(text, span.start)..span.start])
        .filter(|prefix| !prefix.is_empty() && is_blank(prefix))
        .unwrap_or(DEFAULT_INDENT)
}
