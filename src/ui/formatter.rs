//! Plain-text rendering of bundling results
//!
//! Produces [`Line`]s tagged with a [`LineKind`]; styling is left to the
//! reporter so the text itself stays easy to test.

use std::path::Path;
use std::time::Duration;

use crate::bundler::file_ops::CopyStatus;
use crate::bundler::report::{BatchReport, CompileRecord, ResourceReport};
use crate::compiler::format_size;
use crate::error::BundlerError;
use crate::path_utils::to_forward_slashes;
use crate::resolver::OutputMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Header,
    Info,
    Success,
    Failure,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub kind: LineKind,
    pub text: String,
}

impl Line {
    fn new(kind: LineKind, text: impl Into<String>) -> Self {
        Line {
            kind,
            text: text.into(),
        }
    }
}

/// Full per-resource block: header, copies, compiles, summary.
pub fn resource_lines(report: &ResourceReport) -> Vec<Line> {
    let mut lines = vec![
        Line::new(LineKind::Header, format!("Bundling resource: {}", report.name)),
        Line::new(
            LineKind::Info,
            format!("Base directory: {}", report.base_dir.display()),
        ),
        Line::new(
            LineKind::Info,
            format!("Output directory: {}", report.output_dir.display()),
        ),
    ];

    if !report.copies.is_empty() {
        lines.push(Line::new(
            LineKind::Info,
            format!("  Copying {} non-script file(s)", report.copies.len()),
        ));
        for copy in &report.copies {
            lines.push(match &copy.result {
                Ok(CopyStatus::Copied { .. }) => {
                    Line::new(LineKind::Success, format!("    ✓ Copied {}", copy.relative_path))
                }
                Ok(CopyStatus::Unchanged) => Line::new(
                    LineKind::Info,
                    format!("    - {} unchanged (in place)", copy.relative_path),
                ),
                Err(e) => Line::new(
                    LineKind::Failure,
                    format!("    ✗ Failed to copy {}: {e}", copy.relative_path),
                ),
            });
        }
    }

    if report.compiles.is_empty() {
        lines.push(Line::new(
            LineKind::Warning,
            format!("  Warning: No Lua script files found in resource {}", report.name),
        ));
    } else {
        let scripts: usize = report.compiles.iter().map(|c| c.script_count).sum();
        let header = match report.mode {
            OutputMode::Individual => format!("  Compiling {scripts} Lua script(s)"),
            OutputMode::Merged => format!(
                "  Compiling {scripts} Lua script(s) into {} bundle(s)",
                report.compiles.len()
            ),
        };
        lines.push(Line::new(LineKind::Info, header));
        for record in &report.compiles {
            lines.push(compile_line(record, &report.output_dir));
        }
    }

    let label = match report.mode {
        OutputMode::Individual => "Compilation",
        OutputMode::Merged => "Merge compilation",
    };
    let summary_kind = if report.is_success() {
        LineKind::Success
    } else {
        LineKind::Failure
    };
    lines.push(Line::new(
        summary_kind,
        format!(
            "  {label} completed: {} successful, {} errors",
            report.compile_successes(),
            report.error_count()
        ),
    ));

    let (input, output) = report.size_totals();
    if let Some(reduction) = report.size_reduction() {
        lines.push(Line::new(
            LineKind::Info,
            format!(
                "  Resource size summary: {} → {} ({reduction:.0}% reduction)",
                format_size(input),
                format_size(output)
            ),
        ));
    }
    lines.push(Line::new(
        LineKind::Info,
        format!("  Total time: {}", format_duration(report.elapsed)),
    ));

    lines
}

/// `✓ input -> output (time) [sizes]` or `✗ input: error`.
pub fn compile_line(record: &CompileRecord, output_dir: &Path) -> Line {
    let outcome = &record.outcome;
    if !outcome.success {
        let error = outcome
            .error
            .as_ref()
            .map_or_else(|| "compilation failed".to_string(), ToString::to_string);
        return Line::new(LineKind::Failure, format!("    ✗ {}: {error}", record.label));
    }

    let output = outcome
        .output
        .strip_prefix(output_dir)
        .map_or_else(|_| outcome.output.display().to_string(), to_forward_slashes);

    let sizes = match outcome.size_reduction() {
        Some(reduction) if reduction > 0.0 => format!(
            " [{} → {}, {reduction:.0}% reduction]",
            format_size(outcome.input_size),
            format_size(outcome.output_size)
        ),
        Some(_) => format!(
            " [{} → {}]",
            format_size(outcome.input_size),
            format_size(outcome.output_size)
        ),
        None => String::new(),
    };

    Line::new(
        LineKind::Success,
        format!(
            "    ✓ {} -> {output} ({}){sizes}",
            record.label,
            format_duration(outcome.elapsed)
        ),
    )
}

/// Resource dropped before any output was produced.
pub fn skipped_lines(manifest_path: &Path, error: &BundlerError) -> Vec<Line> {
    vec![
        Line::new(
            LineKind::Failure,
            format!("✗ Skipping {}", manifest_path.display()),
        ),
        Line::new(LineKind::Failure, format!("  {error}")),
    ]
}

pub fn batch_summary(batch: &BatchReport) -> Line {
    let kind = if batch.failed() == 0 {
        LineKind::Success
    } else {
        LineKind::Failure
    };
    Line::new(
        kind,
        format!(
            "Bundled {} resource(s): {} successful, {} with errors, {} skipped",
            batch.total(),
            batch.succeeded(),
            batch.with_errors(),
            batch.skipped()
        ),
    )
}

pub fn format_duration(duration: Duration) -> String {
    format!("{duration:.2?}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::report::CopyOutcome;
    use crate::compiler::CompilationOutcome;
    use crate::manifest::catalog::ReferenceCategory;
    use std::path::PathBuf;

    fn record(label: &str, success: bool) -> CompileRecord {
        CompileRecord {
            label: label.to_string(),
            script_count: 1,
            outcome: CompilationOutcome {
                inputs: vec![PathBuf::from("/r/race/client/gui.lua")],
                output: PathBuf::from("/out/race/client/gui.luac"),
                success,
                elapsed: Duration::from_millis(12),
                error: (!success).then(|| BundlerError::CompilerExited {
                    status: "exit status: 1".to_string(),
                    output: "gui.lua:3: syntax error".to_string(),
                }),
                input_size: 2048,
                output_size: if success { 1024 } else { 0 },
            },
        }
    }

    fn report(records: Vec<CompileRecord>) -> ResourceReport {
        ResourceReport {
            name: "race".to_string(),
            base_dir: PathBuf::from("/r/race"),
            output_dir: PathBuf::from("/out/race"),
            mode: OutputMode::Individual,
            manifest_output: PathBuf::from("/out/race/meta.xml"),
            copies: vec![
                CopyOutcome {
                    relative_path: "logo.png".to_string(),
                    category: ReferenceCategory::Asset,
                    target: PathBuf::from("/out/race/logo.png"),
                    result: Ok(CopyStatus::Copied { bytes: 3 }),
                },
                CopyOutcome {
                    relative_path: "missing.png".to_string(),
                    category: ReferenceCategory::Asset,
                    target: PathBuf::from("/out/race/missing.png"),
                    result: Err(BundlerError::IoError {
                        message: "not found".to_string(),
                    }),
                },
            ],
            compiles: records,
            elapsed: Duration::from_millis(40),
        }
    }

    #[test]
    fn test_compile_line_success() {
        let line = compile_line(&record("client/gui.lua", true), Path::new("/out/race"));
        assert_eq!(line.kind, LineKind::Success);
        assert!(line.text.starts_with("    ✓ client/gui.lua -> client/gui.luac ("));
        assert!(line.text.ends_with("[2.0 KB → 1.0 KB, 50% reduction]"));
    }

    #[test]
    fn test_compile_line_failure() {
        let line = compile_line(&record("client/gui.lua", false), Path::new("/out/race"));
        assert_eq!(line.kind, LineKind::Failure);
        assert!(line.text.contains("✗ client/gui.lua: Compiler exited with exit status: 1"));
    }

    #[test]
    fn test_resource_lines() {
        let lines = resource_lines(&report(vec![record("a.lua", true), record("b.lua", false)]));
        let texts: Vec<_> = lines.iter().map(|l| l.text.as_str()).collect();

        assert_eq!(texts[0], "Bundling resource: race");
        assert!(texts.contains(&"  Copying 2 non-script file(s)"));
        assert!(texts.contains(&"    ✓ Copied logo.png"));
        assert!(texts.contains(&"  Compiling 2 Lua script(s)"));
        assert!(texts.contains(&"  Compilation completed: 1 successful, 2 errors"));
        assert!(texts.iter().any(|t| t.starts_with("  Resource size summary: 2.0 KB → 1.0 KB")));
        assert!(texts.iter().any(|t| t.starts_with("    ✗ Failed to copy missing.png")));
    }

    #[test]
    fn test_resource_without_scripts_warns() {
        let lines = resource_lines(&report(vec![]));
        assert!(lines.iter().any(|l| l.kind == LineKind::Warning
            && l.text == "  Warning: No Lua script files found in resource race"));
    }

    #[test]
    fn test_skipped_lines() {
        let err = BundlerError::ManifestParseFailed {
            path: "/r/x/meta.xml".to_string(),
            reason: "bad".to_string(),
        };
        let lines = skipped_lines(Path::new("/r/x/meta.xml"), &err);
        assert_eq!(lines[0].text, "✗ Skipping /r/x/meta.xml");
        assert!(lines[1].text.contains("Failed to parse manifest"));
    }
}
