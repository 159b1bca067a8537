//! UI/Progress presentation layer
//!
//! All user-facing output of a bundling run goes through the [`Reporter`]
//! trait so `--quiet` and tests can swap in [`SilentReporter`].
//! [`ConsoleReporter`] prints styled lines and, for batches on a terminal,
//! keeps an indicatif progress bar below them.

pub mod formatter;

use std::path::Path;

use console::{Style, Term};
use indicatif::{ProgressBar, ProgressStyle};

use crate::bundler::report::{BatchReport, CompileRecord, ResourceResult};
use formatter::{Line, LineKind};

/// Receives bundling events in processing order.
pub trait Reporter {
    fn batch_started(&mut self, total: usize);

    fn resource_started(&mut self, manifest_path: &Path, index: usize, total: usize);

    fn resource_finished(&mut self, result: &ResourceResult);

    /// A lone script compiled without a manifest.
    fn script_finished(&mut self, record: &CompileRecord, output_dir: &Path);

    fn batch_finished(&mut self, batch: &BatchReport);
}

/// Discards everything.
#[derive(Debug, Default)]
pub struct SilentReporter;

impl Reporter for SilentReporter {
    fn batch_started(&mut self, _total: usize) {}

    fn resource_started(&mut self, _manifest_path: &Path, _index: usize, _total: usize) {}

    fn resource_finished(&mut self, _result: &ResourceResult) {}

    fn script_finished(&mut self, _record: &CompileRecord, _output_dir: &Path) {}

    fn batch_finished(&mut self, _batch: &BatchReport) {}
}

/// Styled terminal output.
pub struct ConsoleReporter {
    bar: Option<ProgressBar>,
    interactive: bool,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        ConsoleReporter {
            bar: None,
            interactive: Term::stdout().is_term(),
        }
    }

    fn print(&self, line: &Line) {
        let style = match line.kind {
            LineKind::Header => Style::new().bold(),
            LineKind::Info => Style::new(),
            LineKind::Success => Style::new().green(),
            LineKind::Failure => Style::new().red(),
            LineKind::Warning => Style::new().yellow(),
        };
        let text = style.apply_to(&line.text).to_string();

        match &self.bar {
            Some(bar) if !bar.is_hidden() => bar.println(text),
            _ => println!("{text}"),
        }
    }

    fn print_all(&self, lines: &[Line]) {
        for line in lines {
            self.print(line);
        }
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Reporter for ConsoleReporter {
    fn batch_started(&mut self, total: usize) {
        self.print(&Line {
            kind: LineKind::Info,
            text: format!("Found {total} meta.xml file(s) to process"),
        });

        if self.interactive && total > 1 {
            let bar = ProgressBar::new(u64::try_from(total).unwrap_or(u64::MAX));
            if let Ok(style) = ProgressStyle::default_bar().template("[{bar:40.cyan/blue}] {pos}/{len} {msg}") {
                bar.set_style(style.progress_chars("#>-"));
            }
            self.bar = Some(bar);
        }
    }

    fn resource_started(&mut self, manifest_path: &Path, index: usize, total: usize) {
        if let Some(bar) = &self.bar {
            bar.set_message(manifest_path.display().to_string());
        }
        self.print(&Line {
            kind: LineKind::Info,
            text: format!("\n[{index}/{total}] Processing: {}", manifest_path.display()),
        });
    }

    fn resource_finished(&mut self, result: &ResourceResult) {
        match &result.outcome {
            Ok(report) => self.print_all(&formatter::resource_lines(report)),
            Err(e) => self.print_all(&formatter::skipped_lines(&result.manifest_path, e)),
        }
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
    }

    fn script_finished(&mut self, record: &CompileRecord, output_dir: &Path) {
        self.print(&formatter::compile_line(record, output_dir));
    }

    fn batch_finished(&mut self, batch: &BatchReport) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
        self.print(&Line {
            kind: LineKind::Info,
            text: String::new(),
        });
        self.print(&formatter::batch_summary(batch));
    }
}
