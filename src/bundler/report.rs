//! Result aggregation for resources and batches
//!
//! Workers hand back plain values; counts and totals are derived here after
//! the fact rather than tracked in shared counters.

use std::path::PathBuf;
use std::time::Duration;

use super::file_ops::CopyStatus;
use crate::compiler::{CompilationOutcome, size_reduction};
use crate::error::{BundlerError, Result};
use crate::manifest::catalog::ReferenceCategory;
use crate::resolver::OutputMode;

/// One copied (or attempted) reference.
#[derive(Debug)]
pub struct CopyOutcome {
    pub relative_path: String,
    pub category: ReferenceCategory,
    pub target: PathBuf,
    pub result: Result<CopyStatus>,
}

impl CopyOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// One compiler invocation, labelled for display.
#[derive(Debug)]
pub struct CompileRecord {
    /// Declared script path, or the bundle name in merged mode.
    pub label: String,
    /// Number of scripts that went into the unit.
    pub script_count: usize,
    pub outcome: CompilationOutcome,
}

/// Outcome of bundling one resource that got past path resolution and the
/// manifest rewrite.
#[derive(Debug)]
pub struct ResourceReport {
    pub name: String,
    pub base_dir: PathBuf,
    pub output_dir: PathBuf,
    pub mode: OutputMode,
    pub manifest_output: PathBuf,
    pub copies: Vec<CopyOutcome>,
    pub compiles: Vec<CompileRecord>,
    pub elapsed: Duration,
}

impl ResourceReport {
    pub fn copy_errors(&self) -> usize {
        self.copies.iter().filter(|c| !c.is_success()).count()
    }

    pub fn compile_successes(&self) -> usize {
        self.compiles.iter().filter(|c| c.outcome.success).count()
    }

    pub fn compile_errors(&self) -> usize {
        self.compiles.len() - self.compile_successes()
    }

    pub fn error_count(&self) -> usize {
        self.copy_errors() + self.compile_errors()
    }

    /// No copy or compile failed.
    pub fn is_success(&self) -> bool {
        self.error_count() == 0
    }

    /// Input and output bytes of the successful compilations.
    pub fn size_totals(&self) -> (u64, u64) {
        self.compiles
            .iter()
            .filter(|c| c.outcome.success)
            .fold((0, 0), |(input, output), c| {
                (input + c.outcome.input_size, output + c.outcome.output_size)
            })
    }

    pub fn size_reduction(&self) -> Option<f64> {
        let (input, output) = self.size_totals();
        size_reduction(input, output)
    }
}

/// Per-manifest entry in a batch.
#[derive(Debug)]
pub struct ResourceResult {
    pub manifest_path: PathBuf,
    /// `Err` when the resource was skipped: unreadable or invalid manifest,
    /// unresolvable output path, or a manifest that could not be rewritten.
    pub outcome: Result<ResourceReport>,
}

/// Every resource of one run, in processing order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub resources: Vec<ResourceResult>,
}

impl BatchReport {
    pub fn push(&mut self, manifest_path: PathBuf, outcome: Result<ResourceReport>) {
        self.resources.push(ResourceResult {
            manifest_path,
            outcome,
        });
    }

    pub fn total(&self) -> usize {
        self.resources.len()
    }

    pub fn succeeded(&self) -> usize {
        self.reports().filter(|r| r.is_success()).count()
    }

    pub fn with_errors(&self) -> usize {
        self.reports().filter(|r| !r.is_success()).count()
    }

    pub fn skipped(&self) -> usize {
        self.resources.iter().filter(|r| r.outcome.is_err()).count()
    }

    pub fn failed(&self) -> usize {
        self.with_errors() + self.skipped()
    }

    pub fn reports(&self) -> impl Iterator<Item = &ResourceReport> {
        self.resources.iter().filter_map(|r| r.outcome.as_ref().ok())
    }

    /// `Ok` only when every resource bundled cleanly.
    pub fn into_result(self) -> Result<()> {
        let failed = self.failed();
        if failed == 0 {
            Ok(())
        } else {
            Err(BundlerError::BatchFailed {
                failed,
                total: self.total(),
            })
        }
    }
}
