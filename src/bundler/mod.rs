//! Resource bundling
//!
//! [`ResourceBundler`] drives one resource through
//! `resolve output root -> write manifest -> copy references -> compile`
//! and aggregates the per-file results. [`ResourceBundler::bundle_all`] runs
//! that for every discovered manifest; a failing resource never stops the
//! batch.

pub mod file_ops;
pub mod parallel;
pub mod report;

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::compiler::{CompilationOutcome, CompileOptions, Compiler};
use crate::error::{BundlerError, Result};
use crate::manifest::catalog::FileReference;
use crate::manifest::rewrite::{self, CLIENT_BUNDLE, SERVER_BUNDLE};
use crate::path_utils::to_luac_name;
use crate::resolver::{OutputConfig, OutputMode, ResourceLayout, resolve_output_path};
use crate::resource::Resource;
use crate::resource::groups::ScriptGroups;
use crate::ui::Reporter;
use file_ops::{FileCopier, ensure_parent, same_file, write_atomic};
use report::{BatchReport, CompileRecord, CopyOutcome, ResourceReport};

/// Bundles resources against one [`OutputConfig`].
pub struct ResourceBundler<'a> {
    compiler: &'a dyn Compiler,
    copier: &'a dyn FileCopier,
    config: &'a OutputConfig,
    options: CompileOptions,
    jobs: usize,
}

impl<'a> ResourceBundler<'a> {
    pub fn new(
        compiler: &'a dyn Compiler,
        copier: &'a dyn FileCopier,
        config: &'a OutputConfig,
        options: CompileOptions,
    ) -> Self {
        ResourceBundler {
            compiler,
            copier,
            config,
            options,
            jobs: 1,
        }
    }

    /// Worker cap for copies and individual compilations.
    #[must_use]
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    /// Load and bundle every manifest in order, reporting as it goes.
    pub fn bundle_all(&self, manifests: &[PathBuf], reporter: &mut dyn Reporter) -> BatchReport {
        let total = manifests.len();
        reporter.batch_started(total);

        let mut batch = BatchReport::default();
        for (index, manifest_path) in manifests.iter().enumerate() {
            reporter.resource_started(manifest_path, index + 1, total);

            let outcome = Resource::load(manifest_path).and_then(|resource| self.bundle(&resource));
            if let Err(e) = &outcome {
                warn!(manifest = %manifest_path.display(), error = %e, "skipping resource");
            }

            batch.push(manifest_path.clone(), outcome);
            if let Some(last) = batch.resources.last() {
                reporter.resource_finished(last);
            }
        }

        reporter.batch_finished(&batch);
        batch
    }

    /// Bundle one resource.
    ///
    /// Errors only for failures that stop the resource as a whole: path
    /// resolution and the manifest rewrite. Copy and compile failures are
    /// recorded in the report.
    pub fn bundle(&self, resource: &Resource) -> Result<ResourceReport> {
        let started = Instant::now();

        let layout = ResourceLayout::new(self.config, &resource.base_dir)?;
        let groups = ScriptGroups::group(&resource.files);

        let manifest_output = self.write_manifest(resource, &layout, &groups)?;
        let copies = self.copy_references(resource, &layout);
        let compiles = match self.config.mode {
            OutputMode::Individual => self.compile_individual(resource, &layout),
            OutputMode::Merged => self.compile_merged(&groups, &layout),
        };

        Ok(ResourceReport {
            name: resource.name.clone(),
            base_dir: resource.base_dir.clone(),
            output_dir: layout.output_dir().to_path_buf(),
            mode: self.config.mode,
            manifest_output,
            copies,
            compiles,
            elapsed: started.elapsed(),
        })
    }

    /// Compile a lone `.lua` file next to itself or directly under the
    /// output root.
    pub fn compile_script(&self, script: &Path) -> Result<CompileRecord> {
        let file_name = script
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| BundlerError::UnsupportedInput {
                path: script.display().to_string(),
            })?;

        let output = resolve_output_path(
            &self.config.input_base,
            self.config.output_root.as_deref(),
            &self.config.input_base,
            &file_name,
            &to_luac_name(&file_name),
        )?;

        Ok(CompileRecord {
            label: file_name,
            script_count: 1,
            outcome: self.compile_unit(&[script.to_path_buf()], &output),
        })
    }

    fn write_manifest(
        &self,
        resource: &Resource,
        layout: &ResourceLayout,
        groups: &ScriptGroups<'_>,
    ) -> Result<PathBuf> {
        let rewritten = match self.config.mode {
            OutputMode::Individual => {
                rewrite::rewrite_individual(&resource.manifest, &resource.manifest_path)?
            }
            OutputMode::Merged => rewrite::rewrite_merged(
                &resource.manifest,
                groups.targets(),
                &resource.manifest_path,
            )?,
        };

        let target = layout.manifest_output(&resource.manifest_file_name());
        let unchanged = rewritten == resource.manifest.text();
        if unchanged && layout.is_in_place() && same_file(&resource.manifest_path, &target) {
            debug!(manifest = %target.display(), "manifest unchanged in place");
            return Ok(target);
        }

        write_atomic(&target, &rewritten)?;
        debug!(manifest = %target.display(), "wrote manifest");
        Ok(target)
    }

    /// Non-script references, plus non-`.lua` scripts in individual mode.
    fn copy_references(&self, resource: &Resource, layout: &ResourceLayout) -> Vec<CopyOutcome> {
        let references: Vec<&FileReference> = match self.config.mode {
            OutputMode::Individual => resource.passthrough_files().collect(),
            OutputMode::Merged => resource.asset_files().collect(),
        };
        let work = distinct_outputs(references, layout);

        parallel::map_ordered(&work, self.jobs, |(reference, target)| CopyOutcome {
            relative_path: reference.relative_path.clone(),
            category: reference.category,
            result: self.copier.copy(&reference.full_path, target),
            target: target.clone(),
        })
    }

    fn compile_individual(&self, resource: &Resource, layout: &ResourceLayout) -> Vec<CompileRecord> {
        let work = distinct_outputs(resource.lua_scripts().collect(), layout);

        parallel::map_ordered(&work, self.jobs, |(script, output)| {
            let outcome = match ensure_parent(output) {
                Ok(()) => self.compiler.compile_one(&script.full_path, output, &self.options),
                Err(e) => CompilationOutcome::failed(&[script.full_path.clone()], output, Duration::ZERO, e),
            };
            CompileRecord {
                label: script.relative_path.clone(),
                script_count: 1,
                outcome,
            }
        })
    }

    /// One unit per non-empty effective set: client first, then server.
    fn compile_merged(&self, groups: &ScriptGroups<'_>, layout: &ResourceLayout) -> Vec<CompileRecord> {
        if groups.is_empty() {
            return Vec::new();
        }

        let units = [
            (CLIENT_BUNDLE, groups.effective_client()),
            (SERVER_BUNDLE, groups.effective_server()),
        ];

        units
            .into_iter()
            .filter(|(_, scripts)| !scripts.is_empty())
            .map(|(bundle, scripts)| {
                let inputs: Vec<PathBuf> = scripts.iter().map(|s| s.full_path.clone()).collect();
                let output = layout.bundle_output(bundle);
                debug!(bundle, scripts = inputs.len(), output = %output.display(), "compiling merged bundle");
                CompileRecord {
                    label: bundle.to_string(),
                    script_count: inputs.len(),
                    outcome: self.compile_unit(&inputs, &output),
                }
            })
            .collect()
    }

    fn compile_unit(&self, inputs: &[PathBuf], output: &Path) -> CompilationOutcome {
        if let Err(e) = ensure_parent(output) {
            return CompilationOutcome::failed(inputs, output, Duration::ZERO, e);
        }
        self.compiler.compile_many(inputs, output, &self.options)
    }
}

/// Pair each reference with its output path. A reference whose output is
/// already taken by an earlier declaration is dropped, so no two workers
/// ever write the same file.
fn distinct_outputs<'r>(
    references: Vec<&'r FileReference>,
    layout: &ResourceLayout,
) -> Vec<(&'r FileReference, PathBuf)> {
    let mut seen = HashSet::new();
    references
        .into_iter()
        .filter_map(|reference| {
            let output = layout.reference_output(reference);
            if seen.insert(output.clone()) {
                Some((reference, output))
            } else {
                debug!(src = %reference.relative_path, output = %output.display(), "duplicate declaration skipped");
                None
            }
        })
        .collect()
}
