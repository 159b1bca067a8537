//! List command implementation
//!
//! Prints, without touching the file system, what `build` would do with
//! every discovered resource: where each reference ends up and, in merged
//! mode, which scripts go into each bundle.

use std::path::{Path, PathBuf};

use console::Style;
use serde::Serialize;

use super::helpers;
use crate::cli::ListArgs;
use crate::error::{BundlerError, Result};
use crate::manifest::Audience;
use crate::manifest::catalog::ReferenceCategory;
use crate::manifest::rewrite::{CLIENT_BUNDLE, SERVER_BUNDLE};
use crate::resolver::{OutputConfig, OutputMode, ResourceLayout};
use crate::resource::Resource;
use crate::resource::discovery::InputKind;
use crate::resource::groups::ScriptGroups;

/// What happens to one declared file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Compile,
    Copy,
    /// Folded into a merged bundle.
    Merge,
    /// Non-Lua script removed by the merged manifest.
    Drop,
}

impl Action {
    pub fn label(self) -> &'static str {
        match self {
            Action::Compile => "compile",
            Action::Copy => "copy",
            Action::Merge => "merge",
            Action::Drop => "drop",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PlannedFile {
    pub src: String,
    pub category: ReferenceCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audience: Option<Audience>,
    pub action: Action,
    pub source: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
pub struct PlannedBundle {
    pub name: String,
    pub output: PathBuf,
    pub scripts: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ResourcePlan {
    pub name: String,
    pub mode: OutputMode,
    pub base_dir: PathBuf,
    pub output_dir: PathBuf,
    pub manifest_output: PathBuf,
    pub files: Vec<PlannedFile>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub bundles: Vec<PlannedBundle>,
}

#[derive(Debug, Serialize)]
pub struct PlanEntry {
    pub manifest: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<ResourcePlan>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Run list command
pub fn run(config: Option<&Path>, args: ListArgs) -> Result<()> {
    let (kind, project) = helpers::load_project(&args.input, config)?;
    if let InputKind::Script(path) = &kind {
        return Err(BundlerError::UnsupportedInput {
            path: path.display().to_string(),
        });
    }

    let mode = if args.merge || project.merge {
        OutputMode::Merged
    } else {
        OutputMode::Individual
    };
    let output_root = args.output.or(project.output);
    let output = OutputConfig::new(&args.input, output_root.as_deref(), mode)?;

    let manifests = helpers::manifests_for(&kind, &output, &project.exclude)?;
    let entries: Vec<PlanEntry> = manifests
        .into_iter()
        .map(|manifest| match plan_resource(&manifest, &output) {
            Ok(plan) => PlanEntry {
                manifest,
                plan: Some(plan),
                error: None,
            },
            Err(e) => PlanEntry {
                manifest,
                plan: None,
                error: Some(e.to_string()),
            },
        })
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        print_entries(&entries);
    }

    let failed = entries.iter().filter(|e| e.error.is_some()).count();
    if failed > 0 {
        return Err(BundlerError::BatchFailed {
            failed,
            total: entries.len(),
        });
    }
    Ok(())
}

/// Resolve every output location of the resource at `manifest`.
pub fn plan_resource(manifest: &Path, config: &OutputConfig) -> Result<ResourcePlan> {
    let resource = Resource::load(manifest)?;
    let layout = ResourceLayout::new(config, &resource.base_dir)?;
    let merged = config.mode == OutputMode::Merged;

    let files = resource
        .files
        .iter()
        .map(|reference| {
            let action = match (reference.category, reference.is_lua_script(), merged) {
                (ReferenceCategory::Script, true, true) => Action::Merge,
                (ReferenceCategory::Script, false, true) => Action::Drop,
                (_, true, false) => Action::Compile,
                _ => Action::Copy,
            };
            let output = matches!(action, Action::Compile | Action::Copy)
                .then(|| layout.reference_output(reference));

            PlannedFile {
                src: reference.relative_path.clone(),
                category: reference.category,
                audience: reference.audience,
                action,
                source: reference.full_path.clone(),
                output,
            }
        })
        .collect();

    let bundles = if merged {
        let groups = ScriptGroups::group(&resource.files);
        [
            (CLIENT_BUNDLE, groups.effective_client()),
            (SERVER_BUNDLE, groups.effective_server()),
        ]
        .into_iter()
        .filter(|(_, scripts)| !scripts.is_empty())
        .map(|(name, scripts)| PlannedBundle {
            name: name.to_string(),
            output: layout.bundle_output(name),
            scripts: scripts.iter().map(|s| s.relative_path.clone()).collect(),
        })
        .collect()
    } else {
        Vec::new()
    };

    Ok(ResourcePlan {
        name: resource.name.clone(),
        mode: config.mode,
        base_dir: resource.base_dir.clone(),
        output_dir: layout.output_dir().to_path_buf(),
        manifest_output: layout.manifest_output(&resource.manifest_file_name()),
        files,
        bundles,
    })
}

fn print_entries(entries: &[PlanEntry]) {
    let bold = Style::new().bold();
    let name_style = Style::new().bold().yellow();
    let dim = Style::new().dim();

    println!("Resources ({}):", entries.len());
    for entry in entries {
        println!();
        let Some(plan) = &entry.plan else {
            println!("  {} {}", Style::new().red().apply_to("✗"), entry.manifest.display());
            if let Some(error) = &entry.error {
                println!("    {error}");
            }
            continue;
        };

        println!("  {}", name_style.apply_to(&plan.name));
        println!("    {} {}", bold.apply_to("Source:"), plan.base_dir.display());
        println!("    {} {}", bold.apply_to("Output:"), plan.output_dir.display());
        println!("    {} {}", bold.apply_to("Manifest:"), plan.manifest_output.display());

        if !plan.files.is_empty() {
            println!("    {}", bold.apply_to("Files:"));
        }
        for file in &plan.files {
            let action = format!("{:<7}", file.action.label());
            match &file.output {
                Some(output) => println!(
                    "      {} {} {} {}",
                    dim.apply_to(action),
                    file.src,
                    dim.apply_to("->"),
                    output.display()
                ),
                None => println!("      {} {}", dim.apply_to(action), file.src),
            }
        }

        for bundle in &plan.bundles {
            println!(
                "    {} {} ({} script(s)) -> {}",
                bold.apply_to("Bundle:"),
                bundle.name,
                bundle.scripts.len(),
                bundle.output.display()
            );
        }
    }
}
