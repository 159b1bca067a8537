//! Build command implementation
//!
//! Merges command line flags over `mta-bundler.yaml`, then bundles a single
//! manifest, every manifest below a directory, or compiles one script.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::debug;

use super::helpers;
use crate::bundler::ResourceBundler;
use crate::bundler::file_ops::FsCopier;
use crate::bundler::parallel;
use crate::cli::BuildArgs;
use crate::compiler::luac::{DEFAULT_BINARY, LuacCompiler};
use crate::compiler::{CompileOptions, ObfuscationLevel};
use crate::config::ProjectConfig;
use crate::error::{BundlerError, Result};
use crate::resolver::{OutputConfig, OutputMode};
use crate::resource::discovery::InputKind;
use crate::ui::{ConsoleReporter, Reporter, SilentReporter};

/// Effective build settings after precedence is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSettings {
    pub output: Option<PathBuf>,
    pub mode: OutputMode,
    pub options: CompileOptions,
    pub compiler: PathBuf,
    pub jobs: usize,
    pub timeout: Option<Duration>,
    pub exclude: Vec<String>,
}

impl BuildSettings {
    /// Flags (and `MTA_BUNDLER_LUAC`, which clap folds into `--compiler`)
    /// win over the project file, which wins over defaults. Boolean flags
    /// can only switch a feature on.
    pub fn resolve(args: &BuildArgs, project: &ProjectConfig) -> Self {
        let mode = if args.merge || project.merge {
            OutputMode::Merged
        } else {
            OutputMode::Individual
        };

        let obfuscation = args
            .obfuscation
            .and_then(ObfuscationLevel::from_level)
            .unwrap_or(project.obfuscation);

        BuildSettings {
            output: args.output.clone().or_else(|| project.output.clone()),
            mode,
            options: CompileOptions {
                obfuscation,
                strip_debug: args.strip_debug || project.strip_debug,
                suppress_decompile_warning: args.suppress_decompile_warning
                    || project.suppress_decompile_warning,
            },
            compiler: args
                .compiler
                .clone()
                .or_else(|| project.compiler.clone())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_BINARY)),
            jobs: args
                .jobs
                .map(usize::from)
                .or(project.jobs)
                .unwrap_or_else(parallel::default_jobs),
            timeout: args
                .timeout
                .or(project.timeout_secs)
                .map(Duration::from_secs),
            exclude: project.exclude.clone(),
        }
    }
}

/// Run build command
pub fn run(config: Option<&Path>, quiet: bool, args: BuildArgs) -> Result<()> {
    let (kind, project) = helpers::load_project(&args.input, config)?;
    let settings = BuildSettings::resolve(&args, &project);
    debug!(?settings, "build settings");

    let output = OutputConfig::new(&args.input, settings.output.as_deref(), settings.mode)?;
    let compiler = LuacCompiler::new(settings.compiler.clone()).with_timeout(settings.timeout);
    let bundler =
        ResourceBundler::new(&compiler, &FsCopier, &output, settings.options).with_jobs(settings.jobs);

    let mut reporter: Box<dyn Reporter> = if quiet {
        Box::new(SilentReporter)
    } else {
        Box::new(ConsoleReporter::new())
    };

    if let InputKind::Script(_) = kind {
        return compile_script(&bundler, &output, reporter.as_mut());
    }

    let manifests = helpers::manifests_for(&kind, &output, &settings.exclude)?;
    bundler.bundle_all(&manifests, reporter.as_mut()).into_result()
}

fn compile_script(bundler: &ResourceBundler<'_>, output: &OutputConfig, reporter: &mut dyn Reporter) -> Result<()> {
    let record = bundler.compile_script(&output.input_root)?;
    let output_dir = output.output_root.as_deref().unwrap_or(&output.input_base);
    reporter.script_finished(&record, output_dir);

    if record.outcome.success {
        return Ok(());
    }
    Err(record
        .outcome
        .error
        .unwrap_or(BundlerError::BatchFailed { failed: 1, total: 1 }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn build_args(extra: &[&str]) -> BuildArgs {
        let mut argv = vec!["mta-bundler", "build", "resources"];
        argv.extend_from_slice(extra);
        match crate::cli::Cli::try_parse_from(argv).unwrap().command {
            crate::cli::Commands::Build(args) => args,
            _ => panic!("Expected Build command"),
        }
    }

    #[test]
    fn test_defaults() {
        let mut args = build_args(&[]);
        args.compiler = None;
        let settings = BuildSettings::resolve(&args, &ProjectConfig::default());

        assert_eq!(settings.output, None);
        assert_eq!(settings.mode, OutputMode::Individual);
        assert_eq!(settings.options, CompileOptions::default());
        assert_eq!(settings.compiler, PathBuf::from(DEFAULT_BINARY));
        assert_eq!(settings.jobs, parallel::default_jobs());
        assert_eq!(settings.timeout, None);
    }

    #[test]
    fn test_project_values_apply_without_flags() {
        let mut args = build_args(&[]);
        args.compiler = None;
        let project = ProjectConfig {
            output: Some(PathBuf::from("/srv/dist")),
            merge: true,
            strip_debug: true,
            obfuscation: ObfuscationLevel::Enhanced,
            compiler: Some(PathBuf::from("/opt/luac_mta")),
            jobs: Some(2),
            timeout_secs: Some(9),
            exclude: vec!["**/old/**".to_string()],
            ..ProjectConfig::default()
        };
        let settings = BuildSettings::resolve(&args, &project);

        assert_eq!(settings.output, Some(PathBuf::from("/srv/dist")));
        assert_eq!(settings.mode, OutputMode::Merged);
        assert!(settings.options.strip_debug);
        assert_eq!(settings.options.obfuscation, ObfuscationLevel::Enhanced);
        assert_eq!(settings.compiler, PathBuf::from("/opt/luac_mta"));
        assert_eq!(settings.jobs, 2);
        assert_eq!(settings.timeout, Some(Duration::from_secs(9)));
        assert_eq!(settings.exclude, vec!["**/old/**".to_string()]);
    }

    #[test]
    fn test_flags_override_project() {
        let args = build_args(&["-o", "out", "-e", "0", "-j", "1", "--compiler", "./luac", "--timeout", "5"]);
        let project = ProjectConfig {
            output: Some(PathBuf::from("/srv/dist")),
            obfuscation: ObfuscationLevel::Maximum,
            compiler: Some(PathBuf::from("/opt/luac_mta")),
            jobs: Some(6),
            timeout_secs: Some(60),
            ..ProjectConfig::default()
        };
        let settings = BuildSettings::resolve(&args, &project);

        assert_eq!(settings.output, Some(PathBuf::from("out")));
        assert_eq!(settings.options.obfuscation, ObfuscationLevel::None);
        assert_eq!(settings.compiler, PathBuf::from("./luac"));
        assert_eq!(settings.jobs, 1);
        assert_eq!(settings.timeout, Some(Duration::from_secs(5)));
    }
}
