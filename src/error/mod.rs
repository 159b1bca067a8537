//! Error types and handling for mta-bundler
//!
//! Uses `thiserror` for error definitions and `miette` for pretty diagnostics.
//!
//! Variants are grouped by the stage that raises them:
//! - discovery: locating and parsing a resource's `meta.xml`
//! - resolution: computing output paths
//! - copy / compile: per-file work inside one resource
//! - rewrite: producing the output manifest
//! - config: loading `mta-bundler.yaml`

use miette::Diagnostic;
use thiserror::Error;

/// Main error type for mta-bundler operations
#[derive(Error, Diagnostic, Debug)]
pub enum BundlerError {
    // Input / discovery errors
    #[error("Input path not found: {path}")]
    #[diagnostic(
        code(mta_bundler::input::not_found),
        help("Pass a meta.xml file, a resource directory or a single .lua file")
    )]
    InputNotFound { path: String },

    #[error("Unsupported input file: {path}")]
    #[diagnostic(
        code(mta_bundler::input::unsupported),
        help("Expected a meta.xml manifest or a .lua script")
    )]
    UnsupportedInput { path: String },

    #[error("No meta.xml files found in {path}")]
    #[diagnostic(code(mta_bundler::input::no_resources))]
    NoResourcesFound { path: String },

    #[error("Failed to read manifest: {path}")]
    #[diagnostic(code(mta_bundler::manifest::read_failed))]
    ManifestReadFailed { path: String, reason: String },

    #[error("Failed to parse manifest {path}: {reason}")]
    #[diagnostic(code(mta_bundler::manifest::parse_failed))]
    ManifestParseFailed { path: String, reason: String },

    #[error("Invalid manifest {path}: {message}")]
    #[diagnostic(code(mta_bundler::manifest::invalid))]
    ManifestInvalid { path: String, message: String },

    // Path resolution errors
    #[error("Cannot place '{base_dir}' relative to input root '{input_root}': {reason}")]
    #[diagnostic(
        code(mta_bundler::resolve::failed),
        help("The resource directory must live below the input path on the same volume")
    )]
    PathResolutionFailed {
        input_root: String,
        base_dir: String,
        reason: String,
    },

    // Rewrite errors
    #[error("Cannot rewrite manifest {path}: {reason}")]
    #[diagnostic(code(mta_bundler::manifest::rewrite_failed))]
    RewriteFailed { path: String, reason: String },

    // Copy errors
    #[error("Failed to copy {source_path} to {target}: {reason}")]
    #[diagnostic(code(mta_bundler::fs::copy_failed))]
    CopyFailed {
        source_path: String,
        target: String,
        reason: String,
    },

    #[error("Failed to write file: {path}")]
    #[diagnostic(code(mta_bundler::fs::write_failed))]
    FileWriteFailed { path: String, reason: String },

    #[error("IO error: {message}")]
    #[diagnostic(code(mta_bundler::fs::io_error))]
    IoError { message: String },

    // Compiler errors
    #[error("Failed to start compiler '{binary}': {reason}")]
    #[diagnostic(
        code(mta_bundler::compiler::spawn_failed),
        help("Install luac_mta, put it on PATH, or pass --compiler / set MTA_BUNDLER_LUAC")
    )]
    CompilerSpawnFailed { binary: String, reason: String },

    #[error("Compiler timed out after {seconds}s")]
    #[diagnostic(code(mta_bundler::compiler::timed_out))]
    CompilerTimedOut { seconds: u64 },

    #[error("Compiler exited with {status}: {output}")]
    #[diagnostic(code(mta_bundler::compiler::exited))]
    CompilerExited { status: String, output: String },

    #[error("Validation errors: {message}")]
    #[diagnostic(code(mta_bundler::compiler::validation_failed))]
    CompilerValidationFailed { message: String },

    // Configuration errors
    #[error("Failed to read configuration file: {path}")]
    #[diagnostic(code(mta_bundler::config::read_failed))]
    ConfigReadFailed { path: String, reason: String },

    #[error("Failed to parse configuration file: {path}: {reason}")]
    #[diagnostic(code(mta_bundler::config::parse_failed))]
    ConfigParseFailed { path: String, reason: String },

    #[error("Invalid configuration: {message}")]
    #[diagnostic(code(mta_bundler::config::invalid))]
    ConfigInvalid { message: String },

    #[error("Invalid exclude pattern '{pattern}': {reason}")]
    #[diagnostic(code(mta_bundler::config::invalid_glob))]
    InvalidGlob { pattern: String, reason: String },

    #[error("Unknown shell: {shell}")]
    #[diagnostic(
        code(mta_bundler::cli::unsupported_shell),
        help("Supported shells: bash, elvish, fish, powershell, zsh")
    )]
    UnsupportedShell { shell: String },

    // Batch outcome
    #[error("{failed} of {total} resource(s) failed")]
    #[diagnostic(code(mta_bundler::batch::failed))]
    BatchFailed { failed: usize, total: usize },
}

impl BundlerError {
    pub fn copy_failed(source: &std::path::Path, target: &std::path::Path, reason: impl ToString) -> Self {
        BundlerError::CopyFailed {
            source_path: source.display().to_string(),
            target: target.display().to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn write_failed(path: &std::path::Path, reason: impl ToString) -> Self {
        BundlerError::FileWriteFailed {
            path: path.display().to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn rewrite_failed(path: &std::path::Path, reason: impl Into<String>) -> Self {
        BundlerError::RewriteFailed {
            path: path.display().to_string(),
            reason: reason.into(),
        }
    }
}

impl From<std::io::Error> for BundlerError {
    fn from(err: std::io::Error) -> Self {
        BundlerError::IoError {
            message: err.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for BundlerError {
    fn from(err: serde_yaml::Error) -> Self {
        BundlerError::ConfigParseFailed {
            path: "unknown".to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for BundlerError {
    fn from(err: serde_json::Error) -> Self {
        BundlerError::IoError {
            message: err.to_string(),
        }
    }
}

/// Result type alias using miette for error handling
pub type Result<T> = miette::Result<T, BundlerError>;
