//! Project configuration (`mta-bundler.yaml`)
//!
//! Every field is optional. Values here sit below command line flags and the
//! `MTA_BUNDLER_LUAC` environment variable and above built-in defaults; the
//! merge itself happens in the build command.
//!
//! ```yaml
//! output: dist
//! merge: true
//! strip_debug: true
//! obfuscation: enhanced
//! jobs: 4
//! exclude:
//!   - "**/node_modules/**"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::compiler::ObfuscationLevel;
use crate::error::{BundlerError, Result};
use crate::path_utils;

/// File looked up in the input directory when `--config` is not given.
pub const CONFIG_FILE_NAME: &str = "mta-bundler.yaml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectConfig {
    /// Output root. Relative values are resolved against the config file's
    /// directory by [`ProjectConfig::load`].
    pub output: Option<PathBuf>,
    pub merge: bool,
    pub strip_debug: bool,
    pub suppress_decompile_warning: bool,
    pub obfuscation: ObfuscationLevel,
    /// Compiler binary, looked up on `PATH` when not a path.
    pub compiler: Option<PathBuf>,
    pub jobs: Option<usize>,
    pub timeout_secs: Option<u64>,
    /// Globs, relative to the input directory, of paths skipped during
    /// discovery.
    pub exclude: Vec<String>,
}

impl ProjectConfig {
    /// Parse and validate YAML. `path` is only used in errors.
    pub fn from_yaml(yaml: &str, path: &Path) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml).map_err(|e| BundlerError::ConfigParseFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read `path` and resolve its relative `output` against the file's
    /// directory.
    pub fn load(path: &Path) -> Result<Self> {
        let yaml = fs::read_to_string(path).map_err(|e| BundlerError::ConfigReadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let mut config = Self::from_yaml(&yaml, path)?;
        if let Some(output) = config.output.take() {
            let dir = path.parent().unwrap_or_else(|| Path::new(""));
            config.output = Some(path_utils::clean(&dir.join(output)));
        }

        debug!(config = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Load `explicit` when given (it must exist), otherwise
    /// `<input_dir>/mta-bundler.yaml` if present, otherwise defaults.
    pub fn discover(explicit: Option<&Path>, input_dir: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        let candidate = input_dir.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            Self::load(&candidate)
        } else {
            Ok(Self::default())
        }
    }

    fn validate(&self) -> Result<()> {
        if self.jobs == Some(0) {
            return Err(BundlerError::ConfigInvalid {
                message: "jobs must be at least 1".to_string(),
            });
        }
        if self.timeout_secs == Some(0) {
            return Err(BundlerError::ConfigInvalid {
                message: "timeout_secs must be at least 1".to_string(),
            });
        }
        for pattern in &self.exclude {
            wax::Glob::new(pattern).map_err(|e| BundlerError::InvalidGlob {
                pattern: pattern.clone(),
                reason: e.to_string(),
            })?;
        }
        Ok(())
    }
}
