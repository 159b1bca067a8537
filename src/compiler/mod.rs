//! Lua compiler capability
//!
//! Bundling only needs three things from a compiler: compile one file,
//! compile an ordered list of files into one chunk, and check inputs up
//! front. [`luac::LuacCompiler`] provides them by running `luac_mta`.

pub mod luac;

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{BundlerError, Result};
use crate::path_utils::has_lua_extension;

/// `luac_mta` obfuscation level (`-e`, `-e2`, `-e3`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObfuscationLevel {
    #[default]
    None,
    Basic,
    /// Needs MTA 1.5.2-9.07903 or newer.
    Enhanced,
    /// Needs MTA 1.5.6-9.18728 or newer.
    Maximum,
}

impl ObfuscationLevel {
    /// Numeric level as accepted on the command line (0-3).
    pub fn from_level(level: u8) -> Option<Self> {
        match level {
            0 => Some(ObfuscationLevel::None),
            1 => Some(ObfuscationLevel::Basic),
            2 => Some(ObfuscationLevel::Enhanced),
            3 => Some(ObfuscationLevel::Maximum),
            _ => None,
        }
    }

    pub fn flag(self) -> Option<&'static str> {
        match self {
            ObfuscationLevel::None => None,
            ObfuscationLevel::Basic => Some("-e"),
            ObfuscationLevel::Enhanced => Some("-e2"),
            ObfuscationLevel::Maximum => Some("-e3"),
        }
    }
}

impl fmt::Display for ObfuscationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ObfuscationLevel::None => "none",
            ObfuscationLevel::Basic => "basic",
            ObfuscationLevel::Enhanced => "enhanced",
            ObfuscationLevel::Maximum => "maximum",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompileOptions {
    pub obfuscation: ObfuscationLevel,
    pub strip_debug: bool,
    pub suppress_decompile_warning: bool,
}

/// Result of one compiler invocation.
#[derive(Debug)]
pub struct CompilationOutcome {
    pub inputs: Vec<PathBuf>,
    pub output: PathBuf,
    pub success: bool,
    pub elapsed: Duration,
    pub error: Option<BundlerError>,
    /// Sum of input file sizes in bytes.
    pub input_size: u64,
    /// Size of the produced chunk, 0 on failure.
    pub output_size: u64,
}

impl CompilationOutcome {
    pub fn failed(inputs: &[PathBuf], output: &Path, elapsed: Duration, error: BundlerError) -> Self {
        CompilationOutcome {
            inputs: inputs.to_vec(),
            output: output.to_path_buf(),
            success: false,
            elapsed,
            error: Some(error),
            input_size: 0,
            output_size: 0,
        }
    }

    /// Percentage saved, when both sizes are known.
    pub fn size_reduction(&self) -> Option<f64> {
        size_reduction(self.input_size, self.output_size)
    }
}

/// `(1 - output / input) * 100`, or `None` if either size is zero.
#[allow(clippy::cast_precision_loss)]
pub fn size_reduction(input_size: u64, output_size: u64) -> Option<f64> {
    if input_size == 0 || output_size == 0 {
        return None;
    }
    Some((1.0 - output_size as f64 / input_size as f64) * 100.0)
}

/// The external compiler, shared read-only between worker threads.
pub trait Compiler: Send + Sync {
    /// Compile `inputs`, in order, into the single chunk `output`.
    fn compile_many(&self, inputs: &[PathBuf], output: &Path, options: &CompileOptions) -> CompilationOutcome;

    fn compile_one(&self, input: &Path, output: &Path, options: &CompileOptions) -> CompilationOutcome {
        self.compile_many(&[input.to_path_buf()], output, options)
    }

    /// Inputs must be non-empty, exist, and be `.lua` files.
    fn validate(&self, inputs: &[PathBuf]) -> Result<()> {
        validate_inputs(inputs)
    }
}

/// Input checks shared by compiler implementations. All problems are
/// reported at once.
pub fn validate_inputs(inputs: &[PathBuf]) -> Result<()> {
    if inputs.is_empty() {
        return Err(BundlerError::CompilerValidationFailed {
            message: "no files provided".to_string(),
        });
    }

    let mut problems = Vec::new();
    for input in inputs {
        if !input.is_file() {
            problems.push(format!("file not found: {}", input.display()));
            continue;
        }
        if !has_lua_extension(&input.to_string_lossy()) {
            problems.push(format!("not a Lua file: {}", input.display()));
        }
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(BundlerError::CompilerValidationFailed {
            message: problems.join("; "),
        })
    }
}

/// Total size of the given files; unreadable files count as zero.
pub fn total_size(paths: &[PathBuf]) -> u64 {
    paths
        .iter()
        .filter_map(|p| fs::metadata(p).ok())
        .map(|m| m.len())
        .sum()
}

/// Human-readable size with binary units: `512 B`, `1.5 KB`, `2.0 MB`.
#[allow(clippy::cast_precision_loss)]
pub fn format_size(bytes: u64) -> String {
    const UNIT: u64 = 1024;
    const PREFIXES: [char; 6] = ['K', 'M', 'G', 'T', 'P', 'E'];

    if bytes < UNIT {
        return format!("{bytes} B");
    }

    let mut div = UNIT;
    let mut exp = 0;
    let mut n = bytes / UNIT;
    while n >= UNIT {
        div *= UNIT;
        exp += 1;
        n /= UNIT;
    }
    format!("{:.1} {}B", bytes as f64 / div as f64, PREFIXES[exp])
}
