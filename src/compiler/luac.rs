//! `luac_mta` process runner

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

use super::{CompilationOutcome, CompileOptions, Compiler, total_size};
use crate::error::{BundlerError, Result};

/// Binary looked up on `PATH` when nothing else is configured.
pub const DEFAULT_BINARY: &str = "luac_mta";

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Compiler backed by the MTA `luac_mta` executable.
#[derive(Debug, Clone)]
pub struct LuacCompiler {
    binary: PathBuf,
    timeout: Option<Duration>,
}

impl LuacCompiler {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        LuacCompiler {
            binary: binary.into(),
            timeout: None,
        }
    }

    /// Kill invocations that run longer than `timeout`.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// `-o <output> [-s] [-e|-e2|-e3] [-d] <inputs...>`
    pub fn build_args(options: &CompileOptions, inputs: &[PathBuf], output: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["-o".into(), output.into()];
        if options.strip_debug {
            args.push("-s".into());
        }
        if let Some(flag) = options.obfuscation.flag() {
            args.push(flag.into());
        }
        if options.suppress_decompile_warning {
            args.push("-d".into());
        }
        args.extend(inputs.iter().map(OsString::from));
        args
    }

    fn run(&self, inputs: &[PathBuf], output: &Path, options: &CompileOptions) -> Result<()> {
        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent).map_err(|e| BundlerError::write_failed(parent, e))?;
        }

        // stdout and stderr share one temp file so a chatty compiler cannot fill a pipe
        let mut captured = tempfile::tempfile()?;
        let args = Self::build_args(options, inputs, output);
        debug!(binary = %self.binary.display(), ?args, "running compiler");

        let mut child = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::from(captured.try_clone()?))
            .stderr(Stdio::from(captured.try_clone()?))
            .spawn()
            .map_err(|e| BundlerError::CompilerSpawnFailed {
                binary: self.binary.display().to_string(),
                reason: e.to_string(),
            })?;

        let status = self.wait(&mut child)?;
        if status.success() {
            return Ok(());
        }

        Err(BundlerError::CompilerExited {
            status: status.to_string(),
            output: read_captured(&mut captured),
        })
    }

    fn wait(&self, child: &mut Child) -> Result<ExitStatus> {
        let Some(timeout) = self.timeout else {
            return Ok(child.wait()?);
        };

        let deadline = Instant::now() + timeout;
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(status);
            }
            if Instant::now() >= deadline {
                // already-exited races are fine; the unit fails either way
                let _ = child.kill();
                let _ = child.wait();
                return Err(BundlerError::CompilerTimedOut {
                    seconds: timeout.as_secs(),
                });
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

impl Default for LuacCompiler {
    fn default() -> Self {
        LuacCompiler::new(DEFAULT_BINARY)
    }
}

impl Compiler for LuacCompiler {
    fn compile_many(&self, inputs: &[PathBuf], output: &Path, options: &CompileOptions) -> CompilationOutcome {
        let started = Instant::now();

        if let Err(e) = self.validate(inputs) {
            return CompilationOutcome::failed(inputs, output, started.elapsed(), e);
        }
        let input_size = total_size(inputs);

        let result = self.run(inputs, output, options);
        let elapsed = started.elapsed();
        debug!(output = %output.display(), ?elapsed, ok = result.is_ok(), "compiler finished");

        match result {
            Ok(()) => CompilationOutcome {
                inputs: inputs.to_vec(),
                output: output.to_path_buf(),
                success: true,
                elapsed,
                error: None,
                input_size,
                output_size: fs::metadata(output).map(|m| m.len()).unwrap_or(0),
            },
            Err(e) => CompilationOutcome {
                input_size,
                ..CompilationOutcome::failed(inputs, output, elapsed, e)
            },
        }
    }
}

fn read_captured(file: &mut File) -> String {
    let mut bytes = Vec::new();
    if file.seek(SeekFrom::Start(0)).is_err() || file.read_to_end(&mut bytes).is_err() {
        return String::new();
    }
    String::from_utf8_lossy(&bytes).trim().to_string()
}
