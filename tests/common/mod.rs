//! Common test utilities for mta-bundler integration tests

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::TempDir;

/// Fake `luac_mta`: honours `-o`, skips the other flags, fails on inputs
/// containing `SYNTAX ERROR`, and logs its arguments to `$FAKE_LUAC_LOG`.
const FAKE_COMPILER: &str = r#"#!/bin/sh
if [ -n "$FAKE_LUAC_LOG" ]; then
    echo "$*" >> "$FAKE_LUAC_LOG"
fi
out=""
while [ $# -gt 0 ]; do
    case "$1" in
        -o) out="$2"; shift 2 ;;
        -s|-d|-e|-e2|-e3) shift ;;
        *) break ;;
    esac
done
for f in "$@"; do
    if grep -q "SYNTAX ERROR" "$f"; then
        echo "luac_mta: $f:1: syntax error near 'ERROR'" >&2
        exit 1
    fi
done
printf 'LuaQ' > "$out"
"#;

/// A race resource with every script kind, an asset and a map.
pub const RACE_META: &str = r#"<meta>
    <info author="tester" type="gamemode" name="Race" />
    <script src="server/main.lua" type="server" />
    <script src="client/gui.lua" type="client" />
    <script src="shared/util.lua" type="shared" />
    <script src="legacy.lua" />
    <file src="images/logo.png" />
    <map src="maps/arena.map" />
</meta>
"#;

/// A test workspace for integration tests
pub struct TestWorkspace {
    /// Temporary directory
    pub temp: TempDir,
    /// Path to workspace root
    pub path: PathBuf,
}

impl TestWorkspace {
    /// Create a new test workspace
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let path = temp.path().to_path_buf();
        Self { temp, path }
    }

    /// Write a file in workspace
    pub fn write_file(&self, path: &str, content: &str) {
        let file_path = self.path.join(path);
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        std::fs::write(&file_path, content).expect("Failed to write file");
    }

    /// Read a file from workspace
    pub fn read_file(&self, path: &str) -> String {
        let file_path = self.path.join(path);
        std::fs::read_to_string(&file_path).expect("Failed to read file")
    }

    /// Check if a file exists in workspace
    pub fn file_exists(&self, path: &str) -> bool {
        self.path.join(path).exists()
    }

    pub fn join(&self, path: &str) -> PathBuf {
        self.path.join(path)
    }

    /// Create `<dir>/meta.xml` from [`RACE_META`] with every declared file.
    pub fn create_race_resource(&self, dir: &str) -> PathBuf {
        self.write_file(&format!("{dir}/meta.xml"), RACE_META);
        for (file, content) in [
            ("server/main.lua", "print('server')"),
            ("client/gui.lua", "print('gui')"),
            ("shared/util.lua", "util = {}"),
            ("legacy.lua", "print('legacy')"),
            ("images/logo.png", "PNG"),
            ("maps/arena.map", "<map/>"),
        ] {
            self.write_file(&format!("{dir}/{file}"), content);
        }
        self.join(dir)
    }

    /// Install the fake compiler at `<workspace>/bin/luac_mta`.
    #[cfg(unix)]
    pub fn install_fake_compiler(&self) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = self.join("bin/luac_mta");
        self.write_file("bin/luac_mta", FAKE_COMPILER);
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
            .expect("Failed to make fake compiler executable");
        path
    }

    /// Arguments of every fake compiler invocation, one line each.
    pub fn compiler_log(&self) -> Vec<String> {
        std::fs::read_to_string(self.join("luac.log"))
            .unwrap_or_default()
            .lines()
            .map(ToString::to_string)
            .collect()
    }

    /// Binary command rooted in the workspace, with the fake compiler wired
    /// through the environment.
    pub fn bundler_cmd(&self, compiler: Option<&Path>) -> Command {
        let mut cmd = bundler_cmd();
        cmd.current_dir(&self.path)
            .env_remove("MTA_BUNDLER_LUAC")
            .env_remove("RUST_LOG")
            .env("FAKE_LUAC_LOG", self.join("luac.log"));
        if let Some(compiler) = compiler {
            cmd.env("MTA_BUNDLER_LUAC", compiler);
        }
        cmd
    }
}

// Temporary fix for deprecated cargo_bin - will be updated when build-dir issues are resolved
#[allow(deprecated)]
pub fn bundler_cmd() -> Command {
    Command::cargo_bin("mta-bundler").expect("binary is built")
}
