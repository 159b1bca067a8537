//! Version command implementation

use crate::compiler::luac::DEFAULT_BINARY;
use crate::error::Result;

/// Run version command
pub fn run() -> Result<()> {
    println!("mta-bundler {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Build info:");
    println!("  Rust version: {}", rustc_version());
    println!("  Profile: {}", build_profile());
    println!("  Default compiler: {DEFAULT_BINARY}");

    Ok(())
}

fn rustc_version() -> &'static str {
    // Minimum supported version from Cargo.toml
    env!("CARGO_PKG_RUST_VERSION")
}

fn build_profile() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "release"
    }
}
