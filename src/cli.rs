//! CLI definitions using clap derive API

use clap::builder::{Styles, styling::AnsiColor};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Environment variable naming the compiler binary.
pub const COMPILER_ENV: &str = "MTA_BUNDLER_LUAC";

/// mta-bundler - Multi Theft Auto resource bundler
///
/// Compile the Lua scripts of MTA resources with luac_mta and write
/// matching meta.xml manifests.
#[derive(Parser, Debug)]
#[command(
    name = "mta-bundler",
    author,
    version,
    color = clap::ColorChoice::Auto,
    styles = Styles::styled()
        .header(AnsiColor::Green.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default().bold())
        .placeholder(AnsiColor::Cyan.on_default()),
    about = "Bundle Multi Theft Auto resources",
    long_about = "mta-bundler compiles the Lua scripts declared in MTA resource manifests \
                  (meta.xml) with luac_mta, copies every other referenced file and writes \
                  a manifest pointing at the compiled output, either in place or into a \
                  separate output tree.",
    after_help = "\x1b[1m\x1b[32mExamples:\x1b[0m\n    \
                  mta-bundler build resources/race/meta.xml\n    \
                  mta-bundler build resources -o dist\n    \
                  mta-bundler build resources -o dist --merge -s -e 2\n    \
                  mta-bundler list resources -o dist --json"
)]
pub struct Cli {
    /// Enable verbose output
    #[arg(long, short = 'v', global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only print errors
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Configuration file (defaults to mta-bundler.yaml in the input directory)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compile scripts and write bundled resources
    Build(BuildArgs),

    /// Show what a build would produce without writing anything
    List(ListArgs),

    /// Show version information
    Version,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the build command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Compile one resource in place:\n    mta-bundler build resources/race/meta.xml\n\n\
                  Bundle a resource tree into dist/:\n    mta-bundler build resources -o dist\n\n\
                  Merge scripts into client.luac and server.luac:\n    mta-bundler build resources -o dist --merge\n\n\
                  Strip debug info and obfuscate:\n    mta-bundler build resources -o dist -s -e 3\n\n\
                  Compile a single script:\n    mta-bundler build utils/helpers.lua -o dist")]
pub struct BuildArgs {
    /// meta.xml file, directory containing resources, or a single .lua file
    pub input: PathBuf,

    /// Output directory (defaults to writing next to the sources)
    #[arg(long, short = 'o', value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Merge each resource's scripts into client.luac and server.luac
    #[arg(long, short = 'm')]
    pub merge: bool,

    /// Strip debug information
    #[arg(long = "strip", short = 's')]
    pub strip_debug: bool,

    /// Obfuscation level (0 = none, 1 = basic, 2 = enhanced, 3 = maximum)
    #[arg(short = 'e', long = "obfuscate", value_name = "LEVEL",
          value_parser = clap::value_parser!(u8).range(0..=3))]
    pub obfuscation: Option<u8>,

    /// Suppress the decompile warning
    #[arg(long = "suppress-warning", short = 'd')]
    pub suppress_decompile_warning: bool,

    /// Compiler binary
    #[arg(long, env = COMPILER_ENV, value_name = "PATH")]
    pub compiler: Option<PathBuf>,

    /// Maximum parallel copies and compilations per resource
    #[arg(long, short = 'j', value_name = "N",
          value_parser = clap::value_parser!(u16).range(1..))]
    pub jobs: Option<u16>,

    /// Kill a compiler invocation after this many seconds
    #[arg(long, value_name = "SECS",
          value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,
}

/// Arguments for the list command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Show planned outputs:\n    mta-bundler list resources -o dist\n\n\
                  Show merged targets:\n    mta-bundler list resources --merge\n\n\
                  Machine readable:\n    mta-bundler list resources -o dist --json")]
pub struct ListArgs {
    /// meta.xml file or directory containing resources
    pub input: PathBuf,

    /// Output directory to plan against (defaults to in place)
    #[arg(long, short = 'o', value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Plan merged client.luac / server.luac output
    #[arg(long, short = 'm')]
    pub merge: bool,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

/// Arguments for completions command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Generate bash completions:\n    mta-bundler completions --shell bash > ~/.bash_completion.d/mta-bundler\n\n\
                  Generate zsh completions:\n    mta-bundler completions --shell zsh > ~/.zfunc/_mta-bundler\n\n\
                  Generate fish completions:\n    mta-bundler completions --shell fish > ~/.config/fish/completions/mta-bundler.fish")]
pub struct CompletionsArgs {
    /// Shell type (bash, elvish, fish, powershell, zsh)
    #[arg(long)]
    pub shell: String,
}
