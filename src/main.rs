//! mta-bundler - Multi Theft Auto resource bundler
//!
//! Compiles the Lua scripts declared by MTA resource manifests (`meta.xml`)
//! with `luac_mta`, copies the remaining declared files and writes a
//! manifest that points at the compiled output.

use clap::Parser;

mod bundler;
mod cli;
mod commands;
mod compiler;
mod config;
mod error;
mod logging;
mod manifest;
mod path_utils;
mod resolver;
mod resource;
mod ui;

use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.quiet);

    let config = cli.config.as_deref();
    let result = match cli.command {
        Commands::Build(args) => commands::build::run(config, cli.quiet, args),
        Commands::List(args) => commands::list::run(config, args),
        Commands::Version => commands::version::run(),
        Commands::Completions(args) => commands::completions::run(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
