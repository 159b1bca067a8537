//! Command implementations for the mta-bundler CLI

pub mod build;
pub mod completions;
pub mod helpers;
pub mod list;
pub mod version;
