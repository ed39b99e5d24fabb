//! Subcommand implementations

pub mod import;
