//! Command-line interface for ntsb-explorer.
//!
//! This module provides the CLI structure for the `ntsbx` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::logging::Verbosity;

pub use commands::{
    CausesCommand, ConfigCommand, ImportCommand, OptionsCommand, OutputFormat, SearchCommand,
    SeverityArg, ShowCommand, StatsCommand,
};

/// ntsbx - Explore NTSB aviation accident records
///
/// Imports NTSB JSONL exports into a local database, searches them, and
/// ranks the recorded findings to show what most often causes accidents.
#[derive(Debug, Parser)]
#[command(name = "ntsbx")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Path to the accident database (overrides configuration)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub database: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Import accident records from a JSONL export
    Import(ImportCommand),

    /// Rank findings by how often they are cited
    Causes(CausesCommand),

    /// Show database statistics
    Stats(StatsCommand),

    /// Search accident records
    Search(SearchCommand),

    /// Show one accident record in full
    Show(ShowCommand),

    /// List the values available for search filters
    Options(OptionsCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.verbose)
    }
}
