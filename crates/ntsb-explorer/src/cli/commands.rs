//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Subcommand, ValueEnum};

use crate::accident::Severity;
use crate::storage::SearchQuery;

/// Import command arguments.
#[derive(Debug, Args)]
pub struct ImportCommand {
    /// JSONL export to import, one record per line
    pub file: PathBuf,
}

/// Causes command arguments.
#[derive(Debug, Args)]
pub struct CausesCommand {
    /// Only show findings in this category
    #[arg(long)]
    pub category: Option<String>,

    /// Only show findings whose path contains this text
    #[arg(short, long)]
    pub search: Option<String>,

    /// Treat --search as a regular expression
    #[arg(long, requires = "search")]
    pub regex: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Stats command arguments.
#[derive(Debug, Args)]
pub struct StatsCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Search command arguments.
#[derive(Debug, Args)]
pub struct SearchCommand {
    /// Text matched against NTSB number, event id, probable cause, city, make and model
    pub term: Option<String>,

    /// Filter by highest injury severity (repeatable)
    #[arg(short = 'S', long, value_enum)]
    pub severity: Vec<SeverityArg>,

    /// Filter by state
    #[arg(long)]
    pub state: Option<String>,

    /// Filter by aircraft make
    #[arg(long)]
    pub make: Option<String>,

    /// Show events on or after this date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub from: Option<NaiveDate>,

    /// Show events on or before this date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub to: Option<NaiveDate>,

    /// Only show events with a probable cause
    #[arg(long)]
    pub with_cause: bool,

    /// Maximum number of results (defaults to the configured page size)
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Number of results to skip
    #[arg(long, default_value = "0")]
    pub offset: usize,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

impl SearchCommand {
    /// Build the storage query, using `default_limit` when no limit was given.
    #[must_use]
    pub fn to_query(&self, default_limit: usize) -> SearchQuery {
        SearchQuery {
            term: self.term.clone(),
            severities: self.severity.iter().copied().map(Severity::from).collect(),
            state: self.state.clone(),
            aircraft_make: self.make.clone(),
            date_from: self.from,
            date_to: self.to,
            with_probable_cause: self.with_cause,
            limit: self.limit.unwrap_or(default_limit),
            offset: self.offset,
        }
    }
}

/// Show command arguments.
#[derive(Debug, Args)]
pub struct ShowCommand {
    /// Row ID of the accident
    pub id: i64,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Options command arguments.
#[derive(Debug, Args)]
pub struct OptionsCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Severity argument for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SeverityArg {
    /// Fatal injuries (FATL)
    Fatal,
    /// Serious injuries (SERS)
    Serious,
    /// Minor injuries (MINR)
    Minor,
    /// No injuries (NONE)
    #[value(name = "none")]
    NoInjury,
    /// Unknown (UNKN)
    Unknown,
}

impl From<SeverityArg> for Severity {
    fn from(arg: SeverityArg) -> Self {
        match arg {
            SeverityArg::Fatal => Self::Fatal,
            SeverityArg::Serious => Self::Serious,
            SeverityArg::Minor => Self::Minor,
            SeverityArg::NoInjury => Self::NoInjury,
            SeverityArg::Unknown => Self::Unknown,
        }
    }
}

/// Output format for commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    #[default]
    Plain,
    /// Formatted table
    Table,
    /// JSON output
    Json,
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| format!("expected YYYY-MM-DD, got '{value}': {e}"))
}
