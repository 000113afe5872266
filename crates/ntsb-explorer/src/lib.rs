//! `ntsb-explorer` - Explorer and findings aggregator for NTSB aviation accident records
//!
//! This library imports NTSB JSONL exports into a local `SQLite` store and
//! summarizes the findings attached to each record: which categories,
//! subcategories and individual findings are cited most often, and whether as
//! causes or as contributing factors.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod accident;
pub mod aggregate;
pub mod cli;
pub mod config;
pub mod error;
pub mod findings;
pub mod logging;
pub mod storage;

pub use accident::{Accident, AccidentRecord, Severity};
pub use aggregate::{
    aggregate, aggregate_with_limits, AggregateLimits, CategoryRollup, FindingRanked,
    FindingsAggregator, FindingsFilter, FindingsSummary, SubcategoryCount,
};
pub use config::Config;
pub use error::{Error, Result};
pub use findings::{parse_findings, FindingEntry, Role};
pub use logging::init_logging;
pub use storage::{DatabaseStats, ImportReport, SearchPage, SearchQuery, Storage};
