//! Query parameter and result types for the accident store.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Value;
use serde::Serialize;

use crate::accident::{Accident, Severity};
use crate::error::{Error, Result};

/// Page size used when a search gives none.
pub const DEFAULT_SEARCH_LIMIT: usize = 24;

/// Largest page size accepted by default.
pub const DEFAULT_MAX_SEARCH_LIMIT: usize = 100;

/// Maximum number of distinct makes offered as filter options.
pub const MAX_MAKE_OPTIONS: usize = 200;

/// Filters for [`Storage::search`](super::Storage::search).
///
/// All filters are combined with AND; severities among themselves with OR.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    /// Substring matched against NTSB number, event id, probable cause,
    /// city, make and model.
    pub term: Option<String>,
    /// Accepted severities; empty accepts all.
    pub severities: Vec<Severity>,
    /// Exact state.
    pub state: Option<String>,
    /// Exact aircraft make.
    pub aircraft_make: Option<String>,
    /// Earliest event date, inclusive.
    pub date_from: Option<NaiveDate>,
    /// Latest event date, inclusive.
    pub date_to: Option<NaiveDate>,
    /// Only records with a probable cause.
    pub with_probable_cause: bool,
    /// Page size.
    pub limit: usize,
    /// Rows to skip.
    pub offset: usize,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            term: None,
            severities: Vec::new(),
            state: None,
            aircraft_make: None,
            date_from: None,
            date_to: None,
            with_probable_cause: false,
            limit: DEFAULT_SEARCH_LIMIT,
            offset: 0,
        }
    }
}

impl SearchQuery {
    /// Check the page bounds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidQuery`] if the limit is outside `1..=max_limit`
    /// or the date range is inverted.
    pub fn validate(&self, max_limit: usize) -> Result<()> {
        if self.limit == 0 || self.limit > max_limit {
            return Err(Error::invalid_query(format!(
                "limit must be between 1 and {max_limit}, got {}",
                self.limit
            )));
        }
        if let (Some(from), Some(to)) = (self.date_from, self.date_to) {
            if from > to {
                return Err(Error::invalid_query(format!(
                    "date range is empty: {from} is after {to}"
                )));
            }
        }
        Ok(())
    }

    /// Build the `WHERE` clause and its positional parameters.
    pub(crate) fn where_clause(&self) -> (String, Vec<Value>) {
        let mut conditions: Vec<String> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        if let Some(term) = self.term.as_deref().filter(|t| !t.is_empty()) {
            let pattern = format!("%{term}%");
            let columns = [
                "ntsb_number",
                "event_id",
                "probable_cause",
                "city",
                "aircraft_make",
                "aircraft_model",
            ];
            let clause = columns
                .iter()
                .map(|column| format!("{column} LIKE ?"))
                .collect::<Vec<_>>()
                .join(" OR ");
            conditions.push(format!("({clause})"));
            values.extend(columns.iter().map(|_| Value::Text(pattern.clone())));
        }

        if !self.severities.is_empty() {
            let placeholders = vec!["?"; self.severities.len()].join(", ");
            conditions.push(format!("highest_severity IN ({placeholders})"));
            values.extend(
                self.severities
                    .iter()
                    .map(|s| Value::Text(s.code().to_string())),
            );
        }

        if let Some(state) = &self.state {
            conditions.push("state = ?".to_string());
            values.push(Value::Text(state.clone()));
        }

        if let Some(make) = &self.aircraft_make {
            conditions.push("aircraft_make = ?".to_string());
            values.push(Value::Text(make.clone()));
        }

        // Dates are stored as YYYY-MM-DD, which orders correctly as text.
        if let Some(from) = self.date_from {
            conditions.push("event_date >= ?".to_string());
            values.push(Value::Text(from.format("%Y-%m-%d").to_string()));
        }
        if let Some(to) = self.date_to {
            conditions.push("event_date <= ?".to_string());
            values.push(Value::Text(to.format("%Y-%m-%d").to_string()));
        }

        if self.with_probable_cause {
            conditions.push("probable_cause IS NOT NULL".to_string());
        }

        if conditions.is_empty() {
            (String::new(), values)
        } else {
            (format!("WHERE {}", conditions.join(" AND ")), values)
        }
    }
}

/// One page of search results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchPage {
    /// Matching records on this page, newest row first.
    pub accidents: Vec<Accident>,
    /// Matching records across all pages.
    pub total: u64,
}

/// Counts over the whole accident store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseStats {
    /// All records.
    pub total_events: u64,
    /// Records with a probable cause statement.
    pub events_with_probable_cause: u64,
    /// Records with findings text.
    pub events_with_findings: u64,
    /// Records with severity `FATL`.
    pub fatal_accidents: u64,
    /// Records with severity `SERS`.
    pub serious_accidents: u64,
    /// Records with severity `MINR`.
    pub minor_accidents: u64,
    /// Records with severity `NONE`.
    pub no_injury_accidents: u64,
    /// When records were last imported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_import: Option<DateTime<Utc>>,
}

/// Values offered for the exact-match search filters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    /// Distinct states, sorted.
    pub states: Vec<String>,
    /// Distinct aircraft makes, sorted, at most [`MAX_MAKE_OPTIONS`].
    pub makes: Vec<String>,
}
