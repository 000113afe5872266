//! Storage layer for ntsb-explorer.
//!
//! This module provides `SQLite`-based storage for accident records. It is the
//! data source the findings aggregator reads from, and also answers the
//! explorer's stats, search and lookup queries.

mod import;
pub mod migrations;
pub mod query;
pub mod schema;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, Connection, OpenFlags, OptionalExtension};
use tracing::{debug, info};

use crate::accident::Accident;
use crate::error::{Error, Result};

pub use import::ImportReport;
pub use query::{DatabaseStats, FilterOptions, SearchPage, SearchQuery};

use query::{DEFAULT_MAX_SEARCH_LIMIT, MAX_MAKE_OPTIONS};
use schema::ACCIDENT_COLUMNS;

/// Metadata key holding the time of the last import.
const LAST_IMPORT_KEY: &str = "last_import_at";

/// Storage engine for accident records.
#[derive(Debug)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
    /// Largest page size accepted by [`search`](Self::search).
    max_search_limit: usize,
}

impl Storage {
    /// Open or create a storage database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    /// Initializes the schema if this is a new database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        migrations::initialize_schema(&conn)?;

        info!("Database opened successfully at {}", path.display());
        Ok(Self::from_parts(path, conn))
    }

    /// Open an existing database without write access.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DatabaseMissing`] if the file does not exist, or an
    /// error if it cannot be opened.
    pub fn open_read_only(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(Error::DatabaseMissing { path });
        }

        debug!("Opening database read-only at {}", path.display());
        let conn = Connection::open_with_flags(
            &path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        Ok(Self::from_parts(path, conn))
    }

    /// Create an in-memory storage instance for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self::from_parts(PathBuf::from(":memory:"), conn))
    }

    fn from_parts(path: PathBuf, conn: Connection) -> Self {
        Self {
            path,
            conn,
            max_search_limit: DEFAULT_MAX_SEARCH_LIMIT,
        }
    }

    /// Set the largest page size accepted by [`search`](Self::search).
    #[must_use]
    pub fn with_max_search_limit(mut self, max_search_limit: usize) -> Self {
        self.max_search_limit = max_search_limit;
        self
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Insert an accident record.
    ///
    /// Returns the assigned ID, or `None` if a record with the same event id
    /// already exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn insert(&self, accident: &Accident) -> Result<Option<i64>> {
        insert_accident(&self.conn, accident)
    }

    /// Get an accident by its row ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get(&self, id: i64) -> Result<Option<Accident>> {
        let result = self
            .conn
            .query_row(
                &format!("SELECT {ACCIDENT_COLUMNS} FROM accidents WHERE id = ?1"),
                [id],
                Self::row_to_accident,
            )
            .optional()?;
        Ok(result)
    }

    /// Count all accident records.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count(&self) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM accidents", [], |row| row.get(0))?;
        Ok(count.unsigned_abs())
    }

    /// Read every non-empty findings text, in row order.
    ///
    /// This is the single bulk read behind findings aggregation.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn findings_texts(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            r"
            SELECT findings FROM accidents
            WHERE findings IS NOT NULL AND findings <> ''
            ORDER BY id
            ",
        )?;

        let texts = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;

        debug!("Read {} findings texts", texts.len());
        Ok(texts)
    }

    /// Search accident records.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidQuery`] if the query is out of bounds, or an
    /// error if the database operation fails.
    pub fn search(&self, query: &SearchQuery) -> Result<SearchPage> {
        query.validate(self.max_search_limit)?;

        let (where_clause, mut values) = query.where_clause();

        let total: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM accidents {where_clause}"),
            params_from_iter(values.iter()),
            |row| row.get(0),
        )?;

        values.push(to_sql_int(query.limit));
        values.push(to_sql_int(query.offset));

        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ACCIDENT_COLUMNS} FROM accidents {where_clause} ORDER BY id DESC LIMIT ? OFFSET ?"
        ))?;
        let accidents = stmt
            .query_map(params_from_iter(values.iter()), Self::row_to_accident)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        debug!(
            "Search matched {} records, returning {}",
            total,
            accidents.len()
        );
        Ok(SearchPage {
            accidents,
            total: total.unsigned_abs(),
        })
    }

    /// Get counts over the whole store.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<DatabaseStats> {
        let mut stats = self.conn.query_row(
            r"
            SELECT
                COUNT(*),
                COUNT(probable_cause),
                COUNT(findings),
                COALESCE(SUM(highest_severity = 'FATL'), 0),
                COALESCE(SUM(highest_severity = 'SERS'), 0),
                COALESCE(SUM(highest_severity = 'MINR'), 0),
                COALESCE(SUM(highest_severity = 'NONE'), 0)
            FROM accidents
            ",
            [],
            |row| {
                let get = |idx: usize| row.get::<_, i64>(idx).map(i64::unsigned_abs);
                Ok(DatabaseStats {
                    total_events: get(0)?,
                    events_with_probable_cause: get(1)?,
                    events_with_findings: get(2)?,
                    fatal_accidents: get(3)?,
                    serious_accidents: get(4)?,
                    minor_accidents: get(5)?,
                    no_injury_accidents: get(6)?,
                    last_import: None,
                })
            },
        )?;

        stats.last_import = self.last_import()?;
        Ok(stats)
    }

    /// When records were last imported, if ever.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn last_import(&self) -> Result<Option<DateTime<Utc>>> {
        let value = migrations::get_metadata(&self.conn, LAST_IMPORT_KEY)?;
        Ok(value
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|dt| dt.with_timezone(&Utc)))
    }

    /// Get the distinct values offered for exact-match filters.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn filter_options(&self) -> Result<FilterOptions> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT state FROM accidents WHERE state IS NOT NULL ORDER BY state",
        )?;
        let states = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;

        let mut stmt = self.conn.prepare(
            r"
            SELECT DISTINCT aircraft_make FROM accidents
            WHERE aircraft_make IS NOT NULL
            ORDER BY aircraft_make LIMIT ?1
            ",
        )?;
        let makes = stmt
            .query_map([to_sql_int(MAX_MAKE_OPTIONS)], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;

        Ok(FilterOptions { states, makes })
    }

    /// Convert a database row to an Accident struct.
    fn row_to_accident(row: &rusqlite::Row) -> rusqlite::Result<Accident> {
        Ok(Accident {
            id: Some(row.get(0)?),
            event_id: row.get(1)?,
            ntsb_number: row.get(2)?,
            event_date: row.get(3)?,
            city: row.get(4)?,
            state: row.get(5)?,
            country: row.get(6)?,
            latitude: row.get(7)?,
            longitude: row.get(8)?,
            aircraft_make: row.get(9)?,
            aircraft_model: row.get(10)?,
            aircraft_category: row.get(11)?,
            far_part: row.get(12)?,
            damage: row.get(13)?,
            weather: row.get(14)?,
            light_condition: row.get(15)?,
            flight_phase: row.get(16)?,
            highest_severity: row.get(17)?,
            fatal_count: row.get(18)?,
            serious_count: row.get(19)?,
            minor_count: row.get(20)?,
            probable_cause: row.get(21)?,
            narrative_preliminary: row.get(22)?,
            narrative_factual: row.get(23)?,
            findings: row.get(24)?,
            cause_count: row.get(25)?,
            factor_count: row.get(26)?,
        })
    }
}

/// Insert one record on `conn`, which may be a transaction.
fn insert_accident(conn: &Connection, accident: &Accident) -> Result<Option<i64>> {
    let affected = conn.execute(
        r"
        INSERT OR IGNORE INTO accidents (
            event_id, ntsb_number, event_date, city, state, country, latitude, longitude,
            aircraft_make, aircraft_model, aircraft_category, far_part, damage,
            weather, light_condition, flight_phase, highest_severity,
            fatal_count, serious_count, minor_count,
            probable_cause, narrative_preliminary, narrative_factual,
            findings, cause_count, factor_count
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13,
            ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26
        )
        ",
        params![
            accident.event_id,
            accident.ntsb_number,
            accident.event_date,
            accident.city,
            accident.state,
            accident.country,
            accident.latitude,
            accident.longitude,
            accident.aircraft_make,
            accident.aircraft_model,
            accident.aircraft_category,
            accident.far_part,
            accident.damage,
            accident.weather,
            accident.light_condition,
            accident.flight_phase,
            accident.highest_severity,
            accident.fatal_count,
            accident.serious_count,
            accident.minor_count,
            accident.probable_cause,
            accident.narrative_preliminary,
            accident.narrative_factual,
            accident.findings,
            accident.cause_count,
            accident.factor_count,
        ],
    )?;

    if affected == 0 {
        debug!("Skipping duplicate event {}", accident.event_id);
        return Ok(None);
    }
    Ok(Some(conn.last_insert_rowid()))
}

fn to_sql_int(value: usize) -> rusqlite::types::Value {
    rusqlite::types::Value::Integer(i64::try_from(value).unwrap_or(i64::MAX))
}
