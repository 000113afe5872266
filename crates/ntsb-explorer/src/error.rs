//! Error types for ntsb-explorer.
//!
//! Parsing and aggregating findings never fails; the errors here cover the
//! accident store, configuration, imports and queries.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for ntsb-explorer operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// The database file does not exist.
    #[error("database not found at {path}")]
    DatabaseMissing {
        /// Path that was expected to hold the database.
        path: PathBuf,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Import and Query Errors ===
    /// A line of an import file could not be turned into a record.
    #[error("invalid record on line {line}: {message}")]
    ImportRecord {
        /// 1-based line number in the import file.
        line: usize,
        /// Description of what went wrong.
        message: String,
    },

    /// Query parameters were rejected.
    #[error("invalid query: {message}")]
    InvalidQuery {
        /// Description of the rejected parameter.
        message: String,
    },

    // === I/O Errors ===
    /// Reading an import file or writing output failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },
}

/// A specialized Result type for ntsb-explorer operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new invalid query error.
    #[must_use]
    pub fn invalid_query(message: impl Into<String>) -> Self {
        Self::InvalidQuery {
            message: message.into(),
        }
    }

    /// Create an import error for the given line.
    #[must_use]
    pub fn import_record(line: usize, message: impl Into<String>) -> Self {
        Self::ImportRecord {
            line,
            message: message.into(),
        }
    }

    /// Check if this error means the data source could not be reached.
    ///
    /// Callers aggregating findings treat these as an empty corpus.
    #[must_use]
    pub fn is_source_unavailable(&self) -> bool {
        matches!(
            self,
            Self::DatabaseOpen { .. } | Self::DatabaseMissing { .. } | Self::DatabaseQuery(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_helper_constructors() {
        let err = Error::invalid_query("limit must be between 1 and 100");
        assert_eq!(
            err.to_string(),
            "invalid query: limit must be between 1 and 100"
        );

        let err = Error::import_record(42, "missing event_id");
        assert!(matches!(err, Error::ImportRecord { line: 42, .. }));
        assert_eq!(err.to_string(), "invalid record on line 42: missing event_id");
    }

    #[test]
    fn test_database_missing_display() {
        let err = Error::DatabaseMissing {
            path: PathBuf::from("/tmp/none.db"),
        };
        assert_eq!(err.to_string(), "database not found at /tmp/none.db");
    }

    #[test]
    fn test_source_unavailable_covers_storage_only() {
        let missing = Error::DatabaseMissing {
            path: PathBuf::from("/tmp/none.db"),
        };
        assert!(missing.is_source_unavailable());

        let not_found = std::io::Error::new(std::io::ErrorKind::NotFound, "export.jsonl");
        for err in [
            Error::invalid_query("x"),
            Error::import_record(1, "x"),
            Error::ConfigValidation {
                message: "x".to_string(),
            },
            Error::from(not_found),
        ] {
            assert!(!err.is_source_unavailable(), "{err}");
        }
    }

    #[test]
    fn test_unopenable_database_is_unavailable() {
        let result = rusqlite::Connection::open_with_flags(
            "/nonexistent/ntsb/accidents.db",
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
        );
        if let Err(source) = result {
            let err = Error::DatabaseOpen {
                path: PathBuf::from("/nonexistent/ntsb/accidents.db"),
                source,
            };
            assert!(err.to_string().starts_with("failed to open database at /nonexistent"));
            assert!(err.is_source_unavailable());
        }
    }

    #[test]
    fn test_from_conversions() {
        let err: Error = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, Error::DatabaseQuery(_)));
        assert!(err.is_source_unavailable());
    }

    #[test]
    fn test_figment_error_is_boxed() {
        let err: Error = figment::Error::from("bad value".to_string()).into();
        assert!(matches!(err, Error::ConfigLoad(_)));
        assert!(err.to_string().contains("bad value"));
    }
}
