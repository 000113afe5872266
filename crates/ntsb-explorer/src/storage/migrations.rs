//! Schema versioning for the accident store.
//!
//! The version lives in the `metadata` table next to other bookkeeping values
//! such as the time of the last import.

use rusqlite::{Connection, OptionalExtension};
use tracing::debug;

use crate::error::{Error, Result};

use super::schema::SCHEMA_STATEMENTS;

/// The current schema version.
pub const CURRENT_VERSION: i32 = 2;

/// Key used to store the schema version in the metadata table.
const VERSION_KEY: &str = "schema_version";

/// Partial index backing the bulk findings read.
const CREATE_FINDINGS_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_accidents_with_findings
ON accidents(id) WHERE findings IS NOT NULL
";

/// Initialize the database schema.
///
/// Creates all tables and indexes if they don't exist, then brings the schema
/// up to [`CURRENT_VERSION`].
///
/// # Errors
///
/// Returns an error if schema creation or migration fails.
pub fn initialize_schema(conn: &Connection) -> Result<()> {
    for statement in SCHEMA_STATEMENTS {
        conn.execute(statement, [])?;
    }

    let version = schema_version(conn)?;
    if version > CURRENT_VERSION {
        return Err(Error::DatabaseMigration {
            message: format!(
                "database schema version {version} is newer than supported version {CURRENT_VERSION}"
            ),
        });
    }
    for next in (version + 1)..=CURRENT_VERSION {
        debug!("Migrating accident store to schema version {}", next);
        run_migration(conn, next)?;
        set_metadata(conn, VERSION_KEY, &next.to_string())?;
    }

    Ok(())
}

/// Get the current schema version from the database.
///
/// Returns 0 if no version is set (fresh database).
///
/// # Errors
///
/// Returns an error if the stored version is not a number or the query fails.
pub fn schema_version(conn: &Connection) -> Result<i32> {
    match get_metadata(conn, VERSION_KEY)? {
        Some(value) => value.parse().map_err(|_| Error::DatabaseMigration {
            message: format!("invalid schema version: {value}"),
        }),
        None => Ok(0),
    }
}

/// Read a metadata value.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn get_metadata(conn: &Connection, key: &str) -> Result<Option<String>> {
    let value = conn
        .query_row("SELECT value FROM metadata WHERE key = ?1", [key], |row| {
            row.get(0)
        })
        .optional()?;
    Ok(value)
}

/// Write a metadata value, replacing any previous one.
///
/// # Errors
///
/// Returns an error if the statement fails.
pub fn set_metadata(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
        (key, value),
    )?;
    Ok(())
}

fn run_migration(conn: &Connection, version: i32) -> Result<()> {
    match version {
        // Base schema, created by SCHEMA_STATEMENTS.
        1 => Ok(()),
        2 => {
            conn.execute(CREATE_FINDINGS_INDEX, [])?;
            Ok(())
        }
        _ => Err(Error::DatabaseMigration {
            message: format!("unknown migration version: {version}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_db() -> Connection {
        Connection::open_in_memory().expect("failed to create in-memory database")
    }

    fn create_metadata_only(conn: &Connection) {
        conn.execute(
            "CREATE TABLE metadata (key TEXT PRIMARY KEY, value TEXT NOT NULL)",
            [],
        )
        .unwrap();
    }

    #[test]
    fn test_initialize_schema_creates_tables() {
        let conn = create_test_db();
        initialize_schema(&conn).expect("failed to initialize schema");

        for table in ["accidents", "metadata"] {
            let count: i32 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                    [table],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(count, 1, "missing table {table}");
        }
    }

    #[test]
    fn test_initialize_schema_sets_version() {
        let conn = create_test_db();
        initialize_schema(&conn).unwrap();
        assert_eq!(schema_version(&conn).unwrap(), CURRENT_VERSION);
    }

    #[test]
    fn test_initialize_schema_idempotent() {
        let conn = create_test_db();
        initialize_schema(&conn).expect("first init failed");
        initialize_schema(&conn).expect("second init failed");
        assert_eq!(schema_version(&conn).unwrap(), CURRENT_VERSION);
    }

    #[test]
    fn test_upgrade_from_v1_adds_findings_index() {
        let conn = create_test_db();
        for statement in SCHEMA_STATEMENTS {
            conn.execute(statement, []).unwrap();
        }
        set_metadata(&conn, VERSION_KEY, "1").unwrap();

        initialize_schema(&conn).unwrap();

        let count: i32 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='index' AND name='idx_accidents_with_findings'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(schema_version(&conn).unwrap(), 2);
    }

    #[test]
    fn test_newer_schema_rejected() {
        let conn = create_test_db();
        initialize_schema(&conn).unwrap();
        set_metadata(&conn, VERSION_KEY, "99").unwrap();

        let err = initialize_schema(&conn).unwrap_err();
        assert!(err.to_string().contains("newer than supported"));
    }

    #[test]
    fn test_schema_version_fresh_db() {
        let conn = create_test_db();
        create_metadata_only(&conn);
        assert_eq!(schema_version(&conn).unwrap(), 0);
    }

    #[test]
    fn test_invalid_schema_version() {
        let conn = create_test_db();
        create_metadata_only(&conn);
        set_metadata(&conn, VERSION_KEY, "two").unwrap();

        let err = schema_version(&conn).unwrap_err();
        assert!(err.to_string().contains("invalid schema version"));
    }

    #[test]
    fn test_metadata_roundtrip_and_replace() {
        let conn = create_test_db();
        create_metadata_only(&conn);

        assert!(get_metadata(&conn, "last_import").unwrap().is_none());
        set_metadata(&conn, "last_import", "a").unwrap();
        set_metadata(&conn, "last_import", "b").unwrap();
        assert_eq!(get_metadata(&conn, "last_import").unwrap().as_deref(), Some("b"));
    }

    #[test]
    fn test_run_migration_unknown_version() {
        let conn = create_test_db();
        initialize_schema(&conn).unwrap();

        let err = run_migration(&conn, 999).unwrap_err();
        assert!(err.to_string().contains("unknown migration version"));
    }

    #[test]
    fn test_indexes_created() {
        let conn = create_test_db();
        initialize_schema(&conn).unwrap();

        let indexes: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='index' AND tbl_name='accidents'")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect();

        assert!(indexes.iter().any(|n| n.contains("severity")));
        assert!(indexes.iter().any(|n| n.contains("state")));
        assert!(indexes.iter().any(|n| n.contains("make")));
        assert!(indexes.iter().any(|n| n.contains("date")));
        assert!(indexes.iter().any(|n| n.contains("with_findings")));
    }
}
