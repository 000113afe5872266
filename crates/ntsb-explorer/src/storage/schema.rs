//! `SQLite` schema definitions for ntsb-explorer.

/// SQL statement to create the accidents table.
pub const CREATE_ACCIDENTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS accidents (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    event_id TEXT NOT NULL UNIQUE,
    ntsb_number TEXT,
    event_date TEXT,
    city TEXT,
    state TEXT,
    country TEXT,
    latitude TEXT,
    longitude TEXT,
    aircraft_make TEXT,
    aircraft_model TEXT,
    aircraft_category TEXT,
    far_part TEXT,
    damage TEXT,
    weather TEXT,
    light_condition TEXT,
    flight_phase TEXT,
    highest_severity TEXT,
    fatal_count INTEGER NOT NULL DEFAULT 0,
    serious_count INTEGER NOT NULL DEFAULT 0,
    minor_count INTEGER NOT NULL DEFAULT 0,
    probable_cause TEXT,
    narrative_preliminary TEXT,
    narrative_factual TEXT,
    findings TEXT,
    cause_count INTEGER NOT NULL DEFAULT 0,
    factor_count INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
)
";

/// SQL statement to create an index on `highest_severity` for stats and filtering.
pub const CREATE_SEVERITY_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_accidents_severity ON accidents(highest_severity)
";

/// SQL statement to create an index on `state` for filtering.
pub const CREATE_STATE_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_accidents_state ON accidents(state)
";

/// SQL statement to create an index on `aircraft_make` for filtering.
pub const CREATE_MAKE_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_accidents_make ON accidents(aircraft_make)
";

/// SQL statement to create an index on `event_date` for range queries.
pub const CREATE_DATE_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_accidents_date ON accidents(event_date)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_ACCIDENTS_TABLE,
    CREATE_SEVERITY_INDEX,
    CREATE_STATE_INDEX,
    CREATE_MAKE_INDEX,
    CREATE_DATE_INDEX,
    CREATE_METADATA_TABLE,
];

/// Columns selected when reading a full accident row, in `row_to_accident` order.
pub const ACCIDENT_COLUMNS: &str = "id, event_id, ntsb_number, event_date, city, state, country, \
     latitude, longitude, aircraft_make, aircraft_model, aircraft_category, far_part, damage, \
     weather, light_condition, flight_phase, highest_severity, fatal_count, serious_count, \
     minor_count, probable_cause, narrative_preliminary, narrative_factual, findings, \
     cause_count, factor_count";
