//! Bulk import of NTSB JSONL exports.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::accident::{Accident, AccidentRecord};
use crate::error::{Error, Result};

use super::{insert_accident, migrations, Storage, LAST_IMPORT_KEY};

/// Number of bad lines reported individually before going quiet.
const MAX_LOGGED_ERRORS: usize = 5;

/// Rows between progress messages.
const PROGRESS_INTERVAL: usize = 1000;

/// Outcome of an import run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    /// New records written.
    pub imported: usize,
    /// Records skipped because their event id was already stored.
    pub duplicates: usize,
    /// Lines that could not be parsed.
    pub errors: usize,
}

impl ImportReport {
    /// Total non-blank lines seen.
    #[must_use]
    pub fn lines(&self) -> usize {
        self.imported + self.duplicates + self.errors
    }
}

impl Storage {
    /// Import accident records from a JSONL file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or the database write fails.
    pub fn import_file(&mut self, path: impl AsRef<Path>) -> Result<ImportReport> {
        let path = path.as_ref();
        info!("Importing accident records from {}", path.display());
        let file = File::open(path)?;
        self.import_jsonl(BufReader::new(file))
    }

    /// Import accident records, one JSON object per line.
    ///
    /// Blank lines are skipped. Lines that fail to parse are counted in
    /// [`ImportReport::errors`] and do not stop the import. All rows are
    /// written in a single transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if reading fails or the database write fails.
    pub fn import_jsonl<R: BufRead>(&mut self, reader: R) -> Result<ImportReport> {
        let mut report = ImportReport::default();
        let tx = self.conn.transaction()?;

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let line_number = index + 1;
            if line.trim().is_empty() {
                continue;
            }

            let accident = match parse_line(line_number, &line) {
                Ok(accident) => accident,
                Err(e) => {
                    report.errors += 1;
                    if report.errors <= MAX_LOGGED_ERRORS {
                        warn!("{}", e);
                    }
                    continue;
                }
            };

            match insert_accident(&tx, &accident)? {
                Some(_) => report.imported += 1,
                None => report.duplicates += 1,
            }

            if report.lines() % PROGRESS_INTERVAL == 0 {
                debug!("Processed {} records", report.lines());
            }
        }

        if report.errors > MAX_LOGGED_ERRORS {
            warn!(
                "{} more unparseable lines not shown",
                report.errors - MAX_LOGGED_ERRORS
            );
        }

        migrations::set_metadata(&tx, LAST_IMPORT_KEY, &Utc::now().to_rfc3339())?;
        tx.commit()?;

        info!(
            "Imported {} records ({} duplicates, {} errors)",
            report.imported, report.duplicates, report.errors
        );
        Ok(report)
    }
}

fn parse_line(line_number: usize, line: &str) -> Result<Accident> {
    let record: AccidentRecord = serde_json::from_str(line)
        .map_err(|e| Error::import_record(line_number, e.to_string()))?;
    if record.event_id.trim().is_empty() {
        return Err(Error::import_record(line_number, "empty event_id"));
    }
    Ok(record.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::init_test_logging;
    use crate::storage::SearchQuery;
    use std::io::Cursor;

    const EXPORT: &str = r#"{"event_id": "E1", "event_date": "01/05/2008", "location": {"state": "AZ"}, "injuries": {"highest_severity": "FATL", "fatal": 1}, "contributing_factors": {"findings": "Personnel issues-Task performance-Aircraft control - C"}}

{"event_id": "E2", "probable_cause": "Engine failure", "contributing_factors": {"findings": "Aircraft-Aircraft powerplant-Engine - C | Personnel issues-Task performance - F"}}
not json
{"event_id": "E1"}
{"event_id": "E3"}
"#;

    fn import(storage: &mut Storage, data: &str) -> ImportReport {
        storage.import_jsonl(Cursor::new(data)).unwrap()
    }

    #[test]
    fn test_import_counts() {
        init_test_logging();
        let mut storage = Storage::open_in_memory().unwrap();

        let report = import(&mut storage, EXPORT);
        assert_eq!(
            report,
            ImportReport {
                imported: 3,
                duplicates: 1,
                errors: 1,
            }
        );
        assert_eq!(report.lines(), 5);
        assert_eq!(storage.count().unwrap(), 3);
    }

    #[test]
    fn test_import_maps_fields() {
        let mut storage = Storage::open_in_memory().unwrap();
        import(&mut storage, EXPORT);

        let page = storage.search(&SearchQuery::default()).unwrap();
        let first = page.accidents.iter().find(|a| a.event_id == "E1").unwrap();
        assert_eq!(first.event_date.as_deref(), Some("2008-01-05"));
        assert_eq!(first.state.as_deref(), Some("AZ"));
        assert_eq!(first.highest_severity.as_deref(), Some("FATL"));
        assert_eq!(first.fatal_count, 1);
    }

    #[test]
    fn test_import_feeds_findings_texts() {
        let mut storage = Storage::open_in_memory().unwrap();
        import(&mut storage, EXPORT);

        let texts = storage.findings_texts().unwrap();
        assert_eq!(texts.len(), 2);
        assert!(texts[0].starts_with("Personnel issues"));
    }

    #[test]
    fn test_reimport_is_all_duplicates() {
        let mut storage = Storage::open_in_memory().unwrap();
        import(&mut storage, EXPORT);

        let report = import(&mut storage, EXPORT);
        assert_eq!(report.imported, 0);
        assert_eq!(report.duplicates, 4);
        assert_eq!(storage.count().unwrap(), 3);
    }

    #[test]
    fn test_import_records_last_import() {
        let mut storage = Storage::open_in_memory().unwrap();
        assert!(storage.last_import().unwrap().is_none());

        import(&mut storage, "");
        assert!(storage.last_import().unwrap().is_some());
        assert!(storage.stats().unwrap().last_import.is_some());
    }

    #[test]
    fn test_empty_event_id_is_error() {
        let mut storage = Storage::open_in_memory().unwrap();
        let report = import(&mut storage, "{\"event_id\": \"  \"}\n");
        assert_eq!(report.errors, 1);
        assert_eq!(report.imported, 0);
    }

    #[test]
    fn test_parse_line_error_mentions_line() {
        let err = parse_line(7, "{").unwrap_err();
        assert!(matches!(err, Error::ImportRecord { line: 7, .. }));
    }

    #[test]
    fn test_import_file_missing() {
        let mut storage = Storage::open_in_memory().unwrap();
        let path = std::env::temp_dir().join("ntsb_explorer_no_such_export.jsonl");
        assert!(matches!(storage.import_file(&path), Err(Error::Io(_))));
    }

    #[test]
    fn test_import_file() {
        let path = std::env::temp_dir().join(format!(
            "ntsb_explorer_import_{}.jsonl",
            std::process::id()
        ));
        std::fs::write(&path, EXPORT).unwrap();

        let mut storage = Storage::open_in_memory().unwrap();
        let report = storage.import_file(&path).unwrap();
        assert_eq!(report.imported, 3);

        let _ = std::fs::remove_file(&path);
    }

}
