//! Accident record types.
//!
//! [`Accident`] is one row of the accident store. [`AccidentRecord`] is the
//! nested shape of a line in an NTSB JSONL export; it converts into an
//! [`Accident`] ready for insertion.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::findings::{parse_findings, FindingEntry};

/// Highest injury severity of an accident, by NTSB code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// At least one fatality.
    #[serde(rename = "FATL")]
    Fatal,
    /// At least one serious injury.
    #[serde(rename = "SERS")]
    Serious,
    /// At least one minor injury.
    #[serde(rename = "MINR")]
    Minor,
    /// No injuries.
    #[serde(rename = "NONE")]
    NoInjury,
    /// Not recorded.
    #[serde(rename = "UNKN")]
    Unknown,
}

impl Severity {
    /// All severities in display order.
    pub const ALL: [Self; 5] = [
        Self::Fatal,
        Self::Serious,
        Self::Minor,
        Self::NoInjury,
        Self::Unknown,
    ];

    /// The NTSB code stored in the database.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::Fatal => "FATL",
            Self::Serious => "SERS",
            Self::Minor => "MINR",
            Self::NoInjury => "NONE",
            Self::Unknown => "UNKN",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Fatal => "Fatal",
            Self::Serious => "Serious Injury",
            Self::Minor => "Minor Injury",
            Self::NoInjury => "No Injury",
            Self::Unknown => "Unknown",
        }
    }

    /// Look up a severity by code. Unrecognized codes map to `Unknown`.
    #[must_use]
    pub fn from_code(code: &str) -> Self {
        match code {
            "FATL" => Self::Fatal,
            "SERS" => Self::Serious,
            "MINR" => Self::Minor,
            "NONE" => Self::NoInjury,
            _ => Self::Unknown,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// One accident row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Accident {
    /// Row id (assigned by storage layer).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// NTSB event identifier, unique per event.
    pub event_id: String,
    /// NTSB report number.
    pub ntsb_number: Option<String>,
    /// Event date, `YYYY-MM-DD` when the source date could be parsed.
    pub event_date: Option<String>,

    /// City of the event.
    pub city: Option<String>,
    /// State or region code.
    pub state: Option<String>,
    /// Country code.
    pub country: Option<String>,
    /// Latitude as recorded.
    pub latitude: Option<String>,
    /// Longitude as recorded.
    pub longitude: Option<String>,

    /// Aircraft manufacturer.
    pub aircraft_make: Option<String>,
    /// Aircraft model.
    pub aircraft_model: Option<String>,
    /// Aircraft category code.
    pub aircraft_category: Option<String>,
    /// Federal Aviation Regulations part the flight operated under.
    pub far_part: Option<String>,
    /// Aircraft damage code.
    pub damage: Option<String>,

    /// Weather condition code.
    pub weather: Option<String>,
    /// Light condition code.
    pub light_condition: Option<String>,
    /// Phase of flight.
    pub flight_phase: Option<String>,

    /// Highest injury severity code (`FATL`, `SERS`, ...).
    pub highest_severity: Option<String>,
    /// Fatal injuries.
    pub fatal_count: i64,
    /// Serious injuries.
    pub serious_count: i64,
    /// Minor injuries.
    pub minor_count: i64,

    /// Probable cause statement.
    pub probable_cause: Option<String>,
    /// Preliminary narrative.
    pub narrative_preliminary: Option<String>,
    /// Factual narrative.
    pub narrative_factual: Option<String>,

    /// Raw findings text, entries joined by `" | "`.
    pub findings: Option<String>,
    /// Findings marked as causes, as reported by the source.
    pub cause_count: i64,
    /// Findings marked as factors, as reported by the source.
    pub factor_count: i64,
}

impl Accident {
    /// The severity of this accident, if recorded.
    #[must_use]
    pub fn severity(&self) -> Option<Severity> {
        self.highest_severity.as_deref().map(Severity::from_code)
    }

    /// Parsed findings of this accident, in source order.
    #[must_use]
    pub fn finding_entries(&self) -> Vec<FindingEntry> {
        self.findings.as_deref().map(parse_findings).unwrap_or_default()
    }

    /// City, state and country joined for display.
    #[must_use]
    pub fn location(&self) -> String {
        [&self.city, &self.state, &self.country]
            .into_iter()
            .filter_map(|part| part.as_deref())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Aircraft make and model joined for display.
    #[must_use]
    pub fn aircraft(&self) -> String {
        [&self.aircraft_make, &self.aircraft_model]
            .into_iter()
            .filter_map(|part| part.as_deref())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Readable label for the light condition code.
    #[must_use]
    pub fn light_label(&self) -> &str {
        match self.light_condition.as_deref() {
            Some("DAYL") => "Daylight",
            Some("NITE") => "Night",
            Some("DUSK") => "Dusk",
            Some("DAWN") => "Dawn",
            Some(other) => other,
            None => "Unknown",
        }
    }
}

/// Location block of an export line.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RecordLocation {
    /// City of the event.
    pub city: Option<String>,
    /// State or region code.
    pub state: Option<String>,
    /// Country code.
    pub country: Option<String>,
    /// Latitude as recorded.
    pub latitude: Option<serde_json::Value>,
    /// Longitude as recorded.
    pub longitude: Option<serde_json::Value>,
}

/// Aircraft block of an export line.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RecordAircraft {
    /// Manufacturer.
    pub make: Option<String>,
    /// Model.
    pub model: Option<String>,
    /// Category code.
    pub category: Option<String>,
    /// Federal Aviation Regulations part the flight operated under.
    pub far_part: Option<String>,
    /// Aircraft damage code.
    pub damage: Option<String>,
}

/// Conditions block of an export line.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RecordConditions {
    /// Weather condition code.
    pub weather: Option<String>,
    /// Light condition code.
    pub light: Option<String>,
}

/// Injuries block of an export line.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RecordInjuries {
    /// Highest injury severity code.
    pub highest_severity: Option<String>,
    /// Fatal injuries.
    pub fatal: Option<i64>,
    /// Serious injuries.
    pub serious: Option<i64>,
    /// Minor injuries.
    pub minor: Option<i64>,
}

/// Contributing factors block of an export line.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RecordFactors {
    /// Findings text.
    pub findings: Option<String>,
    /// Findings marked as causes, as reported by the source.
    pub cause_count: Option<i64>,
    /// Findings marked as factors, as reported by the source.
    pub factor_count: Option<i64>,
}

/// One line of an NTSB JSONL export.
#[derive(Debug, Clone, Deserialize)]
pub struct AccidentRecord {
    /// NTSB event identifier.
    pub event_id: String,
    /// NTSB report number.
    #[serde(default)]
    pub ntsb_number: Option<String>,
    /// Event date as exported.
    #[serde(default)]
    pub event_date: Option<String>,
    /// Where the event happened.
    #[serde(default)]
    pub location: Option<RecordLocation>,
    /// Aircraft involved.
    #[serde(default)]
    pub aircraft: Option<RecordAircraft>,
    /// Weather and light.
    #[serde(default)]
    pub conditions: Option<RecordConditions>,
    /// Phase of flight.
    #[serde(default)]
    pub flight_phase: Option<String>,
    /// Injury counts.
    #[serde(default)]
    pub injuries: Option<RecordInjuries>,
    /// Probable cause statement.
    #[serde(default)]
    pub probable_cause: Option<String>,
    /// Preliminary narrative.
    #[serde(default)]
    pub narrative_preliminary: Option<String>,
    /// Factual narrative.
    #[serde(default)]
    pub narrative_factual: Option<String>,
    /// Findings and their counts.
    #[serde(default)]
    pub contributing_factors: Option<RecordFactors>,
}

impl From<AccidentRecord> for Accident {
    fn from(record: AccidentRecord) -> Self {
        let location = record.location.unwrap_or_default();
        let aircraft = record.aircraft.unwrap_or_default();
        let conditions = record.conditions.unwrap_or_default();
        let injuries = record.injuries.unwrap_or_default();
        let factors = record.contributing_factors.unwrap_or_default();

        Self {
            id: None,
            event_id: record.event_id,
            ntsb_number: non_empty(record.ntsb_number),
            event_date: non_empty(record.event_date).map(|raw| normalize_event_date(&raw)),
            city: non_empty(location.city),
            state: non_empty(location.state),
            country: non_empty(location.country),
            latitude: location.latitude.as_ref().and_then(value_to_string),
            longitude: location.longitude.as_ref().and_then(value_to_string),
            aircraft_make: non_empty(aircraft.make),
            aircraft_model: non_empty(aircraft.model),
            aircraft_category: non_empty(aircraft.category),
            far_part: non_empty(aircraft.far_part),
            damage: non_empty(aircraft.damage),
            weather: non_empty(conditions.weather),
            light_condition: non_empty(conditions.light),
            flight_phase: non_empty(record.flight_phase),
            highest_severity: non_empty(injuries.highest_severity),
            fatal_count: injuries.fatal.unwrap_or(0),
            serious_count: injuries.serious.unwrap_or(0),
            minor_count: injuries.minor.unwrap_or(0),
            probable_cause: non_empty(record.probable_cause),
            narrative_preliminary: non_empty(record.narrative_preliminary),
            narrative_factual: non_empty(record.narrative_factual),
            findings: non_empty(factors.findings),
            cause_count: factors.cause_count.unwrap_or(0),
            factor_count: factors.factor_count.unwrap_or(0),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn value_to_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Parse an NTSB event date.
///
/// Accepts `MM/DD/YYYY` and `MM/DD/YY` (optionally followed by a time),
/// `YYYY-MM-DD`, naive `YYYY-MM-DDTHH:MM:SS` and RFC 3339. Two-digit years
/// below 50 are read as 20xx, the rest as 19xx.
#[must_use]
pub fn parse_event_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.date());
    }

    let day_part = raw.split_whitespace().next()?;
    if let Ok(date) = NaiveDate::parse_from_str(day_part, "%Y-%m-%d") {
        return Some(date);
    }

    let mut fields = day_part.split('/');
    let month: u32 = fields.next()?.parse().ok()?;
    let day: u32 = fields.next()?.parse().ok()?;
    let year_field = fields.next()?;
    if fields.next().is_some() {
        return None;
    }
    let mut year: i32 = year_field.parse().ok()?;
    if year_field.len() <= 2 {
        year += if year < 50 { 2000 } else { 1900 };
    }
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Normalize an event date to `YYYY-MM-DD`, keeping unparseable input as is.
#[must_use]
pub fn normalize_event_date(raw: &str) -> String {
    parse_event_date(raw).map_or_else(|| raw.to_string(), |d| d.format("%Y-%m-%d").to_string())
}
