//! Parsing of NTSB findings text.
//!
//! An accident record carries its findings as a single string: entries joined
//! by `" | "`, each entry a dash-separated taxonomy path optionally tagged with
//! a trailing `" - C"` (cause) or `" - F"` (contributing factor) marker.
//!
//! ```text
//! Personnel issues-Task performance-Aircraft control - C | Aircraft-Powerplant - F
//! ```
//!
//! Parsing is tolerant: entries without a usable category are skipped rather
//! than reported as errors.

use serde::{Deserialize, Serialize};
use tracing::trace;

/// Separator between entries of a findings string.
pub const ENTRY_SEPARATOR: &str = " | ";

/// Separator between the levels of a finding path.
pub const PATH_SEPARATOR: char = '-';

/// Joiner used to rebuild the detail from the path levels past the subcategory.
pub const DETAIL_JOINER: &str = " - ";

const CAUSE_MARKER: &str = " - C";
const FACTOR_MARKER: &str = " - F";

/// The role a finding played in an accident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// A direct cause of the accident.
    Cause,
    /// A contributing (non-direct) factor.
    Factor,
    /// Neither marker was present.
    Unspecified,
}

impl Role {
    /// Split a trailing role marker off `segment`.
    ///
    /// Only an exact `" - C"` or `" - F"` at the very end counts.
    #[must_use]
    pub fn split_marker(segment: &str) -> (&str, Self) {
        if let Some(path) = segment.strip_suffix(CAUSE_MARKER) {
            (path, Self::Cause)
        } else if let Some(path) = segment.strip_suffix(FACTOR_MARKER) {
            (path, Self::Factor)
        } else {
            (segment, Self::Unspecified)
        }
    }

    /// Whether this finding is ranked as a cause.
    ///
    /// Unspecified findings rank alongside factors.
    #[must_use]
    pub fn is_cause(self) -> bool {
        matches!(self, Self::Cause)
    }

    /// Upper-case label used when listing a record's findings.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Cause => "CAUSE",
            Self::Factor => "FACTOR",
            Self::Unspecified => "FINDING",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cause => write!(f, "cause"),
            Self::Factor => write!(f, "factor"),
            Self::Unspecified => write!(f, "unspecified"),
        }
    }
}

/// One parsed entry of a findings string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindingEntry {
    /// The entry as it appeared, role marker included.
    pub raw_path: String,
    /// The entry with its role marker removed.
    pub clean_path: String,
    /// Cause, factor or unspecified.
    pub role: Role,
    /// First path level.
    pub category: String,
    /// Second path level, empty when absent.
    pub subcategory: String,
    /// Remaining path levels joined with `" - "`, empty when absent.
    pub detail: String,
}

impl FindingEntry {
    /// Parse a single entry.
    ///
    /// Returns `None` when the entry has no non-empty category.
    #[must_use]
    pub fn parse(segment: &str) -> Option<Self> {
        let (clean_path, role) = Role::split_marker(segment);

        let mut parts = clean_path.split(PATH_SEPARATOR).map(str::trim);
        let category = parts.next().unwrap_or_default();
        if category.is_empty() {
            trace!("Skipping finding without category: {:?}", segment);
            return None;
        }
        let subcategory = parts.next().unwrap_or_default();
        let detail = parts.collect::<Vec<_>>().join(DETAIL_JOINER);

        Some(Self {
            raw_path: segment.to_string(),
            clean_path: clean_path.to_string(),
            role,
            category: category.to_string(),
            subcategory: subcategory.to_string(),
            detail,
        })
    }

    /// Path levels below the category, for display.
    #[must_use]
    pub fn trail(&self) -> Vec<&str> {
        self.clean_path
            .split(PATH_SEPARATOR)
            .map(str::trim)
            .skip(1)
            .collect()
    }
}

/// Split a findings string into its non-empty raw segments.
pub fn segments(text: &str) -> impl Iterator<Item = &str> {
    text.split(ENTRY_SEPARATOR)
        .filter(|segment| !segment.trim().is_empty())
}

/// Parse every entry of a findings string, skipping malformed ones.
#[must_use]
pub fn parse_findings(text: &str) -> Vec<FindingEntry> {
    segments(text).filter_map(FindingEntry::parse).collect()
}
