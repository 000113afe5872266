//! Cause and factor aggregation over findings text.
//!
//! [`FindingsAggregator`] makes one pass over the findings strings of every
//! record and produces a [`FindingsSummary`]: global totals, a rollup per
//! category with its most frequent subcategories, and a ranking of distinct
//! finding paths by occurrence.
//!
//! All orderings are by count, descending, with ties kept in the order the
//! keys were first seen. Feeding the same texts in the same order therefore
//! always yields the same summary.

use std::collections::HashMap;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::findings::{self, FindingEntry, Role};

/// Default number of subcategories kept per category.
pub const DEFAULT_MAX_SUBCATEGORIES: usize = 10;

/// Default number of ranked findings kept.
pub const DEFAULT_MAX_FINDINGS: usize = 500;

/// Truncation limits applied when a summary is finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateLimits {
    /// Subcategories kept per category rollup.
    pub max_subcategories: usize,
    /// Entries kept in the global findings ranking.
    pub max_findings: usize,
}

impl Default for AggregateLimits {
    fn default() -> Self {
        Self {
            max_subcategories: DEFAULT_MAX_SUBCATEGORIES,
            max_findings: DEFAULT_MAX_FINDINGS,
        }
    }
}

/// Occurrences of one subcategory within a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubcategoryCount {
    /// Subcategory name.
    pub name: String,
    /// Number of findings with this subcategory.
    pub count: u64,
}

/// Totals for one top-level category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRollup {
    /// Category name.
    pub category: String,
    /// All findings in this category.
    pub total: u64,
    /// Findings marked as causes.
    pub causes: u64,
    /// Findings marked as contributing factors.
    pub factors: u64,
    /// Most frequent subcategories.
    pub subcategories: Vec<SubcategoryCount>,
}

impl CategoryRollup {
    /// Findings carrying neither role marker.
    #[must_use]
    pub fn unspecified(&self) -> u64 {
        self.total
            .saturating_sub(self.causes)
            .saturating_sub(self.factors)
    }
}

/// A distinct finding path and how often it occurred.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindingRanked {
    /// The finding path without its role marker.
    pub full_path: String,
    /// First path level.
    pub category: String,
    /// Second path level, empty when absent.
    pub subcategory: String,
    /// Remaining path levels, empty when absent.
    pub detail: String,
    /// Whether the finding was marked as a cause.
    pub is_cause: bool,
    /// Number of occurrences.
    pub count: u64,
}

/// The result of aggregating a findings corpus.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindingsSummary {
    /// Every parsed finding.
    pub total_findings: u64,
    /// Findings marked as causes.
    pub total_causes: u64,
    /// Findings marked as contributing factors.
    pub total_factors: u64,
    /// Category rollups, largest first.
    pub categories: Vec<CategoryRollup>,
    /// Most frequent distinct findings.
    pub findings: Vec<FindingRanked>,
}

impl FindingsSummary {
    /// Findings carrying neither role marker.
    #[must_use]
    pub fn total_unspecified(&self) -> u64 {
        self.total_findings
            .saturating_sub(self.total_causes)
            .saturating_sub(self.total_factors)
    }

    /// Whether nothing was aggregated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total_findings == 0
    }

    /// Look up the rollup for a category.
    #[must_use]
    pub fn category(&self, name: &str) -> Option<&CategoryRollup> {
        self.categories.iter().find(|c| c.category == name)
    }

    /// Ranked findings matching `filter`, in ranking order.
    #[must_use]
    pub fn filtered(&self, filter: &FindingsFilter) -> Vec<&FindingRanked> {
        self.findings.iter().filter(|f| filter.matches(f)).collect()
    }
}

/// Narrows the ranked findings of a summary.
#[derive(Debug, Clone, Default)]
pub struct FindingsFilter {
    category: Option<String>,
    pattern: Option<Regex>,
}

impl FindingsFilter {
    /// Build a filter on an exact category and/or a case-insensitive search.
    ///
    /// The search is literal text unless `as_regex` is set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidQuery`] if `as_regex` is set and the search is
    /// not a valid pattern.
    pub fn new(category: Option<String>, search: Option<&str>, as_regex: bool) -> Result<Self> {
        let pattern = match search.filter(|s| !s.is_empty()) {
            Some(search) => {
                let source = if as_regex {
                    search.to_string()
                } else {
                    regex::escape(search)
                };
                let regex = RegexBuilder::new(&source)
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| Error::invalid_query(format!("invalid search pattern: {e}")))?;
                Some(regex)
            }
            None => None,
        };
        Ok(Self { category, pattern })
    }

    /// Whether `finding` passes this filter.
    #[must_use]
    pub fn matches(&self, finding: &FindingRanked) -> bool {
        if let Some(category) = &self.category {
            if &finding.category != category {
                return false;
            }
        }
        match &self.pattern {
            Some(pattern) => {
                pattern.is_match(&finding.full_path)
                    || pattern.is_match(&finding.category)
                    || pattern.is_match(&finding.subcategory)
            }
            None => true,
        }
    }
}

#[derive(Debug)]
struct CategoryTally {
    category: String,
    total: u64,
    causes: u64,
    factors: u64,
    subcategories: Vec<SubcategoryCount>,
    subcategory_index: HashMap<String, usize>,
}

impl CategoryTally {
    fn new(category: String) -> Self {
        Self {
            category,
            total: 0,
            causes: 0,
            factors: 0,
            subcategories: Vec::new(),
            subcategory_index: HashMap::new(),
        }
    }

    fn record(&mut self, entry: &FindingEntry) {
        self.total += 1;
        match entry.role {
            Role::Cause => self.causes += 1,
            Role::Factor => self.factors += 1,
            Role::Unspecified => {}
        }

        if entry.subcategory.is_empty() {
            return;
        }
        if let Some(&idx) = self.subcategory_index.get(&entry.subcategory) {
            self.subcategories[idx].count += 1;
        } else {
            self.subcategory_index
                .insert(entry.subcategory.clone(), self.subcategories.len());
            self.subcategories.push(SubcategoryCount {
                name: entry.subcategory.clone(),
                count: 1,
            });
        }
    }

    fn into_rollup(self, max_subcategories: usize) -> CategoryRollup {
        let mut subcategories = self.subcategories;
        subcategories.sort_by(|a, b| b.count.cmp(&a.count));
        subcategories.truncate(max_subcategories);

        CategoryRollup {
            category: self.category,
            total: self.total,
            causes: self.causes,
            factors: self.factors,
            subcategories,
        }
    }
}

/// Single-pass accumulator for findings statistics.
///
/// Each aggregator owns its working maps; build one per request and consume
/// it with [`finish`](Self::finish).
///
/// # Examples
///
/// ```
/// use ntsb_explorer::FindingsAggregator;
///
/// let mut aggregator = FindingsAggregator::default();
/// aggregator.add_text("Aircraft-Powerplant-Engine failure - F");
/// let summary = aggregator.finish();
///
/// assert_eq!(summary.total_factors, 1);
/// assert_eq!(summary.categories[0].category, "Aircraft");
/// ```
#[derive(Debug, Default)]
pub struct FindingsAggregator {
    limits: AggregateLimits,
    total_findings: u64,
    total_causes: u64,
    total_factors: u64,
    categories: Vec<CategoryTally>,
    category_index: HashMap<String, usize>,
    findings: Vec<FindingRanked>,
    finding_index: HashMap<(String, bool), usize>,
}

impl FindingsAggregator {
    /// Create an aggregator with custom truncation limits.
    #[must_use]
    pub fn with_limits(limits: AggregateLimits) -> Self {
        Self {
            limits,
            ..Self::default()
        }
    }

    /// Parse and record every entry of one findings string.
    pub fn add_text(&mut self, text: &str) {
        for segment in findings::segments(text) {
            if let Some(entry) = FindingEntry::parse(segment) {
                self.add_entry(&entry);
            }
        }
    }

    /// Record one parsed entry.
    pub fn add_entry(&mut self, entry: &FindingEntry) {
        self.total_findings += 1;
        match entry.role {
            Role::Cause => self.total_causes += 1,
            Role::Factor => self.total_factors += 1,
            Role::Unspecified => {}
        }

        let idx = match self.category_index.get(&entry.category) {
            Some(&idx) => idx,
            None => {
                let idx = self.categories.len();
                self.category_index.insert(entry.category.clone(), idx);
                self.categories
                    .push(CategoryTally::new(entry.category.clone()));
                idx
            }
        };
        self.categories[idx].record(entry);

        // Unspecified entries rank together with factors.
        let key = (entry.clean_path.clone(), entry.role.is_cause());
        if let Some(&idx) = self.finding_index.get(&key) {
            self.findings[idx].count += 1;
        } else {
            self.finding_index.insert(key, self.findings.len());
            self.findings.push(FindingRanked {
                full_path: entry.clean_path.clone(),
                category: entry.category.clone(),
                subcategory: entry.subcategory.clone(),
                detail: entry.detail.clone(),
                is_cause: entry.role.is_cause(),
                count: 1,
            });
        }
    }

    /// Sort, truncate and return the summary.
    #[must_use]
    pub fn finish(self) -> FindingsSummary {
        let limits = self.limits;

        let mut categories: Vec<CategoryRollup> = self
            .categories
            .into_iter()
            .map(|tally| tally.into_rollup(limits.max_subcategories))
            .collect();
        categories.sort_by(|a, b| b.total.cmp(&a.total));

        let distinct = self.findings.len();
        let mut findings = self.findings;
        findings.sort_by(|a, b| b.count.cmp(&a.count));
        findings.truncate(limits.max_findings);

        debug!(
            total = self.total_findings,
            causes = self.total_causes,
            factors = self.total_factors,
            categories = categories.len(),
            distinct_findings = distinct,
            "Aggregated findings"
        );

        FindingsSummary {
            total_findings: self.total_findings,
            total_causes: self.total_causes,
            total_factors: self.total_factors,
            categories,
            findings,
        }
    }
}

/// Aggregate a sequence of findings strings with the default limits.
#[must_use]
pub fn aggregate<I, S>(texts: I) -> FindingsSummary
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    aggregate_with_limits(texts, AggregateLimits::default())
}

/// Aggregate a sequence of findings strings with custom limits.
#[must_use]
pub fn aggregate_with_limits<I, S>(texts: I, limits: AggregateLimits) -> FindingsSummary
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut aggregator = FindingsAggregator::with_limits(limits);
    for text in texts {
        aggregator.add_text(text.as_ref());
    }
    aggregator.finish()
}
