//! Metric extraction: the facts both output artifacts report.

use crate::document::TabularDocument;
use crate::error::ReportError;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Summary facts about the crawl export, computed once per run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    /// Data rows in the first sheet (header excluded, never negative).
    pub url_count: u64,
    pub source_sheet_name: String,
    pub column_count: usize,
    pub source_file_name: String,
    pub processed_at_utc: DateTime<Utc>,
}

impl Metrics {
    /// `2026-10-19T08:30:00.000Z`
    pub fn processed_at_iso(&self) -> String {
        self.processed_at_utc
            .to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

/// Read the first sheet of `doc` and derive its [`Metrics`].
///
/// The first row is the header; an empty or header-only sheet yields zero.
pub fn extract_metrics(
    doc: &TabularDocument,
    source_file_name: &str,
    processed_at_utc: DateTime<Utc>,
) -> Result<Metrics, ReportError> {
    let sheet = doc.first_sheet().ok_or_else(|| ReportError::EmptyDocument {
        file: source_file_name.to_string(),
    })?;

    Ok(Metrics {
        url_count: sheet.row_count().saturating_sub(1) as u64,
        source_sheet_name: sheet.name.clone(),
        column_count: sheet.column_count(),
        source_file_name: source_file_name.to_string(),
        processed_at_utc,
    })
}
