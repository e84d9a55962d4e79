//! Result types returned by batch generation and image fetching.

use crate::error::{RowError, Sheet2PdfError};
use crate::record::Record;
use serde::Serialize;
use std::path::PathBuf;

/// One row that failed to produce a document.
///
/// Entries are created in failure order and never modified afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct FailureEntry {
    /// 0-based position in the failure sequence.
    pub failure: usize,
    /// Source row index of the failed record.
    pub row_index: usize,
    /// The record as loaded, before cleaning.
    pub record: Record,
    pub error: RowError,
}

/// A document written for one row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedDocument {
    pub row_index: usize,
    pub path: PathBuf,
}

/// Counters for one batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchStats {
    /// Records loaded from the input.
    pub total_rows: usize,
    pub generated: usize,
    pub failed: usize,
    /// Wall-clock time for the whole batch, load included.
    pub duration_ms: u64,
}

/// Outcome of [`crate::generate()`].
///
/// A batch with failed rows is still `Ok`; inspect [`BatchReport::failures`]
/// or call [`BatchReport::into_result`] to treat any failure as an error.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    /// Documents in source-row order.
    pub documents: Vec<GeneratedDocument>,
    /// Failures in the order they happened.
    pub failures: Vec<FailureEntry>,
    pub stats: BatchStats,
    /// Set when a failure report workbook was written.
    pub report_path: Option<PathBuf>,
}

impl BatchReport {
    /// `true` when every row produced a document.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// `Err(PartialFailure)` if any row failed, the report otherwise.
    pub fn into_result(self) -> Result<Self, Sheet2PdfError> {
        if self.is_clean() {
            Ok(self)
        } else {
            Err(Sheet2PdfError::PartialFailure {
                failed: self.failures.len(),
                total: self.stats.total_rows,
            })
        }
    }
}

/// A URL that could not be downloaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchFailure {
    pub row_index: usize,
    /// The cell content; for non-text cells, its display form.
    pub url: String,
    pub error: String,
}

/// Outcome of [`crate::fetch_images`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct FetchReport {
    /// Files written, in row order.
    pub downloaded: Vec<PathBuf>,
    /// Rows whose URL cell was missing or blank.
    pub skipped: usize,
    pub failures: Vec<FetchFailure>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(row: usize) -> FailureEntry {
        FailureEntry {
            failure: 0,
            row_index: row,
            record: Record::new(row).with("Column1", "Acme"),
            error: RowError::Template {
                detail: "boom".into(),
            },
        }
    }

    #[test]
    fn clean_report_passes_into_result() {
        let report = BatchReport {
            stats: BatchStats {
                total_rows: 2,
                generated: 2,
                ..BatchStats::default()
            },
            ..BatchReport::default()
        };
        assert!(report.is_clean());
        assert_eq!(report.into_result().unwrap().stats.generated, 2);
    }

    #[test]
    fn failures_become_partial_failure() {
        let report = BatchReport {
            failures: vec![failure(3)],
            stats: BatchStats {
                total_rows: 5,
                generated: 4,
                failed: 1,
                duration_ms: 10,
            },
            ..BatchReport::default()
        };
        match report.into_result() {
            Err(Sheet2PdfError::PartialFailure { failed, total }) => {
                assert_eq!((failed, total), (1, 5));
            }
            other => panic!("expected PartialFailure, got {other:?}"),
        }
    }

    #[test]
    fn failure_entry_serialises_record_and_error() {
        let json = serde_json::to_value(failure(3)).unwrap();
        assert_eq!(json["row_index"], 3);
        assert_eq!(json["record"]["fields"]["Column1"], "Acme");
        assert!(json["error"].get("Template").is_some());
    }
}
