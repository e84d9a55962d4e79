//! Failure report: save the batch's [`FailureEntry`] list as a workbook.
//!
//! One sheet, one header row, one row per failure:
//!
//! | failure | row_index | row | error |
//! |---------|-----------|-----|-------|
//! | 0 | 3 | `{"Column1":"Acme",…}` | `renderer exited with code 1: …` |
//!
//! `row` is the JSON form of the record as loaded, so the failing input can
//! be inspected (or pasted back into the source sheet) without re-running.
//! Text longer than an Excel cell holds ([`MAX_CELL_CHARS`]) is cut and ends
//! with [`TRUNCATION_MARK`].

use crate::error::Sheet2PdfError;
use crate::output::FailureEntry;
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use std::path::{Path, PathBuf};
use tracing::info;

/// Name of the single worksheet in the report.
pub const REPORT_SHEET: &str = "failures";

/// Most characters Excel accepts in a single cell.
pub const MAX_CELL_CHARS: usize = 32_767;

/// Suffix of a cell whose text was cut to fit [`MAX_CELL_CHARS`].
pub const TRUNCATION_MARK: &str = "…[truncated]";

const HEADERS: [&str; 4] = ["failure", "row_index", "row", "error"];

/// Write `entries` to `path`, creating the parent directory if needed.
pub async fn write_failure_report(
    path: &Path,
    entries: &[FailureEntry],
) -> Result<(), Sheet2PdfError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| Sheet2PdfError::ReportWriteFailed {
                path: path.to_path_buf(),
                detail: e.to_string(),
            })?;
    }

    let rows = entries
        .iter()
        .map(report_row)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| Sheet2PdfError::ReportWriteFailed {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;

    let target: PathBuf = path.to_path_buf();
    tokio::task::spawn_blocking(move || save_workbook(&target, &rows))
        .await
        .map_err(|e| Sheet2PdfError::Internal(format!("Report task panicked: {}", e)))?
        .map_err(|e| Sheet2PdfError::ReportWriteFailed {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;

    info!("Wrote {} failures to {}", entries.len(), path.display());
    Ok(())
}

struct ReportRow {
    failure: usize,
    row_index: usize,
    row_json: String,
    error: String,
}

fn report_row(entry: &FailureEntry) -> Result<ReportRow, serde_json::Error> {
    Ok(ReportRow {
        failure: entry.failure,
        row_index: entry.row_index,
        row_json: fit_cell(serde_json::to_string(&entry.record.fields)?),
        error: fit_cell(entry.error.to_string()),
    })
}

fn fit_cell(text: String) -> String {
    if text.chars().count() <= MAX_CELL_CHARS {
        return text;
    }
    let keep = MAX_CELL_CHARS - TRUNCATION_MARK.chars().count();
    let cut = text
        .char_indices()
        .nth(keep)
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    let mut fitted = String::with_capacity(cut + TRUNCATION_MARK.len());
    fitted.push_str(&text[..cut]);
    fitted.push_str(TRUNCATION_MARK);
    fitted
}

fn save_workbook(path: &Path, rows: &[ReportRow]) -> Result<(), XlsxError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let sheet = workbook.add_worksheet();
    sheet.set_name(REPORT_SHEET)?;

    for (col, header) in HEADERS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *header, &bold)?;
    }
    for (i, row) in rows.iter().enumerate() {
        let r = (i + 1) as u32;
        sheet.write_number(r, 0, row.failure as f64)?;
        sheet.write_number(r, 1, row.row_index as f64)?;
        sheet.write_string(r, 2, &row.row_json)?;
        sheet.write_string(r, 3, &row.error)?;
    }

    workbook.save(path)
}
