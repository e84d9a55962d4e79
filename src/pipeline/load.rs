//! Record loading: read named sheets of a workbook into [`Record`]s.
//!
//! ## Why spawn_blocking?
//!
//! calamine parses the whole sheet synchronously (zip inflate + XML). Running
//! it inside `tokio::task::spawn_blocking` keeps the runtime's worker thread
//! free, the same way every other blocking library call in the pipeline is
//! isolated.
//!
//! ## Header handling
//!
//! The first row of each sheet is the header. Blank header cells become
//! `Unnamed: <n>` and repeated names get `.1`, `.2`, … suffixes, so every
//! column in a record has a distinct key.

use crate::error::Sheet2PdfError;
use crate::record::{CellValue, Dataset, Record};
use calamine::{open_workbook_auto, Data, DataType, Range, Reader};
use indexmap::IndexMap;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, error, info};

/// Load records, treating any read failure as "nothing to process".
///
/// The failure is logged at `error` level and an empty [`Dataset`] is
/// returned. Callers that must distinguish "empty sheet" from "unreadable
/// file" use [`try_load_records`].
pub async fn load_records(path: &Path, sheets: &[String]) -> Dataset {
    match try_load_records(path, sheets).await {
        Ok(dataset) => dataset,
        Err(e) => {
            error!("Failed to load records from {}: {}", path.display(), e);
            Dataset::default()
        }
    }
}

/// Load records, propagating read failures.
///
/// An empty `sheets` slice reads the first sheet of the workbook.
pub async fn try_load_records(path: &Path, sheets: &[String]) -> Result<Dataset, Sheet2PdfError> {
    let path = path.to_path_buf();
    let sheets = sheets.to_vec();

    tokio::task::spawn_blocking(move || read_workbook(&path, &sheets))
        .await
        .map_err(|e| Sheet2PdfError::Internal(format!("Workbook task panicked: {}", e)))?
}

/// Blocking implementation of record loading.
///
/// Sheets are merged in the order given; row indices continue across
/// sheets so they stay unique.
pub fn read_workbook(path: &Path, sheets: &[String]) -> Result<Dataset, Sheet2PdfError> {
    if !path.exists() {
        return Err(Sheet2PdfError::InputNotFound {
            path: path.to_path_buf(),
        });
    }

    let mut workbook = open_workbook_auto(path).map_err(|e| Sheet2PdfError::WorkbookOpen {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;

    let available = workbook.sheet_names();
    let selected: Vec<String> = if sheets.is_empty() {
        available.first().cloned().into_iter().collect()
    } else {
        sheets.to_vec()
    };

    let mut dataset = Dataset::default();
    for sheet in &selected {
        if !available.contains(sheet) {
            return Err(Sheet2PdfError::SheetNotFound {
                path: path.to_path_buf(),
                sheet: sheet.clone(),
                available: available.clone(),
            });
        }

        let range = workbook
            .worksheet_range(sheet)
            .map_err(|e| Sheet2PdfError::WorkbookOpen {
                path: path.to_path_buf(),
                detail: format!("sheet '{}': {}", sheet, e),
            })?;

        let (headers, records) = read_range(&range, dataset.records.len());
        info!("Loaded {} rows from sheet '{}'", records.len(), sheet);

        for header in headers {
            if !dataset.columns.contains(&header) {
                dataset.columns.push(header);
            }
        }
        dataset.records.extend(records);
    }

    Ok(dataset)
}

/// Split a sheet range into header names and records numbered from `first_index`.
fn read_range(range: &Range<Data>, first_index: usize) -> (Vec<String>, Vec<Record>) {
    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return (Vec::new(), Vec::new());
    };
    let headers = header_names(header_row);

    let records = rows
        .enumerate()
        .map(|(offset, row)| {
            let fields: IndexMap<String, CellValue> = headers
                .iter()
                .enumerate()
                .map(|(col, name)| {
                    let value = row.get(col).map(cell_value).unwrap_or_default();
                    (name.clone(), value)
                })
                .collect();
            Record {
                index: first_index + offset,
                fields,
            }
        })
        .collect();

    (headers, records)
}

fn header_names(row: &[Data]) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    row.iter()
        .enumerate()
        .map(|(col, cell)| {
            let base = match cell {
                Data::Empty => format!("Unnamed: {}", col),
                Data::String(s) if s.is_empty() => format!("Unnamed: {}", col),
                Data::String(s) => s.clone(),
                other => other.to_string(),
            };
            let count = seen.entry(base.clone()).or_insert(0);
            let name = if *count == 0 {
                base
            } else {
                format!("{}.{}", base, count)
            };
            *count += 1;
            name
        })
        .collect()
}

fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::String(s) if s.is_empty() => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Int(i) => CellValue::Int(*i),
        Data::Float(f) => CellValue::Number(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => match cell.as_datetime() {
            Some(ndt) => CellValue::Timestamp(ndt.format("%Y-%m-%d %H:%M:%S").to_string()),
            None => CellValue::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Timestamp(s.clone()),
        Data::Error(e) => {
            debug!("Cell error value {:?} read as empty", e);
            CellValue::Empty
        }
        Data::Empty => CellValue::Empty,
    }
}
