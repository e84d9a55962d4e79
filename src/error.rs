//! Error types for the sheet2pdf library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Sheet2PdfError`] is **fatal**: the batch cannot proceed at all
//!   (input workbook missing, template unreadable, identity column absent).
//!   Returned as `Err(Sheet2PdfError)` from [`crate::generate()`] and
//!   [`crate::fetch_images`].
//!
//! * [`RowError`] is **non-fatal**: one row failed to render (template
//!   error, wkhtmltopdf missing or crashing) but every other row is fine.
//!   Stored inside [`crate::output::FailureEntry`] and written to the
//!   failure report.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the sheet2pdf library.
///
/// Row-level failures use [`RowError`] and are collected in
/// [`crate::output::BatchReport`] rather than propagated here.
#[derive(Debug, Error)]
pub enum Sheet2PdfError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input workbook was not found at the given path.
    #[error("Input workbook not found: '{path}'\nCheck DATA_FOLDER and DATA_FILE_NAME.")]
    InputNotFound { path: PathBuf },

    /// The file exists but calamine could not open it as a workbook.
    #[error("Could not open workbook '{path}': {detail}")]
    WorkbookOpen { path: PathBuf, detail: String },

    /// The requested sheet is not in the workbook.
    #[error("Sheet '{sheet}' not found in '{path}' (available: {available:?})")]
    SheetNotFound {
        path: PathBuf,
        sheet: String,
        available: Vec<String>,
    },

    /// A column the pipeline cannot run without is absent from the header row.
    #[error("Required {role} column '{column}' is missing from the input (columns: {available:?})")]
    MissingColumn {
        column: String,
        role: &'static str,
        available: Vec<String>,
    },

    // ── Template errors ───────────────────────────────────────────────────
    /// The template file could not be read.
    #[error("Template not found: '{path}': {source}")]
    TemplateNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The template was read but does not compile.
    #[error("Template '{name}' is invalid: {detail}")]
    TemplateInvalid { name: String, detail: String },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create an output directory.
    #[error("Failed to create output directory '{path}': {source}")]
    OutputDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not write the failure report workbook.
    #[error("Failed to write failure report '{path}': {detail}")]
    ReportWriteFailed { path: PathBuf, detail: String },

    // ── Batch outcome ─────────────────────────────────────────────────────
    /// Some rows succeeded but at least one failed.
    ///
    /// Returned by [`crate::output::BatchReport::into_result`] when the
    /// caller wants to treat any row failure as an error.
    #[error("{failed}/{total} rows failed to render")]
    PartialFailure { failed: usize, total: usize },

    /// A single manually supplied record failed to render.
    #[error("Row {row}: {source}")]
    RowFailed {
        row: usize,
        #[source]
        source: RowError,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single row.
///
/// Stored in [`crate::output::FailureEntry`] when a row fails. The batch
/// always continues with the next row.
#[derive(Debug, Clone, Error, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum RowError {
    /// minijinja failed to render the row's context.
    #[error("template rendering failed: {detail}")]
    Template { detail: String },

    /// The renderer executable could not be started.
    #[error("could not start renderer '{binary}': {detail}")]
    RendererUnavailable { binary: PathBuf, detail: String },

    /// The renderer ran but exited unsuccessfully.
    #[error("renderer exited with {}: {stderr}", .exit_code.map_or_else(|| "a signal".to_string(), |c| format!("code {c}")))]
    RendererFailed {
        exit_code: Option<i32>,
        stderr: String,
    },

    /// The renderer reported success but wrote nothing.
    #[error("renderer produced no file at '{path}'")]
    OutputMissing { path: PathBuf },
}
