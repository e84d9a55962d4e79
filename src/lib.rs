//! # sheet2pdf
//!
//! Render one PDF per spreadsheet row through an HTML template.
//!
//! Each row of a workbook is cleaned with per-column text rules, enriched
//! with an image path and a category checklist, bound into a Jinja template
//! and handed to wkhtmltopdf. A row that fails is recorded in a failure
//! report; it never stops the batch.
//!
//! ## Pipeline Overview
//!
//! ```text
//! workbook
//!  │
//!  ├─ 1. Load      read the configured sheets (calamine, spawn_blocking)
//!  ├─ 2. Clean     identity / slash-delimited / long-text / default rules
//!  ├─ 3. Enrich    + image_path, + checkbox_html
//!  ├─ 4. Template  minijinja, auto-escape off
//!  ├─ 5. Write     wkhtmltopdf, one process per row
//!  └─ 6. Report    failures → exceptions.xlsx
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sheet2pdf::{generate, GeneratorConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = GeneratorConfig::builder()
//!         .data_file("data/data-1.xlsx")
//!         .sheet("Sheet1")
//!         .images_base_path("/srv/app/documents/images_MS/")
//!         .build()?;
//!     let report = generate(&config).await?;
//!     eprintln!(
//!         "{} generated, {} failed",
//!         report.stats.generated, report.stats.failed
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `sheet2pdf` binary (clap + anyhow + tracing-subscriber + indicatif + dotenvy) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! sheet2pdf = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod fetch;
pub mod generate;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod record;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    ColumnRoles, FetchConfig, GeneratorConfig, GeneratorConfigBuilder, PageSize, PdfOptions,
};
pub use error::{RowError, Sheet2PdfError};
pub use fetch::fetch_images;
pub use generate::{generate, generate_record, generate_sync};
pub use output::{
    BatchReport, BatchStats, FailureEntry, FetchFailure, FetchReport, GeneratedDocument,
};
pub use pipeline::enrich::EnrichedRecord;
pub use pipeline::load::{load_records, try_load_records};
pub use pipeline::normalize::FieldRole;
pub use pipeline::template::{referenced_fields, render_context};
pub use pipeline::writer::{PdfRenderer, WkHtmlToPdf};
pub use progress::{NoopProgressCallback, ProgressCallback, RowProgressCallback};
pub use record::{CellValue, Dataset, Record};
