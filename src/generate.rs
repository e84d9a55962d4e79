//! Batch generation entry points.
//!
//! [`generate`] drives one run from workbook to PDFs:
//!
//! ```text
//! LOAD ──▶ CLEAN ──▶ setup ──▶ RENDER_LOOP ──▶ REPORT ──▶ done
//! ```
//!
//! Only LOAD, CLEAN and setup (template, output directory) can abort the
//! batch. Inside the render loop each row either yields a document or a
//! [`FailureEntry`]; the loop always runs to the end. A report that cannot
//! be saved is logged and leaves `report_path` empty.

use crate::config::GeneratorConfig;
use crate::error::{RowError, Sheet2PdfError};
use crate::output::{BatchReport, BatchStats, FailureEntry, GeneratedDocument};
use crate::pipeline::enrich::{Enricher, CHECKBOX_FIELD, IMAGE_PATH_FIELD};
use crate::pipeline::normalize::ColumnMap;
use crate::pipeline::template::TemplateRenderer;
use crate::pipeline::writer::{PdfRenderer, WkHtmlToPdf};
use crate::pipeline::{load, report};
use crate::record::Record;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Generate one PDF per record of the configured sheets.
///
/// # Returns
/// `Ok(BatchReport)` whenever the batch ran, even if some rows failed
/// (check `report.failures`, or call [`BatchReport::into_result`]).
///
/// # Errors
/// Returns `Err(Sheet2PdfError)` only for fatal errors:
/// - input workbook missing, unreadable, or without the requested sheet
/// - identity column missing from the header row
/// - template missing or invalid
/// - output directory cannot be created
pub async fn generate(config: &GeneratorConfig) -> Result<BatchReport, Sheet2PdfError> {
    let batch_start = Instant::now();
    info!(
        "Starting batch: {} [{}]",
        config.data_file.display(),
        config.sheets.join(", ")
    );

    // ── LOAD ─────────────────────────────────────────────────────────────
    let dataset = load::try_load_records(&config.data_file, &config.sheets).await?;
    let total_rows = dataset.len();
    if dataset.is_empty() {
        info!("No records in {}; nothing to process", config.data_file.display());
        if let Some(ref cb) = config.progress_callback {
            cb.on_batch_start(0);
            cb.on_batch_complete(0, 0);
        }
        return Ok(BatchReport {
            stats: BatchStats {
                duration_ms: batch_start.elapsed().as_millis() as u64,
                ..BatchStats::default()
            },
            ..BatchReport::default()
        });
    }
    info!("Loaded {} records", total_rows);

    // ── CLEAN ────────────────────────────────────────────────────────────
    let columns = ColumnMap::resolve(&dataset.columns, &config.columns)?;
    let enricher = Enricher::new(config, columns);
    let cleaned: Vec<Record> = dataset.records.iter().map(|r| enricher.clean(r)).collect();
    debug!("Cleaned {} records", cleaned.len());

    // ── Setup ────────────────────────────────────────────────────────────
    let template = TemplateRenderer::load(&config.template_dir, &config.template_name).await?;
    warn_unbound_fields(&template, &dataset.columns);
    ensure_output_dir(&config.output_dir).await?;
    let renderer = resolve_renderer(config);

    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_start(total_rows);
    }

    // ── RENDER_LOOP ──────────────────────────────────────────────────────
    let mut documents: Vec<GeneratedDocument> = Vec::with_capacity(total_rows);
    let mut failures: Vec<FailureEntry> = Vec::new();

    for (original, record) in dataset.records.iter().zip(&cleaned) {
        let row = record.index;
        if let Some(ref cb) = config.progress_callback {
            cb.on_row_start(row, total_rows);
        }

        match render_one(&enricher, &template, renderer.as_ref(), &config.output_dir, record).await
        {
            Ok(path) => {
                info!("Row {} → {}", row, path.display());
                if let Some(ref cb) = config.progress_callback {
                    cb.on_row_complete(row, total_rows, &path);
                }
                documents.push(GeneratedDocument {
                    row_index: row,
                    path,
                });
            }
            Err(e) => {
                warn!("Row {} failed: {}", row, e);
                if let Some(ref cb) = config.progress_callback {
                    cb.on_row_error(row, total_rows, &e.to_string());
                }
                failures.push(FailureEntry {
                    failure: failures.len(),
                    row_index: row,
                    record: original.clone(),
                    error: e,
                });
            }
        }
    }

    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_complete(total_rows, documents.len());
    }

    // ── REPORT ───────────────────────────────────────────────────────────
    let report_path = if failures.is_empty() {
        info!("All {} rows generated cleanly", total_rows);
        None
    } else {
        match report::write_failure_report(&config.report_path, &failures).await {
            Ok(()) => Some(config.report_path.clone()),
            Err(e) => {
                error!("{}; {} failures are only in the returned report", e, failures.len());
                None
            }
        }
    };

    let stats = BatchStats {
        total_rows,
        generated: documents.len(),
        failed: failures.len(),
        duration_ms: batch_start.elapsed().as_millis() as u64,
    };
    info!(
        "Batch complete: {}/{} generated, {} failed, {}ms",
        stats.generated, stats.total_rows, stats.failed, stats.duration_ms
    );

    Ok(BatchReport {
        documents,
        failures,
        stats,
        report_path,
    })
}

/// Synchronous wrapper around [`generate`].
///
/// Creates a temporary tokio runtime internally.
pub fn generate_sync(config: &GeneratorConfig) -> Result<BatchReport, Sheet2PdfError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Sheet2PdfError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(generate(config))
}

/// Render a single hand-built record through the same clean → enrich →
/// template → writer path as the batch.
///
/// Useful for regenerating one document after fixing its data. The record's
/// own columns stand in for the header row, so it must carry the identity
/// column. No failure report is written; a row failure is returned as
/// [`Sheet2PdfError::RowFailed`].
pub async fn generate_record(
    record: &Record,
    config: &GeneratorConfig,
) -> Result<GeneratedDocument, Sheet2PdfError> {
    let columns: Vec<String> = record.fields.keys().cloned().collect();
    let enricher = Enricher::new(config, ColumnMap::resolve(&columns, &config.columns)?);

    let template = TemplateRenderer::load(&config.template_dir, &config.template_name).await?;
    warn_unbound_fields(&template, &columns);
    ensure_output_dir(&config.output_dir).await?;
    let renderer = resolve_renderer(config);

    let cleaned = enricher.clean(record);
    let path = render_one(&enricher, &template, renderer.as_ref(), &config.output_dir, &cleaned)
        .await
        .map_err(|e| Sheet2PdfError::RowFailed {
            row: record.index,
            source: e,
        })?;
    info!("Row {} → {}", record.index, path.display());

    Ok(GeneratedDocument {
        row_index: record.index,
        path,
    })
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Enrich, render and write one cleaned record.
async fn render_one(
    enricher: &Enricher,
    template: &TemplateRenderer,
    renderer: &dyn PdfRenderer,
    output_dir: &Path,
    cleaned: &Record,
) -> Result<PathBuf, RowError> {
    let enriched = enricher.enrich(cleaned);
    let html = template.render(&enriched)?;
    let path = output_dir.join(enricher.document_file_name(&enriched));
    renderer.render_pdf(&html, &path).await?;
    Ok(path)
}

/// Use the injected renderer if there is one, wkhtmltopdf otherwise.
fn resolve_renderer(config: &GeneratorConfig) -> Arc<dyn PdfRenderer> {
    if let Some(ref renderer) = config.renderer {
        return Arc::clone(renderer);
    }
    debug!("Using wkhtmltopdf at {}", config.renderer_binary.display());
    Arc::new(WkHtmlToPdf::new(
        config.renderer_binary.clone(),
        config.pdf.clone(),
    ))
}

async fn ensure_output_dir(dir: &Path) -> Result<(), Sheet2PdfError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| Sheet2PdfError::OutputDirFailed {
            path: dir.to_path_buf(),
            source: e,
        })
}

/// Warn about template variables no record will ever provide.
fn warn_unbound_fields(template: &TemplateRenderer, columns: &[String]) {
    for name in unbound_fields(template, columns) {
        warn!(
            "Template '{}' references '{}', which is not an input column; it will render empty",
            template.name(),
            name
        );
    }
}

fn unbound_fields(template: &TemplateRenderer, columns: &[String]) -> Vec<String> {
    template
        .referenced_fields()
        .into_iter()
        .filter(|name| {
            name != IMAGE_PATH_FIELD
                && name != CHECKBOX_FIELD
                && !columns.iter().any(|c| c == name)
        })
        .collect()
}
