//! Image fetcher: download one image per row from a URL column.
//!
//! Independent of batch generation. It writes `<folder>/<row><suffix>`,
//! which is exactly the `image_path` the generator computes when
//! `images_base_path` points at the same folder, so running the fetcher
//! first puts every picture where the template expects it.
//!
//! Blank URL cells are skipped silently. Every other problem (HTTP error
//! status, network failure, unwritable file) is logged, recorded as a
//! [`FetchFailure`] and the loop moves on. There is no retry.

use crate::config::FetchConfig;
use crate::error::Sheet2PdfError;
use crate::output::{FetchFailure, FetchReport};
use crate::pipeline::load;
use crate::record::CellValue;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Download every URL of `config.url_column` into `config.output_folder`.
///
/// # Errors
/// Fatal only when the output folder cannot be created or the HTTP client
/// cannot be built. An unreadable workbook logs an error and yields an
/// empty report.
pub async fn fetch_images(config: &FetchConfig) -> Result<FetchReport, Sheet2PdfError> {
    let sheets: Vec<String> = config.sheet.iter().cloned().collect();
    let dataset = load::load_records(&config.data_file, &sheets).await;

    tokio::fs::create_dir_all(&config.output_folder)
        .await
        .map_err(|e| Sheet2PdfError::OutputDirFailed {
            path: config.output_folder.clone(),
            source: e,
        })?;

    if dataset.is_empty() {
        info!("No records to fetch images for");
        return Ok(FetchReport::default());
    }
    if !dataset.columns.iter().any(|c| c == &config.url_column) {
        warn!(
            "URL column '{}' not found in {}; every row will be skipped",
            config.url_column,
            config.data_file.display()
        );
    }

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.download_timeout_secs))
        .build()
        .map_err(|e| Sheet2PdfError::Internal(format!("Failed to build HTTP client: {}", e)))?;

    let mut report = FetchReport::default();
    for record in &dataset.records {
        let row = record.index;
        let url = match record.get(&config.url_column) {
            None => {
                report.skipped += 1;
                continue;
            }
            Some(value) if value.is_blank() => {
                report.skipped += 1;
                continue;
            }
            Some(CellValue::Text(s)) => s.trim(),
            Some(other) => {
                warn!("Row {}: URL cell is not text ({:?})", row, other);
                report.failures.push(FetchFailure {
                    row_index: row,
                    url: other.to_string(),
                    error: "URL cell is not text".to_string(),
                });
                continue;
            }
        };

        let target = image_file(&config.output_folder, row, &config.image_suffix);
        match download(&client, url, &target).await {
            Ok(bytes) => {
                debug!("Row {}: {} bytes from {}", row, bytes, url);
                report.downloaded.push(target);
            }
            Err(error) => {
                warn!("Row {}: failed to fetch {}: {}", row, url, error);
                report.failures.push(FetchFailure {
                    row_index: row,
                    url: url.to_string(),
                    error,
                });
            }
        }
    }

    info!(
        "Fetched {} images ({} skipped, {} failed)",
        report.downloaded.len(),
        report.skipped,
        report.failures.len()
    );
    Ok(report)
}

/// `<folder>/<row><suffix>`.
pub fn image_file(folder: &Path, row: usize, suffix: &str) -> PathBuf {
    folder.join(format!("{}{}", row, suffix))
}

/// GET `url` and write the body to `target`, returning the byte count.
async fn download(client: &reqwest::Client, url: &str, target: &Path) -> Result<usize, String> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| {
            if e.is_timeout() {
                format!("timed out: {e}")
            } else {
                e.to_string()
            }
        })?
        .error_for_status()
        .map_err(|e| match e.status() {
            Some(status) => format!("HTTP {}", status),
            None => e.to_string(),
        })?;

    let bytes = response.bytes().await.map_err(|e| e.to_string())?;
    tokio::fs::write(target, &bytes)
        .await
        .map_err(|e| format!("could not write {}: {}", target.display(), e))?;
    Ok(bytes.len())
}
