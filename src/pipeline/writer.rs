//! Document writing: hand rendered HTML to an external HTML→PDF renderer.
//!
//! The renderer sits behind the [`PdfRenderer`] trait so the batch driver
//! never depends on wkhtmltopdf directly. [`WkHtmlToPdf`] is the production
//! implementation; tests and embedders inject their own via
//! [`crate::config::GeneratorConfigBuilder::renderer`].
//!
//! ## Invocation
//!
//! ```text
//! wkhtmltopdf --quiet --enable-local-file-access --page-size A4 \
//!     --margin-top 0in --margin-right 0in --margin-bottom 0in --margin-left 0in \
//!     - <output.pdf>
//! ```
//!
//! The HTML is streamed on stdin (`-`), so no temporary HTML file is left
//! behind. Local file access must be on for `<img src="/abs/path.jpg">`
//! references produced by `image_path` to resolve.

use crate::config::PdfOptions;
use crate::error::RowError;
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

/// Turns one HTML document into a PDF file.
///
/// Implementations must be `Send + Sync` so a single instance can be shared
/// through an `Arc` in [`crate::config::GeneratorConfig`].
#[async_trait]
pub trait PdfRenderer: Send + Sync {
    /// Render `html` to `output`. Any failure is reported for this row only.
    async fn render_pdf(&self, html: &str, output: &Path) -> Result<(), RowError>;
}

/// Renders through the wkhtmltopdf command-line tool.
#[derive(Debug, Clone)]
pub struct WkHtmlToPdf {
    binary: PathBuf,
    options: PdfOptions,
}

impl WkHtmlToPdf {
    pub fn new(binary: impl Into<PathBuf>, options: PdfOptions) -> Self {
        Self {
            binary: binary.into(),
            options,
        }
    }

    /// Command-line arguments for rendering stdin to `output`.
    pub fn command_args(&self, output: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["--quiet".into()];
        if self.options.enable_local_file_access {
            args.push("--enable-local-file-access".into());
        }
        args.push("--page-size".into());
        args.push(self.options.page_size.as_str().into());
        for side in ["top", "right", "bottom", "left"] {
            args.push(format!("--margin-{side}").into());
            args.push(self.options.margin.clone().into());
        }
        args.push("-".into());
        args.push(output.as_os_str().to_os_string());
        args
    }
}

#[async_trait]
impl PdfRenderer for WkHtmlToPdf {
    async fn render_pdf(&self, html: &str, output: &Path) -> Result<(), RowError> {
        debug!("{} → {}", self.binary.display(), output.display());

        let mut child = Command::new(&self.binary)
            .args(self.command_args(output))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| RowError::RendererUnavailable {
                binary: self.binary.clone(),
                detail: e.to_string(),
            })?;

        // stdin is fed from its own task while stderr is drained below, so a
        // chatty renderer cannot stall on a full pipe.
        let feeder = child.stdin.take().map(|mut stdin| {
            let html = html.to_owned();
            tokio::spawn(async move { stdin.write_all(html.as_bytes()).await })
        });

        let out = child
            .wait_with_output()
            .await
            .map_err(|e| RowError::RendererUnavailable {
                binary: self.binary.clone(),
                detail: e.to_string(),
            })?;

        if let Some(feeder) = feeder {
            // A write error means the child stopped reading; its status and
            // stderr carry the real cause.
            match feeder.await {
                Ok(Err(e)) => warn!("Could not stream HTML to {}: {}", self.binary.display(), e),
                Err(e) => warn!("stdin task for {} failed: {}", self.binary.display(), e),
                Ok(Ok(())) => {}
            }
        }

        if !out.status.success() {
            return Err(RowError::RendererFailed {
                exit_code: out.status.code(),
                stderr: String::from_utf8_lossy(&out.stderr).trim().to_string(),
            });
        }

        if !tokio::fs::try_exists(output).await.unwrap_or(false) {
            return Err(RowError::OutputMissing {
                path: output.to_path_buf(),
            });
        }

        Ok(())
    }
}
