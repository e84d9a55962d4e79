//! CLI binary for sheet2pdf.
//!
//! A thin shim over the library crate that maps environment variables and
//! flags to `GeneratorConfig` / `FetchConfig` and prints results. A `.env`
//! file in the working directory is loaded first, so the usual setup is a
//! `.env` next to the data and a bare `sheet2pdf generate`.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use sheet2pdf::{
    fetch_images, generate, generate_record, CellValue, ColumnRoles, FetchConfig,
    GeneratorConfig, PageSize, ProgressCallback, Record, RowProgressCallback,
};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::warn;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a live bar plus one log line per row.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Per-row wall-clock start times for elapsed reporting.
    start_times: Mutex<HashMap<usize, Instant>>,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    /// Spinner until `on_batch_start` tells us the row count.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);

        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Reading workbook…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
            errors: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>4}/{len} rows  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Generating");
        self.bar.reset_eta();
    }

    fn elapsed_secs(&self, row: usize) -> f64 {
        self.start_times
            .lock()
            .ok()
            .and_then(|mut times| times.remove(&row))
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl RowProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_rows: usize) {
        self.activate_bar(total_rows);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Generating {total_rows} documents…"))
        ));
    }

    fn on_row_start(&self, row: usize, _total_rows: usize) {
        if let Ok(mut times) = self.start_times.lock() {
            times.insert(row, Instant::now());
        }
        self.bar.set_message(format!("row {row}"));
    }

    fn on_row_complete(&self, row: usize, _total_rows: usize, output: &Path) {
        let elapsed = self.elapsed_secs(row);
        let name = output
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.bar.println(format!(
            "  {} Row {:>4}  {}  {}",
            green("✓"),
            row,
            name,
            dim(&format!("{elapsed:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_row_error(&self, row: usize, _total_rows: usize, error: &str) {
        let elapsed = self.elapsed_secs(row);
        self.errors.fetch_add(1, Ordering::SeqCst);

        // Keep one line per row.
        let msg: String = if error.chars().count() > 80 {
            let mut short: String = error.chars().take(79).collect();
            short.push('\u{2026}');
            short
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} Row {:>4}  {}  {}",
            red("✗"),
            row,
            red(&msg),
            dim(&format!("{elapsed:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total_rows: usize, generated: usize) {
        let failed = total_rows.saturating_sub(generated);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} documents generated",
                green("✔"),
                bold(&generated.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} documents generated  ({} failed)",
                if generated == 0 { red("✘") } else { cyan("⚠") },
                bold(&generated.to_string()),
                total_rows,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Generate one PDF per row of data/data-1.xlsx (Sheet1)
  sheet2pdf generate

  # Several sheets, Letter paper, fail the exit code on any row failure
  sheet2pdf generate --sheet Sheet1,Sheet2 --page-size letter --strict

  # Download the images referenced by the "liendulogo" column first
  sheet2pdf fetch-images --images-folder images_MS

  # Regenerate a single document by hand
  sheet2pdf manual --index 522 --field Column1='Acme*HQ' --field Column3='Type 2.'

  # Check that wkhtmltopdf is installed
  sheet2pdf check

ENVIRONMENT VARIABLES (also read from .env):
  DATA_FOLDER            Folder holding the workbook           [data/]
  DATA_FILE_NAME         Workbook file name                    [data-1.xlsx]
  SHEET_NAME             Sheet(s) to read, comma-separated     [Sheet1]
  TEMPLATES_FOLDER       Template folder                       [templates/]
  HTML_FILE              Template file name                    [pdf_template.html]
  DOC_PREFIX             Root of every output path             [documents/]
  OUTPUT_FOLDER          PDF folder under DOC_PREFIX           [generated_pdfs]
  EXCEPTIONS_FILE_NAME   Failure report under DOC_PREFIX       [exceptions.xlsx]
  IMAGES_ABSOLUTE_PATH   Prefix of every image_path            []
  IMAGE_SUFFIX           Suffix of every image_path            [_image.jpg]
  PAGE_SIZE              A4 or Letter                          [A4]
  WK_HTML_TO_PDF         wkhtmltopdf executable                [searched on PATH]
  IDENTITY_COLUMN        Column naming each PDF                [Column1]
  SLASH_COLUMN           Column whose slashes become spaces    [Column2]
  LONG_TEXT_COLUMN       Column turned into a dash list        [Column3]
  CATEGORIES             Checkbox labels, comma-separated      [Type 1,…,Type 4]
  URL_COLUMN             Image URL column (fetch-images)       [liendulogo]
  IMAGES_FOLDER          Image folder under DOC_PREFIX         [images_MS]
  DOWNLOAD_TIMEOUT       Per-image timeout in seconds          [120]
  RUST_LOG               Log filter override
"#;

/// Render one PDF per spreadsheet row through an HTML template.
#[derive(Parser, Debug)]
#[command(
    name = "sheet2pdf",
    version,
    about = "Render one PDF per spreadsheet row through an HTML template and wkhtmltopdf",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "SHEET2PDF_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "SHEET2PDF_QUIET")]
    quiet: bool,

    /// Print the result as JSON on stdout.
    #[arg(long, global = true)]
    json: bool,

    /// Disable the progress bar.
    #[arg(long, global = true, env = "SHEET2PDF_NO_PROGRESS")]
    no_progress: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate one PDF per row and a failure report.
    Generate {
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        render: RenderArgs,
        /// Exit non-zero if any row failed.
        #[arg(long)]
        strict: bool,
    },
    /// Download one image per row from a URL column.
    FetchImages {
        #[command(flatten)]
        source: SourceArgs,
        /// Column holding the image URLs.
        #[arg(long, env = "URL_COLUMN", default_value = "liendulogo")]
        url_column: String,
        /// Download folder, under DOC_PREFIX.
        #[arg(long, env = "IMAGES_FOLDER", default_value = "images_MS")]
        images_folder: String,
        #[arg(long, env = "DOC_PREFIX", default_value = "documents/")]
        doc_prefix: String,
        #[arg(long, env = "IMAGE_SUFFIX", default_value = "_image.jpg")]
        image_suffix: String,
        /// Per-image HTTP timeout in seconds.
        #[arg(long, env = "DOWNLOAD_TIMEOUT", default_value_t = 120)]
        download_timeout: u64,
    },
    /// Render a single record given on the command line.
    Manual {
        /// Row index of the record (used for the file name and image_path).
        #[arg(long)]
        index: usize,
        /// A field of the record, as COLUMN=VALUE. Repeatable.
        #[arg(long = "field", value_parser = parse_field, required = true)]
        fields: Vec<(String, String)>,
        #[command(flatten)]
        render: RenderArgs,
    },
    /// Locate wkhtmltopdf and report its version.
    Check {
        #[arg(long, env = "WK_HTML_TO_PDF")]
        wk_html_to_pdf: Option<PathBuf>,
    },
}

/// Where the records come from.
#[derive(Args, Debug)]
struct SourceArgs {
    #[arg(long, env = "DATA_FOLDER", default_value = "data/")]
    data_folder: String,
    #[arg(long, env = "DATA_FILE_NAME", default_value = "data-1.xlsx")]
    data_file_name: String,
    /// Sheet name(s), comma-separated; merged in order.
    #[arg(long = "sheet", env = "SHEET_NAME", default_value = "Sheet1", value_delimiter = ',')]
    sheets: Vec<String>,
}

impl SourceArgs {
    fn data_file(&self) -> PathBuf {
        Path::new(&self.data_folder).join(&self.data_file_name)
    }
}

/// How each record becomes a document.
#[derive(Args, Debug)]
struct RenderArgs {
    #[arg(long, env = "TEMPLATES_FOLDER", default_value = "templates/")]
    templates_folder: PathBuf,
    #[arg(long, env = "HTML_FILE", default_value = "pdf_template.html")]
    html_file: String,
    #[arg(long, env = "DOC_PREFIX", default_value = "documents/")]
    doc_prefix: String,
    #[arg(long, env = "OUTPUT_FOLDER", default_value = "generated_pdfs")]
    output_folder: String,
    #[arg(long, env = "EXCEPTIONS_FILE_NAME", default_value = "exceptions.xlsx")]
    exceptions_file_name: String,
    /// Prefix of every image_path, usually an absolute folder ending in '/'.
    #[arg(long, env = "IMAGES_ABSOLUTE_PATH", default_value = "")]
    images_absolute_path: String,
    #[arg(long, env = "IMAGE_SUFFIX", default_value = "_image.jpg")]
    image_suffix: String,
    /// A4 or Letter.
    #[arg(long, env = "PAGE_SIZE", default_value = "A4", value_parser = parse_page_size)]
    page_size: PageSize,
    /// wkhtmltopdf executable; searched on PATH when unset.
    #[arg(long, env = "WK_HTML_TO_PDF")]
    wk_html_to_pdf: Option<PathBuf>,
    #[arg(long, env = "IDENTITY_COLUMN", default_value = "Column1")]
    identity_column: String,
    #[arg(long, env = "SLASH_COLUMN", default_value = "Column2")]
    slash_column: String,
    #[arg(long, env = "LONG_TEXT_COLUMN", default_value = "Column3")]
    long_text_column: String,
    /// Checkbox labels, comma-separated.
    #[arg(
        long,
        env = "CATEGORIES",
        default_value = "Type 1,Type 2,Type 3,Type 4",
        value_delimiter = ','
    )]
    categories: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is the normal case.
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // With the progress bar active, library INFO lines would only interleave
    // with the bar's own output.
    let uses_bar = matches!(cli.command, Command::Generate { .. });
    let show_progress = uses_bar && !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Generate {
            ref source,
            ref render,
            strict,
        } => {
            let progress_cb: Option<ProgressCallback> = if show_progress {
                Some(CliProgressCallback::new_dynamic() as Arc<dyn RowProgressCallback>)
            } else {
                None
            };
            let config = build_config(Some(source), render, progress_cb)?;

            let report = generate(&config).await.context("Generation failed")?;

            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&report).context("Failed to serialise report")?
                );
            } else if !cli.quiet {
                eprintln!(
                    "{}  {}/{} rows  {}ms  →  {}",
                    if report.is_clean() { green("✔") } else { cyan("⚠") },
                    report.stats.generated,
                    report.stats.total_rows,
                    report.stats.duration_ms,
                    bold(&config.output_dir.display().to_string()),
                );
                if let Some(ref path) = report.report_path {
                    eprintln!(
                        "   {} failures logged to {}",
                        red(&report.stats.failed.to_string()),
                        bold(&path.display().to_string())
                    );
                }
            }

            if strict {
                report.into_result().context("Some rows failed")?;
            }
        }

        Command::FetchImages {
            ref source,
            ref url_column,
            ref images_folder,
            ref doc_prefix,
            ref image_suffix,
            download_timeout,
        } => {
            let config = FetchConfig {
                data_file: source.data_file(),
                sheet: source.sheets.first().cloned(),
                url_column: url_column.clone(),
                output_folder: Path::new(doc_prefix).join(images_folder),
                image_suffix: image_suffix.clone(),
                download_timeout_secs: download_timeout,
            };
            if source.sheets.len() > 1 {
                warn!("fetch-images reads one sheet; using '{}'", source.sheets[0]);
            }

            let report = fetch_images(&config)
                .await
                .context("Image download failed")?;

            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&report).context("Failed to serialise report")?
                );
            } else if !cli.quiet {
                eprintln!(
                    "{}  {} downloaded, {} blank, {} failed  →  {}",
                    if report.failures.is_empty() { green("✔") } else { cyan("⚠") },
                    report.downloaded.len(),
                    report.skipped,
                    report.failures.len(),
                    bold(&config.output_folder.display().to_string()),
                );
                for f in &report.failures {
                    eprintln!("   {} row {}  {}  {}", red("✗"), f.row_index, dim(&f.url), f.error);
                }
            }
        }

        Command::Manual {
            index,
            ref fields,
            ref render,
        } => {
            let config = build_config(None, render, None)?;

            let record = fields
                .iter()
                .fold(Record::new(index), |record, (column, value)| {
                    record.with(column.as_str(), CellValue::from(value.as_str()))
                });

            let doc = generate_record(&record, &config)
                .await
                .with_context(|| format!("Failed to render row {index}"))?;

            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&doc).context("Failed to serialise result")?
                );
            } else if !cli.quiet {
                eprintln!("{}  {}", green("✔"), bold(&doc.path.display().to_string()));
            }
        }

        Command::Check { ref wk_html_to_pdf } => {
            let binary = wkhtmltopdf_locate::locate(wk_html_to_pdf.as_deref())
                .context("wkhtmltopdf is not available")?;
            let version = wkhtmltopdf_locate::probe_version(&binary)
                .with_context(|| format!("Failed to run {}", binary.display()))?;

            if cli.json {
                println!(
                    "{}",
                    serde_json::json!({ "binary": binary, "version": version })
                );
            } else {
                println!("Binary:   {}", binary.display());
                println!("Version:  {}", version);
            }
        }
    }

    Ok(())
}

/// Map CLI args to `GeneratorConfig`. `source` is `None` for manual records.
fn build_config(
    source: Option<&SourceArgs>,
    render: &RenderArgs,
    progress: Option<ProgressCallback>,
) -> Result<GeneratorConfig> {
    let doc_prefix = Path::new(&render.doc_prefix);

    let mut builder = GeneratorConfig::builder();
    if let Some(source) = source {
        builder = builder
            .data_file(source.data_file())
            .sheets(source.sheets.iter().map(|s| s.trim().to_string()));
    }
    builder = builder
        .template_dir(&render.templates_folder)
        .template_name(render.html_file.as_str())
        .output_dir(doc_prefix.join(&render.output_folder))
        .report_path(doc_prefix.join(&render.exceptions_file_name))
        .images_base_path(render.images_absolute_path.as_str())
        .image_suffix(render.image_suffix.as_str())
        .columns(ColumnRoles {
            identity: render.identity_column.clone(),
            slash_delimited: render.slash_column.clone(),
            long_text: render.long_text_column.clone(),
        })
        .categories(
            render
                .categories
                .iter()
                .map(|c| c.trim())
                .filter(|c| !c.is_empty())
                .map(String::from),
        )
        .page_size(render.page_size)
        .renderer_binary(resolve_binary(render.wk_html_to_pdf.as_deref()));

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Resolve wkhtmltopdf up front. If the locator finds nothing, fall back to
/// the configured value or the bare name; each row then fails with
/// `RendererUnavailable` and lands in the failure report.
fn resolve_binary(explicit: Option<&Path>) -> PathBuf {
    match wkhtmltopdf_locate::locate(explicit) {
        Ok(path) => path,
        Err(e) => {
            warn!("{}", e);
            explicit
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(wkhtmltopdf_locate::BINARY_NAME))
        }
    }
}

fn parse_field(s: &str) -> std::result::Result<(String, String), String> {
    match s.split_once('=') {
        Some((column, value)) if !column.trim().is_empty() => {
            Ok((column.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected COLUMN=VALUE, got '{s}'")),
    }
}

fn parse_page_size(s: &str) -> std::result::Result<PageSize, String> {
    s.parse::<PageSize>().map_err(|e| e.to_string())
}
