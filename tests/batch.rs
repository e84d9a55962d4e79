//! Integration tests for batch generation.
//!
//! Every test builds its workbook with rust_xlsxwriter inside a TempDir and
//! injects a recording renderer, so no wkhtmltopdf install is needed.

use async_trait::async_trait;
use calamine::{open_workbook_auto, Data, Reader};
use rust_xlsxwriter::Workbook;
use sheet2pdf::{
    generate, generate_sync, GeneratorConfig, PdfRenderer, RowError, RowProgressCallback,
    Sheet2PdfError,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

// ── Test helpers ─────────────────────────────────────────────────────────────

const TEMPLATE: &str = "<h1>{{ Column1 }}</h1><p>{{ Column2 }}</p><div>{{ Column3 }}</div>\
<img src=\"{{ image_path }}\">{{ checkbox_html }}";

type Sheet<'a> = (&'a str, Vec<Vec<Option<&'a str>>>);

fn header() -> Vec<Option<&'static str>> {
    vec![Some("Column1"), Some("Column2"), Some("Column3")]
}

fn five_rows() -> Vec<Vec<Option<&'static str>>> {
    vec![
        header(),
        vec![Some("Acme*HQ"), Some("red/green"), Some("Type 1 fits.Type 3 too.")],
        vec![Some("Beta"), Some("a/b"), Some("Nothing.")],
        vec![Some("Gamma"), None, Some("Type 2.")],
        vec![Some("Delta*X"), Some("x"), Some("Type 4.")],
        vec![Some("Epsilon"), Some("y"), None],
    ]
}

fn write_workbook(path: &Path, sheets: &[Sheet<'_>]) {
    let mut workbook = Workbook::new();
    for (name, rows) in sheets {
        let sheet = workbook.add_worksheet();
        sheet.set_name(*name).unwrap();
        for (r, row) in rows.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                if let Some(text) = cell {
                    sheet.write_string(r as u32, c as u16, *text).unwrap();
                }
            }
        }
    }
    workbook.save(path).unwrap();
}

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new(sheets: &[Sheet<'_>]) -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("data")).unwrap();
        std::fs::create_dir_all(dir.path().join("templates")).unwrap();
        write_workbook(&dir.path().join("data").join("data-1.xlsx"), sheets);
        std::fs::write(dir.path().join("templates").join("pdf_template.html"), TEMPLATE).unwrap();
        Self { dir }
    }

    fn standard() -> Self {
        Self::new(&[("Sheet1", five_rows())])
    }

    fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    fn builder(&self) -> sheet2pdf::GeneratorConfigBuilder {
        GeneratorConfig::builder()
            .data_file(self.path("data/data-1.xlsx"))
            .template_dir(self.path("templates"))
            .output_dir(self.path("documents/generated_pdfs"))
            .report_path(self.path("documents/exceptions.xlsx"))
            .images_base_path("/imgs/")
    }
}

/// Writes the HTML to the output path; fails for file names with `fail_prefix`.
#[derive(Default)]
struct RecordingRenderer {
    fail_prefix: Option<String>,
    calls: Mutex<Vec<(PathBuf, String)>>,
}

impl RecordingRenderer {
    fn failing(prefix: &str) -> Arc<Self> {
        Arc::new(Self {
            fail_prefix: Some(prefix.to_string()),
            ..Self::default()
        })
    }

    fn calls(&self) -> Vec<(PathBuf, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PdfRenderer for RecordingRenderer {
    async fn render_pdf(&self, html: &str, output: &Path) -> Result<(), RowError> {
        self.calls
            .lock()
            .unwrap()
            .push((output.to_path_buf(), html.to_string()));

        let name = output.file_name().unwrap().to_string_lossy().into_owned();
        if let Some(ref prefix) = self.fail_prefix {
            if name.starts_with(prefix.as_str()) {
                return Err(RowError::RendererFailed {
                    exit_code: Some(1),
                    stderr: "simulated crash".into(),
                });
            }
        }
        tokio::fs::write(output, html).await.unwrap();
        Ok(())
    }
}

fn file_names(report: &sheet2pdf::BatchReport) -> Vec<String> {
    report
        .documents
        .iter()
        .map(|d| d.path.file_name().unwrap().to_string_lossy().into_owned())
        .collect()
}

// ── Failure isolation ────────────────────────────────────────────────────────

#[tokio::test]
async fn row_failure_is_isolated_and_reported() {
    let fx = Fixture::standard();
    let renderer = RecordingRenderer::failing("3_");
    let config = fx.builder().renderer(renderer.clone()).build().unwrap();

    let report = generate(&config).await.expect("batch should complete");

    assert_eq!(
        file_names(&report),
        vec![
            "0_Acme- HQ.pdf",
            "1_Beta.pdf",
            "2_Gamma.pdf",
            "4_Epsilon.pdf"
        ]
    );
    for doc in &report.documents {
        assert!(doc.path.is_file(), "missing {}", doc.path.display());
    }

    assert_eq!(report.failures.len(), 1);
    let failure = &report.failures[0];
    assert_eq!(failure.failure, 0);
    assert_eq!(failure.row_index, 3);
    // The snapshot is the record as loaded, before cleaning.
    assert_eq!(
        failure.record.get("Column1").and_then(|v| v.as_text()),
        Some("Delta*X")
    );
    assert!(matches!(failure.error, RowError::RendererFailed { .. }));

    assert_eq!(report.stats.total_rows, 5);
    assert_eq!(report.stats.generated, 4);
    assert_eq!(report.stats.failed, 1);
    assert_eq!(renderer.calls().len(), 5);

    let report_path = report.report_path.clone().expect("report written");
    assert_eq!(report_path, fx.path("documents/exceptions.xlsx"));

    let mut wb = open_workbook_auto(&report_path).unwrap();
    let range = wb.worksheet_range("failures").unwrap();
    let rows: Vec<&[Data]> = range.rows().collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1][0], Data::Float(0.0));
    assert_eq!(rows[1][1], Data::Float(3.0));

    match report.into_result() {
        Err(Sheet2PdfError::PartialFailure { failed, total }) => {
            assert_eq!((failed, total), (1, 5));
        }
        other => panic!("expected PartialFailure, got {other:?}"),
    }
}

#[tokio::test]
async fn clean_batch_writes_no_report() {
    let fx = Fixture::standard();
    let config = fx
        .builder()
        .renderer(Arc::new(RecordingRenderer::default()))
        .build()
        .unwrap();

    let report = generate(&config).await.unwrap();

    assert!(report.is_clean());
    assert_eq!(report.documents.len(), 5);
    assert!(report.report_path.is_none());
    assert!(!fx.path("documents/exceptions.xlsx").exists());
}

#[tokio::test]
async fn missing_renderer_binary_fails_rows_not_batch() {
    let fx = Fixture::standard();
    let config = fx
        .builder()
        .renderer_binary("/definitely/not/here/wkhtmltopdf")
        .build()
        .unwrap();

    let report = generate(&config).await.unwrap();

    assert!(report.documents.is_empty());
    assert_eq!(report.failures.len(), 5);
    let counters: Vec<usize> = report.failures.iter().map(|f| f.failure).collect();
    assert_eq!(counters, vec![0, 1, 2, 3, 4]);
    assert!(report
        .failures
        .iter()
        .all(|f| matches!(f.error, RowError::RendererUnavailable { .. })));
    assert!(fx.path("documents/exceptions.xlsx").is_file());
}

#[tokio::test]
async fn oversized_failing_row_is_still_reported() {
    let long = "y".repeat(20_000);
    let fx = Fixture::new(&[(
        "Sheet1",
        vec![
            vec![Some("Column1"), Some("Column3"), Some("Notes")],
            vec![Some("ok"), Some("short"), None],
            vec![Some("bad"), Some(long.as_str()), Some(long.as_str())],
        ],
    )]);
    let config = fx
        .builder()
        .renderer(RecordingRenderer::failing("1_"))
        .build()
        .unwrap();

    let report = generate(&config).await.expect("batch should complete");

    assert_eq!(file_names(&report), vec!["0_ok.pdf"]);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].row_index, 1);

    let report_path = report.report_path.clone().expect("report written");
    let mut wb = open_workbook_auto(&report_path).unwrap();
    let range = wb.worksheet_range("failures").unwrap();
    let rows: Vec<&[Data]> = range.rows().collect();
    assert_eq!(rows.len(), 2);
    let Data::String(json) = &rows[1][2] else {
        panic!("row column is not a string: {:?}", rows[1][2]);
    };
    assert!(json.ends_with(sheet2pdf::pipeline::report::TRUNCATION_MARK));
}

#[tokio::test]
async fn unwritable_report_keeps_the_batch_result() {
    let fx = Fixture::standard();
    // A directory where the report file should go.
    std::fs::create_dir_all(fx.path("documents/exceptions.xlsx")).unwrap();
    let config = fx
        .builder()
        .renderer(RecordingRenderer::failing("3_"))
        .build()
        .unwrap();

    let report = generate(&config).await.expect("batch should complete");

    assert_eq!(report.documents.len(), 4);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].row_index, 3);
    assert!(report.report_path.is_none());
}

// ── Rendering content ────────────────────────────────────────────────────────

#[tokio::test]
async fn html_carries_cleaned_fields_and_enrichment() {
    let fx = Fixture::standard();
    let renderer = Arc::new(RecordingRenderer::default());
    let config = fx
        .builder()
        .categories(["Type 1", "Type 2", "Type 3"])
        .renderer(renderer.clone())
        .build()
        .unwrap();

    generate(&config).await.unwrap();
    let calls = renderer.calls();
    let (_, html0) = &calls[0];

    assert!(html0.contains("<h1>Acme- HQ</h1>"), "{html0}");
    assert!(html0.contains("<p>red green</p>"), "{html0}");
    assert!(html0.contains("<div>Type 1 fits<br> - Type 3 too.</div>"), "{html0}");
    assert!(html0.contains("<img src=\"/imgs/0_image.jpg\">"), "{html0}");
    assert!(html0.contains("disabled checked> Type 1</label>"));
    assert!(html0.contains("disabled> Type 2</label>"));
    assert!(html0.contains("disabled checked> Type 3</label>"));

    // Blank Column2 renders as nothing.
    let (_, html2) = &calls[2];
    assert!(html2.contains("<p></p>"), "{html2}");
    assert!(html2.contains("disabled checked> Type 2</label>"));
}

#[tokio::test]
async fn same_input_gives_same_names_and_bytes() {
    let fx = Fixture::standard();

    let first = Arc::new(RecordingRenderer::default());
    let config = fx.builder().renderer(first.clone()).build().unwrap();
    let a = generate(&config).await.unwrap();

    let second = Arc::new(RecordingRenderer::default());
    let config = fx.builder().renderer(second.clone()).build().unwrap();
    let b = generate(&config).await.unwrap();

    assert_eq!(file_names(&a), file_names(&b));
    assert_eq!(first.calls(), second.calls());
}

// ── Sheets ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn merged_sheets_number_rows_continuously() {
    let fx = Fixture::new(&[
        ("Sheet1", five_rows()),
        (
            "Sheet2",
            vec![header(), vec![Some("Zeta"), Some("z"), Some("Type 1.")]],
        ),
    ]);
    let config = fx
        .builder()
        .sheets(["Sheet1", "Sheet2"])
        .renderer(Arc::new(RecordingRenderer::default()))
        .build()
        .unwrap();

    let report = generate(&config).await.unwrap();

    assert_eq!(report.stats.total_rows, 6);
    assert_eq!(file_names(&report).last().unwrap(), "5_Zeta.pdf");
}

#[tokio::test]
async fn header_only_sheet_is_nothing_to_process() {
    let fx = Fixture::new(&[("Sheet1", vec![header()])]);
    let renderer = Arc::new(RecordingRenderer::default());
    let config = fx.builder().renderer(renderer.clone()).build().unwrap();

    let report = generate(&config).await.unwrap();

    assert_eq!(report.stats.total_rows, 0);
    assert!(report.documents.is_empty());
    assert!(report.report_path.is_none());
    assert!(renderer.calls().is_empty());
}

// ── Fatal errors ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_input_is_fatal() {
    let fx = Fixture::standard();
    let config = fx
        .builder()
        .data_file(fx.path("data/nope.xlsx"))
        .build()
        .unwrap();

    let err = generate(&config).await.unwrap_err();
    assert!(matches!(err, Sheet2PdfError::InputNotFound { .. }));
}

#[tokio::test]
async fn unknown_sheet_is_fatal() {
    let fx = Fixture::standard();
    let config = fx.builder().sheet("Nope").build().unwrap();

    let err = generate(&config).await.unwrap_err();
    assert!(matches!(err, Sheet2PdfError::SheetNotFound { .. }));
}

#[tokio::test]
async fn missing_template_is_fatal() {
    let fx = Fixture::standard();
    let renderer = Arc::new(RecordingRenderer::default());
    let config = fx
        .builder()
        .template_name("missing.html")
        .renderer(renderer.clone())
        .build()
        .unwrap();

    let err = generate(&config).await.unwrap_err();
    assert!(matches!(err, Sheet2PdfError::TemplateNotFound { .. }));
    assert!(renderer.calls().is_empty());
}

#[tokio::test]
async fn missing_identity_column_is_fatal() {
    let fx = Fixture::new(&[(
        "Sheet1",
        vec![
            vec![Some("Name"), Some("Column3")],
            vec![Some("Acme"), Some("Type 1.")],
        ],
    )]);
    let config = fx
        .builder()
        .renderer(Arc::new(RecordingRenderer::default()))
        .build()
        .unwrap();

    let err = generate(&config).await.unwrap_err();
    match err {
        Sheet2PdfError::MissingColumn { column, role, .. } => {
            assert_eq!(column, "Column1");
            assert_eq!(role, "identity");
        }
        other => panic!("unexpected error: {other}"),
    }
}

// ── Callbacks & sync wrapper ─────────────────────────────────────────────────

#[derive(Default)]
struct Counting {
    total: AtomicUsize,
    complete: AtomicUsize,
    errors: AtomicUsize,
    generated: AtomicUsize,
}

impl RowProgressCallback for Counting {
    fn on_batch_start(&self, total_rows: usize) {
        self.total.store(total_rows, Ordering::SeqCst);
    }
    fn on_row_complete(&self, _row: usize, _total_rows: usize, _output: &Path) {
        self.complete.fetch_add(1, Ordering::SeqCst);
    }
    fn on_row_error(&self, row: usize, _total_rows: usize, _error: &str) {
        assert_eq!(row, 3);
        self.errors.fetch_add(1, Ordering::SeqCst);
    }
    fn on_batch_complete(&self, _total_rows: usize, generated: usize) {
        self.generated.store(generated, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn progress_callback_sees_every_row() {
    let fx = Fixture::standard();
    let counting = Arc::new(Counting::default());
    let config = fx
        .builder()
        .renderer(RecordingRenderer::failing("3_"))
        .progress_callback(counting.clone())
        .build()
        .unwrap();

    generate(&config).await.unwrap();

    assert_eq!(counting.total.load(Ordering::SeqCst), 5);
    assert_eq!(counting.complete.load(Ordering::SeqCst), 4);
    assert_eq!(counting.errors.load(Ordering::SeqCst), 1);
    assert_eq!(counting.generated.load(Ordering::SeqCst), 4);
}

#[test]
fn generate_sync_runs_without_a_runtime() {
    let fx = Fixture::standard();
    let config = fx
        .builder()
        .renderer(Arc::new(RecordingRenderer::default()))
        .build()
        .unwrap();

    let report = generate_sync(&config).unwrap();
    assert_eq!(report.stats.generated, 5);
}
