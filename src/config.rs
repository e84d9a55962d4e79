//! Configuration types for batch PDF generation and image fetching.
//!
//! All generator behaviour is controlled through [`GeneratorConfig`], built
//! via its [`GeneratorConfigBuilder`]. The configuration is constructed once
//! at startup (the CLI maps environment variables onto it) and passed by
//! reference into every stage; no stage reads the environment itself.

use crate::error::Sheet2PdfError;
use crate::pipeline::normalize::FieldRole;
use crate::pipeline::writer::PdfRenderer;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

/// Configuration for one batch run.
///
/// Built via [`GeneratorConfig::builder()`] or using
/// [`GeneratorConfig::default()`].
///
/// # Example
/// ```rust
/// use sheet2pdf::{GeneratorConfig, PageSize};
///
/// let config = GeneratorConfig::builder()
///     .data_file("data/data-1.xlsx")
///     .sheet("Sheet1")
///     .page_size(PageSize::Letter)
///     .image_suffix("_image.png")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct GeneratorConfig {
    /// Workbook to read. Default: `data/data-1.xlsx`.
    pub data_file: PathBuf,

    /// Sheets to load, merged in this order. Default: `["Sheet1"]`.
    pub sheets: Vec<String>,

    /// Directory holding the HTML template. Default: `templates/`.
    pub template_dir: PathBuf,

    /// Template file name inside `template_dir`. Default: `pdf_template.html`.
    pub template_name: String,

    /// Where the PDFs are written. Default: `documents/generated_pdfs`.
    pub output_dir: PathBuf,

    /// Failure report workbook, written only when a row fails.
    /// Default: `documents/exceptions.xlsx`.
    pub report_path: PathBuf,

    /// Prefix of every `image_path`, usually an absolute directory with a
    /// trailing separator. Default: empty.
    pub images_base_path: String,

    /// Suffix of every `image_path`. Default: `_image.jpg`.
    pub image_suffix: String,

    /// Which columns get the identity / slash-delimited / long-text cleaning.
    pub columns: ColumnRoles,

    /// Labels rendered as the `checkbox_html` checklist, in order.
    pub categories: Vec<String>,

    /// Visual options passed to the HTML→PDF renderer.
    pub pdf: PdfOptions,

    /// wkhtmltopdf executable. Default: `wkhtmltopdf` (resolved via PATH).
    pub renderer_binary: PathBuf,

    /// Pre-constructed renderer. Takes precedence over `renderer_binary`.
    pub renderer: Option<Arc<dyn PdfRenderer>>,

    /// Per-row progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from("data/data-1.xlsx"),
            sheets: vec!["Sheet1".to_string()],
            template_dir: PathBuf::from("templates"),
            template_name: "pdf_template.html".to_string(),
            output_dir: PathBuf::from("documents/generated_pdfs"),
            report_path: PathBuf::from("documents/exceptions.xlsx"),
            images_base_path: String::new(),
            image_suffix: "_image.jpg".to_string(),
            columns: ColumnRoles::default(),
            categories: default_categories(),
            pdf: PdfOptions::default(),
            renderer_binary: PathBuf::from(wkhtmltopdf_locate::BINARY_NAME),
            renderer: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for GeneratorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratorConfig")
            .field("data_file", &self.data_file)
            .field("sheets", &self.sheets)
            .field("template_dir", &self.template_dir)
            .field("template_name", &self.template_name)
            .field("output_dir", &self.output_dir)
            .field("report_path", &self.report_path)
            .field("images_base_path", &self.images_base_path)
            .field("image_suffix", &self.image_suffix)
            .field("columns", &self.columns)
            .field("categories", &self.categories)
            .field("pdf", &self.pdf)
            .field("renderer_binary", &self.renderer_binary)
            .field("renderer", &self.renderer.as_ref().map(|_| "<dyn PdfRenderer>"))
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn RowProgressCallback>"),
            )
            .finish()
    }
}

impl GeneratorConfig {
    /// Create a new builder for `GeneratorConfig`.
    pub fn builder() -> GeneratorConfigBuilder {
        GeneratorConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`GeneratorConfig`].
#[derive(Debug)]
pub struct GeneratorConfigBuilder {
    config: GeneratorConfig,
}

impl GeneratorConfigBuilder {
    pub fn data_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_file = path.into();
        self
    }

    /// Load a single sheet.
    pub fn sheet(mut self, name: impl Into<String>) -> Self {
        self.config.sheets = vec![name.into()];
        self
    }

    /// Load several sheets and merge them in order. Blank names are dropped.
    pub fn sheets<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.sheets = names
            .into_iter()
            .map(Into::into)
            .filter(|s: &String| !s.trim().is_empty())
            .collect();
        self
    }

    pub fn template_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.template_dir = dir.into();
        self
    }

    pub fn template_name(mut self, name: impl Into<String>) -> Self {
        self.config.template_name = name.into();
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn report_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.report_path = path.into();
        self
    }

    pub fn images_base_path(mut self, base: impl Into<String>) -> Self {
        self.config.images_base_path = base.into();
        self
    }

    pub fn image_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.config.image_suffix = suffix.into();
        self
    }

    pub fn columns(mut self, columns: ColumnRoles) -> Self {
        self.config.columns = columns;
        self
    }

    pub fn categories<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.categories = labels.into_iter().map(Into::into).collect();
        self
    }

    pub fn page_size(mut self, size: PageSize) -> Self {
        self.config.pdf.page_size = size;
        self
    }

    pub fn pdf_options(mut self, options: PdfOptions) -> Self {
        self.config.pdf = options;
        self
    }

    pub fn renderer_binary(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.renderer_binary = path.into();
        self
    }

    pub fn renderer(mut self, renderer: Arc<dyn PdfRenderer>) -> Self {
        self.config.renderer = Some(renderer);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<GeneratorConfig, Sheet2PdfError> {
        let c = &self.config;
        if c.sheets.is_empty() {
            return Err(Sheet2PdfError::InvalidConfig(
                "At least one sheet name is required".into(),
            ));
        }
        if c.columns.identity.trim().is_empty() {
            return Err(Sheet2PdfError::InvalidConfig(
                "Identity column name must not be empty".into(),
            ));
        }
        if c.template_name.trim().is_empty() {
            return Err(Sheet2PdfError::InvalidConfig(
                "Template name must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

/// Configuration for the image fetcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Workbook to read. Default: `data/data-1.xlsx`.
    pub data_file: PathBuf,

    /// Sheet to read; `None` reads the first sheet.
    pub sheet: Option<String>,

    /// Column holding the image URLs. Default: `liendulogo`.
    pub url_column: String,

    /// Download directory. Default: `documents/images_MS`.
    pub output_folder: PathBuf,

    /// File name suffix after the row index. Default: `_image.jpg`.
    pub image_suffix: String,

    /// Per-request timeout in seconds. Default: 120.
    pub download_timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from("data/data-1.xlsx"),
            sheet: None,
            url_column: "liendulogo".to_string(),
            output_folder: PathBuf::from("documents/images_MS"),
            image_suffix: "_image.jpg".to_string(),
            download_timeout_secs: 120,
        }
    }
}

// ── Column roles ─────────────────────────────────────────────────────────

/// Names of the columns that get a non-default cleaning rule.
///
/// Every other column is cleaned with [`FieldRole::Default`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRoles {
    /// Used in the PDF file name; must be present in the input.
    pub identity: String,
    pub slash_delimited: String,
    /// Also the text searched for category labels.
    pub long_text: String,
}

impl Default for ColumnRoles {
    fn default() -> Self {
        Self {
            identity: "Column1".to_string(),
            slash_delimited: "Column2".to_string(),
            long_text: "Column3".to_string(),
        }
    }
}

impl ColumnRoles {
    /// The role a column plays, decided by name alone.
    pub fn role_for(&self, column: &str) -> FieldRole {
        if column == self.identity {
            FieldRole::Identity
        } else if column == self.slash_delimited {
            FieldRole::SlashDelimited
        } else if column == self.long_text {
            FieldRole::LongText
        } else {
            FieldRole::Default
        }
    }
}

fn default_categories() -> Vec<String> {
    ["Type 1", "Type 2", "Type 3", "Type 4"]
        .into_iter()
        .map(String::from)
        .collect()
}

// ── PDF options ──────────────────────────────────────────────────────────

/// Paper size handed to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PageSize {
    #[default]
    A4,
    Letter,
}

impl PageSize {
    /// The value wkhtmltopdf expects after `--page-size`.
    pub fn as_str(self) -> &'static str {
        match self {
            PageSize::A4 => "A4",
            PageSize::Letter => "Letter",
        }
    }
}

impl FromStr for PageSize {
    type Err = Sheet2PdfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "a4" => Ok(PageSize::A4),
            "letter" => Ok(PageSize::Letter),
            other => Err(Sheet2PdfError::InvalidConfig(format!(
                "Unknown page size '{other}' (expected A4 or Letter)"
            ))),
        }
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed visual options for every generated document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdfOptions {
    pub page_size: PageSize,
    /// Applied to all four sides. Default: `0in`.
    pub margin: String,
    /// Lets templates reference local images. Default: `true`.
    pub enable_local_file_access: bool,
}

impl Default for PdfOptions {
    fn default() -> Self {
        Self {
            page_size: PageSize::default(),
            margin: "0in".to_string(),
            enable_local_file_access: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_layout() {
        let c = GeneratorConfig::default();
        assert_eq!(c.sheets, vec!["Sheet1"]);
        assert_eq!(c.image_suffix, "_image.jpg");
        assert_eq!(c.categories.len(), 4);
        assert_eq!(c.pdf.margin, "0in");
        assert!(c.pdf.enable_local_file_access);
        assert_eq!(c.template_dir, PathBuf::from("templates"));
        assert_eq!(c.template_name, "pdf_template.html");
    }

    #[test]
    fn builder_rejects_empty_sheet_list() {
        let err = GeneratorConfig::builder()
            .sheets(Vec::<String>::new())
            .build()
            .unwrap_err();
        assert!(matches!(err, Sheet2PdfError::InvalidConfig(_)));
    }

    #[test]
    fn builder_drops_blank_sheet_names() {
        let c = GeneratorConfig::builder()
            .sheets(["Sheet1", " ", "Sheet2"])
            .build()
            .unwrap();
        assert_eq!(c.sheets, vec!["Sheet1", "Sheet2"]);
    }

    #[test]
    fn builder_rejects_empty_identity_column() {
        let err = GeneratorConfig::builder()
            .columns(ColumnRoles {
                identity: String::new(),
                ..ColumnRoles::default()
            })
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("Identity"));
    }

    #[test]
    fn role_lookup_is_by_exact_name() {
        let roles = ColumnRoles::default();
        assert_eq!(roles.role_for("Column1"), FieldRole::Identity);
        assert_eq!(roles.role_for("Column2"), FieldRole::SlashDelimited);
        assert_eq!(roles.role_for("Column3"), FieldRole::LongText);
        assert_eq!(roles.role_for("column1"), FieldRole::Default);
        assert_eq!(roles.role_for("Other"), FieldRole::Default);
    }

    #[test]
    fn page_size_parses_case_insensitively() {
        assert_eq!("a4".parse::<PageSize>().unwrap(), PageSize::A4);
        assert_eq!(" LETTER ".parse::<PageSize>().unwrap(), PageSize::Letter);
        assert!("legal".parse::<PageSize>().is_err());
    }

    #[test]
    fn debug_hides_trait_objects() {
        let dbg = format!("{:?}", GeneratorConfig::default());
        assert!(dbg.contains("GeneratorConfig"));
        assert!(dbg.contains("renderer: None"));
    }
}
