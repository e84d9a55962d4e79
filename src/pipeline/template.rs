//! Template rendering: bind an [`EnrichedRecord`] into the HTML template.
//!
//! Templates use Jinja syntax (minijinja). Auto-escaping is switched off:
//! field values deliberately carry HTML fragments (`<br> - ` lists,
//! checkbox markup) that must reach the renderer verbatim.

use crate::error::{RowError, Sheet2PdfError};
use crate::pipeline::enrich::EnrichedRecord;
use crate::record::CellValue;
use indexmap::IndexMap;
use minijinja::{AutoEscape, Environment, Value};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use tracing::debug;

static RE_TEMPLATE_VAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{-?\s*([A-Za-z_][A-Za-z0-9_]*)").unwrap());

/// Largest magnitude below which every whole `f64` is an exact `i64`.
const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0;

/// A compiled template, loaded once per batch.
pub struct TemplateRenderer {
    env: Environment<'static>,
    name: String,
    source: String,
}

impl TemplateRenderer {
    /// Read and compile `<dir>/<name>`.
    ///
    /// # Errors
    /// [`Sheet2PdfError::TemplateNotFound`] if the file cannot be read,
    /// [`Sheet2PdfError::TemplateInvalid`] if it does not compile.
    pub async fn load(dir: &Path, name: &str) -> Result<Self, Sheet2PdfError> {
        let path = dir.join(name);
        let source = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| Sheet2PdfError::TemplateNotFound { path, source: e })?;
        Self::from_source(name, source)
    }

    /// Compile a template held in memory.
    pub fn from_source(name: &str, source: String) -> Result<Self, Sheet2PdfError> {
        let mut env = Environment::new();
        env.set_auto_escape_callback(|_| AutoEscape::None);
        env.add_template_owned(name.to_string(), source.clone())
            .map_err(|e| Sheet2PdfError::TemplateInvalid {
                name: name.to_string(),
                detail: e.to_string(),
            })?;
        debug!("Compiled template '{}' ({} bytes)", name, source.len());

        Ok(Self {
            env,
            name: name.to_string(),
            source,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Names used in `{{ … }}` expressions, in first-use order.
    pub fn referenced_fields(&self) -> Vec<String> {
        referenced_fields(&self.source)
    }

    /// Render one record to HTML.
    pub fn render(&self, record: &EnrichedRecord) -> Result<String, RowError> {
        let template = self
            .env
            .get_template(&self.name)
            .map_err(|e| RowError::Template {
                detail: e.to_string(),
            })?;
        template
            .render(render_context(record))
            .map_err(|e| RowError::Template {
                detail: e.to_string(),
            })
    }
}

/// The flat field → value mapping handed to the template.
///
/// Empty cells bind as empty strings so a blank cell prints nothing. Whole
/// numbers bind as integers, matching their [`CellValue`] `Display` form
/// used in document file names (`1234.0` prints as `1234`).
pub fn render_context(record: &EnrichedRecord) -> IndexMap<String, Value> {
    record
        .fields
        .iter()
        .map(|(name, value)| {
            let bound = match value {
                CellValue::Empty => Value::from(""),
                CellValue::Number(n) if n.fract() == 0.0 && n.abs() < MAX_EXACT_INT => {
                    Value::from(*n as i64)
                }
                other => Value::from_serialize(other),
            };
            (name.clone(), bound)
        })
        .collect()
}

/// Variable names referenced by `{{ name }}` / `{{- name }}` expressions.
pub fn referenced_fields(source: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for caps in RE_TEMPLATE_VAR.captures_iter(source) {
        let name = caps[1].to_string();
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}
