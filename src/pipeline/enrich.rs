//! Record enrichment: add the derived `image_path` and `checkbox_html` fields.
//!
//! The template sees every original column plus these two. `image_path` is
//! where the image fetcher (or the user) put the row's picture;
//! `checkbox_html` renders the category checklist as disabled HTML
//! checkboxes ticked by what the long-text column mentions.

use crate::config::GeneratorConfig;
use crate::pipeline::normalize::ColumnMap;
use crate::record::{CellValue, Record};
use indexmap::IndexMap;
use serde::Serialize;

/// Template field holding the computed image path.
pub const IMAGE_PATH_FIELD: &str = "image_path";

/// Template field holding the rendered category checklist.
pub const CHECKBOX_FIELD: &str = "checkbox_html";

/// A cleaned record plus its derived fields, ready for the template.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedRecord {
    pub index: usize,
    pub fields: IndexMap<String, CellValue>,
}

impl EnrichedRecord {
    pub fn get(&self, field: &str) -> Option<&CellValue> {
        self.fields.get(field)
    }
}

/// `<base><index><suffix>`, e.g. `/srv/images/7_image.jpg`.
pub fn image_path(base: &str, index: usize, suffix: &str) -> String {
    format!("{}{}{}", base, index, suffix)
}

/// One disabled checkbox per category, in list order, ticked when the
/// label occurs in `text`.
pub fn checkbox_html(categories: &[String], text: &str) -> String {
    categories
        .iter()
        .map(|label| {
            let checked = if text.contains(label.as_str()) {
                " checked"
            } else {
                ""
            };
            format!(
                r#"<label style="font-family: sans-serif;"><input type="checkbox" disabled{}> {}</label><br>"#,
                checked, label
            )
        })
        .collect()
}

/// Applies cleaning and enrichment with the settings of one batch.
#[derive(Debug, Clone)]
pub struct Enricher {
    columns: ColumnMap,
    images_base_path: String,
    image_suffix: String,
    categories: Vec<String>,
}

impl Enricher {
    pub fn new(config: &GeneratorConfig, columns: ColumnMap) -> Self {
        Self {
            columns,
            images_base_path: config.images_base_path.clone(),
            image_suffix: config.image_suffix.clone(),
            categories: config.categories.clone(),
        }
    }

    /// Run each text field through its column's normaliser.
    pub fn clean(&self, record: &Record) -> Record {
        self.columns.normalize_record(record)
    }

    /// Add `image_path` and `checkbox_html` to an already cleaned record.
    pub fn enrich(&self, cleaned: &Record) -> EnrichedRecord {
        let long_text = cleaned
            .get(self.columns.long_text_column())
            .and_then(CellValue::as_text)
            .unwrap_or("");

        let mut fields = cleaned.fields.clone();
        fields.insert(
            IMAGE_PATH_FIELD.to_string(),
            CellValue::Text(image_path(
                &self.images_base_path,
                cleaned.index,
                &self.image_suffix,
            )),
        );
        fields.insert(
            CHECKBOX_FIELD.to_string(),
            CellValue::Text(checkbox_html(&self.categories, long_text)),
        );

        EnrichedRecord {
            index: cleaned.index,
            fields,
        }
    }

    /// `<index>_<identity>.pdf`; a blank identity leaves just `<index>_.pdf`.
    pub fn document_file_name(&self, record: &EnrichedRecord) -> String {
        let identity = record
            .get(self.columns.identity_column())
            .map(CellValue::to_string)
            .unwrap_or_default();
        format!("{}_{}.pdf", record.index, identity)
    }
}
