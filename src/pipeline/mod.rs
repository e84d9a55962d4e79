//! Pipeline stages for spreadsheet-to-PDF generation.
//!
//! Each submodule implements exactly one transformation step, so every
//! stage is testable on its own and the renderer can be swapped without
//! touching the others.
//!
//! ## Data Flow
//!
//! ```text
//! load ──▶ normalize ──▶ enrich ──▶ template ──▶ writer
//! (xlsx)   (cleanup)     (+2 fields) (HTML)      (wkhtmltopdf)
//!                                                   │ RowError
//!                                                   ▼
//!                                                 report (xlsx)
//! ```
//!
//! 1. [`load`]: read sheets into records; runs in `spawn_blocking`
//!    because calamine is synchronous
//! 2. [`normalize`]: per-column text rules chosen by [`normalize::FieldRole`]
//! 3. [`enrich`]: add `image_path` and `checkbox_html`
//! 4. [`template`]: bind the record into the minijinja template
//! 5. [`writer`]: hand the HTML to the PDF renderer; the only stage that
//!    runs an external process
//! 6. [`report`]: save the failures collected along the way

pub mod enrich;
pub mod load;
pub mod normalize;
pub mod report;
pub mod template;
pub mod writer;
