//! Progress-callback trait for per-row generation events.
//!
//! Inject an [`Arc<dyn RowProgressCallback>`] via
//! [`crate::config::GeneratorConfigBuilder::progress_callback`] to receive
//! events as the batch driver works through the rows. The CLI uses this to
//! drive its progress bar; library callers can forward events anywhere.
//!
//! # Example
//!
//! ```rust
//! use sheet2pdf::{GeneratorConfig, RowProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     failed: AtomicUsize,
//! }
//!
//! impl RowProgressCallback for CountingCallback {
//!     fn on_row_error(&self, row: usize, total: usize, error: &str) {
//!         self.failed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("Row {} of {} failed: {}", row, total, error);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { failed: AtomicUsize::new(0) });
//!
//! let config = GeneratorConfig::builder()
//!     .progress_callback(counter as Arc<dyn RowProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::path::Path;
use std::sync::Arc;

/// Called by the batch driver as it processes each row.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. `row` is always the record's row index, not its
/// position in the iteration.
pub trait RowProgressCallback: Send + Sync {
    /// Called once after loading, before any row is rendered.
    fn on_batch_start(&self, total_rows: usize) {
        let _ = total_rows;
    }

    /// Called just before a row is enriched and rendered.
    fn on_row_start(&self, row: usize, total_rows: usize) {
        let _ = (row, total_rows);
    }

    /// Called when a row's PDF has been written to `output`.
    fn on_row_complete(&self, row: usize, total_rows: usize, output: &Path) {
        let _ = (row, total_rows, output);
    }

    /// Called when a row fails; the batch carries on with the next row.
    fn on_row_error(&self, row: usize, total_rows: usize, error: &str) {
        let _ = (row, total_rows, error);
    }

    /// Called once after every row has been attempted.
    fn on_batch_complete(&self, total_rows: usize, generated: usize) {
        let _ = (total_rows, generated);
    }
}

/// Default when no callback is configured.
pub struct NoopProgressCallback;

impl RowProgressCallback for NoopProgressCallback {}

/// Type stored in [`crate::config::GeneratorConfig`].
pub type ProgressCallback = Arc<dyn RowProgressCallback>;
