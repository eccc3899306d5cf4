//! Progress-callback trait for per-document extraction events.
//!
//! Inject an [`Arc<dyn ExtractionProgressCallback>`] via
//! [`crate::config::ExtractionConfigBuilder::progress_callback`] to be told
//! when each card is sent to the model and when it comes back. The CLI uses
//! this to drive a terminal spinner; a web backend could forward the events to
//! a websocket instead.
//!
//! # Example
//!
//! ```rust
//! use idcard_extract::{DocumentType, ExtractionConfig, ExtractionProgressCallback};
//! use std::sync::Arc;
//!
//! struct LogCallback;
//!
//! impl ExtractionProgressCallback for LogCallback {
//!     fn on_document_complete(&self, doc: DocumentType, recovered: usize, elapsed: f64) {
//!         eprintln!("{doc}: {recovered} fields in {elapsed:.1}s");
//!     }
//! }
//!
//! let config = ExtractionConfig::builder()
//!     .progress_callback(Arc::new(LogCallback) as Arc<dyn ExtractionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::document::DocumentType;
use std::sync::Arc;

/// Called by the extraction pipeline as it processes each document.
///
/// PAN and Aadhaar cards may be extracted concurrently, so implementations
/// must be `Send + Sync`. All methods default to no-ops.
pub trait ExtractionProgressCallback: Send + Sync {
    /// Called before the input is loaded. Always followed by exactly one of
    /// `on_document_complete` or `on_document_error`.
    fn on_document_start(&self, doc: DocumentType) {
        let _ = doc;
    }

    /// Called when the model answered and the record was normalised.
    ///
    /// # Arguments
    /// * `recovered` — number of non-empty fields in the record
    /// * `elapsed`   — seconds spent in the model call
    fn on_document_complete(&self, doc: DocumentType, recovered: usize, elapsed: f64) {
        let _ = (doc, recovered, elapsed);
    }

    /// Called when the document could not be extracted, including when the
    /// input file or payload could not be read or decoded.
    fn on_document_error(&self, doc: DocumentType, error: &str) {
        let _ = (doc, error);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ExtractionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ExtractionConfig`].
pub type ProgressCallback = Arc<dyn ExtractionProgressCallback>;
