//! Progress-callback trait for per-document pipeline events.
//!
//! Inject an [`Arc<dyn PipelineProgressCallback>`] via
//! [`crate::config::PipelineConfigBuilder::progress_callback`] to receive
//! events as the driver works through the input directory. The CLI uses it to
//! print its `Processing …` / `Saved …` / `Error …` lines; library callers can
//! forward events anywhere without the pipeline knowing how.
//!
//! # Example
//!
//! ```rust
//! use edgequake_pdf2json::{PipelineConfig, PipelineProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     saved: AtomicUsize,
//! }
//!
//! impl PipelineProgressCallback for CountingCallback {
//!     fn on_result_saved(&self, document: &str, _path: &std::path::Path) {
//!         self.saved.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{document} done");
//!     }
//! }
//!
//! let cb = Arc::new(CountingCallback { saved: AtomicUsize::new(0) });
//! let config = PipelineConfig::builder()
//!     .progress_callback(cb as Arc<dyn PipelineProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::error::DocumentError;
use std::path::Path;
use std::sync::Arc;

/// Called by the pipeline driver as it processes each document.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Documents are processed one at a time, so events for
/// a document always arrive in stage order.
pub trait PipelineProgressCallback: Send + Sync {
    /// Called once after discovery, before the first document.
    fn on_run_start(&self, total_documents: usize) {
        let _ = total_documents;
    }

    /// Called when work on a document begins.
    fn on_document_start(&self, document: &str) {
        let _ = document;
    }

    /// Called after the rendered page image has been written.
    fn on_image_saved(&self, document: &str, path: &Path) {
        let _ = (document, path);
    }

    /// Called after the JSON result has been written.
    fn on_result_saved(&self, document: &str, path: &Path) {
        let _ = (document, path);
    }

    /// Called when a document stops at a failed stage.
    fn on_document_error(&self, document: &str, error: &DocumentError) {
        let _ = (document, error);
    }

    /// Called once after every document has been attempted.
    fn on_run_complete(&self, total_documents: usize, persisted: usize) {
        let _ = (total_documents, persisted);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl PipelineProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::PipelineConfig`].
pub type ProgressCallback = Arc<dyn PipelineProgressCallback>;
