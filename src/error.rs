//! Error types for the edgequake-pdf2json library.
//!
//! Two tiers reflect two distinct failure modes:
//!
//! * [`PipelineError`] — **Fatal**: the run cannot start at all (service not
//!   configured, pdfium missing, output directory not creatable). Returned as
//!   `Err(PipelineError)` from [`crate::batch::run`] and
//!   [`crate::batch::process_directory`].
//!
//! * [`DocumentError`] — **Non-fatal**: one document failed (corrupt file,
//!   rejected API call) but the rest of the batch is unaffected. Stored inside
//!   [`crate::output::DocumentOutcome`] so a caller can see exactly which
//!   files failed and at which stage.
//!
//! [`RenderError`] and [`ExtractError`] are stage-local; the driver maps them
//! into a [`DocumentError`] carrying the file name and the failing [`Stage`].

use crate::output::Stage;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-pdf2json library.
#[derive(Debug, Error)]
pub enum PipelineError {
    // ── Config errors ─────────────────────────────────────────────────────
    /// A required environment variable for the extraction service is unset.
    #[error("Extraction service is not configured: {var} is not set.\n{hint}")]
    ProviderNotConfigured { var: String, hint: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium, place the library in the working\n\
directory, or install it on the system library path.\n"
    )]
    PdfiumBindingFailed(String),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not list the input directory.
    #[error("Failed to read input directory '{path}': {source}")]
    InputDirUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not create one of the output directories.
    #[error("Failed to create output directory '{path}': {source}")]
    OutputDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A non-fatal error for a single document.
///
/// The `Display` text is the console line the CLI prints for the failure.
#[derive(Debug, Clone, PartialEq, Error, serde::Serialize, serde::Deserialize)]
pub enum DocumentError {
    /// The file could not be opened or parsed as a PDF.
    #[error("Error opening {file}: {detail}")]
    DocumentOpen { file: String, detail: String },

    /// A stage after opening failed: render, encode, extract or persist.
    #[error("Error processing {file}: {detail}")]
    ServiceCall {
        file: String,
        stage: Stage,
        detail: String,
    },
}

impl DocumentError {
    /// The stage at which the document stopped.
    pub fn stage(&self) -> Stage {
        match self {
            DocumentError::DocumentOpen { .. } => Stage::Open,
            DocumentError::ServiceCall { stage, .. } => *stage,
        }
    }

    /// File name of the document that failed.
    pub fn file(&self) -> &str {
        match self {
            DocumentError::DocumentOpen { file, .. } | DocumentError::ServiceCall { file, .. } => {
                file
            }
        }
    }
}

/// Failure while opening or rasterising a page.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Not a readable PDF.
    #[error("{0}")]
    Open(String),

    /// The requested page does not exist.
    #[error("page index {index} is out of range (document has {total} pages)")]
    PageOutOfRange { index: usize, total: usize },

    /// pdfium returned an error while rendering.
    #[error("rasterisation failed: {0}")]
    Rasterisation(String),
}

/// Failure while calling the extraction service.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Connection, TLS or timeout failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// HTTP 401 / 403 — retrying with the same credentials will not help.
    #[error("authentication failed (HTTP {status}): {detail}")]
    Auth { status: u16, detail: String },

    /// Any other non-success HTTP status.
    #[error("service returned HTTP {status}: {detail}")]
    Api { status: u16, detail: String },

    /// The model declined to answer.
    #[error("model refused the request: {0}")]
    Refused(String),

    /// The completion stopped before producing a full object.
    #[error("completion did not finish (finish_reason = {0})")]
    Incomplete(String),

    /// Response body or message content was not the expected JSON.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The JSON object does not match the declared schema.
    #[error("response does not match schema '{schema}': {detail}")]
    SchemaMismatch { schema: String, detail: String },
}
