//! # edgequake-pdf2json
//!
//! Extract structured fields from PDF documents as JSON using Vision Language
//! Models (VLMs).
//!
//! Each PDF in a directory has its first page rasterised to a PNG, which is
//! sent with a fixed three-question prompt to an Azure OpenAI vision
//! deployment. The model answers with a strict JSON object (customer name,
//! account number, balance in USD) that is written next to the page image.
//!
//! ## Pipeline Overview
//!
//! ```text
//! input_documents/*.pdf
//!  │
//!  ├─ 1. Input    discover *.pdf, check the %PDF header
//!  ├─ 2. Render   rasterise page 0 at 2× via pdfium
//!  ├─ 3. Encode   PNG → base64 data URI   (→ output_images/<stem>.png)
//!  ├─ 4. Extract  structured-output call (json_schema, strict)
//!  └─ 5. Persist  output_results/<stem>.json
//! ```
//!
//! Documents are processed one at a time. A failure in one document is
//! recorded in its [`DocumentOutcome`] and never stops the rest of the batch.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_pdf2json::{run, PipelineConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Credentials from AOAI_ENDPOINT / AOAI_API_KEY / AOAI_DEPLOYMENT
//!     let report = run(&PipelineConfig::default()).await?;
//!     for outcome in report.failures() {
//!         eprintln!("{}: {:?}", outcome.file_name(), outcome.error);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2json` binary (clap + anyhow + dotenvy + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod batch;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod schema;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use batch::{process_directory, process_document, run};
pub use config::{AzureOpenAiConfig, PipelineConfig, PipelineConfigBuilder};
pub use error::{DocumentError, ExtractError, PipelineError, RenderError};
pub use output::{DocumentOutcome, DocumentState, RunReport, RunStats, Stage};
pub use pipeline::encode::ImageData;
pub use pipeline::extract::{
    extract, AzureOpenAiExtractor, ExtractionRequest, StructuredExtractor,
};
pub use pipeline::render::{PageRenderer, PdfiumRenderer, RenderedPage};
pub use progress::{NoopProgressCallback, PipelineProgressCallback, ProgressCallback};
pub use schema::{AccountSummary, ExtractionTarget, FieldKind, OutputSchema};
