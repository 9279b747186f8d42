//! Batch driver: run every document in the input directory through the
//! pipeline, one at a time.
//!
//! ## Failure isolation
//!
//! [`process_document`] never returns an error. Whatever goes wrong inside a
//! document (unreadable file, rejected API call, full disk) is captured as a
//! [`DocumentError`] in that document's [`DocumentOutcome`] and the loop moves
//! on. Only problems that make the whole run impossible (no credentials, no
//! pdfium, output directory not creatable) surface as [`PipelineError`].
//!
//! Nothing is rolled back: a page image written before a failed extraction
//! stays on disk.

use crate::config::PipelineConfig;
use crate::error::{DocumentError, PipelineError, RenderError};
use crate::output::{DocumentOutcome, DocumentState, RunReport, RunStats, Stage};
use crate::pipeline::encode::{self, ImageData, PNG_MIME};
use crate::pipeline::extract::{self, AzureOpenAiExtractor, StructuredExtractor};
use crate::pipeline::render::{PageRenderer, PdfiumRenderer};
use crate::pipeline::{input, persist};
use crate::schema::AccountSummary;
use std::fmt::Display;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Run the pipeline over `config.input_dir`.
///
/// This is the primary entry point for the library. The renderer and the
/// extraction provider come from `config` when pre-built, otherwise pdfium
/// is bound and Azure OpenAI is configured from the environment.
///
/// # Errors
/// Returns `Err(PipelineError)` only for fatal setup errors. Per-document
/// failures are reported inside the returned [`RunReport`].
pub async fn run(config: &PipelineConfig) -> Result<RunReport, PipelineError> {
    let extractor = resolve_extractor(config)?;
    let renderer = resolve_renderer(config)?;
    process_directory(config, renderer.as_ref(), extractor.as_ref()).await
}

/// Process every matching document in `config.input_dir` sequentially.
pub async fn process_directory(
    config: &PipelineConfig,
    renderer: &dyn PageRenderer,
    extractor: &dyn StructuredExtractor,
) -> Result<RunReport, PipelineError> {
    let total_start = Instant::now();

    ensure_dir(&config.results_dir)?;
    if config.save_images {
        ensure_dir(&config.images_dir)?;
    }

    let documents = input::discover_documents(&config.input_dir, &config.extension)?;
    info!(
        "Processing {} documents from {} with {}",
        documents.len(),
        config.input_dir.display(),
        extractor.name()
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_run_start(documents.len());
    }

    let mut outcomes = Vec::with_capacity(documents.len());
    for path in &documents {
        outcomes.push(process_document(path, config, renderer, extractor).await);
    }

    let persisted = outcomes.iter().filter(|o| o.is_persisted()).count();
    let stats = RunStats {
        total_documents: outcomes.len(),
        persisted,
        failed: outcomes.len() - persisted,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Run complete: {}/{} documents persisted, {}ms total",
        stats.persisted, stats.total_documents, stats.total_duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_run_complete(stats.total_documents, stats.persisted);
    }

    Ok(RunReport { outcomes, stats })
}

/// Take one document from `Discovered` to `Persisted` or `Failed(stage)`.
pub async fn process_document(
    path: &Path,
    config: &PipelineConfig,
    renderer: &dyn PageRenderer,
    extractor: &dyn StructuredExtractor,
) -> DocumentOutcome {
    let start = Instant::now();
    let mut outcome = DocumentOutcome::discovered(path.to_path_buf());
    let file = outcome.file_name();

    info!("Processing {}", file);
    if let Some(ref cb) = config.progress_callback {
        cb.on_document_start(&file);
    }

    if let Err(error) = run_stages(&mut outcome, &file, config, renderer, extractor).await {
        warn!("{}", error);
        if let Some(ref cb) = config.progress_callback {
            cb.on_document_error(&file, &error);
        }
        outcome.state = DocumentState::Failed(error.stage());
        outcome.error = Some(error);
    }

    outcome.duration_ms = start.elapsed().as_millis() as u64;
    outcome
}

async fn run_stages(
    outcome: &mut DocumentOutcome,
    file: &str,
    config: &PipelineConfig,
    renderer: &dyn PageRenderer,
    extractor: &dyn StructuredExtractor,
) -> Result<(), DocumentError> {
    let path = outcome.source.clone();
    let stem = input::document_stem(&path);

    // ── Open + render ────────────────────────────────────────────────────
    let page = input::check_pdf_header(&path)
        .and_then(|()| renderer.render_page(&path, config.page_index))
        .map_err(|e| match e {
            RenderError::Open(detail) => DocumentError::DocumentOpen {
                file: file.to_string(),
                detail,
            },
            other => service_error(file, Stage::Render, other),
        })?;
    outcome.state = DocumentState::Rendered;

    // ── Encode ───────────────────────────────────────────────────────────
    let png = encode::encode_png(&page.image).map_err(|e| service_error(file, Stage::Encode, e))?;
    let image = ImageData::from_bytes(&png, PNG_MIME);
    outcome.state = DocumentState::Encoded;

    if config.save_images {
        let image_path = persist::write_image(&config.images_dir, &stem, &png)
            .map_err(|e| service_error(file, Stage::Persist, e))?;
        if let Some(ref cb) = config.progress_callback {
            cb.on_image_saved(file, &image_path);
        }
        outcome.image_path = Some(image_path);
    }

    // ── Extract ──────────────────────────────────────────────────────────
    let summary: AccountSummary = extract::extract(extractor, &config.prompt, &image)
        .await
        .map_err(|e| service_error(file, Stage::Extract, e))?;
    debug!("{}: extracted {:?}", file, summary);
    outcome.state = DocumentState::Extracted;

    // ── Persist ──────────────────────────────────────────────────────────
    let result_path = persist::write_json(&config.results_dir, &stem, &summary)
        .map_err(|e| service_error(file, Stage::Persist, e))?;
    if let Some(ref cb) = config.progress_callback {
        cb.on_result_saved(file, &result_path);
    }

    outcome.extracted = Some(summary);
    outcome.result_path = Some(result_path);
    outcome.state = DocumentState::Persisted;
    Ok(())
}

fn service_error(file: &str, stage: Stage, detail: impl Display) -> DocumentError {
    DocumentError::ServiceCall {
        file: file.to_string(),
        stage,
        detail: detail.to_string(),
    }
}

fn ensure_dir(path: &Path) -> Result<(), PipelineError> {
    std::fs::create_dir_all(path).map_err(|source| PipelineError::OutputDirFailed {
        path: path.to_path_buf(),
        source,
    })
}

/// Use the pre-built renderer if given, otherwise bind pdfium.
fn resolve_renderer(config: &PipelineConfig) -> Result<Arc<dyn PageRenderer>, PipelineError> {
    if let Some(ref renderer) = config.renderer {
        return Ok(Arc::clone(renderer));
    }
    Ok(Arc::new(PdfiumRenderer::bind(config.zoom)?))
}

/// Use the pre-built provider if given, otherwise Azure OpenAI from `AOAI_*`.
fn resolve_extractor(
    config: &PipelineConfig,
) -> Result<Arc<dyn StructuredExtractor>, PipelineError> {
    if let Some(ref extractor) = config.extractor {
        return Ok(Arc::clone(extractor));
    }
    Ok(Arc::new(AzureOpenAiExtractor::from_env()?))
}
