//! Configuration types for the extraction pipeline.
//!
//! Run behaviour is controlled through [`PipelineConfig`], built via its
//! [`PipelineConfigBuilder`]. Every default equals the fixed constant the
//! tool was designed around (`input_documents/`, `output_images/`,
//! `output_results/`, 2× zoom, first page only), so
//! `PipelineConfig::default()` reproduces the standard run exactly.
//!
//! Service credentials live separately in [`AzureOpenAiConfig`], loaded once
//! from the process environment at startup.

use crate::error::PipelineError;
use crate::pipeline::extract::StructuredExtractor;
use crate::pipeline::render::{PageRenderer, MAX_ZOOM, MIN_ZOOM};
use crate::progress::ProgressCallback;
use crate::prompts::EXTRACTION_PROMPT;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

pub const DEFAULT_INPUT_DIR: &str = "input_documents";
pub const DEFAULT_IMAGES_DIR: &str = "output_images";
pub const DEFAULT_RESULTS_DIR: &str = "output_results";
pub const DEFAULT_ZOOM: f32 = 2.0;

/// Configuration for one pipeline run.
///
/// # Example
/// ```rust
/// use edgequake_pdf2json::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .input_dir("statements")
///     .zoom(3.0)
///     .save_images(false)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct PipelineConfig {
    /// Directory scanned (non-recursively) for input documents. Default: `input_documents`.
    pub input_dir: PathBuf,

    /// Where rendered page images are written. Default: `output_images`.
    pub images_dir: PathBuf,

    /// Where JSON results are written. Default: `output_results`.
    pub results_dir: PathBuf,

    /// File extension (without dot, case-sensitive) selecting input documents. Default: `pdf`.
    pub extension: String,

    /// 0-based page to rasterise. Default: 0.
    pub page_index: usize,

    /// Magnification applied to both page axes when rasterising. Default: 2.0.
    ///
    /// At 1.0 a PDF point maps to one pixel (72 DPI), which is too coarse for
    /// small print on statements. 2.0 doubles both axes and keeps the PNG
    /// well under typical upload limits.
    pub zoom: f32,

    /// Write each rendered page to `images_dir` as `<stem>.png`. Default: true.
    pub save_images: bool,

    /// User instruction sent with each image. Default: [`EXTRACTION_PROMPT`].
    pub prompt: String,

    /// Pre-constructed renderer. If None, pdfium is bound at run start with
    /// `zoom`. A pre-built renderer keeps its own zoom; `zoom` does not apply
    /// to it.
    pub renderer: Option<Arc<dyn PageRenderer>>,

    /// Pre-constructed extraction provider. If None, Azure OpenAI is
    /// configured from the environment.
    pub extractor: Option<Arc<dyn StructuredExtractor>>,

    /// Optional per-document progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from(DEFAULT_INPUT_DIR),
            images_dir: PathBuf::from(DEFAULT_IMAGES_DIR),
            results_dir: PathBuf::from(DEFAULT_RESULTS_DIR),
            extension: "pdf".to_string(),
            page_index: 0,
            zoom: DEFAULT_ZOOM,
            save_images: true,
            prompt: EXTRACTION_PROMPT.to_string(),
            renderer: None,
            extractor: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("input_dir", &self.input_dir)
            .field("images_dir", &self.images_dir)
            .field("results_dir", &self.results_dir)
            .field("extension", &self.extension)
            .field("page_index", &self.page_index)
            .field("zoom", &self.zoom)
            .field("save_images", &self.save_images)
            .field("renderer", &self.renderer.as_ref().map(|_| "<dyn PageRenderer>"))
            .field(
                "extractor",
                &self.extractor.as_ref().map(|e| e.name().to_string()),
            )
            .finish()
    }
}

impl PipelineConfig {
    /// Create a new builder for `PipelineConfig`.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`PipelineConfig`].
#[derive(Debug)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn input_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.input_dir = dir.into();
        self
    }

    pub fn images_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.images_dir = dir.into();
        self
    }

    pub fn results_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.results_dir = dir.into();
        self
    }

    pub fn extension(mut self, ext: impl Into<String>) -> Self {
        self.config.extension = ext.into().trim_start_matches('.').to_string();
        self
    }

    pub fn page_index(mut self, idx: usize) -> Self {
        self.config.page_index = idx;
        self
    }

    pub fn zoom(mut self, zoom: f32) -> Self {
        self.config.zoom = if zoom.is_finite() {
            zoom.clamp(MIN_ZOOM, MAX_ZOOM)
        } else {
            zoom
        };
        self
    }

    pub fn save_images(mut self, v: bool) -> Self {
        self.config.save_images = v;
        self
    }

    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.prompt = prompt.into();
        self
    }

    pub fn renderer(mut self, renderer: Arc<dyn PageRenderer>) -> Self {
        self.config.renderer = Some(renderer);
        self
    }

    pub fn extractor(mut self, extractor: Arc<dyn StructuredExtractor>) -> Self {
        self.config.extractor = Some(extractor);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PipelineConfig, PipelineError> {
        let c = &self.config;
        if !c.zoom.is_finite() || c.zoom <= 0.0 {
            return Err(PipelineError::InvalidConfig(format!(
                "zoom must be a positive number, got {}",
                c.zoom
            )));
        }
        if c.extension.is_empty() {
            return Err(PipelineError::InvalidConfig(
                "extension must not be empty".into(),
            ));
        }
        if c.prompt.trim().is_empty() {
            return Err(PipelineError::InvalidConfig(
                "prompt must not be empty".into(),
            ));
        }
        if c.images_dir == c.results_dir {
            return Err(PipelineError::InvalidConfig(format!(
                "images and results directories must differ ('{}')",
                c.images_dir.display()
            )));
        }
        Ok(self.config)
    }
}

// ── Azure OpenAI ─────────────────────────────────────────────────────────

pub const ENV_ENDPOINT: &str = "AOAI_ENDPOINT";
pub const ENV_API_KEY: &str = "AOAI_API_KEY";
pub const ENV_DEPLOYMENT: &str = "AOAI_DEPLOYMENT";
pub const ENV_API_VERSION: &str = "AOAI_API_VERSION";

/// First API version that accepts `response_format: json_schema`.
pub const DEFAULT_API_VERSION: &str = "2024-08-01-preview";

/// Connection and request settings for an Azure OpenAI chat deployment.
#[derive(Clone)]
pub struct AzureOpenAiConfig {
    /// Resource endpoint, e.g. `https://my-resource.openai.azure.com`.
    pub endpoint: String,
    pub api_key: String,
    /// Deployment name of a vision-capable model.
    pub deployment: String,
    pub api_version: String,
    /// Sampling temperature. Default: 0.7.
    pub temperature: f32,
    /// Cap on generated tokens. Default: 2000.
    pub max_tokens: u32,
    /// Whole-request timeout in seconds. Default: 600.
    pub timeout_secs: u64,
}

impl fmt::Debug for AzureOpenAiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AzureOpenAiConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .field("deployment", &self.deployment)
            .field("api_version", &self.api_version)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl AzureOpenAiConfig {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        deployment: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            deployment: deployment.into(),
            api_version: DEFAULT_API_VERSION.to_string(),
            temperature: 0.7,
            max_tokens: 2000,
            timeout_secs: 600,
        }
    }

    /// Read `AOAI_ENDPOINT`, `AOAI_API_KEY`, `AOAI_DEPLOYMENT` and the
    /// optional `AOAI_API_VERSION` from the process environment.
    pub fn from_env() -> Result<Self, PipelineError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub(crate) fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, PipelineError> {
        let require = |var: &str| {
            lookup(var)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| PipelineError::ProviderNotConfigured {
                    var: var.to_string(),
                    hint: format!(
                        "Set {ENV_ENDPOINT}, {ENV_API_KEY} and {ENV_DEPLOYMENT} \
                         in the environment or in a .env file."
                    ),
                })
        };

        let mut config = Self::new(
            require(ENV_ENDPOINT)?,
            require(ENV_API_KEY)?,
            require(ENV_DEPLOYMENT)?,
        );
        if let Some(v) = lookup(ENV_API_VERSION).filter(|v| !v.trim().is_empty()) {
            config.api_version = v;
        }
        Ok(config)
    }

    /// Full chat-completions URL for this deployment.
    pub fn chat_completions_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint.trim_end_matches('/'),
            self.deployment,
            self.api_version
        )
    }
}
