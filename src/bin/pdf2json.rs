//! CLI binary for edgequake-pdf2json.
//!
//! A thin shim over the library crate: loads `.env`, maps flags to
//! `PipelineConfig`, and prints one line per pipeline event. Every flag has a
//! default, so running `pdf2json` with no arguments processes
//! `input_documents/` into `output_images/` and `output_results/`.
//!
//! The exit code is 0 whenever the run could start, even if individual
//! documents failed; those failures are printed, not signalled.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_pdf2json::config::{
    DEFAULT_IMAGES_DIR, DEFAULT_INPUT_DIR, DEFAULT_RESULTS_DIR, DEFAULT_ZOOM,
};
use edgequake_pdf2json::{
    run, DocumentError, PipelineConfig, PipelineProgressCallback, ProgressCallback,
};
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn paint(code: &str, s: &str) -> String {
    if io::stderr().is_terminal() {
        format!("\x1b[{code}m{s}\x1b[0m")
    } else {
        s.to_string()
    }
}
fn green(s: &str) -> String {
    paint("32", s)
}
fn red(s: &str) -> String {
    paint("31", s)
}
fn cyan(s: &str) -> String {
    paint("36", s)
}
fn bold(s: &str) -> String {
    paint("1", s)
}

// ── Console progress callback ────────────────────────────────────────────────

/// Prints the per-document progress lines on stdout.
///
/// In quiet mode only the `Error …` lines are printed (on stderr).
struct ConsoleProgress {
    quiet: bool,
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

impl PipelineProgressCallback for ConsoleProgress {
    fn on_document_start(&self, document: &str) {
        if !self.quiet {
            println!("Processing {document}...");
        }
    }

    fn on_image_saved(&self, _document: &str, path: &Path) {
        if !self.quiet {
            println!("Saved image to {}", file_name(path));
        }
    }

    fn on_result_saved(&self, _document: &str, path: &Path) {
        if !self.quiet {
            println!("Saved extracted information to {}", file_name(path));
        }
    }

    fn on_document_error(&self, _document: &str, error: &DocumentError) {
        if self.quiet {
            eprintln!("{error}");
        } else {
            println!("{error}");
        }
    }

    fn on_run_complete(&self, total: usize, persisted: usize) {
        if self.quiet {
            return;
        }
        let failed = total.saturating_sub(persisted);
        if total == 0 {
            eprintln!("{} no documents found", cyan("⚠"));
        } else if failed == 0 {
            eprintln!(
                "{} {} documents extracted successfully",
                green("✔"),
                bold(&persisted.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} documents extracted  ({} failed)",
                if failed == total { red("✘") } else { cyan("⚠") },
                bold(&persisted.to_string()),
                total,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Standard run: input_documents/ → output_images/ + output_results/
  pdf2json

  # Other directories, sharper render, no page images kept
  pdf2json --input-dir statements --zoom 3 --no-images

  # Machine-readable run report on stdout
  pdf2json --json > report.json

ENVIRONMENT VARIABLES:
  AOAI_ENDPOINT       Azure OpenAI resource endpoint (required)
  AOAI_API_KEY        Azure OpenAI API key (required)
  AOAI_DEPLOYMENT     Vision-capable model deployment name (required)
  AOAI_API_VERSION    API version (default: 2024-08-01-preview)
  PDFIUM_LIB_PATH     Path to an existing libpdfium
  RUST_LOG            Override the log filter (e.g. edgequake_pdf2json=debug)

  Variables may also be placed in a .env file in the working directory.
"#;

/// Extract customer name, account number and balance from PDF statements.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2json",
    version,
    about = "Extract customer name, account number and balance from PDFs using a Vision LLM",
    long_about = "Render the first page of every PDF in a directory, ask an Azure OpenAI vision \
deployment for the customer name, account number and USD balance, and save each answer as JSON.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Directory scanned for *.pdf files (non-recursive).
    #[arg(long, env = "PDF2JSON_INPUT_DIR", default_value = DEFAULT_INPUT_DIR)]
    input_dir: PathBuf,

    /// Directory receiving <stem>.png page images.
    #[arg(long, env = "PDF2JSON_IMAGES_DIR", default_value = DEFAULT_IMAGES_DIR)]
    images_dir: PathBuf,

    /// Directory receiving <stem>.json results.
    #[arg(long, env = "PDF2JSON_RESULTS_DIR", default_value = DEFAULT_RESULTS_DIR)]
    results_dir: PathBuf,

    /// Render magnification applied to both page axes.
    #[arg(long, env = "PDF2JSON_ZOOM", default_value_t = DEFAULT_ZOOM)]
    zoom: f32,

    /// Do not write page images.
    #[arg(long, env = "PDF2JSON_NO_IMAGES")]
    no_images: bool,

    /// Print the run report as JSON on stdout instead of progress lines.
    #[arg(long, env = "PDF2JSON_JSON")]
    json: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2JSON_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2JSON_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress lines already report every document; library logs only
    // show up on request.
    let filter = if cli.verbose { "debug" } else { "error" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let progress: ProgressCallback = Arc::new(ConsoleProgress {
        quiet: cli.quiet || cli.json,
    });

    let config = PipelineConfig::builder()
        .input_dir(&cli.input_dir)
        .images_dir(&cli.images_dir)
        .results_dir(&cli.results_dir)
        .zoom(cli.zoom)
        .save_images(!cli.no_images)
        .progress_callback(progress)
        .build()
        .context("Invalid configuration")?;

    // ── Run ──────────────────────────────────────────────────────────────
    let report = run(&config).await.context("Extraction run could not start")?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialise run report")?
        );
    }

    Ok(())
}
