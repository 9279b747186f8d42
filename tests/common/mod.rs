//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use edgequake_pdf2json::{
    DocumentError, ExtractError, ExtractionRequest, PageRenderer, PipelineProgressCallback,
    RenderError, RenderedPage, StructuredExtractor,
};
use image::{DynamicImage, Rgba, RgbaImage};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Mutex;

pub const JANE_DOE_TEXT: &str = "Customer: Jane Doe, Account: 123456789, Balance: $4,200.00";

pub fn jane_doe_answer() -> Value {
    json!({
        "customerName": "Jane Doe",
        "accountNumber": "123456789",
        "balanceUSD": "4200.00"
    })
}

/// A minimal, valid single-page US-Letter PDF showing `text` in Helvetica.
pub fn sample_pdf(text: &str) -> Vec<u8> {
    let escaped = text
        .replace('\\', "\\\\")
        .replace('(', "\\(")
        .replace(')', "\\)");
    let content = format!("BT /F1 14 Tf 72 720 Td ({escaped}) Tj ET");

    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
         /Resources << /Font << /F1 4 0 R >> >> /Contents 5 0 R >>"
            .to_string(),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
        format!(
            "<< /Length {} >>\nstream\n{}\nendstream",
            content.len(),
            content
        ),
    ];

    let mut pdf = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, obj) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, obj).as_bytes());
    }

    let xref_offset = pdf.len();
    let mut tail = format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
    for off in offsets {
        tail.push_str(&format!("{off:010} 00000 n \n"));
    }
    tail.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
        objects.len() + 1,
        xref_offset
    ));
    pdf.extend_from_slice(tail.as_bytes());
    pdf
}

/// Renders every document as a solid `width × height` image without pdfium.
pub struct StubRenderer {
    pub width: u32,
    pub height: u32,
}

impl Default for StubRenderer {
    fn default() -> Self {
        Self {
            width: 64,
            height: 48,
        }
    }
}

impl PageRenderer for StubRenderer {
    fn render_page(&self, path: &Path, page_index: usize) -> Result<RenderedPage, RenderError> {
        if page_index != 0 {
            return Err(RenderError::PageOutOfRange {
                index: page_index,
                total: 1,
            });
        }
        std::fs::metadata(path).map_err(|e| RenderError::Open(e.to_string()))?;
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            self.width,
            self.height,
            Rgba([250, 250, 250, 255]),
        ));
        Ok(RenderedPage {
            image,
            page_count: 1,
            width_pt: self.width as f32,
            height_pt: self.height as f32,
        })
    }
}

/// What a [`StubExtractor`] was asked.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub instruction: String,
    pub data_uri: String,
    pub schema_name: String,
}

/// Answers from a queue (last answer repeats) and records every request.
pub struct StubExtractor {
    answers: Mutex<VecDeque<Result<Value, String>>>,
    last: Mutex<Result<Value, String>>,
    pub requests: Mutex<Vec<RecordedRequest>>,
}

impl StubExtractor {
    pub fn always(answer: Value) -> Self {
        Self::sequence(vec![Ok(answer)])
    }

    pub fn failing(message: &str) -> Self {
        Self::sequence(vec![Err(message.to_string())])
    }

    pub fn sequence(answers: Vec<Result<Value, String>>) -> Self {
        let last = answers
            .last()
            .cloned()
            .unwrap_or_else(|| Err("no answer configured".to_string()));
        Self {
            answers: Mutex::new(answers.into()),
            last: Mutex::new(last),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl StructuredExtractor for StubExtractor {
    fn name(&self) -> &str {
        "stub"
    }

    async fn submit(&self, request: &ExtractionRequest<'_>) -> Result<Value, ExtractError> {
        self.requests.lock().unwrap().push(RecordedRequest {
            instruction: request.instruction.to_string(),
            data_uri: request.image.to_data_uri(),
            schema_name: request.schema.name.clone(),
        });

        let answer = {
            let mut queue = self.answers.lock().unwrap();
            match queue.pop_front() {
                Some(a) => a,
                None => self.last.lock().unwrap().clone(),
            }
        };
        answer.map_err(|detail| ExtractError::Api {
            status: 500,
            detail,
        })
    }
}

/// Records the console lines the CLI would print.
#[derive(Default)]
pub struct RecordingProgress {
    pub lines: Mutex<Vec<String>>,
}

impl RecordingProgress {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }
}

impl PipelineProgressCallback for RecordingProgress {
    fn on_document_start(&self, document: &str) {
        self.lines
            .lock()
            .unwrap()
            .push(format!("Processing {document}..."));
    }

    fn on_image_saved(&self, _document: &str, path: &Path) {
        self.lines.lock().unwrap().push(format!(
            "Saved image to {}",
            path.file_name().unwrap().to_string_lossy()
        ));
    }

    fn on_result_saved(&self, _document: &str, path: &Path) {
        self.lines.lock().unwrap().push(format!(
            "Saved extracted information to {}",
            path.file_name().unwrap().to_string_lossy()
        ));
    }

    fn on_document_error(&self, _document: &str, error: &DocumentError) {
        self.lines.lock().unwrap().push(error.to_string());
    }
}
