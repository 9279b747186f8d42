//! Pipeline stages for PDF-to-JSON extraction.
//!
//! Each submodule implements exactly one step, so each is testable on its own
//! and the renderer or the extraction provider can be replaced without
//! touching the others.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ encode ──▶ extract ──▶ persist
//! (discover) (pdfium)  (base64)   (VLM)       (.png / .json)
//! ```
//!
//! 1. [`input`]   — list `*.pdf` files and check the `%PDF` header
//! 2. [`render`]  — rasterise page 0 at a fixed zoom
//! 3. [`encode`]  — PNG-encode and wrap as a base64 data URI
//! 4. [`extract`] — structured-output call; the only stage with network I/O
//! 5. [`persist`] — write the page image and the JSON record

pub mod encode;
pub mod extract;
pub mod input;
pub mod persist;
pub mod render;
