//! Image encoding: `DynamicImage` → PNG bytes → base64 data URI.
//!
//! Vision chat APIs accept images inline as `data:<mime>;base64,<payload>`
//! URIs inside the JSON request body, so no separate upload is needed. PNG is
//! used because it is lossless; JPEG artefacts around small digits are exactly
//! what breaks account-number recognition.
//!
//! The same PNG bytes are written to `output_images/` and embedded in the
//! request, so the saved image is byte-for-byte what the model saw.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

pub const PNG_MIME: &str = "image/png";

/// A base64-encoded image ready to embed in a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    /// Base64 payload (standard alphabet, padded).
    pub data: String,
    pub mime_type: String,
}

impl ImageData {
    pub fn from_bytes(bytes: &[u8], mime_type: impl Into<String>) -> Self {
        let data = STANDARD.encode(bytes);
        debug!("Encoded image → {} bytes base64", data.len());
        Self {
            data,
            mime_type: mime_type.into(),
        }
    }

    /// `data:<mime>;base64,<payload>`
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

/// PNG-encode a rendered page.
pub fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;
    Ok(buf)
}

/// Build a data URI from raw bytes and a MIME type.
pub fn to_data_uri(bytes: &[u8], mime_type: &str) -> String {
    ImageData::from_bytes(bytes, mime_type).to_data_uri()
}

/// Split a base64 data URI back into its MIME type and decoded bytes.
///
/// Returns `None` if `uri` is not of the form `data:<mime>;base64,<payload>`
/// or the payload is not valid base64.
pub fn decode_data_uri(uri: &str) -> Option<(String, Vec<u8>)> {
    let rest = uri.strip_prefix("data:")?;
    let (header, payload) = rest.split_once(',')?;
    let mime = header.strip_suffix(";base64")?;
    let bytes = STANDARD.decode(payload).ok()?;
    Some((mime.to_string(), bytes))
}
